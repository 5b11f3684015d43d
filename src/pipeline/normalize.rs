//! Text normalisation: full-width → half-width, whitespace collapse.
//!
//! Every downstream pattern (case numbers, month/day dates, session summary
//! lines) is written against ASCII digits. The council PDFs mix `３月１９日`
//! and `3月19日` freely, sometimes within the same table, so normalisation
//! must run before any line is classified.
//!
//! Only the full-width ASCII letters/digits block and the ideographic space
//! are folded. Full-width punctuation such as `（）` and `～` is left alone:
//! title endings and recess-period patterns match it as-is.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fold `Ａ-Ｚ`, `ａ-ｚ`, `０-９` to ASCII and U+3000 to a plain space.
pub fn to_half_width(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
                char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
            }
            '\u{3000}' => ' ',
            other => other,
        })
        .collect()
}

static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse internal whitespace runs to one space and trim.
pub fn collapse_whitespace(line: &str) -> String {
    RE_WHITESPACE_RUN.replace_all(line, " ").trim().to_string()
}

/// Split already half-width text into normalised, non-empty lines.
pub fn split_lines(half_width: &str) -> Vec<String> {
    half_width
        .lines()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect()
}
