//! Record assembly: positional pairing, canonical order, duplicate policy.
//!
//! `result[i]` of a segment is paired with `title[i]` of the same segment.
//! When reconstruction produced fewer titles than there are results, the
//! excess results get an empty title instead of failing the document; the
//! empty field is what a reviewer later searches for. No realignment is
//! attempted when the counts differ, since there is no reliable signal for
//! which title went missing. The mismatch is logged instead.

use crate::output::{ResolutionItem, Session};
use crate::pipeline::layout::LayoutRules;
use crate::pipeline::segment::Segment;
use crate::pipeline::titles::reconstruct_titles;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Pair every segment's results with its reconstructed titles, then sort
/// and drop duplicate `(caseType, num)` pairs.
pub fn assemble_items(segments: &[Segment], rules: &dyn LayoutRules) -> Vec<ResolutionItem> {
    let mut items = Vec::new();

    for (idx, segment) in segments.iter().enumerate() {
        let titles = reconstruct_titles(&segment.title_lines, rules);

        if titles.len() != segment.results.len() {
            warn!(
                "Segment {}: {} results but {} titles; pairing by position",
                idx + 1,
                segment.results.len(),
                titles.len()
            );
        }

        for (i, result) in segment.results.iter().enumerate() {
            items.push(ResolutionItem::new(
                result.case_type,
                result.num,
                titles.get(i).cloned().unwrap_or_default(),
                result.decision_date,
                result.outcome,
            ));
        }
    }

    sort_and_dedup_items(&mut items);
    items
}

/// Stable sort by case-type priority then number; of two records with the
/// same `(caseType, num)`, the one that appeared first in the document wins.
pub fn sort_and_dedup_items(items: &mut Vec<ResolutionItem>) {
    items.sort_by(ResolutionItem::canonical_cmp);
    items.dedup_by(|later, earlier| {
        let dup = later.case_type == earlier.case_type && later.num == earlier.num;
        if dup {
            warn!(
                "Duplicate {}: keeping first occurrence, dropping title {:?}",
                later.case_number, later.title
            );
        }
        dup
    });
}

/// Presentation order: year descending, then session label, then URL.
pub fn sort_sessions(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then_with(|| natural_cmp(&a.session_label, &b.session_label))
            .then_with(|| a.pdf_url.cmp(&b.pdf_url))
    });
}

/// Drop items whose `(eraLabel, caseType, num)` an earlier session already
/// emitted. Returns the number of items dropped. Run after [`sort_sessions`]
/// so the survivor is deterministic.
pub fn dedup_across_sessions(sessions: &mut [Session]) -> usize {
    let mut seen = BTreeSet::new();
    let mut dropped = 0;

    for session in sessions.iter_mut() {
        let before = session.items.len();
        let era = session.era_label.clone();
        session.items.retain(|item| seen.insert((era.clone(), item.case_type, item.num)));
        let removed = before - session.items.len();
        if removed > 0 {
            warn!(
                "{}: dropped {} item(s) already present in an earlier session of {}",
                session.session_name, removed, era
            );
            dropped += removed;
        }
    }

    debug!("Cross-session dedup dropped {} item(s)", dropped);
    dropped
}

/// Compare strings by codepoint, treating ASCII digit runs as numbers so
/// that `定例第2回` sorts before `定例第10回`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_digits(&mut ai);
                let nb = take_digits(&mut bi);
                let ord = na
                    .trim_start_matches('0')
                    .len()
                    .cmp(&nb.trim_start_matches('0').len())
                    .then_with(|| na.trim_start_matches('0').cmp(nb.trim_start_matches('0')))
                    .then_with(|| na.len().cmp(&nb.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(it: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = it.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        it.next();
    }
    digits
}
