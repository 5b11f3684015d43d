//! Pipeline stages for council-resolution extraction.
//!
//! Each submodule implements exactly one transformation step, so each can
//! be tested on its own and the layout heuristics can be replaced without
//! touching the network or assembly code.
//!
//! ## Data Flow
//!
//! ```text
//! locate ──▶ acquire ──▶ normalize ──▶ segment ──▶ titles ──▶ assemble
//! (index)    (PDF text)  (half-width)  (blocks)   (rejoin)   (records)
//! ```
//!
//! 1. [`locate`]: walk the index and year pages, collect one document
//!    link per council session with its era, year and session label
//! 2. [`acquire`]: fetch or read the PDF and extract its text; extraction
//!    runs in `spawn_blocking` because it is CPU-bound
//! 3. [`normalize`]: full-width digits/letters to ASCII, whitespace collapse
//! 4. [`segment`]: result/title block state machine
//! 5. [`titles`]: rejoin titles wrapped across physical lines
//! 6. [`assemble`]: positional pairing, canonical order, duplicate policy
//!
//! Stages 4–6 consult [`layout::LayoutRules`] for every line-shape decision.

pub mod acquire;
pub mod assemble;
pub mod layout;
pub mod locate;
pub mod normalize;
pub mod segment;
pub mod titles;

use crate::output::ParsedDocument;
use layout::LayoutRules;
use tracing::debug;

/// Run stages 3–6 on one document's raw extracted text.
///
/// Pure and deterministic: the same text always yields the same document.
pub fn parse_text(raw: &str, rules: &dyn LayoutRules) -> ParsedDocument {
    let half_width = normalize::to_half_width(raw);
    let lines = normalize::split_lines(&half_width);

    let segments = segment::segment_lines(&lines, rules);
    let items = assemble::assemble_items(&segments, rules);
    let session_range = rules
        .session_range(&lines, &half_width)
        .unwrap_or_default();

    debug!(
        "Parsed {} lines into {} segments, {} items",
        lines.len(),
        segments.len(),
        items.len()
    );

    ParsedDocument {
        session_range,
        items,
    }
}
