//! Result segmentation: partition normalised lines into item blocks.
//!
//! The result table prints every result row of a block first and the
//! matching titles after it, in the same order:
//!
//! ```text
//! 議案第1号 3月3日 原案可決      ┐ results
//! 議案第2号 3月3日 原案可決      ┘
//! 新得町税条例の一部を改正する条例  ┐ titles
//! 令和6年度新得町一般会計補正予算   ┘
//! 議案第3号 3月19日 原案可決     ← new block starts here
//! ```
//!
//! A result line that follows title lines is what tells one block from the
//! next, so the segmenter is a three-state machine rather than a splitter.

use crate::pipeline::layout::{LayoutRules, ResultLine};

/// One block of results and the title-candidate lines that follow them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub results: Vec<ResultLine>,
    pub title_lines: Vec<String>,
}

impl Segment {
    fn is_empty(&self) -> bool {
        self.results.is_empty() && self.title_lines.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing seen yet. Lines before the first result are dropped.
    Init,
    InResults,
    InTitles,
}

/// Run the segmentation state machine over normalised, non-empty lines.
pub fn segment_lines<S: AsRef<str>>(lines: &[S], rules: &dyn LayoutRules) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = Segment::default();
    let mut state = State::Init;

    for line in lines {
        let line = line.as_ref();

        if let Some(result) = rules.parse_result_line(line) {
            if state == State::InTitles {
                segments.push(std::mem::take(&mut current));
            }
            current.results.push(result);
            state = State::InResults;
            continue;
        }

        if state == State::InResults {
            state = State::InTitles;
        }
        if state == State::InTitles && rules.is_title_candidate(line) {
            current.title_lines.push(line.to_string());
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}
