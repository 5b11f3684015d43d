//! Keyword-based theme classification of resolution titles.
//!
//! The score of a theme is the number of its keywords that occur in the
//! title. Short keywords overlap (`農` ⊂ `農業`, `税` ⊂ `交付税`), so a title
//! about dairy farming can score 3 on agriculture from a single word. The
//! thresholds are set with these overlaps counted.

use crate::themes::{ThemeConfig, ThemeRule};
use serde::Serialize;
use std::cmp::Reverse;

/// One theme that matched a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeMatch {
    pub theme_id: String,
    /// Number of matched keywords; doubles as the confidence.
    pub score: usize,
    /// Matched keywords in keyword-list order.
    pub matched: Vec<String>,
}

impl ThemeMatch {
    /// `theme:<id>`.
    pub fn reference(&self) -> String {
        format!("theme:{}", self.theme_id)
    }
}

/// Why a matching theme was not emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum RejectReason {
    /// Score below the theme's threshold.
    BelowThreshold,
    /// Score 1 and no matched keyword is on the theme's allow-list.
    /// `weak_hits` lists the matched weak keywords, if any.
    NotOnAllowList {
        #[serde(rename = "weakHits")]
        weak_hits: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub candidate: ThemeMatch,
    pub reason: RejectReason,
}

/// Outcome of classifying one title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Top viable theme, plus the runner-up when it ties on score.
    pub winners: Vec<ThemeMatch>,
    pub rejections: Vec<Rejection>,
}

impl Classification {
    /// Whether any theme matched at all, viable or not.
    pub fn has_candidates(&self) -> bool {
        !self.winners.is_empty() || !self.rejections.is_empty()
    }
}

fn score_rule(title: &str, rule: &ThemeRule) -> Option<ThemeMatch> {
    let matched: Vec<String> = rule
        .keywords
        .iter()
        .filter(|kw| title.contains(kw.as_str()))
        .cloned()
        .collect();

    (!matched.is_empty()).then(|| ThemeMatch {
        theme_id: rule.id.clone(),
        score: matched.len(),
        matched,
    })
}

/// Every theme with at least one match, ranked by score then priority.
pub fn score_themes(title: &str, config: &ThemeConfig) -> Vec<ThemeMatch> {
    let mut matches: Vec<ThemeMatch> = config
        .themes
        .iter()
        .filter_map(|rule| score_rule(title, rule))
        .collect();

    matches.sort_by(|a, b| {
        let key = |m: &ThemeMatch| (Reverse(m.score), config.priority_rank(&m.theme_id));
        key(a).cmp(&key(b)).then_with(|| a.theme_id.cmp(&b.theme_id))
    });
    matches
}

fn check_viable(candidate: &ThemeMatch, rule: &ThemeRule) -> Result<(), RejectReason> {
    if candidate.score < rule.threshold {
        return Err(RejectReason::BelowThreshold);
    }
    if candidate.score == 1
        && !rule.score1_allowlist.is_empty()
        && !candidate
            .matched
            .iter()
            .any(|kw| rule.score1_allowlist.contains(kw))
    {
        let weak_hits = candidate
            .matched
            .iter()
            .filter(|kw| rule.weak_keywords.contains(kw))
            .cloned()
            .collect();
        return Err(RejectReason::NotOnAllowList { weak_hits });
    }
    Ok(())
}

/// Classify one title.
pub fn classify(title: &str, config: &ThemeConfig) -> Classification {
    let mut viable = Vec::new();
    let mut rejections = Vec::new();

    for candidate in score_themes(title, config) {
        let Some(rule) = config.themes.iter().find(|r| r.id == candidate.theme_id) else {
            continue;
        };
        match check_viable(&candidate, rule) {
            Ok(()) => viable.push(candidate),
            Err(reason) => rejections.push(Rejection { candidate, reason }),
        }
    }

    let mut viable = viable.into_iter();
    let mut winners = Vec::with_capacity(2);
    if let Some(top) = viable.next() {
        let top_score = top.score;
        winners.push(top);
        if let Some(second) = viable.next().filter(|s| s.score == top_score) {
            winners.push(second);
        }
    }

    Classification {
        winners,
        rejections,
    }
}
