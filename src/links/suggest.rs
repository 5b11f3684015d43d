//! Suggest theme links for every titled item in the session index.
//!
//! The output is advisory and fully regenerated on each run. Keys already
//! present in the master store are left out, so the file only ever shows
//! what a reviewer has not yet decided on.

use crate::classify::{classify, RejectReason};
use crate::error::GiketsuError;
use crate::links::table::{encode_rows, read_table, LinkRow};
use crate::links::write_atomic;
use crate::output::Session;
use crate::themes::ThemeConfig;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, info};

const SUGGEST_PREAMBLE: &str = "\
# Suggested theme links, regenerated on every run of `giketsu suggest`.
# Review the rows, then run `giketsu merge` to append them to the master file.
# The score/matched annotations are for reviewers and are ignored on import.
";

/// One proposed link with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub row: LinkRow,
    pub score: usize,
    pub matched: Vec<String>,
}

impl Suggestion {
    fn annotation(&self) -> String {
        format!("score:{} matched:[{}]", self.score, self.matched.join("/"))
    }
}

/// Adopted rows for one theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeTally {
    pub adopted: usize,
    /// Of `adopted`, how many were accepted at score 1 via the allow-list.
    pub score1: usize,
}

/// Counts printed after a suggest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestReport {
    pub adopted: usize,
    /// Items that matched some theme but had no viable candidate.
    pub below_threshold: usize,
    /// Score-1 candidates rejected for missing the allow-list.
    pub allowlist_excluded: usize,
    /// Of those, rejections where a weak keyword was matched.
    pub weak_excluded: usize,
    pub weak_keyword_counts: BTreeMap<String, usize>,
    /// Items tagged with two tied themes.
    pub multi_theme_items: usize,
    /// Keys already present in the master store.
    pub skipped_existing: usize,
    pub empty_titles: usize,
    pub per_theme: BTreeMap<String, ThemeTally>,
}

/// Classify every item and collect the links not yet in `existing`.
///
/// Returned suggestions are in file order.
pub fn suggest_rows(
    sessions: &[Session],
    existing: &HashSet<LinkRow>,
    config: &ThemeConfig,
) -> (Vec<Suggestion>, SuggestReport) {
    let mut report = SuggestReport::default();
    let mut suggestions = Vec::new();
    let mut handled: HashSet<LinkRow> = HashSet::new();
    let mut skipped: HashSet<LinkRow> = HashSet::new();
    let mut multi_theme: BTreeSet<(String, String, u32)> = BTreeSet::new();

    for session in sessions {
        for item in &session.items {
            if item.title.trim().is_empty() {
                report.empty_titles += 1;
                continue;
            }

            let classification = classify(&item.title, config);
            if !classification.has_candidates() {
                continue;
            }

            for rejection in &classification.rejections {
                if let RejectReason::NotOnAllowList { weak_hits } = &rejection.reason {
                    report.allowlist_excluded += 1;
                    if !weak_hits.is_empty() {
                        report.weak_excluded += 1;
                        for kw in weak_hits {
                            *report.weak_keyword_counts.entry(kw.clone()).or_default() += 1;
                        }
                    }
                }
            }

            if classification.winners.is_empty() {
                report.below_threshold += 1;
                continue;
            }
            if classification.winners.len() == 2 {
                multi_theme.insert((
                    session.era_label.clone(),
                    item.case_type.to_string(),
                    item.num,
                ));
            }

            for winner in classification.winners {
                let row = LinkRow {
                    case_type: item.case_type.to_string(),
                    era_label: session.era_label.clone(),
                    num: item.num,
                    reference: winner.reference(),
                };

                if !handled.insert(row.clone()) {
                    continue;
                }
                if existing.contains(&row) {
                    skipped.insert(row);
                    continue;
                }

                let tally = report.per_theme.entry(winner.theme_id.clone()).or_default();
                tally.adopted += 1;
                if winner.score == 1 {
                    tally.score1 += 1;
                }

                suggestions.push(Suggestion {
                    row,
                    score: winner.score,
                    matched: winner.matched,
                });
            }
        }
    }

    suggestions.sort_by(|a, b| a.row.file_order(&b.row));
    report.adopted = suggestions.len();
    report.skipped_existing = skipped.len();
    report.multi_theme_items = multi_theme.len();

    (suggestions, report)
}

/// Render the suggestion file.
pub fn render_suggestions(suggestions: &[Suggestion]) -> Result<String, GiketsuError> {
    let body = encode_rows(
        suggestions.iter().map(|s| (&s.row, Some(s.annotation()))),
        true,
    )?;
    Ok(format!("{SUGGEST_PREAMBLE}{body}"))
}

/// Read the session index and (optionally) the master store, then write a
/// fresh suggestion file.
pub fn suggest_links(
    index_path: &Path,
    master_path: &Path,
    output_path: &Path,
    config: &ThemeConfig,
) -> Result<SuggestReport, GiketsuError> {
    let raw = std::fs::read_to_string(index_path).map_err(|e| GiketsuError::InputReadFailed {
        path: index_path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let sessions: Vec<Session> =
        serde_json::from_str(&raw).map_err(|e| GiketsuError::InputReadFailed {
            path: index_path.to_path_buf(),
            detail: format!("expected a JSON array of sessions: {e}"),
        })?;

    let existing: HashSet<LinkRow> = if master_path.exists() {
        match read_table(master_path)? {
            (_, Some(table)) => table.lenient_rows(master_path).0.into_iter().collect(),
            (_, None) => HashSet::new(),
        }
    } else {
        debug!("No master store at {}; nothing to skip", master_path.display());
        HashSet::new()
    };

    let (suggestions, report) = suggest_rows(&sessions, &existing, config);
    write_atomic(output_path, render_suggestions(&suggestions)?.as_bytes())?;

    info!(
        "Wrote {} suggestion(s) to {}",
        report.adopted,
        output_path.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{CaseType, Outcome, PartialDate, ResolutionItem};

    fn session(era: &str, titles: &[(u32, &str)]) -> Session {
        Session {
            pdf_url: format!("https://example.jp/{era}.pdf"),
            year: 2025,
            era_label: era.to_string(),
            session_label: "定例第1回".to_string(),
            session_name: format!("{era}定例第1回"),
            session_range: String::new(),
            items: titles
                .iter()
                .map(|(num, title)| {
                    ResolutionItem::new(
                        CaseType::Bill,
                        *num,
                        *title,
                        PartialDate::new(3, 19),
                        Outcome::ApprovedAsProposed,
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn suggestions_and_counts() {
        let sessions = vec![session(
            "令和7年",
            &[
                (1, "令和7年度新得町一般会計予算"),
                (2, "地域医療の確保を求める意見書"),
                (3, "新得町健康づくり推進条例の制定について"),
                (4, ""),
                (5, "新得町税条例の一部を改正する条例"),
            ],
        )];
        let (rows, report) = suggest_rows(&sessions, &HashSet::new(), &ThemeConfig::default());

        let refs: Vec<(u32, &str)> = rows
            .iter()
            .map(|s| (s.row.num, s.row.reference.as_str()))
            .collect();
        assert_eq!(
            refs,
            vec![
                (2, "theme:community"),
                (2, "theme:health"),
            ]
        );
        assert_eq!(report.adopted, 2);
        assert_eq!(report.multi_theme_items, 1);
        assert_eq!(report.empty_titles, 1);
        // items 1 (予算 only), 3 (健康 only) and 5 (税 only)
        assert_eq!(report.below_threshold, 3);
        assert_eq!(report.allowlist_excluded, 1);
        assert_eq!(report.weak_excluded, 1);
        assert_eq!(report.weak_keyword_counts.get("健康"), Some(&1));
        assert_eq!(report.per_theme["health"].score1, 1);
    }

    #[test]
    fn existing_master_rows_are_skipped() {
        let sessions = vec![session("令和7年", &[(9, "令和6年度新得町一般会計補正予算")])];
        let existing: HashSet<LinkRow> = [LinkRow {
            case_type: "議案".into(),
            era_label: "令和7年".into(),
            num: 9,
            reference: "theme:finance".into(),
        }]
        .into_iter()
        .collect();

        let (rows, report) = suggest_rows(&sessions, &existing, &ThemeConfig::default());
        assert!(rows.is_empty());
        assert_eq!(report.skipped_existing, 1);
    }

    #[test]
    fn rendered_file_has_preamble_header_and_annotation() {
        let sessions = vec![session("令和7年", &[(9, "令和6年度新得町一般会計補正予算")])];
        let (rows, _) = suggest_rows(&sessions, &HashSet::new(), &ThemeConfig::default());
        let text = render_suggestions(&rows).unwrap();
        assert!(text.starts_with("# Suggested theme links"));
        assert!(text.contains("\ncaseType,eraLabel,num,ref\n"));
        assert!(text.ends_with("議案,令和7年,9,theme:finance  # score:2 matched:[予算/補正]\n"));
    }
}
