//! Output types: resolution items, sessions, and crawl statistics.
//!
//! Every type here serialises to the camelCase JSON shape consumed by the
//! presentation layer (`giketsu_index.json`), and deserialises back so the
//! downstream suggest pass can read a previously written index.

use crate::error::DocumentError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Kind of legislative item. Determines sort priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaseType {
    /// 議案: a bill submitted by the town.
    #[serde(rename = "議案")]
    Bill,
    /// 意見案: an opinion statement submitted by council members.
    #[serde(rename = "意見案")]
    OpinionBill,
}

impl CaseType {
    /// Label as it appears in the source documents and in natural keys.
    pub fn as_str(self) -> &'static str {
        match self {
            CaseType::Bill => "議案",
            CaseType::OpinionBill => "意見案",
        }
    }

    /// Parse the document label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "議案" => Some(CaseType::Bill),
            "意見案" => Some(CaseType::OpinionBill),
            _ => None,
        }
    }

    /// Lower sorts first: bills before opinion bills.
    pub fn priority(self) -> u8 {
        match self {
            CaseType::Bill => 0,
            CaseType::OpinionBill => 1,
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a vote, in keyword-matching order.
///
/// [`Outcome::ALL`] is ordered so that longer keywords which contain a shorter
/// one (`不採択` ⊃ `採択`) are tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "原案可決")]
    ApprovedAsProposed,
    #[serde(rename = "修正可決")]
    ApprovedWithAmendment,
    #[serde(rename = "否決")]
    Rejected,
    #[serde(rename = "撤回")]
    Withdrawn,
    #[serde(rename = "継続審査")]
    ContinuedForReview,
    #[serde(rename = "委員会付託")]
    ReferredToCommittee,
    #[serde(rename = "不採択")]
    NotAdopted,
    #[serde(rename = "採択")]
    Adopted,
    #[serde(rename = "廃案")]
    Scrapped,
    #[serde(rename = "取り下げ")]
    RetractedBySubmitter,
}

impl Outcome {
    /// Every outcome in matching order.
    pub const ALL: [Outcome; 10] = [
        Outcome::ApprovedAsProposed,
        Outcome::ApprovedWithAmendment,
        Outcome::Rejected,
        Outcome::Withdrawn,
        Outcome::ContinuedForReview,
        Outcome::ReferredToCommittee,
        Outcome::NotAdopted,
        Outcome::Adopted,
        Outcome::Scrapped,
        Outcome::RetractedBySubmitter,
    ];

    /// Keyword as printed in the result table.
    pub fn keyword(self) -> &'static str {
        match self {
            Outcome::ApprovedAsProposed => "原案可決",
            Outcome::ApprovedWithAmendment => "修正可決",
            Outcome::Rejected => "否決",
            Outcome::Withdrawn => "撤回",
            Outcome::ContinuedForReview => "継続審査",
            Outcome::ReferredToCommittee => "委員会付託",
            Outcome::NotAdopted => "不採択",
            Outcome::Adopted => "採択",
            Outcome::Scrapped => "廃案",
            Outcome::RetractedBySubmitter => "取り下げ",
        }
    }

    /// First outcome whose keyword occurs anywhere in `line`.
    pub fn find_in(line: &str) -> Option<Self> {
        Outcome::ALL.into_iter().find(|o| line.contains(o.keyword()))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Month/day without a year; the year comes from the owning [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PartialDate {
    pub month: u8,
    pub day: u8,
}

static RE_PARTIAL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([0-9]{1,2})\s*月\s*([0-9]{1,2})\s*日\s*$").unwrap());

impl PartialDate {
    pub fn new(month: u8, day: u8) -> Self {
        Self { month, day }
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}月{}日", self.month, self.day)
    }
}

impl From<PartialDate> for String {
    fn from(d: PartialDate) -> Self {
        d.to_string()
    }
}

impl TryFrom<String> for PartialDate {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let caps = RE_PARTIAL_DATE
            .captures(&s)
            .ok_or_else(|| format!("not a month/day date: {s:?}"))?;
        let month = caps[1].parse().map_err(|_| format!("bad month in {s:?}"))?;
        let day = caps[2].parse().map_err(|_| format!("bad day in {s:?}"))?;
        Ok(PartialDate { month, day })
    }
}

/// One bill or opinion bill voted on in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionItem {
    /// Display form, e.g. `議案第1号`.
    pub case_number: String,
    pub case_type: CaseType,
    pub num: u32,
    /// Empty when no title block lined up with this result.
    pub title: String,
    pub decision_date: PartialDate,
    pub result: Outcome,
}

impl ResolutionItem {
    pub fn new(
        case_type: CaseType,
        num: u32,
        title: impl Into<String>,
        decision_date: PartialDate,
        result: Outcome,
    ) -> Self {
        Self {
            case_number: format!("{}第{}号", case_type, num),
            case_type,
            num,
            title: title.into(),
            decision_date,
            result,
        }
    }

    /// Canonical order: case-type priority, then number.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.case_type
            .priority()
            .cmp(&other.case_type.priority())
            .then(self.num.cmp(&other.num))
    }
}

/// One council meeting whose resolution document was processed as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub pdf_url: String,
    pub year: i32,
    /// Era string the documents are filed under, e.g. `令和7年`.
    pub era_label: String,
    /// e.g. `定例第1回`.
    pub session_label: String,
    /// `era_label` + `session_label`.
    pub session_name: String,
    /// Opening–closing dates such as `3月3日～3月19日`; empty when unknown.
    pub session_range: String,
    pub items: Vec<ResolutionItem>,
}

/// Items and session range recovered from one document's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub session_range: String,
    pub items: Vec<ResolutionItem>,
}

/// Counts reported at the end of a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    pub year_pages: usize,
    pub year_pages_failed: usize,
    pub documents_found: usize,
    pub documents_succeeded: usize,
    pub documents_failed: usize,
    pub total_items: usize,
    pub empty_titles: usize,
    /// Items dropped because an earlier session already emitted the same key.
    pub duplicate_items_dropped: usize,
    pub total_duration_ms: u64,
}

/// Result of a full crawl: the session index plus what went wrong.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlOutput {
    pub sessions: Vec<Session>,
    pub stats: CrawlStats,
    pub failures: Vec<DocumentError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_prefers_longer_keyword() {
        assert_eq!(Outcome::find_in("意見案第1号 3月19日 不採択"), Some(Outcome::NotAdopted));
        assert_eq!(Outcome::find_in("意見案第2号 3月19日 採択"), Some(Outcome::Adopted));
        assert_eq!(Outcome::find_in("議案第2号 3月19日"), None);
    }

    #[test]
    fn item_serialises_in_index_shape() {
        let item = ResolutionItem::new(
            CaseType::Bill,
            3,
            "令和7年度新得町一般会計予算",
            PartialDate::new(3, 14),
            Outcome::ApprovedAsProposed,
        );
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["caseNumber"], "議案第3号");
        assert_eq!(json["caseType"], "議案");
        assert_eq!(json["num"], 3);
        assert_eq!(json["decisionDate"], "3月14日");
        assert_eq!(json["result"], "原案可決");
    }

    #[test]
    fn partial_date_parses_index_strings() {
        let d = PartialDate::try_from("12月 5日".to_string()).unwrap();
        assert_eq!(d, PartialDate::new(12, 5));
        assert!(PartialDate::try_from("令和7年".to_string()).is_err());
    }

    #[test]
    fn bills_sort_before_opinion_bills() {
        let bill = ResolutionItem::new(
            CaseType::Bill,
            10,
            "",
            PartialDate::new(3, 1),
            Outcome::Withdrawn,
        );
        let opinion = ResolutionItem::new(
            CaseType::OpinionBill,
            1,
            "",
            PartialDate::new(3, 1),
            Outcome::Adopted,
        );
        assert_eq!(bill.canonical_cmp(&opinion), Ordering::Less);
    }
}
