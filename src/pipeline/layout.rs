//! Line-shape heuristics for the 議決結果 document family.
//!
//! The PDFs carry no machine-readable structure. What the pipeline knows
//! about the layout is captured in the [`LayoutRules`] trait: which lines are
//! result rows, which lines are boilerplate, and where a wrapped title ends.
//! Segmentation, title reconstruction and assembly only talk to the trait,
//! so tuning a keyword list or supporting another town's layout means
//! writing a new implementation rather than editing the state machine.

use crate::output::{CaseType, Outcome, PartialDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// One parsed result row: `議案第3号 3月14日 原案可決`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLine {
    pub case_type: CaseType,
    pub num: u32,
    pub decision_date: PartialDate,
    pub outcome: Outcome,
}

/// Layout knowledge consumed by the segmenter, reconstructor and assembler.
///
/// Implementations must be pure: the same line always classifies the same
/// way. They are shared across concurrently processed documents, hence
/// `Send + Sync`.
pub trait LayoutRules: Send + Sync {
    /// Parse a result row. `None` unless the case id, the date and the
    /// outcome keyword all appear on this one line.
    fn parse_result_line(&self, line: &str) -> Option<ResultLine>;

    /// `false` for structural noise (headers, banners, signatures, recess
    /// periods) that must never be absorbed into a title.
    fn is_title_candidate(&self, line: &str) -> bool;

    /// Whether an accumulated title buffer ends at a title boundary.
    fn is_title_complete(&self, buffer: &str) -> bool;

    /// Buffer length (in characters) past which a title is force-emitted.
    fn max_title_chars(&self) -> usize {
        120
    }

    /// Opening–closing range of the session, if the document states it.
    fn session_range(&self, lines: &[String], half_width_text: &str) -> Option<String>;
}

/// Rules for the Shintoku town council resolution reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLayout;

static RE_CASE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(議案|意見案)\s*第\s*([0-9]+)\s*号").unwrap());

static RE_PARTIAL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{1,2})\s*月\s*([0-9]{1,2})\s*日").unwrap());

static RE_NOISE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // 「件 名」 column header on its own
        r"^件\s*名$",
        // 「議案番号 議決月日 議決結果 ...」
        r"^議案番号\s",
        // session summary 「定例第1回 3月3日 3月19日 ...」
        r"^(定例|臨時)第[0-9]+回\s+[0-9]+月[0-9]+日",
        // document serial 「新 議 号」
        r"^新\s+議\s+号",
        // spaced-out banner date 「令和 7 年 3 月 ...」
        r"^令和\s+[0-9]+\s+年",
        // addressee and sender
        r"^新\s+得\s+町\s+長",
        r"^新得町議会議長\s",
        // report title
        r"新得町議会議決結果報告",
        // recess period 「3月4日 ～ 3月12日」
        r"^[0-9]+月[0-9]+日\s*[～~]",
        // period headers
        r"^(招集月日|開会月日|閉会月日|会議日数|休会月日)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RE_TITLE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(について|予算|件|）|\)|意見書|こと|ため|同意|よる|など|承認|承諾|条例)$").unwrap()
});

static RE_SESSION_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(定例|臨時)第[0-9]+回\s+([0-9]+月[0-9]+日)\s+([0-9]+月[0-9]+日)").unwrap()
});

static RE_SESSION_PERIOD: Lazy<Regex> = Lazy::new(|| Regex::new(r"会\s*期\s+([^\n]+)").unwrap());

impl LayoutRules for DefaultLayout {
    fn parse_result_line(&self, line: &str) -> Option<ResultLine> {
        let case = RE_CASE_ID.captures(line)?;
        let date = RE_PARTIAL_DATE.captures(line)?;
        let outcome = Outcome::find_in(line)?;

        Some(ResultLine {
            case_type: CaseType::from_label(&case[1])?,
            num: case[2].parse().ok().filter(|n| *n > 0)?,
            decision_date: PartialDate::new(date[1].parse().ok()?, date[2].parse().ok()?),
            outcome,
        })
    }

    fn is_title_candidate(&self, line: &str) -> bool {
        !RE_NOISE.iter().any(|re| re.is_match(line))
    }

    fn is_title_complete(&self, buffer: &str) -> bool {
        RE_TITLE_END.is_match(buffer)
    }

    fn session_range(&self, lines: &[String], half_width_text: &str) -> Option<String> {
        if let Some(caps) = lines.iter().find_map(|l| RE_SESSION_SUMMARY.captures(l)) {
            return Some(format!("{}～{}", &caps[2], &caps[3]));
        }
        RE_SESSION_PERIOD
            .captures(half_width_text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_line_needs_all_three_parts() {
        let rules = DefaultLayout;
        let parsed = rules
            .parse_result_line("議案第 12 号 3月 19日 修正可決")
            .expect("full result line");
        assert_eq!(parsed.case_type, CaseType::Bill);
        assert_eq!(parsed.num, 12);
        assert_eq!(parsed.decision_date, PartialDate::new(3, 19));
        assert_eq!(parsed.outcome, Outcome::ApprovedWithAmendment);

        assert!(rules.parse_result_line("議案第12号 3月19日").is_none());
        assert!(rules.parse_result_line("議案第12号 原案可決").is_none());
        assert!(rules.parse_result_line("3月19日 原案可決").is_none());
    }

    #[test]
    fn case_number_zero_is_not_a_result() {
        assert!(DefaultLayout
            .parse_result_line("議案第0号 3月19日 原案可決")
            .is_none());
    }

    #[test]
    fn opinion_bill_result_line() {
        let parsed = DefaultLayout
            .parse_result_line("意見案第2号 6月20日 採択")
            .unwrap();
        assert_eq!(parsed.case_type, CaseType::OpinionBill);
        assert_eq!(parsed.outcome, Outcome::Adopted);
    }

    #[test]
    fn boilerplate_is_not_a_title() {
        let rules = DefaultLayout;
        for line in [
            "件 名",
            "件名",
            "議案番号 議決月日 議決結果",
            "定例第1回 3月3日 3月19日 17日間",
            "新 議 号",
            "令和 7 年 3 月 19 日",
            "新 得 町 長 様",
            "新得町議会議長 佐藤 太郎",
            "新得町議会議決結果報告書",
            "3月4日 ～ 3月12日",
            "招集月日 3月3日",
            "会議日数 17日間",
        ] {
            assert!(!rules.is_title_candidate(line), "{line} should be noise");
        }
        assert!(rules.is_title_candidate("新得町税条例の一部を改正する条例"));
        assert!(rules.is_title_candidate("令和7年度新得町一般会計予算"));
    }

    #[test]
    fn title_endings() {
        let rules = DefaultLayout;
        assert!(rules.is_title_complete("令和7年度新得町一般会計予算"));
        assert!(rules.is_title_complete("新得町過疎地域持続的発展計画の変更について"));
        assert!(rules.is_title_complete("財政制度の充実を求める意見書"));
        assert!(rules.is_title_complete("新得町手数料条例の一部を改正する条例"));
        assert!(rules.is_title_complete("専決処分の承認を求めることについて（第1号）"));
        assert!(!rules.is_title_complete("新得町農業振興に"));
    }

    #[test]
    fn session_range_from_summary_line() {
        let lines = vec![
            "新得町議会議決結果報告".to_string(),
            "定例第1回 3月3日 3月19日 17日間".to_string(),
        ];
        assert_eq!(
            DefaultLayout.session_range(&lines, ""),
            Some("3月3日～3月19日".to_string())
        );
    }

    #[test]
    fn session_range_falls_back_to_period_line() {
        let text = "令和7年臨時第1回\n会 期 1月24日 1日間\n";
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        assert_eq!(
            DefaultLayout.session_range(&lines, text),
            Some("1月24日 1日間".to_string())
        );
        assert_eq!(DefaultLayout.session_range(&[], "no period here"), None);
    }
}
