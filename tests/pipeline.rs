//! Integration tests for the text → records pipeline.
//!
//! Fixtures are the text `pdf-extract` produces for 議決結果 PDFs, page
//! breaks included; no network or PDF parsing is involved.

use giketsu::pipeline::assemble::{dedup_across_sessions, sort_sessions};
use giketsu::{parse_text, render_index, CaseType, DefaultLayout, Outcome, Session};
use std::collections::HashSet;

/// Two pages. Page 2 repeats the page banner and reprints 議案第11号.
const TWO_PAGE_SESSION: &str = "\
新得町議会議決結果報告
定例第２回　６月１０日　６月１２日　３日間
議案番号　議決月日　議決結果
件　名
議案第１０号　６月１０日　原案可決
議案第１１号　６月１２日　修正可決
新得町農業振興に
関する条例の一部を改正する条例
令和７年度新得町一般会計補正予算（第２号）
新得町議会議決結果報告
議案番号　議決月日　議決結果
件　名
議案第１１号　６月１２日　原案可決
意見案第２号　６月１２日　否決
重複して印字された件名について
国民健康保険制度の見直しを求める意見書
";

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("giketsu=debug")
        .try_init();
}

fn session(year: i32, era: &str, label: &str, text: &str) -> Session {
    let parsed = parse_text(text, &DefaultLayout);
    Session {
        pdf_url: format!("https://example.jp/{era}/{label}.pdf"),
        year,
        era_label: era.to_string(),
        session_label: label.to_string(),
        session_name: format!("{era}{label}"),
        session_range: parsed.session_range,
        items: parsed.items,
    }
}

#[test]
fn wrapped_titles_and_reprinted_rows() {
    init_logging();
    let doc = parse_text(TWO_PAGE_SESSION, &DefaultLayout);
    assert_eq!(doc.session_range, "6月10日～6月12日");

    let numbers: Vec<&str> = doc.items.iter().map(|i| i.case_number.as_str()).collect();
    assert_eq!(numbers, vec!["議案第10号", "議案第11号", "意見案第2号"]);

    assert_eq!(
        doc.items[0].title,
        "新得町農業振興に関する条例の一部を改正する条例"
    );
    // The first occurrence of 議案第11号 wins over the reprint.
    assert_eq!(doc.items[1].title, "令和7年度新得町一般会計補正予算（第2号）");
    assert_eq!(doc.items[1].result, Outcome::ApprovedWithAmendment);

    assert_eq!(doc.items[2].case_type, CaseType::OpinionBill);
    assert_eq!(doc.items[2].result, Outcome::Rejected);
    assert_eq!(doc.items[2].title, "国民健康保険制度の見直しを求める意見書");
}

#[test]
fn missing_titles_leave_items_untitled() {
    let text = "\
議案第１号　１月２４日　原案可決
議案第２号　１月２４日　原案可決
新得町固定資産評価審査委員会委員の選任について
";
    let doc = parse_text(text, &DefaultLayout);
    assert_eq!(doc.items.len(), 2);
    assert_eq!(doc.items[0].title, "新得町固定資産評価審査委員会委員の選任について");
    assert_eq!(doc.items[1].title, "");
    assert_eq!(doc.session_range, "");
}

#[test]
fn index_json_is_byte_identical_across_runs() {
    let render = || {
        let mut sessions = vec![
            session(2024, "令和6年", "定例第2回", TWO_PAGE_SESSION),
            session(2025, "令和7年", "定例第2回", TWO_PAGE_SESSION),
        ];
        sort_sessions(&mut sessions);
        dedup_across_sessions(&mut sessions);
        render_index(&sessions).unwrap()
    };
    assert_eq!(render(), render());
}

#[test]
fn natural_keys_unique_across_the_index() {
    init_logging();
    let mut sessions = vec![
        session(2025, "令和7年", "定例第10回", TWO_PAGE_SESSION),
        session(2025, "令和7年", "定例第2回", TWO_PAGE_SESSION),
        session(2024, "令和6年", "定例第2回", TWO_PAGE_SESSION),
    ];
    sort_sessions(&mut sessions);

    let labels: Vec<&str> = sessions.iter().map(|s| s.session_name.as_str()).collect();
    assert_eq!(
        labels,
        vec!["令和7年定例第2回", "令和7年定例第10回", "令和6年定例第2回"]
    );

    let dropped = dedup_across_sessions(&mut sessions);
    assert_eq!(dropped, 3);
    assert!(sessions[1].items.is_empty());
    assert_eq!(sessions[0].items.len(), 3);
    assert_eq!(sessions[2].items.len(), 3);

    let mut seen = HashSet::new();
    for s in &sessions {
        for item in &s.items {
            assert!(
                seen.insert((s.era_label.clone(), item.case_type, item.num)),
                "duplicate key {} {}",
                s.era_label,
                item.case_number
            );
        }
    }
}
