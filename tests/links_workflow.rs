//! Integration tests for the link store: suggest → review → merge → build.

use giketsu::links::{build_link_map, merge_links, suggest_links, BuildReport};
use giketsu::{
    render_index, CaseType, GiketsuError, Outcome, PartialDate, ResolutionItem, Session,
    ThemeConfig,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn themes() -> ThemeConfig {
    serde_json::from_value(serde_json::json!({
        "themes": [
            { "id": "finance", "keywords": ["予算", "補正", "会計"], "threshold": 2 },
            { "id": "health", "keywords": ["医療", "健康", "国民健康保険"], "threshold": 1,
              "score1Allowlist": ["医療", "国民健康保険"], "weakKeywords": ["健康"] }
        ],
        "priority": ["finance", "health"]
    }))
    .unwrap()
}

fn session(year: i32, era: &str, titles: &[(u32, &str)]) -> Session {
    Session {
        pdf_url: format!("https://example.jp/{era}.pdf"),
        year,
        era_label: era.to_string(),
        session_label: "定例第1回".to_string(),
        session_name: format!("{era}定例第1回"),
        session_range: "3月3日～3月19日".to_string(),
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

struct Workspace {
    _dir: TempDir,
    index: PathBuf,
    master: PathBuf,
    suggested: PathBuf,
    map: PathBuf,
}

fn workspace(master: &str) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();

    let sessions = vec![
        session(
            2025,
            "令和7年",
            &[
                (1, "令和7年度新得町一般会計補正予算（第1号）"),
                (2, "地域医療の確保を求める意見書"),
                (3, "新得町健康づくり推進条例"),
                (4, ""),
            ],
        ),
        session(2024, "令和6年", &[(1, "令和6年度新得町一般会計予算")]),
    ];
    let index = root.join("public/data/giketsu_index.json");
    fs::create_dir_all(index.parent().unwrap()).unwrap();
    fs::write(&index, render_index(&sessions).unwrap()).unwrap();

    let master_path = root.join("data/gikai_links.csv");
    fs::create_dir_all(master_path.parent().unwrap()).unwrap();
    fs::write(&master_path, master).unwrap();

    Workspace {
        index,
        master: master_path,
        suggested: root.join("data/gikai_links_suggested.csv"),
        map: root.join("public/data/gikai_links.json"),
        _dir: dir,
    }
}

fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('#') && !l.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Workflow ─────────────────────────────────────────────────────────────────

#[test]
fn suggest_merge_build_round() {
    let ws = workspace("caseType,eraLabel,num,ref\n議案,令和7年,2,theme:health\n");

    let report = suggest_links(&ws.index, &ws.master, &ws.suggested, &themes()).unwrap();
    assert_eq!(report.adopted, 2);
    assert_eq!(report.skipped_existing, 1);
    assert_eq!(report.empty_titles, 1);
    assert_eq!(report.allowlist_excluded, 1);
    assert_eq!(report.weak_excluded, 1);
    assert_eq!(report.weak_keyword_counts.get("健康"), Some(&1));

    assert_eq!(
        data_lines(&ws.suggested),
        vec![
            "caseType,eraLabel,num,ref",
            "議案,令和6年,1,theme:finance  # score:2 matched:[予算/会計]",
            "議案,令和7年,1,theme:finance  # score:3 matched:[予算/補正/会計]",
        ]
    );

    let merged = merge_links(&ws.master, &ws.suggested).unwrap();
    assert_eq!((merged.appended, merged.skipped, merged.invalid), (2, 0, 0));
    assert_eq!(
        fs::read_to_string(&ws.master).unwrap(),
        "caseType,eraLabel,num,ref\n\
         議案,令和7年,2,theme:health\n\
         議案,令和6年,1,theme:finance\n\
         議案,令和7年,1,theme:finance\n"
    );

    let built = build_link_map(&ws.master, &ws.map).unwrap();
    assert_eq!(built, BuildReport { keys: 3, refs: 3 });
    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&ws.map).unwrap()).unwrap();
    assert_eq!(map["令和7年-議案-1"], serde_json::json!(["theme:finance"]));
    assert_eq!(map["令和7年-議案-2"], serde_json::json!(["theme:health"]));

    // Everything is in the master now, so a fresh suggest run is empty.
    let again = suggest_links(&ws.index, &ws.master, &ws.suggested, &themes()).unwrap();
    assert_eq!(again.adopted, 0);
    assert_eq!(again.skipped_existing, 3);
    assert_eq!(data_lines(&ws.suggested), vec!["caseType,eraLabel,num,ref"]);
}

#[test]
fn merging_twice_appends_nothing_the_second_time() {
    let ws = workspace("caseType,eraLabel,num,ref\n");
    suggest_links(&ws.index, &ws.master, &ws.suggested, &themes()).unwrap();

    let first = merge_links(&ws.master, &ws.suggested).unwrap();
    assert_eq!(first.appended, 3);
    let after_first = fs::read_to_string(&ws.master).unwrap();

    let second = merge_links(&ws.master, &ws.suggested).unwrap();
    assert_eq!((second.appended, second.skipped), (0, 3));
    assert_eq!(fs::read_to_string(&ws.master).unwrap(), after_first);
}

#[test]
fn suggest_works_without_a_master() {
    let ws = workspace("");
    fs::remove_file(&ws.master).unwrap();

    let report = suggest_links(&ws.index, &ws.master, &ws.suggested, &themes()).unwrap();
    assert_eq!(report.adopted, 3);
    assert_eq!(report.per_theme["health"].score1, 1);
    assert!(!ws.master.exists());
}

#[test]
fn build_refuses_a_malformed_master() {
    let ws = workspace(
        "caseType,eraLabel,num,ref\n\
         議案,令和7年,1,theme:finance\n\
         # reviewed 2025-04\n\
         議案,令和7年,2,topic:health\n",
    );

    let err = build_link_map(&ws.master, &ws.map).unwrap_err();
    match err {
        GiketsuError::InvalidLinkRow { line, .. } => assert_eq!(line, 4),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ws.map.exists());
}

#[test]
fn build_refuses_a_row_without_ref() {
    let ws = workspace("caseType,eraLabel,num,ref\n議案,令和7年,1\n議案,令和7年,2,theme:health\n");

    let err = build_link_map(&ws.master, &ws.map).unwrap_err();
    match err {
        GiketsuError::InvalidLinkRow { line, detail, .. } => {
            assert_eq!(line, 2);
            assert!(detail.contains("expected at least 4 columns, found 3"), "{detail}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ws.map.exists());
}

#[test]
fn merge_requires_a_master() {
    let ws = workspace("");
    fs::remove_file(&ws.master).unwrap();
    suggest_links(&ws.index, &ws.master, &ws.suggested, &themes()).unwrap();

    let err = merge_links(&ws.master, &ws.suggested).unwrap_err();
    assert!(matches!(err, GiketsuError::MasterNotFound { .. }));
}
