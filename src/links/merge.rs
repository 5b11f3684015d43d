//! Append reviewed suggestions to the master link store.
//!
//! Existing master text is never rewritten: new rows are appended after it,
//! sorted, with a newline inserted first if the file lacked a trailing one.

use crate::error::GiketsuError;
use crate::links::table::{encode_rows, read_table, LinkRow};
use crate::links::write_atomic;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Counts printed after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub appended: usize,
    /// Rows already in the master (or repeated within the suggestion file).
    pub skipped: usize,
    /// Malformed suggestion rows, warned and ignored.
    pub invalid: usize,
}

/// Merge `suggested_path` into `master_path`.
pub fn merge_links(master_path: &Path, suggested_path: &Path) -> Result<MergeReport, GiketsuError> {
    if !master_path.exists() {
        return Err(GiketsuError::MasterNotFound {
            path: master_path.to_path_buf(),
        });
    }
    if !suggested_path.exists() {
        return Err(GiketsuError::FileNotFound {
            path: suggested_path.to_path_buf(),
        });
    }

    let (master_text, master_table) = read_table(master_path)?;
    let Some(master_table) = master_table else {
        return Err(GiketsuError::InvalidCsvHeader {
            path: master_path.to_path_buf(),
            line: 1,
            found: "<no header line>".into(),
        });
    };

    let mut known: HashSet<LinkRow> = master_table
        .lenient_rows(master_path)
        .0
        .into_iter()
        .collect();

    let mut report = MergeReport::default();
    let mut to_append = Vec::new();

    if let (_, Some(suggested)) = read_table(suggested_path)? {
        let (rows, invalid) = suggested.lenient_rows(suggested_path);
        report.invalid = invalid;
        for row in rows {
            if known.insert(row.clone()) {
                to_append.push(row);
            } else {
                report.skipped += 1;
            }
        }
    }

    report.appended = to_append.len();
    if to_append.is_empty() {
        info!("Nothing new to merge into {}", master_path.display());
        return Ok(report);
    }

    to_append.sort_by(LinkRow::file_order);
    let appended = encode_rows(to_append.iter().map(|r| (r, None)), false)?;

    let mut text = master_text;
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&appended);
    write_atomic(master_path, text.as_bytes())?;

    info!(
        "Appended {} row(s) to {}",
        report.appended,
        master_path.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_master_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let suggested = dir.path().join("suggested.csv");
        std::fs::write(&suggested, "caseType,eraLabel,num,ref\n").unwrap();

        let err = merge_links(&dir.path().join("master.csv"), &suggested).unwrap_err();
        assert!(matches!(err, GiketsuError::MasterNotFound { .. }));
    }

    #[test]
    fn appends_after_missing_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.csv");
        let suggested = dir.path().join("suggested.csv");
        std::fs::write(&master, "caseType,eraLabel,num,ref\n議案,令和7年,1,issue:tuktuk").unwrap();
        std::fs::write(
            &suggested,
            "# header comment\ncaseType,eraLabel,num,ref\n\
             議案,令和7年,3,theme:finance  # score:2 matched:[予算/補正]\n\
             議案,令和7年,1,issue:tuktuk\n\
             議案,令和7年,2,theme:health\n\
             議案,令和7年,2,theme:health\n\
             議案,令和7年,x,theme:health\n",
        )
        .unwrap();

        let report = merge_links(&master, &suggested).unwrap();
        assert_eq!(
            report,
            MergeReport {
                appended: 2,
                skipped: 2,
                invalid: 1
            }
        );
        assert_eq!(
            std::fs::read_to_string(&master).unwrap(),
            "caseType,eraLabel,num,ref\n議案,令和7年,1,issue:tuktuk\n\
             議案,令和7年,2,theme:health\n議案,令和7年,3,theme:finance\n"
        );
    }
}
