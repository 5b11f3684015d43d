//! Compile the master link store into the JSON lookup map.

use crate::error::GiketsuError;
use crate::links::table::read_table;
use crate::links::write_atomic;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// `"{eraLabel}-{caseType}-{num}"` → sorted refs.
pub type LinkMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub keys: usize,
    pub refs: usize,
}

/// Strictly validate every master row and assemble the map.
///
/// The first malformed row aborts with its line number.
pub fn compile_link_map(master_path: &Path) -> Result<LinkMap, GiketsuError> {
    if !master_path.exists() {
        return Err(GiketsuError::MasterNotFound {
            path: master_path.to_path_buf(),
        });
    }

    let mut map = LinkMap::new();
    let (_, Some(table)) = read_table(master_path)? else {
        return Ok(map);
    };

    for record in &table.records {
        let row = table
            .validate(record)
            .map_err(|detail| GiketsuError::InvalidLinkRow {
                path: master_path.to_path_buf(),
                line: record.line,
                detail,
            })?;
        map.entry(row.map_key()).or_default().insert(row.reference);
    }

    Ok(map)
}

/// Build `output_path` from `master_path`. Nothing is written on error.
pub fn build_link_map(master_path: &Path, output_path: &Path) -> Result<BuildReport, GiketsuError> {
    let map = compile_link_map(master_path)?;

    let mut json = serde_json::to_string_pretty(&map)
        .map_err(|e| GiketsuError::Internal(format!("JSON serialisation failed: {e}")))?;
    json.push('\n');
    write_atomic(output_path, json.as_bytes())?;

    let report = BuildReport {
        keys: map.len(),
        refs: map.values().map(BTreeSet::len).sum(),
    };
    info!(
        "{}: {} keys, {} refs",
        output_path.display(),
        report.keys,
        report.refs
    );
    Ok(report)
}
