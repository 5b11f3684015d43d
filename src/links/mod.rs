//! Theme-link store: suggest → human review → merge → build.
//!
//! ```text
//! giketsu_index.json ──suggest──▶ gikai_links_suggested.csv   (regenerated)
//!                                        │ reviewed by hand
//!                                        ▼
//!                                 ──merge──▶ gikai_links.csv  (append-only)
//!                                        │
//!                                 ──build──▶ gikai_links.json (lookup map)
//! ```
//!
//! Both CSV files share the header `caseType,eraLabel,num,ref`. The master
//! file is the only one a human edits; merge never rewrites text already in
//! it, and build refuses to emit anything while a single row is malformed.

pub mod build;
pub mod merge;
pub mod suggest;
pub mod table;

pub use build::{build_link_map, BuildReport};
pub use merge::{merge_links, MergeReport};
pub use suggest::{suggest_links, SuggestReport};
pub use table::{LinkRow, LINK_HEADER};

use crate::error::GiketsuError;
use std::io::Write;
use std::path::Path;

/// Write `bytes` to `path` through a temp file in the same directory, so a
/// reader never sees a half-written file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), GiketsuError> {
    let write_err = |source| GiketsuError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
