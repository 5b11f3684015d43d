//! # giketsu
//!
//! Extract council resolution records (新得町議会 議決結果) from fixed-layout
//! PDFs and tag them with recurring policy themes.
//!
//! The PDFs are tables flattened to text: every result row of a block
//! (`議案第3号 3月19日 原案可決`) comes first, the titles follow in the same
//! order, and long titles wrap across lines with no marker. This crate
//! recovers the pairing from line order and line shape alone.
//!
//! ## Pipeline Overview
//!
//! ```text
//! index page
//!  │
//!  ├─ 1. Locate     year pages → one PDF link per session
//!  ├─ 2. Acquire    download (timeout, no retry) + pdf-extract (spawn_blocking)
//!  ├─ 3. Normalize  full-width → half-width, whitespace collapse
//!  ├─ 4. Segment    result/title block state machine
//!  ├─ 5. Titles     rejoin wrapped titles
//!  └─ 6. Assemble   positional pairing, canonical order, duplicate policy
//!
//! session index ──▶ classify ──▶ links: suggest → review → merge → build
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use giketsu::{crawl_to_file, CrawlConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlConfig::default();
//!     let output = crawl_to_file("public/data/giketsu_index.json", &config).await?;
//!     eprintln!(
//!         "{} sessions, {} items, {} failed documents",
//!         output.sessions.len(),
//!         output.stats.total_items,
//!         output.stats.documents_failed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `giketsu` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! giketsu = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod classify;
pub mod config;
pub mod crawl;
pub mod error;
pub mod links;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod themes;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use classify::{classify, Classification, ThemeMatch};
pub use config::{CrawlConfig, CrawlConfigBuilder};
pub use crawl::{crawl, crawl_sync, crawl_to_file, extract, extract_from_bytes, render_index};
pub use error::{DocumentError, GiketsuError};
pub use output::{
    CaseType, CrawlOutput, CrawlStats, Outcome, ParsedDocument, PartialDate, ResolutionItem,
    Session,
};
pub use pipeline::layout::{DefaultLayout, LayoutRules};
pub use pipeline::parse_text;
pub use progress::{CrawlProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{crawl_stream, SessionStream};
pub use themes::{ThemeConfig, ThemeRule};
