//! Eager crawl entry points: discover every session, parse every document,
//! then return the sorted session index.
//!
//! Use [`crate::stream::crawl_stream`] instead to receive sessions one by one
//! as their documents finish.

use crate::config::CrawlConfig;
use crate::error::{DocumentError, GiketsuError};
use crate::output::{CrawlOutput, CrawlStats, ParsedDocument, Session};
use crate::pipeline::locate::{self, DocumentEntry};
use crate::pipeline::{acquire, assemble, parse_text};
use futures::stream::{self, Stream, StreamExt};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Crawl the document index and parse every resolution PDF it links to.
///
/// # Returns
/// `Ok(CrawlOutput)` even if some documents failed; see
/// `output.failures` and `output.stats.documents_failed`.
///
/// # Errors
/// Only for fatal problems: an unreachable index page or an HTTP client
/// that cannot be built.
pub async fn crawl(config: &CrawlConfig) -> Result<CrawlOutput, GiketsuError> {
    let total_start = Instant::now();
    let client = config.http_client()?;

    // ── Step 1: Discover documents ───────────────────────────────────────
    let discovery = locate::discover(&client, config).await?;
    let total = discovery.entries.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_crawl_start(discovery.year_pages, total);
    }

    // ── Step 2: Fetch and parse, in discovery order ──────────────────────
    let results: Vec<Result<Session, DocumentError>> =
        document_stream(client, discovery.entries, config.clone())
            .collect()
            .await;

    let mut sessions = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(session) => sessions.push(session),
            Err(e) => failures.push(e),
        }
    }

    // ── Step 3: Order and cross-session dedup ────────────────────────────
    assemble::sort_sessions(&mut sessions);
    let duplicate_items_dropped = assemble::dedup_across_sessions(&mut sessions);

    let items = sessions.iter().flat_map(|s| &s.items);
    let stats = CrawlStats {
        year_pages: discovery.year_pages,
        year_pages_failed: discovery.year_pages_failed,
        documents_found: total,
        documents_succeeded: sessions.len(),
        documents_failed: failures.len(),
        total_items: items.clone().count(),
        empty_titles: items.filter(|i| i.title.is_empty()).count(),
        duplicate_items_dropped,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Crawl complete: {}/{} documents, {} items ({} without title), {}ms",
        stats.documents_succeeded,
        stats.documents_found,
        stats.total_items,
        stats.empty_titles,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_crawl_complete(total, stats.documents_succeeded);
    }

    Ok(CrawlOutput {
        sessions,
        stats,
        failures,
    })
}

/// Crawl and write the session index JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated index behind.
pub async fn crawl_to_file(
    output_path: impl AsRef<Path>,
    config: &CrawlConfig,
) -> Result<CrawlOutput, GiketsuError> {
    let output = crawl(config).await?;
    let path = output_path.as_ref();
    let json = render_index(&output.sessions)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| GiketsuError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| GiketsuError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| GiketsuError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output)
}

/// Synchronous wrapper around [`crawl`].
///
/// Creates a temporary tokio runtime internally.
pub fn crawl_sync(config: &CrawlConfig) -> Result<CrawlOutput, GiketsuError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GiketsuError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(crawl(config))
}

/// Session index as written to disk: pretty JSON with a trailing newline.
pub fn render_index(sessions: &[Session]) -> Result<String, GiketsuError> {
    let mut json = serde_json::to_string_pretty(sessions)
        .map_err(|e| GiketsuError::Internal(format!("JSON serialisation failed: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Parse a single resolution PDF from a local path or URL.
///
/// Useful for checking how a new document layout comes out before it is
/// part of a crawl.
pub async fn extract(
    input: impl AsRef<str>,
    config: &CrawlConfig,
) -> Result<ParsedDocument, GiketsuError> {
    let input = input.as_ref();
    info!("Extracting: {}", input);
    let client = config.http_client()?;
    let bytes = acquire::load_pdf(&client, input, config.pdf_timeout_secs).await?;
    parse_bytes(bytes, input, config).await
}

/// Parse resolution PDF bytes already in memory.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &CrawlConfig,
) -> Result<ParsedDocument, GiketsuError> {
    acquire::check_magic(bytes, "<memory>")?;
    parse_bytes(bytes.to_vec(), "<memory>", config).await
}

async fn parse_bytes(
    bytes: Vec<u8>,
    source_name: &str,
    config: &CrawlConfig,
) -> Result<ParsedDocument, GiketsuError> {
    let text = acquire::extract_text(bytes, source_name).await?;
    Ok(parse_text(&text, config.layout.as_ref()))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn fetch_session(
    client: &reqwest::Client,
    entry: &DocumentEntry,
    config: &CrawlConfig,
) -> Result<Session, GiketsuError> {
    let bytes = acquire::load_pdf(client, &entry.url, config.pdf_timeout_secs).await?;
    let parsed = parse_bytes(bytes, &entry.url, config).await?;

    Ok(Session {
        pdf_url: entry.url.clone(),
        year: entry.year,
        era_label: entry.era_label.clone(),
        session_label: entry.session_label.clone(),
        session_name: entry.session_name(),
        session_range: parsed.session_range,
        items: parsed.items,
    })
}

/// Fetch and parse `entries` with at most `config.concurrency` documents in
/// flight, yielding results in discovery order.
pub(crate) fn document_stream(
    client: reqwest::Client,
    entries: Vec<DocumentEntry>,
    config: CrawlConfig,
) -> impl Stream<Item = Result<Session, DocumentError>> + Send + 'static {
    let total = entries.len();
    let concurrency = config.concurrency.max(1);

    stream::iter(entries.into_iter().enumerate().map(move |(i, entry)| {
        let client = client.clone();
        let config = config.clone();
        async move {
            let index = i + 1;
            let name = entry.session_name();
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_start(index, total, &name);
            }
            info!("[fetch] {} {}", name, entry.url);

            let result = fetch_session(&client, &entry, &config)
                .await
                .map_err(|e| DocumentError::from_pipeline(&name, &entry.url, e));

            match &result {
                Ok(session) => {
                    info!("{}: {} items extracted", name, session.items.len());
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_document_complete(index, total, session.items.len());
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_document_error(index, total, &e.to_string());
                    }
                }
            }
            result
        }
    }))
    .buffered(concurrency)
}
