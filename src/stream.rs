//! Streaming crawl API: emit sessions as their documents finish.
//!
//! Unlike the eager [`crate::crawl::crawl`], which returns only once every
//! document has been attempted and then sorts the index, [`crawl_stream`]
//! yields each session as soon as it is parsed. Sessions arrive in
//! discovery order; presentation ordering and the cross-session duplicate
//! pass are left to the caller ([`crate::pipeline::assemble::sort_sessions`],
//! [`crate::pipeline::assemble::dedup_across_sessions`]).

use crate::config::CrawlConfig;
use crate::crawl::document_stream;
use crate::error::{DocumentError, GiketsuError};
use crate::output::Session;
use crate::pipeline::locate;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document results.
pub type SessionStream = Pin<Box<dyn Stream<Item = Result<Session, DocumentError>> + Send>>;

/// Discover every document, then stream sessions as they are parsed.
///
/// # Returns
/// - `Ok(SessionStream)`: one `Result<Session, DocumentError>` per document
/// - `Err(GiketsuError)`: discovery failed (index unreachable, client error)
///
/// # Example
/// ```rust,no_run
/// use giketsu::{crawl_stream, CrawlConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut sessions = crawl_stream(&CrawlConfig::default()).await?;
/// while let Some(result) = sessions.next().await {
///     match result {
///         Ok(s) => println!("{}: {} items", s.session_name, s.items.len()),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl_stream(config: &CrawlConfig) -> Result<SessionStream, GiketsuError> {
    let client = config.http_client()?;
    let discovery = locate::discover(&client, config).await?;
    info!(
        "Streaming {} documents from {} year pages",
        discovery.entries.len(),
        discovery.year_pages
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_crawl_start(discovery.year_pages, discovery.entries.len());
    }

    Ok(Box::pin(document_stream(
        client,
        discovery.entries,
        config.clone(),
    )))
}
