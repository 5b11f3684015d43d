//! Progress-callback trait for per-document crawl events.
//!
//! Inject an [`Arc<dyn CrawlProgressCallback>`] via
//! [`crate::config::CrawlConfigBuilder::progress_callback`] to receive events
//! as the crawl discovers and processes each council document. The CLI uses
//! it to drive an indicatif progress bar; a library caller could forward the
//! same events to a channel or a log sink.
//!
//! # Example
//!
//! ```rust
//! use giketsu::{CrawlConfig, CrawlProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     items: AtomicUsize,
//! }
//!
//! impl CrawlProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, _index: usize, _total: usize, item_count: usize) {
//!         self.items.fetch_add(item_count, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { items: AtomicUsize::new(0) });
//!
//! let config = CrawlConfig::builder()
//!     .progress_callback(counter as Arc<dyn CrawlProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the crawl as it discovers and processes documents.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. With `concurrency > 1` the per-document methods may
/// be called from different tasks, so shared state needs `Mutex` or atomics.
pub trait CrawlProgressCallback: Send + Sync {
    /// Called once discovery has finished and the document list is known.
    ///
    /// # Arguments
    /// * `year_pages`: year pages that were fetched successfully
    /// * `total_documents`: PDFs that will be processed
    fn on_crawl_start(&self, year_pages: usize, total_documents: usize) {
        let _ = (year_pages, total_documents);
    }

    /// Called just before a document is fetched.
    ///
    /// `index` is 1-based, in discovery order.
    fn on_document_start(&self, index: usize, total: usize, session_name: &str) {
        let _ = (index, total, session_name);
    }

    /// Called when a document was fetched and parsed.
    fn on_document_complete(&self, index: usize, total: usize, item_count: usize) {
        let _ = (index, total, item_count);
    }

    /// Called when a document could not be fetched or its text extracted.
    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every document has been attempted.
    fn on_crawl_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl CrawlProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CrawlConfig`].
pub type ProgressCallback = Arc<dyn CrawlProgressCallback>;
