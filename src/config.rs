//! Configuration for crawling the council-resolution document index.
//!
//! All crawl behaviour is controlled through [`CrawlConfig`], built via its
//! [`CrawlConfigBuilder`]. Callers set only what they care about and rely on
//! the documented defaults for the rest.

use crate::error::GiketsuError;
use crate::pipeline::layout::{DefaultLayout, LayoutRules};
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Index page listing one link per year (`…/giketsu/r7/`, `…/giketsu/h30/`).
pub const DEFAULT_INDEX_URL: &str = "https://www.shintoku-town.jp/gyousei/gikai/giketsu/";

/// Configuration for a crawl.
///
/// Built via [`CrawlConfig::builder()`] or using [`CrawlConfig::default()`].
///
/// # Example
/// ```rust
/// use giketsu::CrawlConfig;
///
/// let config = CrawlConfig::builder()
///     .concurrency(2)
///     .pdf_timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CrawlConfig {
    /// Index page to start discovery from. Default: [`DEFAULT_INDEX_URL`].
    pub index_url: String,

    /// `User-Agent` header sent with every request. Default: `giketsu/<version>`.
    pub user_agent: String,

    /// Timeout for the index page and each year page, in seconds. Default: 30.
    pub index_timeout_secs: u64,

    /// Timeout for each PDF download, in seconds. Default: 120.
    ///
    /// Requests are never retried; a timed-out document is recorded as a
    /// failure and the crawl moves on.
    pub pdf_timeout_secs: u64,

    /// Documents fetched at once. Default: 1 (strictly sequential).
    ///
    /// Output order is discovery order whatever the value.
    pub concurrency: usize,

    /// Line-shape heuristics used to parse every document.
    pub layout: Arc<dyn LayoutRules>,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            user_agent: concat!("giketsu/", env!("CARGO_PKG_VERSION")).to_string(),
            index_timeout_secs: 30,
            pdf_timeout_secs: 120,
            concurrency: 1,
            layout: Arc::new(DefaultLayout),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlConfig")
            .field("index_url", &self.index_url)
            .field("user_agent", &self.user_agent)
            .field("index_timeout_secs", &self.index_timeout_secs)
            .field("pdf_timeout_secs", &self.pdf_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("layout", &"<dyn LayoutRules>")
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn CrawlProgressCallback>"),
            )
            .finish()
    }
}

impl CrawlConfig {
    /// Create a new builder for `CrawlConfig`.
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder {
            config: Self::default(),
        }
    }

    /// HTTP client carrying the configured user agent.
    ///
    /// Timeouts are set per request since index pages and PDFs differ.
    pub fn http_client(&self) -> Result<reqwest::Client, GiketsuError> {
        reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| GiketsuError::Internal(format!("Failed to build HTTP client: {e}")))
    }
}

/// Builder for [`CrawlConfig`].
#[derive(Debug)]
pub struct CrawlConfigBuilder {
    config: CrawlConfig,
}

impl CrawlConfigBuilder {
    pub fn index_url(mut self, url: impl Into<String>) -> Self {
        self.config.index_url = url.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn index_timeout_secs(mut self, secs: u64) -> Self {
        self.config.index_timeout_secs = secs;
        self
    }

    pub fn pdf_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pdf_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn layout(mut self, rules: Arc<dyn LayoutRules>) -> Self {
        self.config.layout = rules;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CrawlConfig, GiketsuError> {
        let c = &self.config;

        let url = reqwest::Url::parse(&c.index_url).map_err(|e| {
            GiketsuError::InvalidConfig(format!("index URL '{}' is invalid: {e}", c.index_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GiketsuError::InvalidConfig(format!(
                "index URL must be http(s), got '{}'",
                c.index_url
            )));
        }
        if c.concurrency == 0 {
            return Err(GiketsuError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.index_timeout_secs == 0 || c.pdf_timeout_secs == 0 {
            return Err(GiketsuError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(GiketsuError::InvalidConfig("User agent must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = CrawlConfig::default();
        assert_eq!(c.index_url, DEFAULT_INDEX_URL);
        assert_eq!(c.index_timeout_secs, 30);
        assert_eq!(c.pdf_timeout_secs, 120);
        assert_eq!(c.concurrency, 1);
        assert!(c.user_agent.starts_with("giketsu/"));
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let c = CrawlConfig::builder()
            .index_url("http://localhost:8080/giketsu/")
            .concurrency(4)
            .pdf_timeout_secs(10)
            .build()
            .unwrap();
        assert_eq!(c.index_url, "http://localhost:8080/giketsu/");
        assert_eq!(c.concurrency, 4);
        assert_eq!(c.pdf_timeout_secs, 10);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(CrawlConfig::builder().concurrency(0).build().is_err());
        assert!(CrawlConfig::builder().index_timeout_secs(0).build().is_err());
        assert!(CrawlConfig::builder().index_url("not a url").build().is_err());
        assert!(CrawlConfig::builder()
            .index_url("ftp://example.jp/giketsu/")
            .build()
            .is_err());
        assert!(CrawlConfig::builder().user_agent(" ").build().is_err());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let s = format!("{:?}", CrawlConfig::default());
        assert!(s.contains("<dyn LayoutRules>"));
    }
}
