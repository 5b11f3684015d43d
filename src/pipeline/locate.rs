//! Document discovery: index page → year pages → one PDF link per session.
//!
//! The index lists one link per year, ending in `/r{n}/` (令和) or `/h{n}/`
//! (平成). Each year page links the resolution PDFs; the session a PDF
//! belongs to is read from the link text or the text of the list item /
//! table cell around it.
//!
//! The pages are small, server-rendered and regular, so anchors are pulled
//! out with regexes instead of a DOM. The enclosing element of a link is
//! found by replaying start/end tags on an open-element stack, with void
//! elements and implicitly closed siblings (`<li>`, `<p>`, …) accounted for.

use crate::config::CrawlConfig;
use crate::error::GiketsuError;
use crate::pipeline::normalize::to_half_width;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// One discovered resolution PDF and what its page says about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    pub url: String,
    pub era_label: String,
    pub year: i32,
    pub session_label: String,
}

impl DocumentEntry {
    /// `令和7年` + `定例第1回`.
    pub fn session_name(&self) -> String {
        format!("{}{}", self.era_label, self.session_label)
    }
}

/// Everything discovery produced, including partial failures.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub entries: Vec<DocumentEntry>,
    pub year_pages: usize,
    pub year_pages_failed: usize,
}

// ── Patterns ─────────────────────────────────────────────────────────────

static RE_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))[^>]*>(.*?)</a\s*>"#)
        .unwrap()
});

static RE_YEAR_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/giketsu/(r|h)[0-9]+/$").unwrap());

static RE_ERA_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(r|h)([0-9]+)/$").unwrap());

static RE_PDF_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());

static RE_ANY_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9]*)\b[^>]*?(/?)>").unwrap()
});

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static RE_SESSION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(定例|臨時)\s*第\s*([0-9]+)\s*回").unwrap());

static RE_RESULT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)議決結果.*$").unwrap());

// ── HTML scanning ────────────────────────────────────────────────────────

struct Anchor {
    href: String,
    text: String,
    start: usize,
    end: usize,
}

fn anchors(html: &str) -> Vec<Anchor> {
    RE_ANCHOR
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let href = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))?
                .as_str();
            Some(Anchor {
                href: decode_entities(href.trim()),
                text: html_text(caps.get(4).map_or("", |m| m.as_str())),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

const CONTEXT_TAGS: &[&str] = &["li", "tr", "td", "p", "div"];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Closed by the next start tag of the same name when no end tag was written.
const SIBLING_CLOSED_TAGS: &[&str] = &["li", "tr", "td", "th", "p", "dt", "dd", "option"];

struct OpenElement {
    name: String,
    content_start: usize,
}

/// Replay one tag on the open-element stack. Returns the smallest stack
/// length reached, so a caller can tell when an element was closed.
fn apply_tag(stack: &mut Vec<OpenElement>, caps: &Captures<'_>) -> usize {
    let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
        return stack.len(); // comment
    };
    let name = name.as_str().to_ascii_lowercase();

    if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
        if let Some(pos) = stack.iter().rposition(|e| e.name == name) {
            stack.truncate(pos);
        }
        return stack.len();
    }

    if stack
        .last()
        .is_some_and(|e| e.name == name && SIBLING_CLOSED_TAGS.contains(&name.as_str()))
    {
        stack.pop();
    }
    let low = stack.len();

    let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
    if !self_closing && !VOID_TAGS.contains(&name.as_str()) {
        stack.push(OpenElement {
            name,
            content_start: whole.end(),
        });
    }
    low
}

/// Text of the closest `li/tr/td/p/div` element enclosing the anchor.
fn context_text(html: &str, anchor: &Anchor) -> String {
    let mut stack = Vec::new();
    let mut tags = RE_ANY_TAG.captures_iter(html);

    for caps in tags.by_ref() {
        if caps.get(0).map_or(true, |m| m.start() >= anchor.start) {
            break;
        }
        apply_tag(&mut stack, &caps);
    }

    let Some(depth) = stack
        .iter()
        .rposition(|e| CONTEXT_TAGS.contains(&e.name.as_str()))
    else {
        return String::new();
    };
    let content_start = stack[depth].content_start;

    let mut stop = html.len();
    for caps in tags {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() < anchor.end {
            continue;
        }
        if apply_tag(&mut stack, &caps) <= depth {
            stop = whole.start();
            break;
        }
    }

    html_text(&html[content_start..stop])
}

fn html_text(fragment: &str) -> String {
    let stripped = RE_TAG.replace_all(fragment, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(String::from)
}

// ── Parsing ──────────────────────────────────────────────────────────────

/// Year-page links on the index page, absolute, deduplicated in page order.
pub fn year_page_urls(html: &str, page_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        warn!("Index URL '{}' does not parse; no year pages", page_url);
        return Vec::new();
    };

    let mut seen = HashSet::new();
    anchors(html)
        .into_iter()
        .filter(|a| RE_YEAR_PAGE.is_match(&a.href))
        .filter_map(|a| resolve(&base, &a.href))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Era label and calendar year encoded in a year-page URL.
///
/// `…/r7/` → (`令和7年`, 2025); `…/h30/` → (`平成30年`, 2018).
pub fn era_from_year_url(url: &str) -> Option<(String, i32)> {
    let caps = RE_ERA_SEGMENT.captures(url)?;
    let n: i32 = caps[2].parse().ok()?;
    match &caps[1] {
        "r" => Some((format!("令和{n}年"), 2018 + n)),
        "h" => Some((format!("平成{n}年"), 1988 + n)),
        _ => None,
    }
}

/// Session label for a PDF link, e.g. `定例第1回`.
///
/// Searches the link text and its surrounding element; falls back to the
/// link text without its `議決結果…` tail and era label, then to `不明`.
pub fn session_label(link_text: &str, context_text: &str, era_label: &str) -> String {
    let search = to_half_width(&format!("{link_text} {context_text}"));
    if let Some(caps) = RE_SESSION_LABEL.captures(&search) {
        return format!("{}第{}回", &caps[1], &caps[2]);
    }

    let fallback = RE_RESULT_SUFFIX.replace(link_text, "").replace(era_label, "");
    let fallback = fallback.trim();
    if fallback.is_empty() {
        "不明".to_string()
    } else {
        fallback.to_string()
    }
}

/// PDF entries on one year page, deduplicated by URL in page order.
pub fn pdf_entries(html: &str, year_url: &str) -> Vec<DocumentEntry> {
    let Some((era_label, year)) = era_from_year_url(year_url) else {
        warn!("'{}' is not a year page URL; skipping", year_url);
        return Vec::new();
    };
    let Ok(base) = Url::parse(year_url) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for anchor in anchors(html) {
        if !RE_PDF_HREF.is_match(&anchor.href) {
            continue;
        }
        let Some(url) = resolve(&base, &anchor.href) else {
            debug!("Unresolvable PDF href '{}' on {}", anchor.href, year_url);
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let context = context_text(html, &anchor);
        entries.push(DocumentEntry {
            url,
            era_label: era_label.clone(),
            year,
            session_label: session_label(&anchor.text, &context, &era_label),
        });
    }

    entries
}

// ── Fetching ─────────────────────────────────────────────────────────────

/// GET a page as text with a per-request timeout. Never retried.
pub async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<String, GiketsuError> {
    let response = client
        .get(url)
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .send()
        .await
        .map_err(|e| request_error(url, timeout_secs, e))?;

    if !response.status().is_success() {
        return Err(GiketsuError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    response
        .text()
        .await
        .map_err(|e| request_error(url, timeout_secs, e))
}

pub(crate) fn request_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> GiketsuError {
    if e.is_timeout() {
        GiketsuError::DownloadTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        GiketsuError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Walk the index and every year page.
///
/// An unreachable index is fatal. A year page that fails is logged, counted
/// and skipped.
pub async fn discover(
    client: &reqwest::Client,
    config: &CrawlConfig,
) -> Result<Discovery, GiketsuError> {
    info!("Fetching index: {}", config.index_url);
    let index_html = fetch_page(client, &config.index_url, config.index_timeout_secs)
        .await
        .map_err(|e| GiketsuError::IndexUnreachable {
            url: config.index_url.clone(),
            reason: e.to_string(),
        })?;

    let year_urls = year_page_urls(&index_html, &config.index_url);
    info!("Found {} year pages", year_urls.len());

    let mut discovery = Discovery::default();
    let mut seen = HashSet::new();

    for year_url in &year_urls {
        debug!("Fetching year page: {}", year_url);
        match fetch_page(client, year_url, config.index_timeout_secs).await {
            Ok(html) => {
                discovery.year_pages += 1;
                let entries = pdf_entries(&html, year_url);
                debug!("{} PDF link(s) on {}", entries.len(), year_url);
                discovery
                    .entries
                    .extend(entries.into_iter().filter(|e| seen.insert(e.url.clone())));
            }
            Err(e) => {
                warn!("Skipping year page {}: {}", year_url, e);
                discovery.year_pages_failed += 1;
            }
        }
    }

    info!("Found {} PDFs total", discovery.entries.len());
    Ok(discovery)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_HTML: &str = r#"
<ul class="list">
  <li><a href="/gyousei/gikai/giketsu/r7/">令和7年</a></li>
  <li><a href="/gyousei/gikai/giketsu/r6/">令和6年</a></li>
  <li><a href='https://www.shintoku-town.jp/gyousei/gikai/giketsu/h30/'>平成30年</a></li>
  <li><a href="/gyousei/gikai/giketsu/r7/">令和7年（重複）</a></li>
  <li><a href="/gyousei/gikai/">議会トップ</a></li>
</ul>"#;

    const YEAR_HTML: &str = r#"
<table>
  <tr><td>定例第１回 <a href="/files/r7_teirei1.pdf">議決結果（PDF）</a></td></tr>
  <tr><td><a href="/files/r7_rinji1.PDF">臨時第1回議決結果</a></td></tr>
</table>
<p><a href="files/r7_other.pdf">令和7年全員協議会議決結果</a></p>
<p><a href="/files/r7_teirei1.pdf">再掲</a></p>
<p><a href="/files/notice.html">お知らせ</a></p>"#;

    #[test]
    fn index_links_resolved_and_deduplicated() {
        let urls = year_page_urls(INDEX_HTML, "https://www.shintoku-town.jp/gyousei/gikai/giketsu/");
        assert_eq!(
            urls,
            vec![
                "https://www.shintoku-town.jp/gyousei/gikai/giketsu/r7/",
                "https://www.shintoku-town.jp/gyousei/gikai/giketsu/r6/",
                "https://www.shintoku-town.jp/gyousei/gikai/giketsu/h30/",
            ]
        );
    }

    #[test]
    fn era_from_url() {
        assert_eq!(
            era_from_year_url("https://x.jp/gyousei/gikai/giketsu/r7/"),
            Some(("令和7年".to_string(), 2025))
        );
        assert_eq!(
            era_from_year_url("https://x.jp/gyousei/gikai/giketsu/h30/"),
            Some(("平成30年".to_string(), 2018))
        );
        assert_eq!(era_from_year_url("https://x.jp/gyousei/gikai/"), None);
    }

    #[test]
    fn pdf_entries_carry_session_metadata() {
        let year_url = "https://www.shintoku-town.jp/gyousei/gikai/giketsu/r7/";
        let entries = pdf_entries(YEAR_HTML, year_url);
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].url, "https://www.shintoku-town.jp/files/r7_teirei1.pdf");
        assert_eq!(entries[0].session_label, "定例第1回");
        assert_eq!(entries[0].year, 2025);
        assert_eq!(entries[0].session_name(), "令和7年定例第1回");

        assert_eq!(entries[1].session_label, "臨時第1回");

        assert_eq!(
            entries[2].url,
            "https://www.shintoku-town.jp/gyousei/gikai/giketsu/r7/files/r7_other.pdf"
        );
        assert_eq!(entries[2].session_label, "全員協議会");
    }

    #[test]
    fn context_stops_at_the_enclosing_element() {
        let html = r#"
<div><h3>定例第1回</h3><p>会期 3月3日～3月19日</p><a href="/a.pdf">議決結果</a></div>
<div><h3>定例第2回</h3><a href="/b.pdf">議決結果</a></div>"#;
        let entries = pdf_entries(html, "https://x.jp/gyousei/gikai/giketsu/r7/");
        let labels: Vec<&str> = entries.iter().map(|e| e.session_label.as_str()).collect();
        assert_eq!(labels, vec!["定例第1回", "定例第2回"]);
    }

    #[test]
    fn unclosed_list_items_close_at_next_sibling() {
        let html = r#"<ul>
  <li>定例第3回<br> <a href="/c.pdf">議決結果</a>
  <li>臨時第2回 <img src="pdf.png"> <a href="/d.pdf">議決結果</a>
</ul>
<p>定例第9回の日程</p>"#;
        let entries = pdf_entries(html, "https://x.jp/gyousei/gikai/giketsu/r7/");
        let labels: Vec<&str> = entries.iter().map(|e| e.session_label.as_str()).collect();
        assert_eq!(labels, vec!["定例第3回", "臨時第2回"]);
    }

    #[test]
    fn session_label_fallbacks() {
        assert_eq!(session_label("定例 第 3 回", "", "令和7年"), "定例第3回");
        assert_eq!(session_label("議決結果", "", "令和7年"), "不明");
        assert_eq!(session_label("令和7年議決結果", "", "令和7年"), "不明");
    }

    #[test]
    fn non_year_url_yields_nothing() {
        assert!(pdf_entries(YEAR_HTML, "https://x.jp/gyousei/gikai/").is_empty());
    }
}
