//! Text acquisition: PDF bytes from a URL or a local path, then plain text.
//!
//! ## Blocking work
//!
//! `pdf-extract` is synchronous and CPU-bound; a large report can keep it
//! busy for seconds. It runs on the blocking pool, and a panic inside the
//! extractor comes back as a `JoinError` that becomes this document's error.
//!
//! Magic bytes (`%PDF`) are checked before extraction so an HTML error page
//! served with a 200 status is reported as "not a PDF" rather than as an
//! opaque parser failure.

use crate::error::GiketsuError;
use crate::pipeline::locate::request_error;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load PDF bytes from a URL or a local path and validate the magic bytes.
pub async fn load_pdf(
    client: &reqwest::Client,
    input: &str,
    timeout_secs: u64,
) -> Result<Vec<u8>, GiketsuError> {
    let bytes = if is_url(input) {
        download_pdf(client, input, timeout_secs).await?
    } else {
        read_local(input)?
    };
    check_magic(&bytes, input)?;
    Ok(bytes)
}

/// Read a local file, mapping the common failures to specific errors.
fn read_local(path_str: &str) -> Result<Vec<u8>, GiketsuError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(GiketsuError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(GiketsuError::PermissionDenied { path });
        }
        Err(_) => return Err(GiketsuError::FileNotFound { path }),
    };

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| GiketsuError::InputReadFailed {
            path: path.clone(),
            detail: e.to_string(),
        })?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Download a PDF into memory. One attempt, bounded by `timeout_secs`.
async fn download_pdf(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<Vec<u8>, GiketsuError> {
    info!("Downloading PDF from: {}", url);

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

    let bytes = response
        .bytes()
        .await
        .map_err(|e| request_error(url, timeout_secs, e))?;

    debug!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}

/// Reject anything that does not start with `%PDF`.
pub fn check_magic(bytes: &[u8], source_name: &str) -> Result<(), GiketsuError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(GiketsuError::NotAPdf {
            source_name: source_name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Extract plain text, page by page, joined with `\n` in document order.
pub async fn extract_text(bytes: Vec<u8>, source_name: &str) -> Result<String, GiketsuError> {
    let name = source_name.to_string();

    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    })
    .await
    .map_err(|e| GiketsuError::TextExtractionFailed {
        source_name: name.clone(),
        detail: format!("extractor panicked: {e}"),
    })?
    .map_err(|e| GiketsuError::TextExtractionFailed {
        source_name: name.clone(),
        detail: e.to_string(),
    })?;

    debug!("Extracted {} page(s) of text from {}", pages.len(), name);
    Ok(pages.join("\n"))
}
