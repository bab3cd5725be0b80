use std::path::Path;
use url::Url;

/// Local filename used when the locator does not name one.
const FALLBACK_FILENAME: &str = "download.csv";

/// Rewrite a shared-file locator into a direct-download URL.
///
/// Google Drive share links (`https://drive.google.com/file/d/<id>/view`)
/// point at an HTML viewer rather than the file itself; the `uc` endpoint
/// serves the raw bytes. Locators already carrying an `id` query parameter
/// normalize to the same endpoint. Anything else is returned unchanged.
pub fn to_download_url(locator: &str) -> String {
    match file_id(locator) {
        Some(id) => format!("https://drive.google.com/uc?export=download&id={}", id),
        None => locator.to_string(),
    }
}

/// Local filename for the downloaded copy of `locator`.
///
/// Shared-file locators yield `<id>.csv`; otherwise the final path segment
/// is kept when it carries an extension.
pub fn derive_filename(locator: &str) -> String {
    if let Some(id) = file_id(locator) {
        return format!("{}.csv", id);
    }

    Url::parse(locator)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && Path::new(name).extension().is_some())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Extract the shared-file id from either the `/file/d/<id>/...` path form
/// or an `id=` query parameter on a drive host.
fn file_id(locator: &str) -> Option<String> {
    let url = Url::parse(locator).ok()?;
    if url.host_str() != Some("drive.google.com") {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    if let Some(pos) = segments.iter().position(|s| *s == "d") {
        if pos > 0 && segments[pos - 1] == "file" {
            if let Some(id) = segments.get(pos + 1).filter(|s| !s.is_empty()) {
                return Some((*id).to_string());
            }
        }
    }

    url.query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.to_string())
}
