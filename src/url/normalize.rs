use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL into the key used to deduplicate visits
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Reject URLs without a host
/// 3. Lowercase the host, keeping an explicit non-default port
/// 4. Append the path, dropping a single trailing slash
///
/// The scheme, query string and fragment never reach the key, so two URLs
/// that differ only in those parts name the same page.
///
/// # Arguments
///
/// * `url_str` - The absolute URL string to normalize
///
/// # Returns
///
/// * `Ok(String)` - The `host[:port]/path` key
/// * `Err(UrlError)` - The input is not an absolute URL with a host
///
/// # Examples
///
/// ```
/// use sitewalk::url::normalize_url;
///
/// let key = normalize_url("https://BLOG.boot.dev/path/").unwrap();
/// assert_eq!(key, "blog.boot.dev/path");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<String> {
    let url = Url::parse(url_str).map_err(|source| UrlError::Parse {
        url: url_str.to_string(),
        source,
    })?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| UrlError::MissingHost(url_str.to_string()))?
        .to_lowercase();

    let mut key = match url.port() {
        Some(port) => format!("{}:{}{}", host, port, url.path()),
        None => format!("{}{}", host, url.path()),
    };

    if key.ends_with('/') {
        key.pop();
    }

    Ok(key)
}
