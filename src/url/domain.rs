use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use gleaner::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Host plus explicit port, e.g. `example.com` or `127.0.0.1:8080`
///
/// Two links are on the same site when their authorities are equal.
pub fn authority(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Domain component of a document filename
///
/// The authority of the URL with every character outside `[A-Za-z0-9.-]`
/// replaced by `_`. Unparseable URLs yield `unknown`.
///
/// # Examples
///
/// ```
/// use gleaner::url::filename_domain;
///
/// assert_eq!(filename_domain("https://news.example.com/a"), "news.example.com");
/// assert_eq!(filename_domain("http://127.0.0.1:8080/"), "127.0.0.1_8080");
/// ```
pub fn filename_domain(raw_url: &str) -> String {
    let authority = Url::parse(raw_url)
        .ok()
        .and_then(|url| authority(&url))
        .unwrap_or_default();

    let sanitized: String = authority
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}
