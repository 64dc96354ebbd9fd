/// Schemes that never lead to a crawlable page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves an href found on a page into an absolute link string
///
/// # Resolution Rules
///
/// - hrefs starting with `http` are taken as absolute
/// - `//host/path` gets the scheme of the base URL
/// - hrefs starting with `/` are appended to the base URL
/// - any other href is joined to the base URL with a `/`
///
/// A trailing `/` on the base URL is not doubled. Empty hrefs, fragment-only
/// hrefs and `javascript:`, `mailto:`, `tel:` and `data:` links resolve to
/// nothing.
///
/// The result is not validated; malformed links are rejected later by the
/// link classifier.
///
/// # Examples
///
/// ```
/// use gleaner::url::resolve_link;
///
/// let base = "https://example.com/forum";
/// assert_eq!(
///     resolve_link("/thread/1", base).as_deref(),
///     Some("https://example.com/forum/thread/1")
/// );
/// assert_eq!(
///     resolve_link("https://other.org/", base).as_deref(),
///     Some("https://other.org/")
/// );
/// assert_eq!(resolve_link("mailto:admin@example.com", base), None);
/// ```
pub fn resolve_link(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    if lowered.starts_with("http") {
        return Some(href.to_string());
    }

    if let Some(rest) = href.strip_prefix("//") {
        let scheme = base_url.split("://").next().filter(|s| !s.is_empty())?;
        return Some(format!("{}://{}", scheme, rest));
    }

    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        Some(format!("{}{}", base, href))
    } else {
        Some(format!("{}/{}", base, href))
    }
}
