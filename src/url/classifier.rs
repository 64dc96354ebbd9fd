use crate::config::CrawlSettings;
use crate::url::domain::authority;
use crate::url::resolve::resolve_link;
use url::Url;

/// Decides whether a discovered link is eligible to be followed
///
/// The link is first resolved against `base_url` (see [`resolve_link`]).
/// It is rejected when:
///
/// - it does not resolve to an absolute http(s) URL
/// - `same_domain_only` is set and its host differs from the base host
/// - its path ends with one of the ignored extensions (case-sensitive)
/// - one of its `/`-delimited path segments is an ignored segment
///
/// Malformed links are simply not followable. The result depends only on the
/// arguments.
///
/// # Examples
///
/// ```
/// use gleaner::config::CrawlSettings;
/// use gleaner::url::is_followable;
///
/// let settings = CrawlSettings::default();
/// let base = "https://example.com";
/// assert!(is_followable("/articles/rust", base, &settings));
/// assert!(!is_followable("/login", base, &settings));
/// assert!(!is_followable("/report.pdf", base, &settings));
/// assert!(!is_followable("https://other.org/articles", base, &settings));
/// ```
pub fn is_followable(link: &str, base_url: &str, settings: &CrawlSettings) -> bool {
    let resolved = match resolve_link(link, base_url) {
        Some(resolved) => resolved,
        None => return false,
    };

    let parsed = match Url::parse(&resolved) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::trace!("Rejecting malformed link {}: {}", resolved, e);
            return false;
        }
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    if settings.same_domain_only && !same_site(&parsed, base_url) {
        return false;
    }

    let path = parsed.path();

    if settings
        .ignored_extensions
        .iter()
        .any(|extension| path.ends_with(extension.as_str()))
    {
        return false;
    }

    if path
        .trim_matches('/')
        .split('/')
        .any(|segment| settings.ignored_path_segments.contains(segment))
    {
        return false;
    }

    true
}

fn same_site(link: &Url, base_url: &str) -> bool {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(_) => return false,
    };

    match (authority(link), authority(&base)) {
        (Some(link_host), Some(base_host)) => link_host == base_host,
        _ => false,
    }
}
