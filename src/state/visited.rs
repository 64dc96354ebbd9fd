use std::collections::HashSet;

/// Tracks the URLs visited during one top-level crawl
///
/// A single set is threaded by mutable reference through the whole recursive
/// traversal, so sibling branches see each other's visits. The set only
/// grows; insertion order is kept for reporting.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl VisitedSet {
    /// Creates an empty visited set
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL as visited
    ///
    /// # Returns
    ///
    /// * `true` - The URL was not visited before
    /// * `false` - The URL was already in the set
    pub fn insert(&mut self, url: &str) -> bool {
        if self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string());
        self.order.push(url.to_string());
        true
    }

    /// Returns true if the URL has been visited
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of visited URLs
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing has been visited yet
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Visited URLs in the order they were first visited
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for VisitedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = VisitedSet::new();
        for url in iter {
            let url: String = url.into();
            set.insert(&url);
        }
        set
    }
}
