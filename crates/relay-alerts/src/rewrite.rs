//! Alert link rewriting.
//!
//! Grafana builds rule links from its own root URL, which is often an
//! internal hostname. An instance can carry a find/replace pair that maps
//! such links to an externally reachable address. Both halves are plain
//! text: `?`, `.` or `$` in either one mean exactly those characters.

use relay_registry::Instance;

/// A literal find/replace pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewrite {
    find: String,
    replace: String,
}

impl LinkRewrite {
    /// Creates a rewrite. Returns `None` for an empty `find`, which would
    /// otherwise match between every character.
    #[must_use]
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Option<Self> {
        let find = find.into();
        if find.is_empty() {
            return None;
        }
        Some(Self {
            find,
            replace: replace.into(),
        })
    }

    /// The rewrite configured on `instance`, if any. A missing replacement
    /// removes the find-string.
    #[must_use]
    pub fn for_instance(instance: &Instance) -> Option<Self> {
        let find = instance.link_regex_find.as_deref()?;
        Self::new(find, instance.link_regex_replace.clone().unwrap_or_default())
    }

    /// Replaces every occurrence of the find-string in `link`.
    #[must_use]
    pub fn apply(&self, link: &str) -> String {
        link.replace(&self.find, &self.replace)
    }
}
