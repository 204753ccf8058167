//! URL canonicalization.
//!
//! The canonical form of a URL is the cache key and the address handed to
//! the inserter. The default transform appends a cache-busting qualifier.

/// Maps a requested URL to its canonical form.
///
/// Implementations must be pure, and applying them to an already
/// canonical URL must return it unchanged.
pub trait Canonicalize: Send + Sync {
    fn canonicalize(&self, url: &str) -> String;
}

impl<F> Canonicalize for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn canonicalize(&self, url: &str) -> String {
        self(url)
    }
}

/// Appends `?suffix` (or `&suffix` when a query is present) ahead of any
/// fragment. Without a suffix the URL passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSuffix {
    suffix: Option<String>,
}

impl CacheSuffix {
    pub fn new(suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        let suffix = suffix.trim_start_matches(['?', '&']).to_string();
        Self {
            suffix: (!suffix.is_empty()).then_some(suffix),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_option(suffix: Option<&str>) -> Self {
        suffix.map(Self::new).unwrap_or_default()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

impl Canonicalize for CacheSuffix {
    fn canonicalize(&self, url: &str) -> String {
        let Some(suffix) = &self.suffix else {
            return url.to_string();
        };

        let (base, fragment) = match url.find('#') {
            Some(idx) => url.split_at(idx),
            None => (url, ""),
        };

        let already = base
            .strip_suffix(suffix.as_str())
            .is_some_and(|head| head.ends_with(['?', '&']));
        if already {
            return url.to_string();
        }

        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{}{}{}{}", base, sep, suffix, fragment)
    }
}
