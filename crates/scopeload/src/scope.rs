//! Scope handles.
//!
//! A [`Scope`] names one isolation boundary (for example one rendering
//! context). Scopes compare by the id allocated when the handle was created,
//! never by label: two scopes built with the same label are still two
//! separate cache partitions. Copies of a handle share its identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Id 0 is reserved for [`Scope::DOCUMENT`].
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque isolation-boundary handle.
#[derive(Clone, Copy)]
pub struct Scope {
    id: u64,
    label: Option<&'static str>,
}

impl Scope {
    /// The default scope, present in every registry from construction.
    pub const DOCUMENT: Scope = Scope {
        id: 0,
        label: Some("document"),
    };

    /// Allocate a fresh scope.
    pub fn new() -> Self {
        Self {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            label: None,
        }
    }

    /// Allocate a fresh scope with a debug label.
    ///
    /// The label is for logs only and does not take part in equality.
    pub fn named(label: &'static str) -> Self {
        Self {
            label: Some(label),
            ..Self::new()
        }
    }

    /// Unique id of this scope.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Debug label, if any.
    pub fn label(&self) -> Option<&'static str> {
        self.label
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Scope {}

impl std::hash::Hash for Scope {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "{}#{}", label, self.id),
            None => write!(f, "scope#{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_label_distinct_identity() {
        let a = Scope::named("frame");
        let b = Scope::named("frame");
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_copy_keeps_identity() {
        let a = Scope::new();
        let copy = a;
        assert_eq!(a, copy);
        assert_eq!(a.id(), copy.id());
    }

    #[test]
    fn test_document_scope_is_reserved() {
        assert_eq!(Scope::DOCUMENT.id(), 0);
        assert_ne!(Scope::new(), Scope::DOCUMENT);
        assert_eq!(Scope::DOCUMENT.to_string(), "document#0");
    }

    #[test]
    fn test_display_unlabeled() {
        let s = Scope::new();
        assert_eq!(s.to_string(), format!("scope#{}", s.id()));
    }
}
