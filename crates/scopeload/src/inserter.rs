//! The attachment seam.
//!
//! A [`ResourceInserter`] performs the platform-specific work of attaching a
//! resource to a scope. It reports back through a [`Completion`], which is
//! consumed on use, so one completion reports at most once. An inserter may
//! also drop the completion without reporting; the loader's deadline covers
//! that case.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::ReferrerPolicy;
use crate::eventual::Completer;
use crate::scope::Scope;
use crate::types::LoadResult;

/// Everything an inserter needs for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertRequest {
    pub scope: Scope,
    /// Canonical URL.
    pub url: String,
    pub referrer_policy: Option<ReferrerPolicy>,
    /// Anonymous cross-origin mode.
    pub cross_origin: bool,
}

/// Attaches resources to scopes.
pub trait ResourceInserter: Send + Sync {
    /// Start attaching `request.url` and report through `completion`.
    ///
    /// Must not block. Reporting synchronously from inside this call is
    /// allowed.
    fn insert(&self, request: InsertRequest, completion: Completion);
}

impl<I: ResourceInserter + ?Sized> ResourceInserter for std::sync::Arc<I> {
    fn insert(&self, request: InsertRequest, completion: Completion) {
        (**self).insert(request, completion)
    }
}

/// One-shot success/failure callback pair for an insert attempt.
pub struct Completion {
    url: String,
    completer: Completer<LoadResult>,
}

impl Completion {
    pub(crate) fn new(url: String, completer: Completer<LoadResult>) -> Self {
        Self { url, completer }
    }

    /// URL this completion reports for.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the load already settled, e.g. because the deadline passed.
    /// Inserters may use this to skip work whose outcome will be ignored.
    pub fn is_settled(&self) -> bool {
        self.completer.is_settled()
    }

    /// Report that the resource attached. Returns `false` if the load had
    /// already settled.
    pub fn succeed(self) -> bool {
        let settled = self.completer.complete(Ok(self.url.clone()));
        if settled {
            info!(url = %self.url, "resource loaded");
        } else {
            debug!(url = %self.url, "late success ignored");
        }
        settled
    }

    /// Report that attaching failed. Returns `false` if the load had already
    /// settled.
    pub fn fail(self) -> bool {
        let settled = self.completer.complete(Err(self.url.clone()));
        if settled {
            warn!(url = %self.url, "resource failed to load");
        } else {
            debug!(url = %self.url, "late failure ignored");
        }
        settled
    }

    /// Report a success or failure from a boolean.
    pub fn finish(self, loaded: bool) -> bool {
        if loaded {
            self.succeed()
        } else {
            self.fail()
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("url", &self.url)
            .field("settled", &self.completer.is_settled())
            .finish()
    }
}
