//! The scoped resource loader.
//!
//! `load` canonicalizes the URL, then looks it up in the scope's cache entry.
//! A hit returns the existing task whether it is pending or settled; a miss
//! publishes a new pending task and only then starts the inserter and the
//! deadline timer. Settled tasks are never replaced, failures included, so a
//! broken resource is attempted once per scope for the life of the loader.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::canonical::{CacheSuffix, Canonicalize};
use crate::config::{LoaderConfig, ReferrerPolicy, SharedConfig};
use crate::eventual;
use crate::inserter::{Completion, InsertRequest, ResourceInserter};
use crate::race;
use crate::registry::ScopeRegistry;
use crate::scope::Scope;
use crate::types::{LoadResult, LoadTask};

/// Scoped, deduplicating loader. Clones share registry, config and inserter.
pub struct ResourceLoader<I> {
    inner: Arc<Inner<I>>,
}

struct Inner<I> {
    registry: ScopeRegistry,
    config: SharedConfig,
    canonicalizer: Box<dyn Canonicalize>,
    inserter: I,
}

impl<I: ResourceInserter> ResourceLoader<I> {
    /// Create a loader with default configuration.
    pub fn new(inserter: I) -> Self {
        Self::with_config(LoaderConfig::default(), inserter)
    }

    /// Create a loader; the cache suffix in `config` becomes the canonicalizer.
    pub fn with_config(config: LoaderConfig, inserter: I) -> Self {
        let canonicalizer = CacheSuffix::from_option(config.cache_suffix.as_deref());
        Self::with_components(config, canonicalizer, inserter)
    }

    /// Create a loader with a custom canonicalizer.
    pub fn with_components(
        config: LoaderConfig,
        canonicalizer: impl Canonicalize + 'static,
        inserter: I,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: ScopeRegistry::new(),
                config: SharedConfig::new(config),
                canonicalizer: Box::new(canonicalizer),
                inserter,
            }),
        }
    }

    /// Load `url` into `scope`, at most once per canonical URL.
    ///
    /// Returns immediately. Starting a load needs a tokio runtime for the
    /// deadline timer; outside one, cached tasks are still returned and a
    /// miss settles at once as a failure without being cached.
    pub fn load(&self, scope: &Scope, url: &str) -> LoadTask {
        let url = self.inner.canonicalizer.canonicalize(url);
        let entry = self.inner.registry.get_or_create(scope);

        if tokio::runtime::Handle::try_current().is_err() {
            if let Some(task) = entry.get(&url) {
                return task;
            }
            warn!(scope = %scope, url = %url, "no tokio runtime, load not started");
            return LoadTask::ready(Err(url));
        }

        let mut completer = None;
        let (task, created) = entry.get_or_insert_with(&url, || {
            let (c, task) = eventual::pending();
            completer = Some(c);
            task
        });

        let Some(completer) = completer.filter(|_| created) else {
            debug!(scope = %scope, url = %url, settled = task.is_settled(), "load cache hit");
            return task;
        };

        let settings = self.inner.config.settings();
        debug!(
            scope = %scope,
            url = %url,
            max_load_time_ms = settings.max_load_time.as_millis() as u64,
            "starting load"
        );

        let request = InsertRequest {
            scope: *scope,
            url: url.clone(),
            referrer_policy: settings.referrer_policy,
            cross_origin: settings.cross_origin,
        };
        let deadline = settings.max_load_time;
        let timeout_url = url.clone();
        let scope_label = scope.to_string();

        race::race_deadline(
            completer,
            deadline,
            move || {
                warn!(
                    scope = %scope_label,
                    url = %timeout_url,
                    max_load_time_ms = deadline.as_millis() as u64,
                    "load timed out"
                );
                Err(timeout_url)
            },
            |completer| {
                self.inner
                    .inserter
                    .insert(request, Completion::new(url, completer));
            },
        );

        task
    }

    /// Load every URL into `scope` and join the outcomes.
    ///
    /// All loads start before this returns. The future resolves once every
    /// load has settled, with one result per input URL, in input order.
    pub fn load_all<U>(
        &self,
        scope: &Scope,
        urls: impl IntoIterator<Item = U>,
    ) -> impl Future<Output = Vec<LoadResult>> + Send + 'static
    where
        U: AsRef<str>,
    {
        let tasks: Vec<LoadTask> = urls
            .into_iter()
            .map(|url| self.load(scope, url.as_ref()))
            .collect();

        async move { join_all(tasks.iter().map(LoadTask::wait)).await }
    }
}

impl<I> ResourceLoader<I> {
    /// Cached task for `url` in `scope`, without starting a load.
    pub fn cached(&self, scope: &Scope, url: &str) -> Option<LoadTask> {
        let url = self.inner.canonicalizer.canonicalize(url);
        self.inner.registry.get(scope)?.get(&url)
    }

    /// Canonical form of `url`, i.e. its cache key.
    pub fn canonicalize(&self, url: &str) -> String {
        self.inner.canonicalizer.canonicalize(url)
    }

    pub fn registry(&self) -> &ScopeRegistry {
        &self.inner.registry
    }

    pub fn inserter(&self) -> &I {
        &self.inner.inserter
    }

    /// The shared config cell. Changes affect loads started afterwards.
    pub fn config(&self) -> &SharedConfig {
        &self.inner.config
    }

    pub fn max_load_time(&self) -> Duration {
        self.inner.config.max_load_time()
    }

    pub fn set_max_load_time(&self, max_load_time: Duration) {
        self.inner.config.set_max_load_time(max_load_time);
    }

    pub fn referrer_policy(&self) -> Option<ReferrerPolicy> {
        self.inner.config.referrer_policy()
    }

    pub fn set_referrer_policy(&self, policy: Option<ReferrerPolicy>) {
        self.inner.config.set_referrer_policy(policy);
    }

    pub fn cross_origin(&self) -> bool {
        self.inner.config.cross_origin()
    }

    pub fn set_cross_origin(&self, cross_origin: bool) {
        self.inner.config.set_cross_origin(cross_origin);
    }
}

impl<I> Clone for ResourceLoader<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I> std::fmt::Debug for ResourceLoader<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("scopes", &self.inner.registry.len())
            .field("config", &self.inner.config.get())
            .finish()
    }
}
