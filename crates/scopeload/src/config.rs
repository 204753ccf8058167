//! Loader configuration.
//!
//! [`LoaderConfig`] is a plain value. [`SharedConfig`] is the mutable cell a
//! loader reads from; each load samples it once, at the moment it starts.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::LoaderError;

/// Referrer policy forwarded to the inserter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferrerPolicy {
    NoReferrer,
    NoReferrerWhenDowngrade,
    Origin,
    OriginWhenCrossOrigin,
    SameOrigin,
    StrictOrigin,
    StrictOriginWhenCrossOrigin,
    UnsafeUrl,
}

impl ReferrerPolicy {
    pub const ALL: [ReferrerPolicy; 8] = [
        Self::NoReferrer,
        Self::NoReferrerWhenDowngrade,
        Self::Origin,
        Self::OriginWhenCrossOrigin,
        Self::SameOrigin,
        Self::StrictOrigin,
        Self::StrictOriginWhenCrossOrigin,
        Self::UnsafeUrl,
    ];

    /// The policy token, as used in HTML attributes and headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoReferrer => "no-referrer",
            Self::NoReferrerWhenDowngrade => "no-referrer-when-downgrade",
            Self::Origin => "origin",
            Self::OriginWhenCrossOrigin => "origin-when-cross-origin",
            Self::SameOrigin => "same-origin",
            Self::StrictOrigin => "strict-origin",
            Self::StrictOriginWhenCrossOrigin => "strict-origin-when-cross-origin",
            Self::UnsafeUrl => "unsafe-url",
        }
    }
}

impl fmt::Display for ReferrerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferrerPolicy {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| LoaderError::InvalidReferrerPolicy {
                value: s.to_string(),
            })
    }
}

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Deadline for one load attempt, in milliseconds.
    #[serde(default = "default_max_load_time_ms")]
    pub max_load_time_ms: u64,

    /// Referrer policy passed to the inserter.
    #[serde(default)]
    pub referrer_policy: Option<ReferrerPolicy>,

    /// Anonymous cross-origin mode.
    #[serde(default)]
    pub cross_origin: bool,

    /// Cache-busting qualifier appended to every URL.
    #[serde(default)]
    pub cache_suffix: Option<String>,
}

fn default_max_load_time_ms() -> u64 {
    5000
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_load_time_ms: default_max_load_time_ms(),
            referrer_policy: None,
            cross_origin: false,
            cache_suffix: None,
        }
    }
}

impl LoaderConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SCOPELOAD_MAX_LOAD_TIME_MS` | Deadline per load (default: 5000) |
    /// | `SCOPELOAD_REFERRER_POLICY` | Referrer policy token |
    /// | `SCOPELOAD_CROSS_ORIGIN` | Anonymous cross-origin mode |
    /// | `SCOPELOAD_CACHE_SUFFIX` | Cache-busting qualifier |
    pub fn from_env() -> Self {
        let referrer_policy = std::env::var("SCOPELOAD_REFERRER_POLICY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .and_then(|v| match v.parse() {
                Ok(policy) => Some(policy),
                Err(e) => {
                    warn!(error = %e, "ignoring SCOPELOAD_REFERRER_POLICY");
                    None
                }
            });

        Self {
            max_load_time_ms: std::env::var("SCOPELOAD_MAX_LOAD_TIME_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_load_time_ms),
            referrer_policy,
            cross_origin: std::env::var("SCOPELOAD_CROSS_ORIGIN")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cache_suffix: std::env::var("SCOPELOAD_CACHE_SUFFIX")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    pub fn max_load_time(&self) -> Duration {
        Duration::from_millis(self.max_load_time_ms)
    }

    /// Set the load deadline in milliseconds.
    pub fn with_max_load_time_ms(mut self, ms: u64) -> Self {
        self.max_load_time_ms = ms;
        self
    }

    pub fn with_referrer_policy(mut self, policy: Option<ReferrerPolicy>) -> Self {
        self.referrer_policy = policy;
        self
    }

    pub fn with_cross_origin(mut self, cross_origin: bool) -> Self {
        self.cross_origin = cross_origin;
        self
    }

    pub fn with_cache_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.cache_suffix = Some(suffix.into());
        self
    }
}

/// Per-load view of the config, sampled when the load starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    pub max_load_time: Duration,
    pub referrer_policy: Option<ReferrerPolicy>,
    pub cross_origin: bool,
}

/// Mutable config cell shared by a loader and its clones. Last writer wins.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<LoaderConfig>>,
}

impl SharedConfig {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current config.
    pub fn get(&self) -> LoaderConfig {
        self.read(Clone::clone)
    }

    pub fn settings(&self) -> LoadSettings {
        self.read(|c| LoadSettings {
            max_load_time: c.max_load_time(),
            referrer_policy: c.referrer_policy,
            cross_origin: c.cross_origin,
        })
    }

    pub fn max_load_time(&self) -> Duration {
        self.read(LoaderConfig::max_load_time)
    }

    pub fn set_max_load_time(&self, max_load_time: Duration) {
        let ms = u64::try_from(max_load_time.as_millis()).unwrap_or(u64::MAX);
        self.write(|c| c.max_load_time_ms = ms);
    }

    pub fn referrer_policy(&self) -> Option<ReferrerPolicy> {
        self.read(|c| c.referrer_policy)
    }

    pub fn set_referrer_policy(&self, policy: Option<ReferrerPolicy>) {
        self.write(|c| c.referrer_policy = policy);
    }

    pub fn cross_origin(&self) -> bool {
        self.read(|c| c.cross_origin)
    }

    pub fn set_cross_origin(&self, cross_origin: bool) {
        self.write(|c| c.cross_origin = cross_origin);
    }

    fn read<R>(&self, f: impl FnOnce(&LoaderConfig) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(|p| p.into_inner());
        f(&guard)
    }

    fn write(&self, f: impl FnOnce(&mut LoaderConfig)) {
        let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
        f(&mut guard);
    }
}
