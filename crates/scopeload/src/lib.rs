//! Scoped, deduplicating resource loader.
//!
//! Attaches resources (stylesheets, scripts, fonts) to isolation scopes
//! exactly once per canonical URL, sharing in-flight work among concurrent
//! callers and bounding every attempt with a deadline:
//!
//! - Per-scope caches keyed by scope identity, with a pre-seeded default scope
//! - Deduplication of pending and settled loads (no implicit retry)
//! - Deadline race between the inserter and a timer; the loser is ignored
//! - Order-preserving batch loads that never short-circuit on failure
//! - An HTTP inserter with referrer policy and credentials handling
//!
//! # Quick Start
//!
//! ```no_run
//! use scopeload::{HttpInserter, HttpInserterConfig, LoaderConfig, ResourceLoader, Scope};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let inserter = HttpInserter::new(
//!     HttpInserterConfig::default().with_base_url("https://cdn.example.com/skins/"),
//! )?;
//! let loader = ResourceLoader::with_config(LoaderConfig::from_env(), inserter);
//!
//! match loader.load(&Scope::DOCUMENT, "content.css").wait().await {
//!     Ok(url) => println!("loaded {url}"),
//!     Err(url) => println!("failed {url}"),
//! }
//!
//! let frame = Scope::named("preview");
//! let results = loader.load_all(&frame, ["a.css", "b.css"]).await;
//! assert_eq!(results.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SCOPELOAD_MAX_LOAD_TIME_MS` | Deadline per load in ms (default: 5000) |
//! | `SCOPELOAD_REFERRER_POLICY` | Referrer policy token |
//! | `SCOPELOAD_CROSS_ORIGIN` | Anonymous cross-origin mode |
//! | `SCOPELOAD_CACHE_SUFFIX` | Cache-busting qualifier |
//! | `SCOPELOAD_BASE_URL` | Base URL for relative resources (HTTP inserter) |
//! | `SCOPELOAD_REFERRER` | Requesting document URL (HTTP inserter) |
//! | `SCOPELOAD_HTTP_TIMEOUT` | Transport timeout in seconds (default: 30) |
//! | `SCOPELOAD_TOKEN` | Bearer token (HTTP inserter) |

pub mod auth;
pub mod canonical;
pub mod config;
pub mod error;
pub mod eventual;
pub mod http;
pub mod inserter;
pub mod loader;
pub mod race;
pub mod registry;
pub mod scope;
pub mod types;

// Re-export main types
pub use auth::Credentials;
pub use canonical::{CacheSuffix, Canonicalize};
pub use config::{LoadSettings, LoaderConfig, ReferrerPolicy, SharedConfig};
pub use error::{LoaderError, LoaderResult};
pub use eventual::{Completer, Eventual};
pub use http::{HttpInserter, HttpInserterConfig};
pub use inserter::{Completion, InsertRequest, ResourceInserter};
pub use loader::ResourceLoader;
pub use registry::{CacheEntry, ScopeRegistry};
pub use scope::Scope;
pub use types::{partition_results, LoadResult, LoadTask};
