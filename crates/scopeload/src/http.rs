//! HTTP inserter: attaches a resource by fetching it once over HTTP.
//!
//! Success means a 2xx response whose body could be drained. The body is
//! never inspected. Redirects are followed by reqwest; the per-request
//! timeout here is a transport limit, separate from the loader's deadline.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, REFERER, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::config::ReferrerPolicy;
use crate::error::{LoaderError, LoaderResult};
use crate::inserter::{Completion, InsertRequest, ResourceInserter};

const USER_AGENT_VALUE: &str = concat!("scopeload/", env!("CARGO_PKG_VERSION"));

/// HTTP inserter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpInserterConfig {
    /// Base URL that relative resource URLs are joined onto.
    #[serde(default)]
    pub base_url: Option<String>,

    /// URL of the requesting document, used to derive the `Referer` header.
    #[serde(default)]
    pub referrer: Option<String>,

    /// Transport timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for HttpInserterConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            referrer: None,
            request_timeout_secs: default_request_timeout(),
            token: None,
        }
    }
}

impl HttpInserterConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SCOPELOAD_BASE_URL` | Base for relative URLs |
    /// | `SCOPELOAD_REFERRER` | Requesting document URL |
    /// | `SCOPELOAD_HTTP_TIMEOUT` | Transport timeout in seconds (default: 30) |
    /// | `SCOPELOAD_TOKEN` | Bearer token |
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("SCOPELOAD_BASE_URL").ok(),
            referrer: std::env::var("SCOPELOAD_REFERRER").ok(),
            request_timeout_secs: std::env::var("SCOPELOAD_HTTP_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_request_timeout),
            token: std::env::var("SCOPELOAD_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_referrer(mut self, url: impl Into<String>) -> Self {
        self.referrer = Some(url.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Inserter that performs one GET per load.
#[derive(Debug, Clone)]
pub struct HttpInserter {
    client: reqwest::Client,
    base_url: Option<Url>,
    referrer: Option<Url>,
    credentials: Credentials,
}

impl HttpInserter {
    pub fn new(config: HttpInserterConfig) -> LoaderResult<Self> {
        let credentials = config
            .token
            .as_ref()
            .map(Credentials::bearer)
            .unwrap_or_default();

        Self::with_credentials(config, credentials)
    }

    pub fn with_credentials(
        config: HttpInserterConfig,
        credentials: Credentials,
    ) -> LoaderResult<Self> {
        if config.request_timeout_secs == 0 {
            return Err(LoaderError::Config {
                message: "request timeout must be at least 1 second".to_string(),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| LoaderError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.as_deref().map(parse_url).transpose()?,
            referrer: config.referrer.as_deref().map(parse_url).transpose()?,
            credentials,
        })
    }

    pub fn from_env() -> LoaderResult<Self> {
        Self::new(HttpInserterConfig::from_env())
    }

    /// Resolve a possibly relative URL against the base URL.
    pub fn resolve(&self, url: &str) -> LoaderResult<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| LoaderError::InvalidUrl {
                    url: url.to_string(),
                    reason: "relative url and no base url configured".to_string(),
                })?;
                base.join(url).map_err(|e| LoaderError::InvalidUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(LoaderError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Build the GET for one attempt.
    fn build_request(&self, request: &InsertRequest) -> LoaderResult<reqwest::RequestBuilder> {
        let target = self.resolve(&request.url)?;
        let mut builder = self.client.get(target.clone());

        if let Some(referer) = referrer_for(self.referrer.as_ref(), &target, request.referrer_policy)
        {
            builder = builder.header(REFERER, referer);
        }

        // Anonymous cross-origin mode only sends credentials to the
        // requesting document's own origin.
        let send_credentials = !request.cross_origin
            || self
                .referrer
                .as_ref()
                .or(self.base_url.as_ref())
                .is_some_and(|origin| origin.origin() == target.origin());

        if send_credentials {
            if let Some(value) = self.credentials.authorization() {
                builder = builder.header(AUTHORIZATION, value);
            }
        }

        Ok(builder)
    }
}

impl ResourceInserter for HttpInserter {
    fn insert(&self, request: InsertRequest, completion: Completion) {
        let builder = match self.build_request(&request) {
            Ok(builder) => builder,
            Err(e) => {
                debug!(url = %request.url, error = %e, "cannot build request");
                completion.fail();
                return;
            }
        };

        tokio::spawn(async move {
            let loaded = match builder.send().await {
                Ok(response) if response.status().is_success() => {
                    match drain(response).await {
                        Ok(()) => true,
                        Err(e) => {
                            debug!(url = %completion.url(), error = %e, "failed to read body");
                            false
                        }
                    }
                }
                Ok(response) => {
                    debug!(
                        url = %completion.url(),
                        status = response.status().as_u16(),
                        "unsuccessful status"
                    );
                    false
                }
                Err(e) => {
                    debug!(url = %completion.url(), error = %e, "request failed");
                    false
                }
            };

            completion.finish(loaded);
        });
    }
}

/// Read the body to the end without buffering it.
async fn drain(mut response: reqwest::Response) -> reqwest::Result<()> {
    while response.chunk().await?.is_some() {}
    Ok(())
}

fn parse_url(url: &str) -> LoaderResult<Url> {
    Url::parse(url).map_err(|e| LoaderError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// `Referer` value for a request from `referrer` to `target` under `policy`.
///
/// An unset policy behaves as `strict-origin-when-cross-origin`.
pub fn referrer_for(
    referrer: Option<&Url>,
    target: &Url,
    policy: Option<ReferrerPolicy>,
) -> Option<String> {
    let referrer = referrer?;
    if !matches!(referrer.scheme(), "http" | "https") {
        return None;
    }

    let mut full = referrer.clone();
    full.set_fragment(None);
    let _ = full.set_username("");
    let _ = full.set_password(None);
    let full = full.to_string();
    let origin = format!("{}/", referrer.origin().ascii_serialization());

    let same_origin = referrer.origin() == target.origin();
    let downgrade = referrer.scheme() == "https" && target.scheme() == "http";

    match policy.unwrap_or(ReferrerPolicy::StrictOriginWhenCrossOrigin) {
        ReferrerPolicy::NoReferrer => None,
        ReferrerPolicy::NoReferrerWhenDowngrade => (!downgrade).then_some(full),
        ReferrerPolicy::Origin => Some(origin),
        ReferrerPolicy::OriginWhenCrossOrigin => Some(if same_origin { full } else { origin }),
        ReferrerPolicy::SameOrigin => same_origin.then_some(full),
        ReferrerPolicy::StrictOrigin => (!downgrade).then_some(origin),
        ReferrerPolicy::StrictOriginWhenCrossOrigin => {
            if same_origin {
                Some(full)
            } else if downgrade {
                None
            } else {
                Some(origin)
            }
        }
        ReferrerPolicy::UnsafeUrl => Some(full),
    }
}
