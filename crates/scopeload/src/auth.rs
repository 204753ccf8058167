//! Credentials for the HTTP inserter.
//!
//! Credentials are attached only when the request's credentials mode allows
//! it: always outside cross-origin mode, and only for same-origin targets in
//! anonymous cross-origin mode. Environment tokens reach the inserter
//! through `HttpInserterConfig::from_env`.

/// Credentials sent with resource requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Static bearer token.
    Bearer(String),

    /// No credentials.
    #[default]
    None,
}

impl Credentials {
    /// Create a static bearer token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// `Authorization` header value, if any.
    pub fn authorization(&self) -> Option<String> {
        match self {
            Self::Bearer(token) => Some(format!("Bearer {}", token)),
            Self::None => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
