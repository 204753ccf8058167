//! Error types for the loader's fallible surfaces.
//!
//! Loads themselves never fail with a `LoaderError`: every load outcome is a
//! [`LoadResult`](crate::LoadResult). These errors cover setup only.

/// Loader errors.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Unknown referrer policy token.
    #[error("invalid referrer policy: {value}")]
    InvalidReferrerPolicy { value: String },

    /// A URL could not be parsed or resolved against the base URL.
    #[error("invalid url: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP client could not be built.
    #[error("network error: {message}")]
    Network { message: String },

    /// A setting has an unusable value.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl LoaderError {
    /// Exit code for CLI. Every setup failure is a configuration error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidReferrerPolicy { .. }
            | Self::InvalidUrl { .. }
            | Self::Network { .. }
            | Self::Config { .. } => 2,
        }
    }
}

impl From<reqwest::Error> for LoaderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for loader setup operations.
pub type LoaderResult<T> = Result<T, LoaderError>;
