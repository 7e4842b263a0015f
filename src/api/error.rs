//! Error types for the PokéAPI data core.

use std::time::Duration;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or aggregating Pokédex data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested name or ID has no remote record (404-shaped).
    #[error("Not found: {resource}")]
    NotFound {
        /// The name, ID, or URL that was requested.
        resource: String,
    },

    /// The remote API is throttling us (429).
    #[error("Rate limited by the API{}", retry_hint(.retry_after))]
    RateLimited {
        /// Retry-after duration, when the API provided one.
        retry_after: Option<Duration>,
    },

    /// Any other non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// Transport-level failure with no response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// One of the sub-fetches of a detail aggregate failed, collapsing
    /// the whole aggregate.
    #[error("Failed to aggregate {stage}: {source}")]
    Aggregation {
        /// Which sub-fetch failed (e.g. "species", "type weaknesses").
        stage: &'static str,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// The remote data violated the assumed contract (malformed URL,
    /// over-deep evolution chain, and the like).
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" - retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

impl Error {
    /// Create a not-found error for a named resource.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Error::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an invalid-data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Error::InvalidData(msg.into())
    }

    /// Wrap an error as an aggregation failure for the given stage.
    pub fn aggregation(stage: &'static str, source: Error) -> Self {
        Error::Aggregation {
            stage,
            source: Box::new(source),
        }
    }

    /// Check if this is a not-found error, looking through aggregation wrappers.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Aggregation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if this is a rate-limit error, looking through aggregation wrappers.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimited { .. } => true,
            Error::Aggregation { source, .. } => source.is_rate_limit(),
            _ => false,
        }
    }

    /// Get retry-after duration if this is a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after } => *retry_after,
            Error::Aggregation { source, .. } => source.retry_after(),
            _ => None,
        }
    }

    /// Get the HTTP status code, if one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound { .. } => Some(404),
            Error::RateLimited { .. } => Some(429),
            Error::Api { status, .. } => Some(*status),
            Error::Aggregation { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("pokemon/missingno");
        assert_eq!(err.to_string(), "Not found: pokemon/missingno");
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_rate_limited() {
        let err = Error::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
        };
        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
        assert!(err.to_string().contains("retry after 60s"));
    }

    #[test]
    fn test_aggregation_preserves_classification() {
        let err = Error::aggregation("species", Error::not_found("pokemon-species/9999"));
        assert!(err.is_not_found());
        assert!(!err.is_rate_limit());
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("species"));
    }

    #[test]
    fn test_api_error_status() {
        let err = Error::Api {
            status: 503,
            message: "maintenance".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_not_found());
    }
}
