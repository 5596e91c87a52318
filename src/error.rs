//! docquery error types

use uuid::Uuid;

/// Raw failure of a single call to a generation provider.
///
/// Produced by [`GenerationProvider`](crate::providers::GenerationProvider)
/// implementations and consumed by the retry loop, which decides from the
/// variant whether another attempt is worthwhile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected upstream failure: {0}")]
    Other(String),
}

impl UpstreamError {
    /// Whether the failure is transient and worth another attempt.
    ///
    /// Only transport-level failures qualify. A rate-limit response is
    /// surfaced to the caller on first occurrence.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }
}

/// Terminal outcome of a failed invocation.
///
/// Each variant maps 1:1 to an HTTP-like status code and a message that is
/// safe to show to end users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifiedError {
    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("upstream connection error")]
    UpstreamUnreachable,

    #[error("upstream rate limit exceeded")]
    RateLimited,

    #[error("upstream error ({status}): {detail}")]
    UpstreamError { status: u16, detail: String },

    #[error("internal error")]
    Internal,
}

impl ClassifiedError {
    /// Classify a terminal upstream failure.
    ///
    /// Called once per invocation, either on the first non-retryable failure
    /// or on the last transient failure once attempts are exhausted.
    pub fn classify(err: &UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout(_) => Self::UpstreamTimeout,
            UpstreamError::Connect(_) => Self::UpstreamUnreachable,
            UpstreamError::Status { status: 429, .. } => Self::RateLimited,
            UpstreamError::Status { status, message } => Self::UpstreamError {
                status: *status,
                detail: message.clone(),
            },
            UpstreamError::Other(_) => Self::Internal,
        }
    }

    /// HTTP-like status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UpstreamTimeout => 504,
            Self::UpstreamUnreachable => 502,
            Self::RateLimited => 429,
            Self::UpstreamError { .. } | Self::Internal => 500,
        }
    }

    /// Message suitable for end users.
    ///
    /// `Internal` never carries the underlying detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::UpstreamTimeout => "Generation service request timed out.".to_string(),
            Self::UpstreamUnreachable => "Error connecting to generation service.".to_string(),
            Self::RateLimited => "Rate limit exceeded, please try again later.".to_string(),
            Self::UpstreamError { status, detail } => {
                format!("Generation service returned HTTP {status}: {detail}")
            }
            Self::Internal => "Internal server error while processing the request.".to_string(),
        }
    }
}

/// docquery error types
#[derive(Debug, thiserror::Error)]
pub enum DocQueryError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("document not found: {0}")]
    DocumentNotFound(Uuid),

    #[error("query cannot be empty")]
    EmptyQuery,

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Invocation(#[from] ClassifiedError),
}

impl DocQueryError {
    /// HTTP-like status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::DocumentNotFound(_) => 404,
            Self::EmptyQuery | Self::InvalidDocument(_) => 400,
            Self::Configuration(_) => 500,
            Self::Invocation(e) => e.status_code(),
        }
    }
}

/// Result type alias for docquery operations
pub type Result<T> = std::result::Result<T, DocQueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_transient() {
        assert!(UpstreamError::Timeout("t".into()).is_transient());
        assert!(UpstreamError::Connect("c".into()).is_transient());
        assert!(
            !UpstreamError::Status {
                status: 429,
                message: "slow down".into()
            }
            .is_transient()
        );
        assert!(
            !UpstreamError::Status {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
        assert!(!UpstreamError::Other("boom".into()).is_transient());
    }

    #[test]
    fn classification_table() {
        let cases = [
            (UpstreamError::Timeout("t".into()), 504),
            (UpstreamError::Connect("c".into()), 502),
            (
                UpstreamError::Status {
                    status: 429,
                    message: "quota".into(),
                },
                429,
            ),
            (
                UpstreamError::Status {
                    status: 400,
                    message: "bad".into(),
                },
                500,
            ),
            (UpstreamError::Other("decode".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ClassifiedError::classify(&err).status_code(), status, "{err}");
        }
    }

    #[test]
    fn upstream_error_keeps_raw_detail() {
        let classified = ClassifiedError::classify(&UpstreamError::Status {
            status: 403,
            message: "API key not valid".into(),
        });
        assert_eq!(
            classified,
            ClassifiedError::UpstreamError {
                status: 403,
                detail: "API key not valid".into()
            }
        );
        assert!(classified.user_message().contains("API key not valid"));
    }

    #[test]
    fn internal_error_hides_detail() {
        let classified =
            ClassifiedError::classify(&UpstreamError::Other("secret path /srv".into()));
        assert_eq!(classified, ClassifiedError::Internal);
        assert!(!classified.user_message().contains("/srv"));
        assert!(!classified.to_string().contains("/srv"));
    }

    #[test]
    fn invocation_error_keeps_classified_status() {
        let err: DocQueryError = ClassifiedError::RateLimited.into();
        assert_eq!(err.status_code(), 429);
        assert_eq!(DocQueryError::EmptyQuery.status_code(), 400);
        assert_eq!(DocQueryError::DocumentNotFound(Uuid::nil()).status_code(), 404);
    }
}
