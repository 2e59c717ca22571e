use thiserror::Error;

/// Failure taxonomy shared by every engine capability.
///
/// Per-indicator failures are recorded as status and never abort a batch;
/// only exhausted fallback chains surface one of these to a caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("request to '{url}' timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("series '{series}' requires a credential that is not configured")]
    MissingCredential { series: String },

    #[error("insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("series '{left}' and '{right}' share no aligned dates")]
    NoOverlap { left: String, right: String },

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("invalid calendar date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
}

impl EngineError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure(message.into())
    }

    /// Stable machine-readable code used in consumer-facing error objects.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "fetch.timeout",
            Self::TransportFailure(_) => "fetch.transport_failure",
            Self::MissingCredential { .. } => "source.missing_credential",
            Self::InsufficientHistory(_) => "history.insufficient",
            Self::NoOverlap { .. } => "series.no_overlap",
            Self::CacheUnavailable(_) => "cache.unavailable",
            Self::InvalidDate { .. } => "series.invalid_date",
        }
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
