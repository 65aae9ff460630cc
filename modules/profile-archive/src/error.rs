use profile_common::{PlatformTag, SkipReason};

/// Per-row extraction failure. Consumed only at the orchestrator boundary,
/// where it becomes a skip record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("No profile URL")]
    MissingUrl,

    #[error("Network error for {url}: {detail}")]
    Network { url: String, detail: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No working extraction strategy for platform {0}")]
    Unsupported(PlatformTag),

    #[error("Sign-in required to read {0}")]
    AuthRequired(String),
}

impl ExtractionError {
    pub fn network(url: &str, detail: impl Into<String>) -> Self {
        ExtractionError::Network {
            url: url.to_string(),
            detail: detail.into(),
        }
    }

    pub fn skip_reason(&self) -> SkipReason {
        match self {
            ExtractionError::MissingUrl => SkipReason::MissingUrl,
            ExtractionError::Network { .. } => SkipReason::NetworkError,
            ExtractionError::HttpStatus { .. } => SkipReason::HttpStatus,
            ExtractionError::Parse(_) => SkipReason::ParseError,
            ExtractionError::Unsupported(_) => SkipReason::ExtractionUnsupported,
            ExtractionError::AuthRequired(_) => SkipReason::AuthRequired,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ExtractionError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
