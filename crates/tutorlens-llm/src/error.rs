#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid or missing API key")]
    Auth,

    #[error("quota exhausted")]
    QuotaExceeded,

    #[error("model {model} not available")]
    ModelNotFound { model: String },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("{provider} API request failed (status {status})")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Map a non-2xx upstream response to an error class.
    ///
    /// Status codes are authoritative where the transport exposes them;
    /// the body scan below only breaks ties for untyped 400s (Gemini
    /// reports an invalid key as 400 `API_KEY_INVALID`, not 401).
    pub(crate) fn from_status(
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
        model: &str,
    ) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth,
            404 => Self::ModelNotFound {
                model: model.to_owned(),
            },
            429 => Self::QuotaExceeded,
            _ => Self::classify_body(&body).unwrap_or(Self::Api {
                provider,
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// Substring classification for error text without a usable status code.
    ///
    /// Markers are kept narrow: a bare "key" would match too many unrelated
    /// messages and misreport auth failures.
    fn classify_body(body: &str) -> Option<Self> {
        let lower = body.to_lowercase();
        if lower.contains("api key")
            || lower.contains("api_key_invalid")
            || lower.contains("unauthenticated")
        {
            return Some(Self::Auth);
        }
        if lower.contains("quota") || lower.contains("resource_exhausted") {
            return Some(Self::QuotaExceeded);
        }
        None
    }

    /// Connectivity-level failure: the request never produced a response.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }

    /// Whether a failed primary call may be retried once on the fallback
    /// model. Auth, quota, and connectivity failures would fail identically
    /// on any model and never qualify.
    #[must_use]
    pub fn allows_fallback(&self) -> bool {
        match self {
            Self::ModelNotFound { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
