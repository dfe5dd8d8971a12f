use std::fmt;

// =========================================================
// Error origin
// =========================================================

/// Where a fetch failure came from.
///
/// Recorded for diagnostics only: the route list treats every origin the
/// same way and never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorOrigin {
    /// Connection, DNS or TLS failure before a response arrived.
    Network,
    /// The backend answered with a non-2xx status.
    Backend { status: u16 },
    /// The response body was not the expected JSON.
    Decode,
    /// No answer within the configured fetch timeout.
    Timeout,
}

impl FetchErrorOrigin {
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchErrorOrigin::Network => "NETWORK_ERROR",
            FetchErrorOrigin::Backend { .. } => "BACKEND_ERROR",
            FetchErrorOrigin::Decode => "DECODE_ERROR",
            FetchErrorOrigin::Timeout => "TIMEOUT",
        }
    }
}

// =========================================================
// Operation trail
// =========================================================

/// One step of the operation trail attached to an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    /// e.g. "routes.fetch_by_date", "http.send"
    pub operation: String,
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// Fetch error
// =========================================================

/// A failed route fetch.
///
/// This is the only error kind the route list sees. Network, backend and
/// decoding problems all arrive as `FetchError`; `origin` says which one it
/// was for the logs.
#[derive(Debug)]
pub struct FetchError {
    pub origin: FetchErrorOrigin,
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl FetchError {
    pub fn new(origin: FetchErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            origin,
            message: message.into(),
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorOrigin::Network, message)
    }

    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::new(FetchErrorOrigin::Backend { status }, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(FetchErrorOrigin::Decode, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FetchErrorOrigin::Timeout, message)
    }

    // --- Context builders ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.origin.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

// =========================================================
// Conversions
// =========================================================

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        let err = if e.is_timeout() {
            FetchError::timeout(e.to_string())
        } else if e.is_decode() {
            FetchError::decode(e.to_string())
        } else {
            FetchError::network(e.to_string())
        };
        err.with_source(e)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::decode(e.to_string()).with_source(e)
    }
}

// =========================================================
// Configuration errors
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set (or is blank).
    Missing(&'static str),
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing required variable {}", key),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "invalid value '{}' for {}: {}", value, key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_includes_trace() {
        let err = FetchError::backend(503, "service unavailable")
            .in_op("http.send")
            .in_op_with("routes.fetch_by_date", "2024-06-10");
        assert_eq!(
            err.to_string(),
            "[BACKEND_ERROR] service unavailable | trace: http.send -> routes.fetch_by_date(2024-06-10)"
        );
        assert_eq!(err.spans().len(), 2);
    }

    #[test]
    fn test_serde_error_becomes_decode_with_source() {
        let json_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = FetchError::from(json_err);
        assert_eq!(err.origin, FetchErrorOrigin::Decode);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::Missing("SUPABASE_URL").to_string(),
            "missing required variable SUPABASE_URL"
        );
    }
}
