use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::retry::Retryable;

/// HTTP statuses that indicate a transient condition on the API side.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Error)]
pub enum ClaudeClientError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("{kind} error: {message}")]
    Transport { kind: TransportKind, message: String },

    #[error("Failed to parse API response: {source}\n  body: {body}")]
    InvalidResponse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API response contained no text content")]
    EmptyResponse,

    #[error("ANTHROPIC_API_KEY is required")]
    MissingApiKey,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClaudeClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClaudeClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl Retryable for ClaudeClientError {
    fn is_retryable(&self) -> bool {
        match self {
            ClaudeClientError::Api { status, .. } => RETRYABLE_STATUSES.contains(status),
            ClaudeClientError::Transport { kind, .. } => kind.is_transient(),
            ClaudeClientError::InvalidResponse { .. }
            | ClaudeClientError::EmptyResponse
            | ClaudeClientError::MissingApiKey
            | ClaudeClientError::Io(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClaudeClientError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else {
            TransportKind::classify(&err, err.is_connect())
        };
        ClaudeClientError::Transport {
            kind,
            message: err.to_string(),
        }
    }
}

// ─── TransportKind ────────────────────────────────────────────────────────

/// Coarse category of a network failure that never produced an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    /// Connection refused, reset, aborted, or dropped mid-request.
    Connection,
    Dns,
    Other,
}

impl TransportKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, TransportKind::Other)
    }

    /// Walk an error's source chain looking for a recognisable network cause.
    ///
    /// `connect_failed` marks errors the HTTP layer already knows happened
    /// while establishing the connection; they fall back to `Connection`.
    pub fn classify(err: &(dyn StdError + 'static), connect_failed: bool) -> Self {
        let mut current: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(io) = e.downcast_ref::<std::io::Error>() {
                use std::io::ErrorKind;
                match io.kind() {
                    ErrorKind::TimedOut => return TransportKind::Timeout,
                    ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::ConnectionRefused
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof => return TransportKind::Connection,
                    _ => {}
                }
            }
            let text = e.to_string().to_ascii_lowercase();
            if text.contains("dns error") || text.contains("failed to lookup address") {
                return TransportKind::Dns;
            }
            current = e.source();
        }
        if connect_failed {
            TransportKind::Connection
        } else {
            TransportKind::Other
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Timeout => "timeout",
            TransportKind::Connection => "connection",
            TransportKind::Dns => "DNS",
            TransportKind::Other => "transport",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ClaudeClientError {
        ClaudeClientError::Api {
            status,
            message: "boom".into(),
        }
    }

    #[test]
    fn transient_statuses_are_retryable() {
        for status in RETRYABLE_STATUSES {
            assert!(api(status).is_retryable(), "{status} should retry");
        }
    }

    #[test]
    fn client_errors_are_terminal() {
        for status in [400, 401, 403, 404, 413, 422, 501] {
            assert!(!api(status).is_retryable(), "{status} should not retry");
        }
    }

    #[test]
    fn io_reset_classifies_as_connection() {
        let io = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert_eq!(TransportKind::classify(&io, false), TransportKind::Connection);
    }

    #[test]
    fn refused_and_aborted_are_connection_and_transient() {
        use std::io::ErrorKind;
        for kind in [ErrorKind::ConnectionRefused, ErrorKind::ConnectionAborted] {
            let io = std::io::Error::from(kind);
            let classified = TransportKind::classify(&io, false);
            assert_eq!(classified, TransportKind::Connection, "{kind:?}");
            assert!(classified.is_transient());
        }
    }

    #[test]
    fn io_timeout_classifies_as_timeout() {
        let io = std::io::Error::from(std::io::ErrorKind::TimedOut);
        assert_eq!(TransportKind::classify(&io, false), TransportKind::Timeout);
    }

    #[test]
    fn dns_message_classifies_as_dns() {
        let io = std::io::Error::other("dns error: failed to lookup address information");
        assert_eq!(TransportKind::classify(&io, true), TransportKind::Dns);
    }

    #[test]
    fn unknown_cause_falls_back_on_connect_flag() {
        let io = std::io::Error::other("something odd");
        assert_eq!(TransportKind::classify(&io, false), TransportKind::Other);
        assert_eq!(TransportKind::classify(&io, true), TransportKind::Connection);
    }

    #[test]
    fn other_transport_and_parse_errors_are_terminal() {
        let other = ClaudeClientError::Transport {
            kind: TransportKind::Other,
            message: "builder".into(),
        };
        assert!(!other.is_retryable());
        assert!(!ClaudeClientError::EmptyResponse.is_retryable());
        assert!(!ClaudeClientError::MissingApiKey.is_retryable());
    }

    #[test]
    fn status_accessor() {
        assert_eq!(api(503).status(), Some(503));
        assert_eq!(ClaudeClientError::EmptyResponse.status(), None);
    }
}
