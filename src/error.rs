//! Error types for the datainsight library.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for datainsight operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of characters of a response body kept in an error.
pub(crate) const BODY_SNIPPET_LEN: usize = 512;

/// Error types that can occur while submitting, decoding, or normalizing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing local files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No API key was configured.
    #[error("API key is missing (set DATAINSIGHT_API_KEY or pass one explicitly)")]
    MissingApiKey,

    /// The file exceeds the upload ceiling and was not sent.
    #[error("File '{name}' is too large ({size} bytes, max {max} bytes)")]
    FileTooLarge {
        /// File name as it would have been uploaded
        name: String,
        /// Actual size in bytes
        size: u64,
        /// Configured ceiling in bytes
        max: u64,
    },

    /// The service rejected the API key (HTTP 401/403).
    #[error("Authentication failed (HTTP {status}): {body}")]
    Auth {
        /// HTTP status code
        status: u16,
        /// Response body snippet
        body: String,
    },

    /// The service answered with a non-success status.
    #[error("Request failed (HTTP {status}): {body}")]
    Transport {
        /// HTTP status code
        status: u16,
        /// Response body snippet
        body: String,
    },

    /// The request deadline elapsed before the response was complete.
    #[error("Request timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// Configured deadline
        timeout: Duration,
    },

    /// The service could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response bytes are not a readable archive.
    #[error("Invalid response archive: {reason} (members: {members:?})")]
    ArchiveFormat {
        /// Underlying decoder message
        reason: String,
        /// Member names seen before the failure
        members: Vec<String>,
    },

    /// The archive holds no JSON member.
    #[error("No JSON payload in response archive (members: {members:?})")]
    MissingPayload {
        /// Member names present in the archive
        members: Vec<String>,
    },

    /// The JSON member could not be parsed.
    #[error("Invalid JSON in '{member}': {reason} (members: {members:?})")]
    PayloadParse {
        /// Name of the selected JSON member
        member: String,
        /// Parser message
        reason: String,
        /// Member names present in the archive
        members: Vec<String>,
    },

    /// A structurally required field is missing or has the wrong shape.
    #[error("Schema error at {path}: {reason}")]
    Schema {
        /// JSON path of the offending field (e.g. `$.pages`)
        path: String,
        /// What was expected
        reason: String,
    },

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Build an error from a non-success HTTP status and its response body.
    ///
    /// 401 and 403 become [`Error::Auth`]; everything else is
    /// [`Error::Transport`]. The body is cut down to a short snippet.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = snippet(body);
        match status {
            401 | 403 => Error::Auth { status, body },
            _ => Error::Transport { status, body },
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the service rejected the credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }

    /// Whether this is an HTTP-level failure (including auth failures).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Auth { .. } | Error::Transport { .. })
    }

    /// Whether a caller may retry the same request later.
    ///
    /// Retries must still respect the service rate limit.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::Timeout { .. } | Error::Connection(_)
        )
    }
}

fn snippet(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FileTooLarge {
            name: "big.pdf".to_string(),
            size: 30,
            max: 25,
        };
        assert_eq!(
            err.to_string(),
            "File 'big.pdf' is too large (30 bytes, max 25 bytes)"
        );

        let err = Error::Timeout {
            timeout: Duration::from_secs(600),
        };
        assert_eq!(err.to_string(), "Request timed out after 600s");
    }

    #[test]
    fn test_from_status_auth() {
        let err = Error::from_status(401, "invalid api key");
        assert!(err.is_auth());
        assert!(err.is_transport());
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(401));

        assert!(Error::from_status(403, "forbidden").is_auth());
    }

    #[test]
    fn test_from_status_transport() {
        let err = Error::from_status(503, "busy");
        assert!(!err.is_auth());
        assert!(err.is_transport());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_body_snippet_truncated() {
        let body = "x".repeat(2000);
        match Error::from_status(500, &body) {
            Error::Transport { body, .. } => {
                assert_eq!(body.chars().count(), BODY_SNIPPET_LEN + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_archive_errors_list_members() {
        let err = Error::MissingPayload {
            members: vec!["page_1.png".to_string()],
        };
        assert!(err.to_string().contains("page_1.png"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
