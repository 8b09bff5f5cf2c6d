//! Error handling for NP DNS API operations.
//!
//! Remote operations fail in one of two ways: the transport never delivered a
//! usable envelope, or the server answered with a non-success application
//! status. The remaining variants cover local problems that happen before any
//! request is issued.

use std::fmt;

/// Main error type for domain status operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainApiError {
    /// Connection failure, timeout, non-2xx HTTP status, or a body that is not
    /// a valid response envelope.
    Transport {
        /// HTTP status when a response was received at all
        status: Option<u16>,
        message: String,
        /// Raw response body, when there was one
        body: Option<String>,
    },

    /// The request reached the server, which reported a failure in `resStatus`.
    Application {
        code: i64,
        message: String,
    },

    /// A local precondition failed; nothing was sent.
    InvalidRequest {
        message: String,
    },

    /// Invalid or missing configuration (credentials, URLs, durations, ...).
    Config {
        message: String,
    },

    /// Reading a configuration or domain list file failed.
    File {
        path: String,
        message: String,
    },
}

impl DomainApiError {
    /// Transport failure without an HTTP response (connect error, timeout).
    pub fn transport<M: Into<String>>(message: M) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// Transport failure with the HTTP status and raw body of the response.
    pub fn transport_with_status<M: Into<String>, B: Into<String>>(
        status: u16,
        message: M,
        body: B,
    ) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Application-level failure, carrying the server's code and message verbatim.
    pub fn application<M: Into<String>>(code: i64, message: M) -> Self {
        Self::Application {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_request<M: Into<String>>(message: M) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// HTTP status attached to a transport failure, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_application(&self) -> bool {
        matches!(self, Self::Application { .. })
    }

    /// Check if this error suggests the caller may retry the operation.
    ///
    /// Advisory only: the client never retries on its own. Application errors
    /// are never retryable since the server has already judged the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { status: None, .. }
                | Self::Transport {
                    status: Some(429 | 500..=599),
                    ..
                }
        )
    }
}

impl fmt::Display for DomainApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport {
                status: Some(code),
                message,
                ..
            } => write!(f, "Transport error (HTTP {}): {}", code, message),
            Self::Transport {
                status: None,
                message,
                ..
            } => write!(f, "Transport error: {}", message),
            Self::Application { code, message } => {
                write!(f, "API error {}: {}", code, message)
            }
            Self::InvalidRequest { message } => write!(f, "Invalid request: {}", message),
            Self::Config { message } => write!(f, "Configuration error: {}", message),
            Self::File { path, message } => write!(f, "File error at '{}': {}", path, message),
        }
    }
}

impl std::error::Error for DomainApiError {}

impl From<reqwest::Error> for DomainApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::transport(format!("connection failed: {}", err))
        } else {
            Self::Transport {
                status: err.status().map(|s| s.as_u16()),
                message: format!("HTTP request failed: {}", err),
                body: None,
            }
        }
    }
}
