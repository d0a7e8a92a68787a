//! Error types for the tutordesk data-access layer.
//!
//! The taxonomy separates failures by how the caller should react:
//! transport errors never trigger credential renewal, auth errors route the
//! user back to login, server errors carry a display-ready message, and
//! cancellations are absorbed before they reach the UI.

use std::fmt;
use thiserror::Error;

/// The unified error type for tutordesk operations.
///
/// Every variant except [`Error::Cancelled`] may surface to a list screen's
/// failed state; cancellations are swallowed at the fetcher/controller
/// boundary when a newer request supersedes an older one.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("network error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (invalid credentials, unrecoverable session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A 4xx/5xx response with an error body.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// The request was superseded and aborted before it resolved.
    #[error("request cancelled")]
    Cancelled,

    /// Client-side query validation failure; no network call was made.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),
}

impl Error {
    /// True if this error marks a superseded request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// True if this error means the user must re-authenticate.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed (DNS, TCP, TLS).
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Other HTTP-level failure, including undecodable response bodies.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No credentials are stored; the caller never logged in.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Login was rejected by the server.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session expired and renewal failed; credentials were cleared.
    #[error("session expired")]
    SessionExpired,

    /// No refresh token or cached principal is available for renewal.
    #[error("refresh token invalid")]
    RefreshTokenInvalid,
}

/// A 4xx/5xx response from the server.
///
/// Carries enough information for a toast or banner to render a
/// human-readable message without further lookups.
#[derive(Debug, Clone)]
pub struct ServerError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code from the body, if present.
    pub code: Option<String>,
    /// Error message from the server, if present.
    pub message: Option<String>,
}

impl ServerError {
    /// Create a new server error.
    pub fn new(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    /// Check if this response indicates an authentication problem.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
            || self.code.as_deref() == Some("token_not_valid")
            || self.code.as_deref() == Some("authentication_failed")
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServerError {}

/// Query validation errors, raised before any network call.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Pages are 1-based; page 0 is never valid.
    #[error("page must be at least 1")]
    PageZero,

    /// A page size of 0 can never produce a page.
    #[error("page size must be at least 1")]
    PageSizeZero,

    /// The requested page lies beyond the known last page.
    #[error("page {page} is out of range (total pages: {total_pages})")]
    PageOutOfRange { page: u32, total_pages: u32 },

    /// The configured API base URL is not usable.
    #[error("invalid base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}
