//! tutordesk-core - Core types and traits for the tutordesk data-access layer.
//!
//! This crate defines the vocabulary shared by the network layer and its
//! consumers: the error taxonomy, credential and token types, the query
//! model for paginated list screens, resource models, and the [`ListLoader`]
//! seam that list controllers are parameterized over.
//!
//! Nothing in this crate performs I/O; the HTTP client lives in
//! `tutordesk-client`.

pub mod api_url;
pub mod auth;
pub mod error;
pub mod loader;
pub mod query;
pub mod resource;

pub use api_url::ApiUrl;
pub use auth::{AccessToken, Credentials, RefreshToken, TokenPair};
pub use error::{AuthError, Error, QueryError, ServerError, TransportError};
pub use loader::ListLoader;
pub use query::{ListResult, QueryDescriptor, QueryToken, DEFAULT_PAGE_SIZE};
pub use resource::{Account, Advisor, AdvisorPayload, ApiPage, Student, StudentPayload, Supervisor};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
