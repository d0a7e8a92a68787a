//! Authentication primitives.
//!
//! Opaque token newtypes and the login credentials type. The mutable
//! credential cell itself lives in `tutordesk-client`; this module only
//! defines the values it holds.

mod credentials;
mod tokens;

pub use credentials::Credentials;
pub use tokens::{AccessToken, RefreshToken, TokenPair};
