//! Opaque bearer token newtypes.
//!
//! Both token kinds are treated as opaque strings: nothing here parses or
//! inspects them, and neither ever appears in `Debug` output. The only way
//! to get at the raw value is `as_str`, which the gateway uses when it
//! builds the `Authorization` header or a renewal request body.

use std::fmt;

/// Short-lived token sent as `Authorization: Bearer <token>` on every
/// authenticated request.
#[derive(Clone)]
pub struct AccessToken(String);

/// Longer-lived token exchanged for a fresh access token when the current
/// one expires, without involving the user.
#[derive(Clone)]
pub struct RefreshToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value. Only for header construction; never log it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RefreshToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value. Only for renewal request bodies; never log it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// A snapshot of the tokens held by a credential store.
///
/// `None` fields model the unauthenticated sentinel: a cleared store
/// reports a pair with neither token present.
#[derive(Debug, Clone, Default)]
pub struct TokenPair {
    /// The current access token, if any.
    pub access: Option<AccessToken>,
    /// The current refresh token, if any.
    pub refresh: Option<RefreshToken>,
}

impl TokenPair {
    /// True if an access token is present.
    pub fn is_authenticated(&self) -> bool {
        self.access.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_leaks_token_material() {
        let access = AccessToken::new("eyJhbGciOiJIUzI1NiJ9.payload.sig");
        let refresh = RefreshToken::new("long-lived-refresh-value");
        let rendered = format!("{access:?} {refresh:?}");
        assert!(!rendered.contains("eyJ"));
        assert!(!rendered.contains("long-lived"));
        assert_eq!(rendered.matches("[REDACTED]").count(), 2);
    }

    #[test]
    fn empty_pair_is_unauthenticated() {
        assert!(!TokenPair::default().is_authenticated());
        let pair = TokenPair {
            access: Some(AccessToken::new("t1")),
            refresh: None,
        };
        assert!(pair.is_authenticated());
    }
}
