//! API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, QueryError};

/// A validated base URL for the dashboard API.
///
/// Must be HTTPS, or HTTP for localhost (used by tests against a mock
/// server). Endpoint paths are joined under `/api/`.
///
/// # Example
///
/// ```
/// use tutordesk_core::ApiUrl;
///
/// let base = ApiUrl::new("https://api.example.com").unwrap();
/// assert_eq!(base.endpoint("students"), "https://api.example.com/api/students");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiUrl(Url);

impl ApiUrl {
    /// Create a new API URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute, has no host, or uses a
    /// scheme other than HTTPS (HTTP is allowed only for localhost).
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| invalid(s, &e.to_string()))?;

        Self::validate(&url, s)?;

        // Normalize: remove trailing slash
        let normalized = if url.path() == "/" {
            let mut u = url.clone();
            u.set_path("");
            u
        } else {
            url
        };

        Ok(Self(normalized))
    }

    /// Returns the full URL for an API endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        // The URL crate always adds a trailing slash to root paths,
        // so trim it before joining the endpoint path
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/api/{}", base, path.trim_start_matches('/'))
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(invalid(original, "must be an absolute URL"));
        }

        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "::1");

        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(invalid(
                original,
                "must use HTTPS (HTTP allowed only for localhost)",
            ));
        }

        if url.host_str().is_none() {
            return Err(invalid(original, "must have a host"));
        }

        Ok(())
    }
}

fn invalid(value: &str, reason: &str) -> Error {
    // Reuse the query-validation channel: a bad base URL is a client-side
    // configuration error and never reaches the network.
    Error::InvalidQuery(QueryError::InvalidBaseUrl {
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let base = ApiUrl::new("https://api.example.com").unwrap();
        assert_eq!(base.host(), Some("api.example.com"));
    }

    #[test]
    fn valid_localhost_http() {
        let base = ApiUrl::new("http://localhost:8000").unwrap();
        assert_eq!(base.host(), Some("localhost"));
    }

    #[test]
    fn endpoint_construction() {
        let base = ApiUrl::new("https://api.example.com").unwrap();
        assert_eq!(
            base.endpoint("students"),
            "https://api.example.com/api/students"
        );
    }

    #[test]
    fn normalizes_trailing_slash() {
        let base = ApiUrl::new("https://api.example.com/").unwrap();
        assert_eq!(
            base.endpoint("auth/login"),
            "https://api.example.com/api/auth/login"
        );
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(ApiUrl::new("http://api.example.com").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(ApiUrl::new("/api/students").is_err());
    }
}
