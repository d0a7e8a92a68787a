//! The auth gateway: bearer-authenticated HTTP with single-shot renewal.
//!
//! Every outbound request carries the current access token. A 401 response
//! triggers at most one credential renewal, coalesced across concurrent
//! requests, after which the original request is replayed exactly once.
//! Any other status, including a second 401 on the replay, is surfaced
//! as-is; there is no unbounded retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use tutordesk_core::{
    AccessToken, ApiUrl, AuthError, Credentials, Error, RefreshToken, Result, ServerError,
    TransportError,
};

use crate::store::CredentialStore;

/// HTTP request timeout. Long enough for slow report endpoints, short
/// enough to fail before the user gives up on the screen.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body for the login endpoint.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Request body for the token renewal endpoint.
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Token pair returned by the login and renewal endpoints.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
    refresh: String,
}

/// Error body shape used by the API for non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "error")]
    code: Option<String>,
    #[serde(default, alias = "detail")]
    message: Option<String>,
}

/// Bearer-authenticated HTTP gateway.
///
/// Cheap to clone; clones share the connection pool, the credential store,
/// and the refresh gate, so concurrent 401s from any number of list screens
/// collapse into a single renewal call.
#[derive(Clone)]
pub struct AuthGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    http: reqwest::Client,
    base: ApiUrl,
    store: CredentialStore,
    /// Serializes renewal attempts; the cell holds the failure of the
    /// last attempt that left the store untouched (a transport error).
    /// Held only for the duration of the renewal call itself, never
    /// across a replayed request.
    refresh_gate: tokio::sync::Mutex<Option<Error>>,
    /// Incremented (under the gate) after every renewal attempt, whether
    /// or not it changed the store. A waiter whose observed epoch moved
    /// reuses the settled attempt's outcome instead of renewing again.
    renew_epoch: AtomicU64,
}

impl AuthGateway {
    /// Create a gateway for the given API base URL and credential store.
    pub fn new(base: ApiUrl, store: CredentialStore) -> Self {
        Self::with_timeout(base, store, REQUEST_TIMEOUT)
    }

    /// Create a gateway with a custom request timeout.
    pub fn with_timeout(base: ApiUrl, store: CredentialStore, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tutordesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            inner: Arc::new(GatewayInner {
                http,
                base,
                store,
                refresh_gate: tokio::sync::Mutex::new(None),
                renew_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the credential store shared by this gateway.
    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// Returns the API base URL this gateway is configured for.
    pub fn base(&self) -> &ApiUrl {
        &self.inner.base
    }

    /// Authenticate with username and password.
    ///
    /// On success the store holds the returned tokens and caches the
    /// credentials as the re-login hint.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: Credentials) -> Result<()> {
        info!("logging in");

        let request = LoginRequest {
            username: credentials.username(),
            password: credentials.password(),
        };
        let url = self.inner.base.endpoint("auth/login");
        let response = self
            .inner
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(from_reqwest)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials.into());
        }
        let response = Self::into_result(response).await?;
        let tokens: TokenResponse = response.json().await.map_err(from_reqwest)?;

        self.inner.store.set(
            AccessToken::new(tokens.access),
            Some(RefreshToken::new(tokens.refresh)),
        );
        self.inner.store.set_principal(credentials);

        debug!("login succeeded");
        Ok(())
    }

    /// Drop all credentials. Subsequent requests fail until the next login.
    pub fn logout(&self) {
        self.inner.store.clear();
        info!("logged out");
    }

    /// Authenticated GET returning a JSON body.
    #[instrument(skip(self, params))]
    pub async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<R> {
        let url = self.inner.base.endpoint(path);
        let response = self
            .send_authed(|http| http.get(&url).query(params))
            .await?;
        response.json().await.map_err(from_reqwest)
    }

    /// Authenticated POST with a JSON body, returning a JSON body.
    #[instrument(skip(self, body))]
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.inner.base.endpoint(path);
        let response = self
            .send_authed(|http| http.post(&url).json(body))
            .await?;
        response.json().await.map_err(from_reqwest)
    }

    /// Authenticated PUT with a JSON body, returning a JSON body.
    #[instrument(skip(self, body))]
    pub async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.inner.base.endpoint(path);
        let response = self.send_authed(|http| http.put(&url).json(body)).await?;
        response.json().await.map_err(from_reqwest)
    }

    /// Authenticated DELETE, discarding the response body.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.inner.base.endpoint(path);
        self.send_authed(|http| http.delete(&url)).await?;
        Ok(())
    }

    /// Issue an authenticated request; on a 401, renew once and replay once.
    ///
    /// The builder closure is invoked again for the replay so the retried
    /// request is an exact rebuild of the original.
    async fn send_authed<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let generation = self.inner.store.generation();
        let epoch = self.inner.renew_epoch.load(Ordering::SeqCst);
        let token = self.access_token()?;

        let response = build(&self.inner.http)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(from_reqwest)?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::into_result(response).await;
        }

        debug!("received 401, attempting credential renewal");
        let token = self.renew(generation, epoch).await?;

        let retried = build(&self.inner.http)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(from_reqwest)?;

        // Exactly one replay: a second 401 maps to an auth error below and
        // never re-enters the renewal path.
        Self::into_result(retried).await
    }

    fn access_token(&self) -> Result<AccessToken> {
        self.inner
            .store
            .snapshot()
            .access
            .ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    /// Renew credentials, coalescing concurrent attempts.
    ///
    /// `generation` and `epoch` were recorded before the failed request.
    /// If either moved while waiting at the gate, another request already
    /// settled a renewal for the same token burst and its outcome is
    /// reused instead of renewing again: a moved generation means the
    /// store was rewritten (new tokens or a clear), a moved epoch with an
    /// untouched store means the attempt failed in transit and its error
    /// is cached at the gate.
    async fn renew(&self, generation: u64, epoch: u64) -> Result<AccessToken> {
        let mut last_failure = self.inner.refresh_gate.lock().await;

        if self.inner.store.generation() != generation {
            return self
                .access_token()
                .map_err(|_| AuthError::SessionExpired.into());
        }
        if self.inner.renew_epoch.load(Ordering::SeqCst) != epoch {
            if let Some(err) = last_failure.clone() {
                debug!("reusing failed renewal outcome");
                return Err(err);
            }
        }

        let outcome = self.renew_locked().await;
        self.inner.renew_epoch.fetch_add(1, Ordering::SeqCst);

        match outcome {
            Ok(token) => {
                *last_failure = None;
                Ok(token)
            }
            // A transport failure says nothing about credential validity;
            // keep the stored tokens so a later burst can try again, and
            // cache the error for waiters already queued behind this one.
            Err(Error::Transport(err)) => {
                warn!(error = %err, "credential renewal failed at transport level");
                *last_failure = Some(Error::Transport(err.clone()));
                Err(Error::Transport(err))
            }
            Err(err) => {
                warn!(error = %err, "credential renewal rejected, clearing session");
                *last_failure = None;
                self.inner.store.clear();
                Err(AuthError::SessionExpired.into())
            }
        }
    }

    /// Perform the renewal call while holding the refresh gate.
    ///
    /// Prefers the refresh token; falls back to re-login from the cached
    /// principal when no refresh token exists.
    async fn renew_locked(&self) -> Result<AccessToken> {
        let snapshot = self.inner.store.snapshot();

        let tokens: TokenResponse = if let Some(refresh) = snapshot.refresh {
            info!("refreshing access token");
            let request = RefreshRequest {
                refresh: refresh.as_str(),
            };
            self.post_unauthed("auth/refresh", &request).await?
        } else if let Some(principal) = self.inner.store.principal() {
            info!("no refresh token cached, re-authenticating");
            let request = LoginRequest {
                username: principal.username(),
                password: principal.password(),
            };
            self.post_unauthed("auth/login", &request).await?
        } else {
            return Err(AuthError::RefreshTokenInvalid.into());
        };

        let access = AccessToken::new(tokens.access);
        self.inner
            .store
            .set(access.clone(), Some(RefreshToken::new(tokens.refresh)));

        debug!("credential renewal succeeded");
        Ok(access)
    }

    /// POST without attaching credentials; used by the renewal calls.
    async fn post_unauthed<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.inner.base.endpoint(path);
        let response = self
            .inner
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;
        let response = Self::into_result(response).await?;
        response.json().await.map_err(from_reqwest)
    }

    /// Classify a response: success passes through, 401 becomes an auth
    /// error, anything else becomes a server error with the parsed body.
    async fn into_result(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::SessionExpired.into());
        }
        Err(Error::Server(Self::parse_error(response).await))
    }

    /// Parse an error response body, tolerating non-JSON bodies.
    async fn parse_error(response: reqwest::Response) -> ServerError {
        let status = response.status().as_u16();
        match response.json::<ErrorBody>().await {
            Ok(body) => ServerError::new(status, body.code, body.message),
            Err(_) => ServerError::new(status, None, None),
        }
    }
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("base", &self.inner.base)
            .field("store", &self.inner.store)
            .finish()
    }
}

/// Map a reqwest failure onto the transport taxonomy.
fn from_reqwest(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}
