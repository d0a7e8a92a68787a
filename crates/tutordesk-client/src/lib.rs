//! tutordesk-client - Authenticated, cancellable, paginated data access.
//!
//! This crate is the network core of the tutordesk dashboard. It provides:
//!
//! - [`CredentialStore`] - the single owner of access/refresh tokens
//! - [`AuthGateway`] - an HTTP client that attaches bearer credentials and,
//!   on a 401, coordinates a single token renewal and replays the failed
//!   request exactly once
//! - [`CancellableFetcher`] - at most one live request per logical stream;
//!   superseded requests are aborted cooperatively
//! - [`ListController`] - pagination/filter/search state for one list
//!   screen, with debounced refetches and token-guarded result application
//! - [`Api`] - thin typed per-resource functions over the gateway
//!
//! # Example
//!
//! ```no_run
//! use tutordesk_client::{Api, AuthGateway, CredentialStore, ListController};
//! use tutordesk_core::{ApiUrl, Credentials, QueryDescriptor};
//!
//! # async fn example() -> tutordesk_core::Result<()> {
//! let store = CredentialStore::new();
//! let gateway = AuthGateway::new(ApiUrl::new("https://api.example.com")?, store);
//! gateway.login(Credentials::new("admin", "hunter2")).await?;
//!
//! let api = Api::new(gateway);
//! let controller = ListController::new(api.students(), QueryDescriptor::new("students"));
//! let mut states = controller.subscribe();
//! controller.submit();
//! states.wait_for(|state| !state.is_fetching()).await.ok();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod controller;
pub mod fetcher;
pub mod gateway;
pub mod store;

pub use api::{Api, PagedEndpoint};
pub use controller::{ListController, ListState, DEFAULT_DEBOUNCE};
pub use fetcher::CancellableFetcher;
pub use gateway::AuthGateway;
pub use store::CredentialStore;
