//! Typed per-resource functions over the auth gateway.
//!
//! The facade owns no state and adds no behavior: it builds endpoint paths
//! and payloads, delegates to [`AuthGateway`], and passes errors through
//! unmodified. List screens attach to it through the [`PagedEndpoint`]
//! adapters, which implement [`ListLoader`] for a controller to consume.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::instrument;

use tutordesk_core::{
    Account, Advisor, AdvisorPayload, ApiPage, Credentials, ListLoader, ListResult,
    QueryDescriptor, Result, Student, StudentPayload, Supervisor,
};

use crate::gateway::AuthGateway;

/// Typed facade over the dashboard API.
///
/// Cheap to clone; clones share the gateway's connection pool and
/// credential store.
#[derive(Debug, Clone)]
pub struct Api {
    gateway: AuthGateway,
}

impl Api {
    /// Wrap a gateway in the typed facade.
    pub fn new(gateway: AuthGateway) -> Self {
        Self { gateway }
    }

    /// Returns the underlying gateway.
    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Authenticate; see [`AuthGateway::login`].
    pub async fn login(&self, credentials: Credentials) -> Result<()> {
        self.gateway.login(credentials).await
    }

    /// Drop credentials; see [`AuthGateway::logout`].
    pub fn logout(&self) {
        self.gateway.logout();
    }

    // ===== Students =====

    pub async fn list_students(&self, query: &QueryDescriptor) -> Result<ListResult<Student>> {
        self.list("students", query).await
    }

    pub async fn get_student(&self, id: i64) -> Result<Student> {
        self.gateway.get_json(&format!("students/{id}"), &[]).await
    }

    pub async fn create_student(&self, payload: &StudentPayload) -> Result<Student> {
        self.gateway.post_json("students", payload).await
    }

    pub async fn update_student(&self, id: i64, payload: &StudentPayload) -> Result<Student> {
        self.gateway
            .put_json(&format!("students/{id}"), payload)
            .await
    }

    pub async fn delete_student(&self, id: i64) -> Result<()> {
        self.gateway.delete(&format!("students/{id}")).await
    }

    /// Loader for student list screens.
    pub fn students(&self) -> PagedEndpoint<Student> {
        PagedEndpoint::new(self.clone(), "students")
    }

    // ===== Advisors =====

    pub async fn list_advisors(&self, query: &QueryDescriptor) -> Result<ListResult<Advisor>> {
        self.list("advisors", query).await
    }

    pub async fn create_advisor(&self, payload: &AdvisorPayload) -> Result<Advisor> {
        self.gateway.post_json("advisors", payload).await
    }

    pub async fn delete_advisor(&self, id: i64) -> Result<()> {
        self.gateway.delete(&format!("advisors/{id}")).await
    }

    /// Loader for advisor list screens.
    pub fn advisors(&self) -> PagedEndpoint<Advisor> {
        PagedEndpoint::new(self.clone(), "advisors")
    }

    // ===== Supervisors =====

    pub async fn list_supervisors(
        &self,
        query: &QueryDescriptor,
    ) -> Result<ListResult<Supervisor>> {
        self.list("supervisors", query).await
    }

    /// Loader for supervisor list screens.
    pub fn supervisors(&self) -> PagedEndpoint<Supervisor> {
        PagedEndpoint::new(self.clone(), "supervisors")
    }

    // ===== Accounts (user/role management) =====

    pub async fn list_accounts(&self, query: &QueryDescriptor) -> Result<ListResult<Account>> {
        self.list("accounts", query).await
    }

    pub async fn delete_account(&self, id: i64) -> Result<()> {
        self.gateway.delete(&format!("accounts/{id}")).await
    }

    /// Loader for account list screens.
    pub fn accounts(&self) -> PagedEndpoint<Account> {
        PagedEndpoint::new(self.clone(), "accounts")
    }

    /// Fetch one page of a paginated list endpoint.
    #[instrument(skip(self, query), fields(page = query.page()))]
    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryDescriptor,
    ) -> Result<ListResult<T>> {
        query.validate()?;
        let page: ApiPage<T> = self
            .gateway
            .get_json(path, &query.to_query_params())
            .await?;
        Ok(page.into_list_result(query.page(), query.page_size()))
    }
}

/// A [`ListLoader`] bound to one paginated endpoint.
///
/// The endpoint path is fixed at construction; the query descriptor's
/// resource name is informational (used for logging and stream identity).
pub struct PagedEndpoint<T> {
    api: Api,
    path: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PagedEndpoint<T> {
    fn new(api: Api, path: &'static str) -> Self {
        Self {
            api,
            path,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for PagedEndpoint<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            path: self.path,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> ListLoader<T> for PagedEndpoint<T>
where
    T: DeserializeOwned + Send + Sync,
{
    async fn load(&self, query: &QueryDescriptor) -> Result<ListResult<T>> {
        self.api.list(self.path, query).await
    }
}

impl<T> std::fmt::Debug for PagedEndpoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedEndpoint")
            .field("path", &self.path)
            .finish()
    }
}
