//! The loader seam between list controllers and the network layer.

use async_trait::async_trait;

use crate::query::{ListResult, QueryDescriptor};
use crate::Result;

/// Loads one page of results for a list screen.
///
/// List controllers are parameterized over this trait: production code
/// implements it on top of the typed API facade, and tests implement fakes
/// with controllable latency and failures.
#[async_trait]
pub trait ListLoader<T>: Send + Sync {
    /// Fetch the page described by `query`.
    async fn load(&self, query: &QueryDescriptor) -> Result<ListResult<T>>;
}
