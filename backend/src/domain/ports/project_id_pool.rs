//! Port for the in-process cache of public project ids used when the
//! recommendation service cannot read the current project.
use async_trait::async_trait;

use crate::domain::ProjectId;

/// Maximum number of ids retained by a pool.
pub const PROJECT_ID_POOL_CAPACITY: usize = 100;

/// Short-lived cache of public project ids.
///
/// Implementations decide freshness; a stale or empty pool yields `None` and
/// the caller refills it with [`ProjectIdPool::replace`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectIdPool: Send + Sync {
    /// Cached ids when the pool is fresh and non-empty.
    async fn fresh_ids(&self) -> Option<Vec<ProjectId>>;

    /// Replace the pool contents, keeping at most
    /// [`PROJECT_ID_POOL_CAPACITY`] ids, and restart the TTL.
    async fn replace(&self, ids: Vec<ProjectId>);
}
