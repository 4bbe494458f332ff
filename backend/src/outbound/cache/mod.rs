//! In-process cache adapters.
//!
//! [`TtlProjectIdPool`] keeps a small set of public project ids for the
//! recommendation fallback. Entries expire as a whole once the TTL elapses;
//! the caller refills the pool from the repository.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::sync::RwLock;

use crate::domain::ProjectId;
use crate::domain::ports::{PROJECT_ID_POOL_CAPACITY, ProjectIdPool};

/// Default lifetime of a filled pool.
pub const DEFAULT_POOL_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default)]
struct PoolState {
    ids: Vec<ProjectId>,
    filled_at: Option<DateTime<Utc>>,
}

/// Project id pool that expires its contents after a fixed TTL.
#[derive(Clone)]
pub struct TtlProjectIdPool {
    state: Arc<RwLock<PoolState>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TtlProjectIdPool {
    /// Create an empty pool using [`DEFAULT_POOL_TTL`].
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, DEFAULT_POOL_TTL)
    }

    /// Create an empty pool with a custom TTL.
    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(PoolState::default())),
            clock,
            ttl,
        }
    }

    fn is_fresh(&self, filled_at: DateTime<Utc>) -> bool {
        let Ok(age) = (self.clock.utc() - filled_at).to_std() else {
            // Clock went backwards; treat the pool as fresh.
            return true;
        };
        age < self.ttl
    }
}

#[async_trait]
impl ProjectIdPool for TtlProjectIdPool {
    async fn fresh_ids(&self) -> Option<Vec<ProjectId>> {
        let state = self.state.read().await;
        let filled_at = state.filled_at?;
        if state.ids.is_empty() || !self.is_fresh(filled_at) {
            return None;
        }
        Some(state.ids.clone())
    }

    async fn replace(&self, mut ids: Vec<ProjectId>) {
        ids.truncate(PROJECT_ID_POOL_CAPACITY);
        let mut state = self.state.write().await;
        state.ids = ids;
        state.filled_at = Some(self.clock.utc());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use chrono::TimeZone;
    use mockable::MockClock;
    use rstest::{fixture, rstest};

    type Now = Arc<Mutex<DateTime<Utc>>>;

    #[fixture]
    fn now() -> Now {
        let start = Utc
            .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        Arc::new(Mutex::new(start))
    }

    fn pool(now: &Now) -> TtlProjectIdPool {
        let shared = Arc::clone(now);
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .returning(move || *shared.lock().expect("clock lock"));
        TtlProjectIdPool::new(Arc::new(clock))
    }

    fn advance(now: &Now, by: chrono::Duration) {
        let mut guard = now.lock().expect("clock lock");
        *guard += by;
    }

    #[rstest]
    #[tokio::test]
    async fn empty_pool_has_no_fresh_ids(now: Now) {
        assert_eq!(pool(&now).fresh_ids().await, None);
    }

    #[rstest]
    #[tokio::test]
    async fn replaced_ids_are_served_until_the_ttl_elapses(now: Now) {
        let pool = pool(&now);
        let ids = vec![ProjectId::random(), ProjectId::random()];
        pool.replace(ids.clone()).await;

        advance(&now, chrono::Duration::minutes(4));
        assert_eq!(pool.fresh_ids().await, Some(ids));

        advance(&now, chrono::Duration::minutes(1));
        assert_eq!(pool.fresh_ids().await, None);
    }

    #[rstest]
    #[tokio::test]
    async fn replace_caps_the_pool(now: Now) {
        let pool = pool(&now);
        let ids: Vec<ProjectId> = (0..PROJECT_ID_POOL_CAPACITY + 20)
            .map(|_| ProjectId::random())
            .collect();
        pool.replace(ids.clone()).await;

        let cached = pool.fresh_ids().await.expect("fresh pool");
        assert_eq!(cached.len(), PROJECT_ID_POOL_CAPACITY);
        assert_eq!(cached.as_slice(), &ids[..PROJECT_ID_POOL_CAPACITY]);
    }

    #[rstest]
    #[tokio::test]
    async fn replacing_with_nothing_empties_the_pool(now: Now) {
        let pool = pool(&now);
        pool.replace(vec![ProjectId::random()]).await;
        pool.replace(Vec::new()).await;
        assert_eq!(pool.fresh_ids().await, None);
    }
}
