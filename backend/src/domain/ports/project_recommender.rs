//! Driving port for "next project" recommendations.
use async_trait::async_trait;

use crate::domain::{Error, ProjectId, Recommendation};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRecommender: Send + Sync {
    /// Pick a public project other than `current`; `not_found` when none exist.
    async fn recommend(&self, current: &ProjectId) -> Result<Recommendation, Error>;
}
