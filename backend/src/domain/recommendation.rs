//! "Next project" recommendation.
//!
//! A uniform draw `r` picks the strategy: `r < 0.2` newest, `r < 0.5` most
//! viewed, otherwise a keyword match on the current title. Empty branches
//! fall back to a random public project. When the current project cannot be
//! read at all the service draws from a short-lived pool of public ids.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::ports::{
    PROJECT_ID_POOL_CAPACITY, ProjectIdPool, ProjectRecommender, ProjectRepository, RandomSource,
};
use crate::domain::service_errors::map_project_error;
use crate::domain::{Error, Project, ProjectId};

/// Upper bound of the draw selecting the newest project.
pub const NEWEST_THRESHOLD: f64 = 0.2;
/// Upper bound of the draw selecting the most viewed project.
pub const MOST_VIEWED_THRESHOLD: f64 = 0.5;
/// Maximum keyword matches considered by the similarity strategy.
pub const SIMILAR_CANDIDATES: u32 = 20;
/// Minimum keyword length for the similarity strategy.
pub const KEYWORD_MIN: usize = 3;

/// How a recommendation was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrategy {
    Newest,
    MostViewed,
    Similar,
    Random,
    CachedPool,
}

impl RecommendationStrategy {
    /// Strategy selected by a draw in `[0, 1)`.
    pub fn for_draw(r: f64) -> Self {
        if r < NEWEST_THRESHOLD {
            Self::Newest
        } else if r < MOST_VIEWED_THRESHOLD {
            Self::MostViewed
        } else {
            Self::Similar
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::MostViewed => "most_viewed",
            Self::Similar => "similar",
            Self::Random => "random",
            Self::CachedPool => "cached_pool",
        }
    }
}

impl fmt::Display for RecommendationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommended project with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub project: Project,
    pub strategy: RecommendationStrategy,
}

/// Longest alphanumeric word of at least [`KEYWORD_MIN`] characters; the
/// whole trimmed title when there is none. Ties keep the first word.
///
/// # Examples
/// ```
/// use codetok::domain::similarity_keyword;
///
/// assert_eq!(similarity_keyword("A bouncing ball demo"), "bouncing");
/// assert_eq!(similarity_keyword(" Go ok "), "Go ok");
/// ```
pub fn similarity_keyword(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= KEYWORD_MIN)
        .fold(None::<&str>, |best, word| match best {
            Some(best) if best.chars().count() >= word.chars().count() => Some(best),
            _ => Some(word),
        })
        .map_or_else(|| title.trim().to_owned(), str::to_owned)
}

/// Escape `%`, `_` and `\` for use inside a `LIKE` pattern.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Recommendation service implementing [`ProjectRecommender`].
#[derive(Clone)]
pub struct RecommendationService<P, C, R> {
    projects: Arc<P>,
    pool: Arc<C>,
    random: Arc<R>,
}

impl<P, C, R> RecommendationService<P, C, R> {
    pub fn new(projects: Arc<P>, pool: Arc<C>, random: Arc<R>) -> Self {
        Self {
            projects,
            pool,
            random,
        }
    }
}

impl<P, C, R> RecommendationService<P, C, R>
where
    P: ProjectRepository,
    C: ProjectIdPool,
    R: RandomSource,
{
    async fn similar(&self, current: &Project) -> Result<Option<Recommendation>, Error> {
        let keyword = similarity_keyword(&current.title);
        if keyword.is_empty() {
            return Ok(None);
        }
        let matches = self
            .projects
            .search_public(&keyword, &current.id, SIMILAR_CANDIDATES)
            .await
            .map_err(map_project_error)?;
        if matches.is_empty() {
            debug!(%keyword, "no similar projects");
            return Ok(None);
        }
        let index = self.random.pick_index(matches.len());
        Ok(matches.into_iter().nth(index).map(|project| Recommendation {
            project,
            strategy: RecommendationStrategy::Similar,
        }))
    }

    async fn by_strategy(&self, current: &Project) -> Result<Option<Recommendation>, Error> {
        let strategy = RecommendationStrategy::for_draw(self.random.next_unit());
        let found = match strategy {
            RecommendationStrategy::Newest => self.projects.newest_public(&current.id).await,
            RecommendationStrategy::MostViewed => {
                self.projects.most_viewed_public(&current.id).await
            }
            _ => return self.similar(current).await,
        }
        .map_err(map_project_error)?;
        Ok(found.map(|project| Recommendation { project, strategy }))
    }

    async fn random(&self, current: &ProjectId) -> Result<Option<Recommendation>, Error> {
        let found = self
            .projects
            .random_public(current)
            .await
            .map_err(map_project_error)?;
        Ok(found.map(|project| Recommendation {
            project,
            strategy: RecommendationStrategy::Random,
        }))
    }

    async fn pooled_ids(&self) -> Result<Vec<ProjectId>, Error> {
        if let Some(ids) = self.pool.fresh_ids().await {
            return Ok(ids);
        }
        let limit = u32::try_from(PROJECT_ID_POOL_CAPACITY).unwrap_or(u32::MAX);
        let ids = self
            .projects
            .sample_public_ids(limit)
            .await
            .map_err(map_project_error)?;
        self.pool.replace(ids.clone()).await;
        Ok(ids)
    }

    async fn from_pool(&self, current: &ProjectId) -> Result<Option<Recommendation>, Error> {
        let candidates: Vec<ProjectId> = self
            .pooled_ids()
            .await?
            .into_iter()
            .filter(|id| id != current)
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }
        let start = self.random.pick_index(candidates.len());
        // Ids may be stale; walk forward from the drawn index until one loads.
        for offset in 0..candidates.len() {
            let id = &candidates[(start + offset) % candidates.len()];
            let found = self
                .projects
                .find_by_id(id)
                .await
                .map_err(map_project_error)?;
            if let Some(project) = found.filter(|project| project.is_public) {
                return Ok(Some(Recommendation {
                    project,
                    strategy: RecommendationStrategy::CachedPool,
                }));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<P, C, R> ProjectRecommender for RecommendationService<P, C, R>
where
    P: ProjectRepository,
    C: ProjectIdPool,
    R: RandomSource,
{
    async fn recommend(&self, current: &ProjectId) -> Result<Recommendation, Error> {
        let recommendation = match self.projects.find_by_id(current).await {
            Ok(Some(project)) => match self.by_strategy(&project).await? {
                Some(found) => Some(found),
                None => self.random(current).await?,
            },
            Ok(None) => {
                debug!(project_id = %current, "current project missing; using id pool");
                self.from_pool(current).await?
            }
            Err(err) => {
                warn!(project_id = %current, error = %err, "current project lookup failed; using id pool");
                self.from_pool(current).await?
            }
        };
        recommendation.ok_or_else(|| Error::not_found("no project to recommend"))
    }
}

#[cfg(test)]
#[path = "recommendation_tests.rs"]
mod tests;
