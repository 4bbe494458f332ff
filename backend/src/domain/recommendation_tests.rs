//! Tests for recommendation selection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ports::{MockProjectIdPool, MockProjectRepository, ProjectPersistenceError};
use crate::domain::{ErrorCode, ExternalSource, ProjectType};

/// Replays scripted draws, repeating the last one when exhausted.
struct ScriptedRandom(Mutex<VecDeque<f64>>);

impl ScriptedRandom {
    fn new(draws: &[f64]) -> Self {
        Self(Mutex::new(draws.iter().copied().collect()))
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&self) -> f64 {
        let mut draws = self.0.lock().expect("draws lock");
        if draws.len() > 1 {
            draws.pop_front().unwrap_or_default()
        } else {
            draws.front().copied().unwrap_or_default()
        }
    }
}

fn project(title: &str) -> Project {
    let now = Utc::now();
    Project {
        id: ProjectId::random(),
        author_id: None,
        title: title.to_owned(),
        description: String::new(),
        files: Vec::new(),
        main_file: None,
        is_public: true,
        views: 0,
        likes: 0,
        external: ExternalSource::default(),
        project_type: ProjectType::External,
        created_at: now,
        updated_at: now,
    }
}

fn service(
    projects: MockProjectRepository,
    pool: MockProjectIdPool,
    draws: &[f64],
) -> RecommendationService<MockProjectRepository, MockProjectIdPool, ScriptedRandom> {
    RecommendationService::new(
        Arc::new(projects),
        Arc::new(pool),
        Arc::new(ScriptedRandom::new(draws)),
    )
}

#[rstest]
#[case(0.0, RecommendationStrategy::Newest)]
#[case(0.19, RecommendationStrategy::Newest)]
#[case(0.2, RecommendationStrategy::MostViewed)]
#[case(0.49, RecommendationStrategy::MostViewed)]
#[case(0.5, RecommendationStrategy::Similar)]
#[case(0.99, RecommendationStrategy::Similar)]
fn thresholds_select_strategies(#[case] draw: f64, #[case] expected: RecommendationStrategy) {
    assert_eq!(RecommendationStrategy::for_draw(draw), expected);
}

#[rstest]
#[case("Particle galaxy simulator", "simulator")]
#[case("CSS-only spinner", "spinner")]
#[case("abc xyz", "abc")]
#[case("  Hi  ", "Hi")]
fn keyword_prefers_longest_word(#[case] title: &str, #[case] expected: &str) {
    assert_eq!(similarity_keyword(title), expected);
}

#[rstest]
#[case("50%", "50\\%")]
#[case("snake_case", "snake\\_case")]
#[case("back\\slash", "back\\\\slash")]
#[case("plain", "plain")]
fn like_patterns_are_escaped(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(escape_like(raw), expected);
}

#[rstest]
#[case(0.1, RecommendationStrategy::Newest)]
#[case(0.3, RecommendationStrategy::MostViewed)]
#[tokio::test]
async fn ordered_strategies_use_matching_queries(
    #[case] draw: f64,
    #[case] expected: RecommendationStrategy,
) {
    let current = project("Current");
    let current_id = current.id;
    let next = project("Next");
    let next_id = next.id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .with(eq(current_id))
        .return_once(move |_| Ok(Some(current)));
    match expected {
        RecommendationStrategy::Newest => {
            projects
                .expect_newest_public()
                .with(eq(current_id))
                .return_once(move |_| Ok(Some(next)));
        }
        _ => {
            projects
                .expect_most_viewed_public()
                .with(eq(current_id))
                .return_once(move |_| Ok(Some(next)));
        }
    }

    let found = service(projects, MockProjectIdPool::new(), &[draw])
        .recommend(&current_id)
        .await
        .expect("recommendation");
    assert_eq!(found.strategy, expected);
    assert_eq!(found.project.id, next_id);
}

#[rstest]
#[tokio::test]
async fn similar_strategy_searches_by_keyword() {
    let current = project("Bouncing balls");
    let current_id = current.id;
    let candidates = vec![project("Bouncing ball A"), project("Bouncing ball B")];
    let second = candidates[1].id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    projects
        .expect_search_public()
        .withf(move |keyword, exclude, _| keyword == "Bouncing" && *exclude == current_id)
        .return_once(move |_, _, _| Ok(candidates));

    let found = service(projects, MockProjectIdPool::new(), &[0.7, 0.9])
        .recommend(&current_id)
        .await
        .expect("recommendation");
    assert_eq!(found.strategy, RecommendationStrategy::Similar);
    assert_eq!(found.project.id, second);
}

#[rstest]
#[tokio::test]
async fn similar_without_matches_falls_back_to_random() {
    let current = project("Unique");
    let current_id = current.id;
    let other = project("Other");
    let other_id = other.id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    projects
        .expect_search_public()
        .return_once(|_, _, _| Ok(Vec::new()));
    projects
        .expect_random_public()
        .with(eq(current_id))
        .return_once(move |_| Ok(Some(other)));

    let found = service(projects, MockProjectIdPool::new(), &[0.8])
        .recommend(&current_id)
        .await
        .expect("recommendation");
    assert_eq!(found.strategy, RecommendationStrategy::Random);
    assert_eq!(found.project.id, other_id);
}

#[rstest]
#[tokio::test]
async fn empty_branch_falls_back_to_random() {
    let current = project("Current");
    let current_id = current.id;
    let other = project("Other");

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    projects.expect_newest_public().return_once(|_| Ok(None));
    projects
        .expect_random_public()
        .return_once(move |_| Ok(Some(other)));

    let found = service(projects, MockProjectIdPool::new(), &[0.05])
        .recommend(&current_id)
        .await
        .expect("recommendation");
    assert_eq!(found.strategy, RecommendationStrategy::Random);
}

#[rstest]
#[tokio::test]
async fn nothing_to_recommend_is_not_found() {
    let current = project("Lonely");
    let current_id = current.id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(current)));
    projects.expect_newest_public().return_once(|_| Ok(None));
    projects.expect_random_public().return_once(|_| Ok(None));

    let err = service(projects, MockProjectIdPool::new(), &[0.1])
        .recommend(&current_id)
        .await
        .expect_err("nothing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn lookup_failure_refills_pool_and_skips_current() {
    let current_id = ProjectId::random();
    let pooled = project("Pooled");
    let pooled_id = pooled.id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .with(eq(current_id))
        .return_once(|_| Err(ProjectPersistenceError::connection("down")));
    projects
        .expect_sample_public_ids()
        .with(eq(100_u32))
        .return_once(move |_| Ok(vec![current_id, pooled_id]));
    projects
        .expect_find_by_id()
        .with(eq(pooled_id))
        .return_once(move |_| Ok(Some(pooled)));

    let mut pool = MockProjectIdPool::new();
    pool.expect_fresh_ids().return_once(|| None);
    pool.expect_replace()
        .withf(move |ids| ids == &vec![current_id, pooled_id])
        .times(1)
        .return_const(());

    let found = service(projects, pool, &[0.0])
        .recommend(&current_id)
        .await
        .expect("pooled recommendation");
    assert_eq!(found.strategy, RecommendationStrategy::CachedPool);
    assert_eq!(found.project.id, pooled_id);
}

#[rstest]
#[tokio::test]
async fn fresh_pool_is_used_without_refill() {
    let current_id = ProjectId::random();
    let pooled = project("Pooled");
    let pooled_id = pooled.id;

    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .with(eq(current_id))
        .return_once(|_| Ok(None));
    projects.expect_sample_public_ids().never();
    projects
        .expect_find_by_id()
        .with(eq(pooled_id))
        .return_once(move |_| Ok(Some(pooled)));

    let mut pool = MockProjectIdPool::new();
    pool.expect_fresh_ids()
        .return_once(move || Some(vec![pooled_id]));
    pool.expect_replace().never();

    let found = service(projects, pool, &[0.4])
        .recommend(&current_id)
        .await
        .expect("pooled recommendation");
    assert_eq!(found.project.id, pooled_id);
}

#[rstest]
#[tokio::test]
async fn pool_with_only_current_is_not_found() {
    let current_id = ProjectId::random();

    let mut projects = MockProjectRepository::new();
    projects.expect_find_by_id().return_once(|_| Ok(None));

    let mut pool = MockProjectIdPool::new();
    pool.expect_fresh_ids()
        .return_once(move || Some(vec![current_id]));

    let err = service(projects, pool, &[0.4])
        .recommend(&current_id)
        .await
        .expect_err("nothing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
