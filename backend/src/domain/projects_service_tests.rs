//! Tests for the project service.

use std::sync::Arc;

use chrono::Utc;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockProjectRepository, MockSocialRepository};
use crate::domain::{ErrorCode, ExternalSource, ProjectType};

fn project(author: Option<UserId>, is_public: bool) -> Project {
    let now = Utc::now();
    Project {
        id: ProjectId::random(),
        author_id: author,
        title: "Bouncing balls".to_owned(),
        description: String::new(),
        files: Vec::new(),
        main_file: None,
        is_public,
        views: 0,
        likes: 0,
        external: ExternalSource::default(),
        project_type: ProjectType::Code,
        created_at: now,
        updated_at: now,
    }
}

#[fixture]
fn owner() -> UserId {
    UserId::random()
}

fn service(
    projects: MockProjectRepository,
    social: MockSocialRepository,
) -> ProjectsService<MockProjectRepository, MockSocialRepository> {
    ProjectsService::new(Arc::new(projects), Arc::new(social))
}

#[rstest]
#[case(3, 2, true)]
#[case(2, 2, false)]
#[case(0, 2, false)]
#[tokio::test]
async fn feed_reports_more_pages(
    #[case] returned: usize,
    #[case] limit: u32,
    #[case] has_more: bool,
) {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_list_public()
        .return_once(move |_| Ok((0..returned).map(|_| project(None, true)).collect()));

    let page = service(projects, MockSocialRepository::new())
        .feed(FeedQuery::new(Some(limit), None))
        .await
        .expect("page");
    assert_eq!(page.has_more, has_more);
    assert!(page.items.len() <= limit as usize);
}

#[rstest]
#[tokio::test]
async fn private_projects_are_hidden_from_strangers(owner: UserId) {
    let hidden = project(Some(owner), false);
    let id = hidden.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(hidden)));

    let err = service(projects, MockSocialRepository::new())
        .detail(&id, Some(UserId::random()))
        .await
        .expect_err("hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn detail_includes_viewer_state(owner: UserId) {
    let visible = project(Some(owner.clone()), true);
    let id = visible.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(visible)));
    let mut social = MockSocialRepository::new();
    social.expect_count_comments().return_once(|_| Ok(4));
    social.expect_count_shares().return_once(|_| Ok(1));
    social.expect_viewer_state().return_once(|_, _| {
        Ok(ViewerState {
            liked: true,
            favorited: false,
        })
    });

    let detail = service(projects, social)
        .detail(&id, Some(owner))
        .await
        .expect("detail");
    assert_eq!(detail.comments, 4);
    assert_eq!(detail.shares, 1);
    assert!(detail.viewer.liked);
}

#[rstest]
#[tokio::test]
async fn non_owners_cannot_update(owner: UserId) {
    let existing = project(Some(owner), true);
    let id = existing.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(existing)));
    projects.expect_update().never();

    let err = service(projects, MockSocialRepository::new())
        .update(&id, &UserId::random(), ProjectPatch::default())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn owners_can_delete(owner: UserId) {
    let existing = project(Some(owner.clone()), false);
    let id = existing.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(existing)));
    projects.expect_delete().times(1).return_once(|_| Ok(true));

    service(projects, MockSocialRepository::new())
        .delete(&id, &owner)
        .await
        .expect("deleted");
}

#[rstest]
#[tokio::test]
async fn create_rejects_invalid_input_with_field(owner: UserId) {
    let mut projects = MockProjectRepository::new();
    projects.expect_create().never();

    let err = service(projects, MockSocialRepository::new())
        .create(&owner, ProjectInput::default())
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d.get("field")).and_then(|f| f.as_str()),
        Some("title")
    );
}

#[rstest]
#[tokio::test]
async fn view_on_missing_project_is_not_found() {
    let mut projects = MockProjectRepository::new();
    projects.expect_find_by_id().return_once(|_| Ok(None));
    projects.expect_increment_views().never();

    let err = service(projects, MockSocialRepository::new())
        .record_view(&ProjectId::random(), None)
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(None)]
#[case(Some(UserId::random()))]
#[tokio::test]
async fn views_on_private_projects_need_the_owner(owner: UserId, #[case] viewer: Option<UserId>) {
    let private = project(Some(owner), false);
    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(private)));
    projects.expect_increment_views().never();

    let err = service(projects, MockSocialRepository::new())
        .record_view(&ProjectId::random(), viewer)
        .await
        .expect_err("hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn owners_count_views_on_private_projects(owner: UserId) {
    let private = project(Some(owner.clone()), false);
    let id = private.id;
    let mut projects = MockProjectRepository::new();
    projects
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(private)));
    projects
        .expect_increment_views()
        .withf(move |candidate| *candidate == id)
        .return_once(|_| Ok(Some(7)));

    let views = service(projects, MockSocialRepository::new())
        .record_view(&id, Some(owner))
        .await
        .expect("counted");
    assert_eq!(views, 7);
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn author_listing_includes_private_only_for_owner(owner: UserId, #[case] is_owner: bool) {
    let mut projects = MockProjectRepository::new();
    projects
        .expect_list_by_author()
        .withf(move |_, include_private| *include_private == is_owner)
        .return_once(|_, _| Ok(Vec::new()));

    let viewer = if is_owner { owner.clone() } else { UserId::random() };
    service(projects, MockSocialRepository::new())
        .by_author(&owner, Some(viewer))
        .await
        .expect("listing");
}
