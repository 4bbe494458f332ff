//! Behavioural coverage for the in-memory repositories.

use super::*;
use crate::domain::{CommentBody, DisplayName, Email, ExternalSource, ProjectType};
use rstest::{fixture, rstest};

#[fixture]
fn store() -> InMemoryStore {
    InMemoryStore::new()
}

async fn register(store: &InMemoryStore, email: &str) -> User {
    let account = NewUserAccount {
        id: UserId::random(),
        email: Email::new(email).expect("valid email"),
        name: DisplayName::new("Ada").expect("valid name"),
        password_hash: "hash".to_owned(),
    };
    UserRepository::create(store, &account)
        .await
        .expect("user created")
}

fn draft(title: &str, is_public: bool) -> ProjectDraft {
    ProjectDraft {
        title: title.to_owned(),
        description: String::new(),
        files: Vec::new(),
        main_file: None,
        is_public,
        external: ExternalSource::default(),
        project_type: ProjectType::Code,
    }
}

async fn publish(store: &InMemoryStore, author: &User, title: &str, is_public: bool) -> Project {
    ProjectRepository::create(
        store,
        &ProjectId::random(),
        Some(author.id.clone()),
        &draft(title, is_public),
    )
    .await
    .expect("project created")
}

async fn comment(
    store: &InMemoryStore,
    project: &Project,
    author: &User,
    parent: Option<CommentId>,
    pending: &[NewNotification],
) -> Comment {
    let new = NewComment {
        id: CommentId::random(),
        project_id: project.id,
        author_id: author.id.clone(),
        parent_id: parent,
        content: CommentBody::new("nice").expect("valid body"),
    };
    store.add_comment(&new, pending).await.expect("comment added")
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_are_rejected(store: InMemoryStore) {
    register(&store, "ada@example.com").await;
    let again = NewUserAccount {
        id: UserId::random(),
        email: Email::new("ada@example.com").expect("valid email"),
        name: DisplayName::new("Imposter").expect("valid name"),
        password_hash: "hash".to_owned(),
    };
    let err = UserRepository::create(&store, &again)
        .await
        .expect_err("duplicate rejected");
    assert_eq!(err, UserPersistenceError::duplicate_email());
}

#[rstest]
#[tokio::test]
async fn profile_updates_can_clear_fields(store: InMemoryStore) {
    let user = register(&store, "ada@example.com").await;
    let set = ProfileUpdate {
        bio: Some(Some("hello".to_owned())),
        ..ProfileUpdate::default()
    };
    store.update_profile(&user.id, &set).await.expect("update");

    let clear = ProfileUpdate {
        bio: Some(None),
        ..ProfileUpdate::default()
    };
    let updated = store
        .update_profile(&user.id, &clear)
        .await
        .expect("update")
        .expect("user exists");
    assert_eq!(updated.bio, None);
    assert_eq!(updated.name, user.name);
}

#[rstest]
#[tokio::test]
async fn public_listing_is_newest_first_and_overfetches_by_one(store: InMemoryStore) {
    let author = register(&store, "ada@example.com").await;
    for title in ["one", "two", "three"] {
        publish(&store, &author, title, true).await;
    }
    publish(&store, &author, "hidden", false).await;

    let page = store
        .list_public(&FeedQuery::new(Some(2), Some(0)))
        .await
        .expect("listing");
    let titles: Vec<&str> = page.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["three", "two", "one"]);
}

#[rstest]
#[tokio::test]
async fn public_listing_search_ignores_case(store: InMemoryStore) {
    let author = register(&store, "ada@example.com").await;
    publish(&store, &author, "Canvas Particles", true).await;
    publish(&store, &author, "Todo list", true).await;

    let query = FeedQuery::new(None, None).with_search(Some("canvas".to_owned()));
    let found = store.list_public(&query).await.expect("listing");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Canvas Particles");
}

#[rstest]
#[tokio::test]
async fn like_toggles_adjust_the_counter(store: InMemoryStore) {
    let author = register(&store, "ada@example.com").await;
    let project = publish(&store, &author, "demo", true).await;

    let first = store.toggle_like(&author.id, &project.id).await.expect("like");
    assert_eq!(first, LikeOutcome { liked: true, likes: 1 });

    let second = store.toggle_like(&author.id, &project.id).await.expect("unlike");
    assert_eq!(second, LikeOutcome { liked: false, likes: 0 });
}

#[rstest]
#[tokio::test]
async fn deleting_a_comment_removes_its_replies(store: InMemoryStore) {
    let author = register(&store, "ada@example.com").await;
    let project = publish(&store, &author, "demo", true).await;
    let root = comment(&store, &project, &author, None, &[]).await;
    let reply = comment(&store, &project, &author, Some(root.id), &[]).await;
    comment(&store, &project, &author, Some(reply.id), &[]).await;
    comment(&store, &project, &author, None, &[]).await;

    assert!(store.delete_comment(&root.id).await.expect("delete"));
    assert_eq!(store.count_comments(&project.id).await.expect("count"), 1);
    assert!(!store.delete_comment(&root.id).await.expect("delete again"));
}

#[rstest]
#[tokio::test]
async fn deleting_a_project_cascades_to_its_edges(store: InMemoryStore) {
    let author = register(&store, "ada@example.com").await;
    let project = publish(&store, &author, "demo", true).await;
    store.toggle_like(&author.id, &project.id).await.expect("like");
    store
        .toggle_favorite(&author.id, &project.id)
        .await
        .expect("favorite");
    comment(&store, &project, &author, None, &[]).await;

    assert!(ProjectRepository::delete(&store, &project.id).await.expect("delete"));
    let viewer = store
        .viewer_state(&author.id, &project.id)
        .await
        .expect("viewer state");
    assert_eq!(viewer, ViewerState::default());
    assert_eq!(store.count_comments(&project.id).await.expect("count"), 0);
    assert!(store.list_favorites(&author.id).await.expect("favorites").is_empty());
}

#[rstest]
#[tokio::test]
async fn comment_notifications_can_be_marked_read_selectively(store: InMemoryStore) {
    let author = register(&store, "ada@example.com").await;
    let fan = register(&store, "fan@example.com").await;
    let project = publish(&store, &author, "demo", true).await;
    let pending = NewNotification {
        recipient_id: author.id.clone(),
        actor_id: fan.id.clone(),
        kind: NotificationKind::Comment,
        entity_id: *project.id.as_uuid(),
    };
    comment(&store, &project, &fan, None, std::slice::from_ref(&pending)).await;
    store.notify(&pending).await.expect("notify");

    let unread = store
        .list_notifications(&author.id, true)
        .await
        .expect("notifications");
    assert_eq!(unread.len(), 2);
    assert_eq!(unread[0].actor.id, fan.id);

    let marked = store
        .mark_notifications_read(&author.id, Some(vec![unread[0].id]))
        .await
        .expect("mark read");
    assert_eq!(marked, 1);
    let remaining = store
        .list_notifications(&author.id, true)
        .await
        .expect("notifications");
    assert_eq!(remaining.len(), 1);

    let rest = store
        .mark_notifications_read(&author.id, None)
        .await
        .expect("mark all");
    assert_eq!(rest, 1);
    assert_eq!(
        store
            .list_notifications(&author.id, false)
            .await
            .expect("notifications")
            .len(),
        2
    );
}

#[rstest]
#[tokio::test]
async fn follows_toggle_and_count(store: InMemoryStore) {
    let ada = register(&store, "ada@example.com").await;
    let bob = register(&store, "bob@example.com").await;

    assert!(store.toggle_follow(&bob.id, &ada.id).await.expect("follow"));
    assert!(store.is_following(&bob.id, &ada.id).await.expect("lookup"));
    let counts = store.follow_counts(&ada.id).await.expect("counts");
    assert_eq!(counts, FollowCounts { followers: 1, following: 0 });

    assert!(!store.toggle_follow(&bob.id, &ada.id).await.expect("unfollow"));
    assert!(!store.is_following(&bob.id, &ada.id).await.expect("lookup"));
}

#[rstest]
#[tokio::test]
async fn shares_accumulate_per_project(store: InMemoryStore) {
    let author = register(&store, "ada@example.com").await;
    let project = publish(&store, &author, "demo", true).await;

    store
        .record_share(&project.id, None, SharePlatform::Twitter)
        .await
        .expect("share");
    let total = store
        .record_share(&project.id, Some(author.id.clone()), SharePlatform::CopyLink)
        .await
        .expect("share");
    assert_eq!(total, 2);
    assert_eq!(store.count_shares(&project.id).await.expect("count"), 2);
}

#[rstest]
#[tokio::test]
async fn sampling_only_returns_public_ids(store: InMemoryStore) {
    let author = register(&store, "ada@example.com").await;
    let public = publish(&store, &author, "public", true).await;
    publish(&store, &author, "private", false).await;

    let ids = store.sample_public_ids(10).await.expect("sample");
    assert_eq!(ids, vec![public.id]);
}
