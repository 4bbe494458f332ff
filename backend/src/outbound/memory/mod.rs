//! In-memory repositories used when no database is configured.
//!
//! [`InMemoryStore`] implements the user, project and social repository
//! ports over a single mutex-guarded state so multi-table mutations (like
//! toggles, comment threads, cascading deletes) stay atomic. Data is lost on
//! restart; this adapter backs local development and the integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{
    ProjectPersistenceError, ProjectRepository, SocialPersistenceError, SocialRepository,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    Comment, CommentId, FeedQuery, FollowCounts, LikeOutcome, NOTIFICATIONS_LIMIT, NewComment,
    NewNotification,
    NewUserAccount, Notification, NotificationKind, ProfileUpdate, Project, ProjectDraft,
    ProjectId, SharePlatform, User, UserAccount, UserId, ViewerState,
};

#[derive(Debug, Clone)]
struct StoredComment {
    id: Uuid,
    project_id: Uuid,
    author_id: Uuid,
    parent_id: Option<Uuid>,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredNotification {
    id: Uuid,
    recipient_id: Uuid,
    actor_id: Uuid,
    kind: NotificationKind,
    entity_id: Uuid,
    read: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<Uuid, UserAccount>,
    /// Insertion order doubles as the tie-breaker for equal timestamps.
    projects: Vec<Project>,
    likes: HashSet<(Uuid, Uuid)>,
    favorites: Vec<(Uuid, Uuid, DateTime<Utc>)>,
    follows: HashSet<(Uuid, Uuid)>,
    shares: HashMap<Uuid, i64>,
    comments: Vec<StoredComment>,
    notifications: Vec<StoredNotification>,
}

impl State {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.accounts.get(&id).map(|account| &account.user)
    }

    fn project_mut(&mut self, id: Uuid) -> Option<&mut Project> {
        self.projects
            .iter_mut()
            .find(|project| *project.id.as_uuid() == id)
    }

    /// Projects newest first; later insertions win ties.
    fn newest_first(&self, keep: impl Fn(&Project) -> bool) -> Vec<&Project> {
        let mut selected: Vec<&Project> = self.projects.iter().rev().filter(|p| keep(p)).collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        selected
    }

    fn public_except<'a>(&'a self, exclude: &'a ProjectId) -> impl Iterator<Item = &'a Project> {
        self.projects
            .iter()
            .filter(move |project| project.is_public && project.id != *exclude)
    }

    fn comment(&self, stored: &StoredComment) -> Result<Comment, String> {
        let author = self
            .user(stored.author_id)
            .ok_or_else(|| format!("author of comment {} is missing", stored.id))?;
        Ok(Comment {
            id: CommentId::from_uuid(stored.id),
            project_id: ProjectId::from_uuid(stored.project_id),
            author: author.clone(),
            parent_id: stored.parent_id.map(CommentId::from_uuid),
            content: stored.content.clone(),
            created_at: stored.created_at,
        })
    }

    fn notification(&self, stored: &StoredNotification) -> Result<Notification, String> {
        let actor = self
            .user(stored.actor_id)
            .ok_or_else(|| format!("actor of notification {} is missing", stored.id))?;
        Ok(Notification {
            id: stored.id,
            recipient_id: UserId::from_uuid(stored.recipient_id),
            actor: actor.clone(),
            kind: stored.kind,
            entity_id: stored.entity_id,
            read: stored.read,
            created_at: stored.created_at,
        })
    }

    fn push_notification(&mut self, pending: &NewNotification) {
        self.notifications.push(StoredNotification {
            id: Uuid::new_v4(),
            recipient_id: *pending.recipient_id.as_uuid(),
            actor_id: *pending.actor_id.as_uuid(),
            kind: pending.kind,
            entity_id: pending.entity_id,
            read: false,
            created_at: Utc::now(),
        });
    }

    /// Remove a comment and every reply beneath it.
    fn remove_comment_tree(&mut self, root: Uuid) -> bool {
        let mut doomed = HashSet::from([root]);
        loop {
            let before = doomed.len();
            for comment in &self.comments {
                if comment.parent_id.is_some_and(|parent| doomed.contains(&parent)) {
                    doomed.insert(comment.id);
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        let count = self.comments.len();
        self.comments.retain(|comment| !doomed.contains(&comment.id));
        self.comments.len() != count
    }

    fn remove_project(&mut self, id: Uuid) -> bool {
        let count = self.projects.len();
        self.projects.retain(|project| *project.id.as_uuid() != id);
        if self.projects.len() == count {
            return false;
        }
        self.likes.retain(|(_, project)| *project != id);
        self.favorites.retain(|(_, project, _)| *project != id);
        self.comments.retain(|comment| comment.project_id != id);
        self.shares.remove(&id);
        true
    }
}

fn contains_keyword(project: &Project, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    project.title.to_lowercase().contains(&needle)
        || project.description.to_lowercase().contains(&needle)
}

fn draft_into(project: &mut Project, draft: &ProjectDraft) {
    project.title.clone_from(&draft.title);
    project.description.clone_from(&draft.description);
    project.files.clone_from(&draft.files);
    project.main_file.clone_from(&draft.main_file);
    project.is_public = draft.is_public;
    project.external = draft.external.clone();
    project.project_type = draft.project_type;
    project.updated_at = Utc::now();
}

/// Process-local store implementing every persistence port.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, account: &NewUserAccount) -> Result<User, UserPersistenceError> {
        let mut state = self.state.lock().await;
        if state
            .accounts
            .values()
            .any(|stored| stored.user.email == account.email)
        {
            return Err(UserPersistenceError::duplicate_email());
        }
        let now = Utc::now();
        let user = User {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            avatar: None,
            bio: None,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(
            *account.id.as_uuid(),
            UserAccount {
                user: user.clone(),
                password_hash: account.password_hash.clone(),
            },
        );
        Ok(user)
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|account| account.user.email.as_ref() == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.state.lock().await;
        Ok(state.user(*id.as_uuid()).cloned())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self.state.lock().await;
        let Some(account) = state.accounts.get_mut(id.as_uuid()) else {
            return Ok(None);
        };
        let user = &mut account.user;
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(avatar) = &update.avatar {
            user.avatar.clone_from(avatar);
        }
        if let Some(bio) = &update.bio {
            user.bio.clone_from(bio);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn create(
        &self,
        id: &ProjectId,
        author: Option<UserId>,
        draft: &ProjectDraft,
    ) -> Result<Project, ProjectPersistenceError> {
        let now = Utc::now();
        let project = Project {
            id: *id,
            author_id: author,
            title: draft.title.clone(),
            description: draft.description.clone(),
            files: draft.files.clone(),
            main_file: draft.main_file.clone(),
            is_public: draft.is_public,
            views: 0,
            likes: 0,
            external: draft.external.clone(),
            project_type: draft.project_type,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.projects.push(project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, ProjectPersistenceError> {
        let state = self.state.lock().await;
        Ok(state.projects.iter().find(|p| p.id == *id).cloned())
    }

    async fn update(
        &self,
        id: &ProjectId,
        draft: &ProjectDraft,
    ) -> Result<Option<Project>, ProjectPersistenceError> {
        let mut state = self.state.lock().await;
        Ok(state.project_mut(*id.as_uuid()).map(|project| {
            draft_into(project, draft);
            project.clone()
        }))
    }

    async fn delete(&self, id: &ProjectId) -> Result<bool, ProjectPersistenceError> {
        Ok(self.state.lock().await.remove_project(*id.as_uuid()))
    }

    async fn list_public(&self, query: &FeedQuery) -> Result<Vec<Project>, ProjectPersistenceError> {
        let state = self.state.lock().await;
        let selected = state.newest_first(|project| {
            project.is_public
                && query.project_type.is_none_or(|kind| project.project_type == kind)
                && query
                    .search
                    .as_deref()
                    .is_none_or(|keyword| contains_keyword(project, keyword))
        });
        Ok(selected
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize + 1)
            .cloned()
            .collect())
    }

    async fn list_by_author(
        &self,
        author: &UserId,
        include_private: bool,
    ) -> Result<Vec<Project>, ProjectPersistenceError> {
        let state = self.state.lock().await;
        Ok(state
            .newest_first(|project| {
                project.author_id.as_ref() == Some(author) && (include_private || project.is_public)
            })
            .into_iter()
            .cloned()
            .collect())
    }

    async fn count_by_author(&self, author: &UserId) -> Result<i64, ProjectPersistenceError> {
        let state = self.state.lock().await;
        let count = state
            .projects
            .iter()
            .filter(|project| project.is_public && project.author_id.as_ref() == Some(author))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn increment_views(&self, id: &ProjectId) -> Result<Option<i64>, ProjectPersistenceError> {
        let mut state = self.state.lock().await;
        Ok(state.project_mut(*id.as_uuid()).map(|project| {
            project.views += 1;
            project.views
        }))
    }

    async fn newest_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError> {
        let state = self.state.lock().await;
        Ok(state
            .newest_first(|project| project.is_public && project.id != *exclude)
            .first()
            .map(|project| (*project).clone()))
    }

    async fn most_viewed_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError> {
        let state = self.state.lock().await;
        let mut candidates = state.newest_first(|project| project.is_public && project.id != *exclude);
        candidates.sort_by(|a, b| b.views.cmp(&a.views));
        Ok(candidates.first().map(|project| (*project).clone()))
    }

    async fn search_public(
        &self,
        keyword: &str,
        exclude: &ProjectId,
        limit: u32,
    ) -> Result<Vec<Project>, ProjectPersistenceError> {
        let state = self.state.lock().await;
        Ok(state
            .newest_first(|project| {
                project.is_public && project.id != *exclude && contains_keyword(project, keyword)
            })
            .into_iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn random_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError> {
        let state = self.state.lock().await;
        let candidates: Vec<&Project> = state.public_except(exclude).collect();
        Ok(candidates
            .choose(&mut rand::thread_rng())
            .map(|project| (*project).clone()))
    }

    async fn sample_public_ids(&self, limit: u32) -> Result<Vec<ProjectId>, ProjectPersistenceError> {
        let state = self.state.lock().await;
        let ids: Vec<ProjectId> = state
            .projects
            .iter()
            .filter(|project| project.is_public)
            .map(|project| project.id)
            .collect();
        Ok(ids
            .choose_multiple(&mut rand::thread_rng(), limit as usize)
            .copied()
            .collect())
    }
}

#[async_trait]
impl SocialRepository for InMemoryStore {
    async fn toggle_like(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<LikeOutcome, SocialPersistenceError> {
        let mut state = self.state.lock().await;
        let edge = (*user.as_uuid(), *project.as_uuid());
        let liked = if state.likes.remove(&edge) {
            false
        } else {
            state.likes.insert(edge);
            true
        };
        let stored = state
            .project_mut(*project.as_uuid())
            .ok_or_else(|| SocialPersistenceError::query(format!("project {project} is missing")))?;
        stored.likes = if liked {
            stored.likes + 1
        } else {
            (stored.likes - 1).max(0)
        };
        Ok(LikeOutcome {
            liked,
            likes: stored.likes,
        })
    }

    async fn viewer_state(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<ViewerState, SocialPersistenceError> {
        let state = self.state.lock().await;
        let (user_id, project_id) = (*user.as_uuid(), *project.as_uuid());
        Ok(ViewerState {
            liked: state.likes.contains(&(user_id, project_id)),
            favorited: state
                .favorites
                .iter()
                .any(|(u, p, _)| *u == user_id && *p == project_id),
        })
    }

    async fn toggle_favorite(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<bool, SocialPersistenceError> {
        let mut state = self.state.lock().await;
        let (user_id, project_id) = (*user.as_uuid(), *project.as_uuid());
        let count = state.favorites.len();
        state
            .favorites
            .retain(|(u, p, _)| !(*u == user_id && *p == project_id));
        if state.favorites.len() != count {
            return Ok(false);
        }
        state.favorites.push((user_id, project_id, Utc::now()));
        Ok(true)
    }

    async fn list_favorites(&self, user: &UserId) -> Result<Vec<Project>, SocialPersistenceError> {
        let state = self.state.lock().await;
        let mut edges: Vec<&(Uuid, Uuid, DateTime<Utc>)> = state
            .favorites
            .iter()
            .rev()
            .filter(|(u, _, _)| u == user.as_uuid())
            .collect();
        edges.sort_by(|a, b| b.2.cmp(&a.2));
        Ok(edges
            .into_iter()
            .filter_map(|(_, project_id, _)| {
                state
                    .projects
                    .iter()
                    .find(|project| project.id.as_uuid() == project_id)
                    .cloned()
            })
            .collect())
    }

    async fn add_comment(
        &self,
        comment: &NewComment,
        notifications: &[NewNotification],
    ) -> Result<Comment, SocialPersistenceError> {
        let mut state = self.state.lock().await;
        let stored = StoredComment {
            id: *comment.id.as_uuid(),
            project_id: *comment.project_id.as_uuid(),
            author_id: *comment.author_id.as_uuid(),
            parent_id: comment.parent_id.as_ref().map(|id| *id.as_uuid()),
            content: comment.content.as_ref().to_owned(),
            created_at: Utc::now(),
        };
        let view = state
            .comment(&stored)
            .map_err(SocialPersistenceError::query)?;
        state.comments.push(stored);
        for pending in notifications {
            state.push_notification(pending);
        }
        Ok(view)
    }

    async fn find_comment(&self, id: &CommentId) -> Result<Option<Comment>, SocialPersistenceError> {
        let state = self.state.lock().await;
        state
            .comments
            .iter()
            .find(|comment| comment.id == *id.as_uuid())
            .map(|stored| state.comment(stored))
            .transpose()
            .map_err(SocialPersistenceError::query)
    }

    async fn list_comments(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Comment>, SocialPersistenceError> {
        let state = self.state.lock().await;
        state
            .comments
            .iter()
            .filter(|comment| comment.project_id == *project.as_uuid())
            .map(|stored| state.comment(stored))
            .collect::<Result<_, _>>()
            .map_err(SocialPersistenceError::query)
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<bool, SocialPersistenceError> {
        Ok(self.state.lock().await.remove_comment_tree(*id.as_uuid()))
    }

    async fn count_comments(&self, project: &ProjectId) -> Result<i64, SocialPersistenceError> {
        let state = self.state.lock().await;
        let count = state
            .comments
            .iter()
            .filter(|comment| comment.project_id == *project.as_uuid())
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn toggle_follow(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialPersistenceError> {
        let mut state = self.state.lock().await;
        let edge = (*follower.as_uuid(), *following.as_uuid());
        if state.follows.remove(&edge) {
            return Ok(false);
        }
        state.follows.insert(edge);
        Ok(true)
    }

    async fn follow_counts(&self, user: &UserId) -> Result<FollowCounts, SocialPersistenceError> {
        let state = self.state.lock().await;
        let id = *user.as_uuid();
        let followers = state.follows.iter().filter(|(_, to)| *to == id).count();
        let following = state.follows.iter().filter(|(from, _)| *from == id).count();
        Ok(FollowCounts {
            followers: i64::try_from(followers).unwrap_or(i64::MAX),
            following: i64::try_from(following).unwrap_or(i64::MAX),
        })
    }

    async fn is_following(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialPersistenceError> {
        let state = self.state.lock().await;
        Ok(state
            .follows
            .contains(&(*follower.as_uuid(), *following.as_uuid())))
    }

    async fn record_share(
        &self,
        project: &ProjectId,
        _user: Option<UserId>,
        _platform: SharePlatform,
    ) -> Result<i64, SocialPersistenceError> {
        let mut state = self.state.lock().await;
        let total = state.shares.entry(*project.as_uuid()).or_insert(0);
        *total += 1;
        Ok(*total)
    }

    async fn count_shares(&self, project: &ProjectId) -> Result<i64, SocialPersistenceError> {
        let state = self.state.lock().await;
        Ok(state.shares.get(project.as_uuid()).copied().unwrap_or(0))
    }

    async fn notify(&self, notification: &NewNotification) -> Result<(), SocialPersistenceError> {
        self.state.lock().await.push_notification(notification);
        Ok(())
    }

    async fn list_notifications(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, SocialPersistenceError> {
        let state = self.state.lock().await;
        let mut selected: Vec<&StoredNotification> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == *user.as_uuid() && (!unread_only || !n.read))
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        selected
            .into_iter()
            .take(NOTIFICATIONS_LIMIT as usize)
            .map(|stored| state.notification(stored))
            .collect::<Result<_, _>>()
            .map_err(SocialPersistenceError::query)
    }

    async fn mark_notifications_read(
        &self,
        user: &UserId,
        ids: Option<Vec<Uuid>>,
    ) -> Result<u64, SocialPersistenceError> {
        let mut state = self.state.lock().await;
        let wanted: Option<HashSet<Uuid>> = ids.map(|ids| ids.into_iter().collect());
        let mut updated = 0_u64;
        for notification in &mut state.notifications {
            let selected = notification.recipient_id == *user.as_uuid()
                && !notification.read
                && wanted
                    .as_ref()
                    .is_none_or(|wanted| wanted.contains(&notification.id));
            if selected {
                notification.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests;
