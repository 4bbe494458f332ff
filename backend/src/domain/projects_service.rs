//! Project domain service: feed paging, CRUD with ownership checks and view
//! counting.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{ProjectRepository, ProjectService, SocialRepository};
use crate::domain::service_errors::{map_project_error, map_social_error};
use crate::domain::{
    Error, FeedPage, FeedQuery, Project, ProjectDetail, ProjectDraft, ProjectId, ProjectInput,
    ProjectPatch, ProjectValidationError, UserId, ViewerState,
};

/// Map a project validation failure to `invalid_request` naming the field.
pub(crate) fn project_validation_error(err: ProjectValidationError) -> Error {
    let field = match &err {
        ProjectValidationError::InvalidId => "id",
        ProjectValidationError::EmptyTitle | ProjectValidationError::TitleTooLong { .. } => "title",
        ProjectValidationError::DescriptionTooLong { .. } => "description",
        ProjectValidationError::TooManyFiles { .. }
        | ProjectValidationError::EmptyFileName
        | ProjectValidationError::InvalidFilePath { .. } => "files",
        ProjectValidationError::UnknownMainFile { .. } => "mainFile",
        ProjectValidationError::MissingExternalUrl => "externalUrl",
        ProjectValidationError::InvalidUrl { field, .. } => *field,
        ProjectValidationError::UnknownType { .. } => "type",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Project service implementing [`ProjectService`].
#[derive(Clone)]
pub struct ProjectsService<P, S> {
    projects: Arc<P>,
    social: Arc<S>,
}

impl<P, S> ProjectsService<P, S> {
    pub fn new(projects: Arc<P>, social: Arc<S>) -> Self {
        Self { projects, social }
    }
}

impl<P, S> ProjectsService<P, S>
where
    P: ProjectRepository,
    S: SocialRepository,
{
    async fn visible(&self, id: &ProjectId, viewer: Option<&UserId>) -> Result<Project, Error> {
        self.projects
            .find_by_id(id)
            .await
            .map_err(map_project_error)?
            .filter(|project| project.is_visible_to(viewer))
            .ok_or_else(|| Error::not_found("project not found"))
    }

    async fn owned(&self, id: &ProjectId, actor: &UserId) -> Result<Project, Error> {
        let project = self.visible(id, Some(actor)).await?;
        if !project.is_owned_by(Some(actor)) {
            return Err(Error::forbidden("only the author may modify this project"));
        }
        Ok(project)
    }
}

#[async_trait]
impl<P, S> ProjectService for ProjectsService<P, S>
where
    P: ProjectRepository,
    S: SocialRepository,
{
    async fn feed(&self, query: FeedQuery) -> Result<FeedPage, Error> {
        let mut items = self
            .projects
            .list_public(&query)
            .await
            .map_err(map_project_error)?;
        let limit = query.limit as usize;
        let has_more = items.len() > limit;
        items.truncate(limit);
        Ok(FeedPage {
            items,
            limit: query.limit,
            offset: query.offset,
            has_more,
        })
    }

    async fn create(&self, author: &UserId, input: ProjectInput) -> Result<Project, Error> {
        let draft = ProjectDraft::try_from_input(input).map_err(project_validation_error)?;
        let project = self
            .projects
            .create(&ProjectId::random(), Some(author.clone()), &draft)
            .await
            .map_err(map_project_error)?;
        info!(project_id = %project.id, author = %author, "project created");
        Ok(project)
    }

    async fn detail(&self, id: &ProjectId, viewer: Option<UserId>) -> Result<ProjectDetail, Error> {
        let project = self.visible(id, viewer.as_ref()).await?;
        let comments = self.social.count_comments(id).await.map_err(map_social_error)?;
        let shares = self.social.count_shares(id).await.map_err(map_social_error)?;
        let viewer = match viewer {
            Some(viewer) => self
                .social
                .viewer_state(&viewer, id)
                .await
                .map_err(map_social_error)?,
            None => ViewerState::default(),
        };
        Ok(ProjectDetail {
            project,
            comments,
            shares,
            viewer,
        })
    }

    async fn update(
        &self,
        id: &ProjectId,
        actor: &UserId,
        patch: ProjectPatch,
    ) -> Result<Project, Error> {
        let current = self.owned(id, actor).await?;
        let draft = patch.apply_to(&current).map_err(project_validation_error)?;
        self.projects
            .update(id, &draft)
            .await
            .map_err(map_project_error)?
            .ok_or_else(|| Error::not_found("project not found"))
    }

    async fn delete(&self, id: &ProjectId, actor: &UserId) -> Result<(), Error> {
        self.owned(id, actor).await?;
        if !self.projects.delete(id).await.map_err(map_project_error)? {
            return Err(Error::not_found("project not found"));
        }
        info!(project_id = %id, "project deleted");
        Ok(())
    }

    async fn record_view(&self, id: &ProjectId, viewer: Option<UserId>) -> Result<i64, Error> {
        self.visible(id, viewer.as_ref()).await?;
        self.projects
            .increment_views(id)
            .await
            .map_err(map_project_error)?
            .ok_or_else(|| Error::not_found("project not found"))
    }

    async fn by_author(
        &self,
        author: &UserId,
        viewer: Option<UserId>,
    ) -> Result<Vec<Project>, Error> {
        let include_private = viewer.as_ref() == Some(author);
        self.projects
            .list_by_author(author, include_private)
            .await
            .map_err(map_project_error)
    }
}

#[cfg(test)]
#[path = "projects_service_tests.rs"]
mod tests;
