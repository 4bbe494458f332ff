//! PostgreSQL-backed `ProjectRepository` implementation using Diesel ORM.
//!
//! Keyword filters use `ILIKE` with `%`, `_` and `\` escaped; PostgreSQL's
//! default escape character is the backslash. View counts are incremented by
//! a single `UPDATE ... RETURNING` so concurrent views never lose updates.

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sql_types::Double;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ProjectPersistenceError, ProjectRepository};
use crate::domain::{FeedQuery, Project, ProjectDraft, ProjectId, UserId, escape_like};

use super::error_mapping::{map_diesel_error_with, map_pool_error_with};
use super::models::{NewProjectRow, ProjectChangeset, ProjectRow};
use super::pool::{DbPool, PoolError};
use super::schema::projects;

diesel::define_sql_function! {
    /// PostgreSQL `random()`.
    fn random() -> Double;
}

/// Diesel-backed implementation of the `ProjectRepository` port.
#[derive(Clone)]
pub struct DieselProjectRepository {
    pool: DbPool,
}

impl DieselProjectRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProjectPersistenceError {
    map_pool_error_with(error, ProjectPersistenceError::connection)
}

fn map_diesel_error(error: DieselError) -> ProjectPersistenceError {
    map_diesel_error_with(
        error,
        ProjectPersistenceError::query,
        ProjectPersistenceError::connection,
    )
}

fn convert(row: ProjectRow) -> Result<Project, ProjectPersistenceError> {
    row.into_project().map_err(ProjectPersistenceError::query)
}

fn convert_all(rows: Vec<ProjectRow>) -> Result<Vec<Project>, ProjectPersistenceError> {
    rows.into_iter().map(convert).collect()
}

fn files_json(draft: &ProjectDraft) -> Result<serde_json::Value, ProjectPersistenceError> {
    serde_json::to_value(&draft.files)
        .map_err(|err| ProjectPersistenceError::query(format!("encode files: {err}")))
}

fn contains_pattern(keyword: &str) -> String {
    format!("%{}%", escape_like(keyword))
}

type ProjectRowSql = diesel::dsl::SqlTypeOf<diesel::dsl::AsSelect<ProjectRow, Pg>>;
type PublicProjects<'a> = projects::BoxedQuery<'a, Pg, ProjectRowSql>;

fn public_except(exclude: &ProjectId) -> PublicProjects<'static> {
    projects::table
        .filter(projects::is_public.eq(true))
        .filter(projects::id.ne(*exclude.as_uuid()))
        .select(ProjectRow::as_select())
        .into_boxed()
}

#[async_trait]
impl ProjectRepository for DieselProjectRepository {
    async fn create(
        &self,
        id: &ProjectId,
        author: Option<UserId>,
        draft: &ProjectDraft,
    ) -> Result<Project, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewProjectRow {
            id: *id.as_uuid(),
            author_id: author.as_ref().map(|author| *author.as_uuid()),
            title: &draft.title,
            description: &draft.description,
            files: files_json(draft)?,
            main_file: draft.main_file.as_deref(),
            is_public: draft.is_public,
            external_url: draft.external.url.as_deref(),
            external_embed: draft.external.embed.as_deref(),
            external_author: draft.external.author.as_deref(),
            project_type: draft.project_type.as_str(),
        };
        let stored: ProjectRow = diesel::insert_into(projects::table)
            .values(&row)
            .returning(ProjectRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert(stored)
    }

    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProjectRow> = projects::table
            .find(*id.as_uuid())
            .select(ProjectRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(convert).transpose()
    }

    async fn update(
        &self,
        id: &ProjectId,
        draft: &ProjectDraft,
    ) -> Result<Option<Project>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = ProjectChangeset {
            title: &draft.title,
            description: &draft.description,
            files: files_json(draft)?,
            main_file: draft.main_file.as_deref(),
            is_public: draft.is_public,
            external_url: draft.external.url.as_deref(),
            external_embed: draft.external.embed.as_deref(),
            external_author: draft.external.author.as_deref(),
            project_type: draft.project_type.as_str(),
            updated_at: Utc::now(),
        };
        let row: Option<ProjectRow> = diesel::update(projects::table.find(*id.as_uuid()))
            .set(&changeset)
            .returning(ProjectRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(convert).transpose()
    }

    async fn delete(&self, id: &ProjectId) -> Result<bool, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(projects::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_public(&self, query: &FeedQuery) -> Result<Vec<Project>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut statement = projects::table
            .filter(projects::is_public.eq(true))
            .select(ProjectRow::as_select())
            .into_boxed();
        if let Some(project_type) = query.project_type {
            statement = statement.filter(projects::project_type.eq(project_type.as_str()));
        }
        if let Some(search) = &query.search {
            let pattern = contains_pattern(search);
            statement = statement.filter(
                projects::title
                    .ilike(pattern.clone())
                    .or(projects::description.ilike(pattern)),
            );
        }
        let rows: Vec<ProjectRow> = statement
            .order((projects::created_at.desc(), projects::id.desc()))
            .limit(i64::from(query.limit) + 1)
            .offset(i64::from(query.offset))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_all(rows)
    }

    async fn list_by_author(
        &self,
        author: &UserId,
        include_private: bool,
    ) -> Result<Vec<Project>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut statement = projects::table
            .filter(projects::author_id.eq(*author.as_uuid()))
            .select(ProjectRow::as_select())
            .into_boxed();
        if !include_private {
            statement = statement.filter(projects::is_public.eq(true));
        }
        let rows: Vec<ProjectRow> = statement
            .order(projects::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_all(rows)
    }

    async fn count_by_author(&self, author: &UserId) -> Result<i64, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        projects::table
            .filter(projects::author_id.eq(*author.as_uuid()))
            .filter(projects::is_public.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn increment_views(&self, id: &ProjectId) -> Result<Option<i64>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(projects::table.find(*id.as_uuid()))
            .set(projects::views.eq(projects::views + 1))
            .returning(projects::views)
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn newest_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProjectRow> = public_except(exclude)
            .order(projects::created_at.desc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(convert).transpose()
    }

    async fn most_viewed_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProjectRow> = public_except(exclude)
            .order((projects::views.desc(), projects::created_at.desc()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(convert).transpose()
    }

    async fn search_public(
        &self,
        keyword: &str,
        exclude: &ProjectId,
        limit: u32,
    ) -> Result<Vec<Project>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pattern = contains_pattern(keyword);
        let rows: Vec<ProjectRow> = public_except(exclude)
            .filter(
                projects::title
                    .ilike(pattern.clone())
                    .or(projects::description.ilike(pattern)),
            )
            .order(projects::created_at.desc())
            .limit(i64::from(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        convert_all(rows)
    }

    async fn random_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProjectRow> = public_except(exclude)
            .order(random())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(convert).transpose()
    }

    async fn sample_public_ids(&self, limit: u32) -> Result<Vec<ProjectId>, ProjectPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<Uuid> = projects::table
            .filter(projects::is_public.eq(true))
            .select(projects::id)
            .order(random())
            .limit(i64::from(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ids.into_iter().map(ProjectId::from_uuid).collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for query helpers.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("canvas", "%canvas%")]
    #[case("100%", "%100\\%%")]
    #[case("a_b", "%a\\_b%")]
    fn contains_patterns_escape_wildcards(#[case] keyword: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(keyword), expected);
    }

    #[rstest]
    fn pool_errors_map_to_connection() {
        let err = map_pool_error(PoolError::build("bad url"));
        assert_eq!(err, ProjectPersistenceError::connection("bad url"));
    }
}
