//! Project records: shareable code/demo entries shown in the feed.
//!
//! A project either carries its own files (`code`, `fragment`) or points at an
//! externally hosted demo (`external`). Constructors validate user input so
//! repositories only ever persist well-formed drafts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::UserId;

/// Maximum title length.
pub const TITLE_MAX: usize = 120;
/// Maximum description length.
pub const DESCRIPTION_MAX: usize = 2000;
/// Maximum number of files per project.
pub const FILES_MAX: usize = 50;
/// Maximum URL length for external links.
pub const URL_MAX: usize = 2048;
/// Default feed page size.
pub const FEED_LIMIT_DEFAULT: u32 = 20;
/// Maximum feed page size.
pub const FEED_LIMIT_MAX: u32 = 50;

/// Return true when `raw` is an absolute `http` or `https` URL with a host.
///
/// Raw whitespace is rejected even where the URL parser would strip it.
pub fn is_http_url(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    Url::parse(raw).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|host| !host.is_empty())
    })
}

/// Validation errors returned by project constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectValidationError {
    #[error("project id must be a valid UUID")]
    InvalidId,
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("a project may contain at most {max} files")]
    TooManyFiles { max: usize },
    #[error("file name must not be empty")]
    EmptyFileName,
    #[error("file path '{path}' must be relative and must not contain '..'")]
    InvalidFilePath { path: String },
    #[error("main file '{name}' does not match any project file")]
    UnknownMainFile { name: String },
    #[error("external projects require an http(s) externalUrl")]
    MissingExternalUrl,
    #[error("'{field}' must be an http(s) URL of at most {max} characters")]
    InvalidUrl { field: &'static str, max: usize },
    #[error("unknown project type '{value}'")]
    UnknownType { value: String },
}

/// Stable project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Parse a project identifier from text.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProjectValidationError> {
        Uuid::parse_str(raw.as_ref().trim())
            .map(Self)
            .map_err(|_| ProjectValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of project shown in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    /// Files uploaded by the author.
    #[default]
    Code,
    /// A pointer to an externally hosted demo.
    External,
    /// An AI-generated fragment.
    Fragment,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::External => "external",
            Self::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = ProjectValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(Self::Code),
            "external" => Ok(Self::External),
            "fragment" => Ok(Self::Fragment),
            other => Err(ProjectValidationError::UnknownType {
                value: other.to_owned(),
            }),
        }
    }
}

/// File descriptor stored in the project's JSON `files` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub size: u64,
}

impl ProjectFile {
    fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProjectValidationError::EmptyFileName);
        }
        if !is_relative_path(&self.path) {
            return Err(ProjectValidationError::InvalidFilePath {
                path: self.path.clone(),
            });
        }
        Ok(())
    }
}

/// Return true for non-empty relative paths without `..` or empty segments.
pub fn is_relative_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "..")
}

/// Attribution for externally hosted projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSource {
    pub url: Option<String>,
    pub embed: Option<String>,
    pub author: Option<String>,
}

/// Persisted project record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub author_id: Option<UserId>,
    pub title: String,
    pub description: String,
    pub files: Vec<ProjectFile>,
    pub main_file: Option<String>,
    pub is_public: bool,
    pub views: i64,
    pub likes: i64,
    pub external: ExternalSource,
    pub project_type: ProjectType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// True when `viewer` may see this project.
    pub fn is_visible_to(&self, viewer: Option<&UserId>) -> bool {
        self.is_public || self.is_owned_by(viewer)
    }

    /// True when `viewer` authored this project.
    pub fn is_owned_by(&self, viewer: Option<&UserId>) -> bool {
        matches!((&self.author_id, viewer), (Some(author), Some(viewer)) if author == viewer)
    }
}

/// Unvalidated project fields as supplied by a client.
#[derive(Debug, Clone, Default)]
pub struct ProjectInput {
    pub title: String,
    pub description: Option<String>,
    pub files: Vec<ProjectFile>,
    pub main_file: Option<String>,
    pub is_public: bool,
    pub external: ExternalSource,
    pub project_type: Option<ProjectType>,
}

/// Validated project contents ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub files: Vec<ProjectFile>,
    pub main_file: Option<String>,
    pub is_public: bool,
    pub external: ExternalSource,
    pub project_type: ProjectType,
}

impl ProjectDraft {
    /// Validate client input.
    ///
    /// The project type defaults to `external` when an external URL is given
    /// and to `code` otherwise. The main file defaults to the first file.
    pub fn try_from_input(input: ProjectInput) -> Result<Self, ProjectValidationError> {
        let title = validate_title(&input.title)?;
        let description = validate_description(input.description.as_deref())?;
        let external = validate_external(input.external)?;

        let project_type = input.project_type.unwrap_or(if external.url.is_some() {
            ProjectType::External
        } else {
            ProjectType::Code
        });
        if project_type == ProjectType::External && external.url.is_none() {
            return Err(ProjectValidationError::MissingExternalUrl);
        }

        let main_file = validate_files(&input.files, input.main_file)?;

        Ok(Self {
            title,
            description,
            files: input.files,
            main_file,
            is_public: input.is_public,
            external,
            project_type,
        })
    }
}

/// Partial update of an existing project; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub files: Option<Vec<ProjectFile>>,
    pub main_file: Option<String>,
    pub is_public: Option<bool>,
    pub external: Option<ExternalSource>,
}

impl ProjectPatch {
    /// Apply the patch to `project`, re-validating the affected fields.
    pub fn apply_to(self, project: &Project) -> Result<ProjectDraft, ProjectValidationError> {
        let title = match self.title {
            Some(title) => validate_title(&title)?,
            None => project.title.clone(),
        };
        let description = match self.description {
            Some(description) => validate_description(Some(&description))?,
            None => project.description.clone(),
        };
        let external = match self.external {
            Some(external) => validate_external(external)?,
            None => project.external.clone(),
        };
        if project.project_type == ProjectType::External && external.url.is_none() {
            return Err(ProjectValidationError::MissingExternalUrl);
        }
        let files = self.files.unwrap_or_else(|| project.files.clone());
        let requested_main = self.main_file.or_else(|| project.main_file.clone());
        let main_file = validate_files(&files, requested_main)?;

        Ok(ProjectDraft {
            title,
            description,
            files,
            main_file,
            is_public: self.is_public.unwrap_or(project.is_public),
            external,
            project_type: project.project_type,
        })
    }
}

fn validate_title(raw: &str) -> Result<String, ProjectValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ProjectValidationError::EmptyTitle);
    }
    if title.chars().count() > TITLE_MAX {
        return Err(ProjectValidationError::TitleTooLong { max: TITLE_MAX });
    }
    Ok(title.to_owned())
}

fn validate_description(raw: Option<&str>) -> Result<String, ProjectValidationError> {
    let description = raw.map(str::trim).unwrap_or_default();
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(ProjectValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX,
        });
    }
    Ok(description.to_owned())
}

fn validate_url(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<String>, ProjectValidationError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if is_http_url(url) && url.len() <= URL_MAX => Ok(Some(url.to_owned())),
        Some(_) => Err(ProjectValidationError::InvalidUrl {
            field,
            max: URL_MAX,
        }),
    }
}

fn validate_external(external: ExternalSource) -> Result<ExternalSource, ProjectValidationError> {
    let author = external
        .author
        .map(|author| author.trim().to_owned())
        .filter(|author| !author.is_empty());
    Ok(ExternalSource {
        url: validate_url("externalUrl", external.url)?,
        embed: validate_url("externalEmbed", external.embed)?,
        author,
    })
}

fn validate_files(
    files: &[ProjectFile],
    main_file: Option<String>,
) -> Result<Option<String>, ProjectValidationError> {
    if files.len() > FILES_MAX {
        return Err(ProjectValidationError::TooManyFiles { max: FILES_MAX });
    }
    for file in files {
        file.validate()?;
    }
    match main_file.map(|name| name.trim().to_owned()) {
        Some(name) if name.is_empty() => Ok(files.first().map(|file| file.name.clone())),
        Some(name) => {
            if files.is_empty() || files.iter().any(|f| f.name == name || f.path == name) {
                Ok(Some(name))
            } else {
                Err(ProjectValidationError::UnknownMainFile { name })
            }
        }
        None => Ok(files.first().map(|file| file.name.clone())),
    }
}

/// Feed page request after clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub limit: u32,
    pub offset: u32,
    pub project_type: Option<ProjectType>,
    pub search: Option<String>,
}

impl FeedQuery {
    /// Build a query, clamping `limit` to `1..=FEED_LIMIT_MAX`.
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit
                .unwrap_or(FEED_LIMIT_DEFAULT)
                .clamp(1, FEED_LIMIT_MAX),
            offset: offset.unwrap_or(0),
            project_type: None,
            search: None,
        }
    }

    pub fn with_type(mut self, project_type: Option<ProjectType>) -> Self {
        self.project_type = project_type;
        self
    }

    /// Attach a free-text filter; blank input is ignored.
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|term| term.trim().to_owned())
            .filter(|term| !term.is_empty());
        self
    }
}

/// One page of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<Project>,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

/// Viewer-specific state attached to a project detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerState {
    pub liked: bool,
    pub favorited: bool,
}

/// Project with derived counters and viewer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetail {
    pub project: Project,
    pub comments: i64,
    pub shares: i64,
    pub viewer: ViewerState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn file(name: &str, path: &str) -> ProjectFile {
        ProjectFile {
            name: name.to_owned(),
            path: path.to_owned(),
            language: Some("html".to_owned()),
            content: None,
            size: 0,
        }
    }

    fn input(title: &str) -> ProjectInput {
        ProjectInput {
            title: title.to_owned(),
            ..ProjectInput::default()
        }
    }

    #[rstest]
    #[case("https://example.com", true)]
    #[case("http://example.com/path?q=1", true)]
    #[case("https://", false)]
    #[case("ftp://example.com", false)]
    #[case("https://exa mple.com", false)]
    #[case("HTTPS://example.com", true)]
    #[case("https://codepen.io:443/ada/pen/ball", true)]
    #[case("https://:@", false)]
    #[case("https://exa<mple>.com", false)]
    #[case("https://[", false)]
    #[case("mailto:ada@example.com", false)]
    fn http_url_detection(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(is_http_url(raw), expected);
    }

    #[rstest]
    #[case("src/index.html", true)]
    #[case("index.html", true)]
    #[case("/etc/passwd", false)]
    #[case("../secret", false)]
    #[case("a//b", false)]
    #[case("a\\b", false)]
    #[case("", false)]
    fn relative_path_detection(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(is_relative_path(raw), expected);
    }

    #[rstest]
    fn draft_defaults_type_from_external_url() {
        let mut with_url = input("Demo");
        with_url.external.url = Some("https://codepen.io/x".to_owned());
        let draft = ProjectDraft::try_from_input(with_url).expect("valid draft");
        assert_eq!(draft.project_type, ProjectType::External);

        let draft = ProjectDraft::try_from_input(input("Demo")).expect("valid draft");
        assert_eq!(draft.project_type, ProjectType::Code);
    }

    #[rstest]
    fn external_type_requires_url() {
        let mut external = input("Demo");
        external.project_type = Some(ProjectType::External);
        assert_eq!(
            ProjectDraft::try_from_input(external),
            Err(ProjectValidationError::MissingExternalUrl)
        );
    }

    #[rstest]
    fn main_file_defaults_to_first_file_and_must_exist() {
        let mut with_files = input("Demo");
        with_files.files = vec![file("index.html", "index.html"), file("app.js", "src/app.js")];
        let draft = ProjectDraft::try_from_input(with_files.clone()).expect("valid draft");
        assert_eq!(draft.main_file.as_deref(), Some("index.html"));

        with_files.main_file = Some("missing.js".to_owned());
        assert_eq!(
            ProjectDraft::try_from_input(with_files),
            Err(ProjectValidationError::UnknownMainFile {
                name: "missing.js".to_owned()
            })
        );
    }

    #[rstest]
    fn rejects_traversal_paths() {
        let mut with_files = input("Demo");
        with_files.files = vec![file("x", "../x")];
        assert!(matches!(
            ProjectDraft::try_from_input(with_files),
            Err(ProjectValidationError::InvalidFilePath { .. })
        ));
    }

    #[rstest]
    #[case("", ProjectValidationError::EmptyTitle)]
    #[case("   ", ProjectValidationError::EmptyTitle)]
    fn rejects_blank_titles(#[case] title: &str, #[case] expected: ProjectValidationError) {
        assert_eq!(ProjectDraft::try_from_input(input(title)), Err(expected));
    }

    #[rstest]
    fn patch_keeps_unchanged_fields() {
        let draft = ProjectDraft::try_from_input(input("Original")).expect("valid draft");
        let now = Utc::now();
        let project = Project {
            id: ProjectId::random(),
            author_id: None,
            title: draft.title,
            description: "keep me".to_owned(),
            files: draft.files,
            main_file: draft.main_file,
            is_public: true,
            views: 3,
            likes: 1,
            external: draft.external,
            project_type: draft.project_type,
            created_at: now,
            updated_at: now,
        };
        let patched = ProjectPatch {
            title: Some(" Renamed ".to_owned()),
            is_public: Some(false),
            ..ProjectPatch::default()
        }
        .apply_to(&project)
        .expect("valid patch");

        assert_eq!(patched.title, "Renamed");
        assert_eq!(patched.description, "keep me");
        assert!(!patched.is_public);
    }

    #[rstest]
    #[case(None, FEED_LIMIT_DEFAULT)]
    #[case(Some(0), 1)]
    #[case(Some(500), FEED_LIMIT_MAX)]
    fn feed_query_clamps_limit(#[case] requested: Option<u32>, #[case] expected: u32) {
        assert_eq!(FeedQuery::new(requested, None).limit, expected);
    }
}
