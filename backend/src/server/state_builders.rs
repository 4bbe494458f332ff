//! Builders for HTTP state ports.
//!
//! Repository-backed services run on Diesel when a pool is configured and on
//! the in-memory store otherwise. The language model falls back to an
//! adapter that reports every provider as unconfigured, so generation
//! answers 503 until an API key is set.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};
use zeroize::Zeroizing;

use codetok::AppSettings;
use codetok::domain::ports::{
    AccountService, LanguageModel, ProjectRecommender, ProjectRepository, ProjectService,
    SocialRepository, SocialService, UnconfiguredLanguageModel, UserRepository,
};
use codetok::domain::{
    AccountsService, FilesService, GenerationService, InteractionsService, ProjectsService,
    RecommendationService,
};
use codetok::inbound::http::state::HttpState;
use codetok::outbound::cache::TtlProjectIdPool;
use codetok::outbound::llm::OpenAiCompatibleModel;
use codetok::outbound::memory::InMemoryStore;
use codetok::outbound::persistence::{
    DieselProjectRepository, DieselSocialRepository, DieselUserRepository,
};
use codetok::outbound::random::ThreadRandom;
use codetok::outbound::storage::CapStdBlobStore;

use super::ServerConfig;

/// Ports backed by the user, project and social repositories.
struct RepositoryPorts {
    accounts: Arc<dyn AccountService>,
    projects: Arc<dyn ProjectService>,
    recommender: Arc<dyn ProjectRecommender>,
    social: Arc<dyn SocialService>,
}

fn repository_ports<U, P, S>(users: Arc<U>, projects: Arc<P>, social: Arc<S>) -> RepositoryPorts
where
    U: UserRepository + 'static,
    P: ProjectRepository + 'static,
    S: SocialRepository + 'static,
{
    let pool = Arc::new(TtlProjectIdPool::new(Arc::new(DefaultClock)));
    RepositoryPorts {
        accounts: Arc::new(AccountsService::new(
            Arc::clone(&users),
            Arc::clone(&projects),
            Arc::clone(&social),
        )),
        projects: Arc::new(ProjectsService::new(
            Arc::clone(&projects),
            Arc::clone(&social),
        )),
        recommender: Arc::new(RecommendationService::new(
            Arc::clone(&projects),
            pool,
            Arc::new(ThreadRandom),
        )),
        social: Arc::new(InteractionsService::new(users, projects, social)),
    }
}

fn build_repository_ports(config: &ServerConfig) -> RepositoryPorts {
    match &config.db_pool {
        Some(pool) => repository_ports(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselProjectRepository::new(pool.clone())),
            Arc::new(DieselSocialRepository::new(pool.clone())),
        ),
        None => {
            warn!("no database configured; using in-memory repositories");
            let store = Arc::new(InMemoryStore::new());
            repository_ports(Arc::clone(&store), Arc::clone(&store), store)
        }
    }
}

/// Pick the language model adapter for the configured provider.
///
/// # Errors
///
/// Returns an I/O error when the provider base URL is malformed or the HTTP
/// client cannot be built.
fn build_language_model(settings: &AppSettings) -> io::Result<Arc<dyn LanguageModel>> {
    let Some(api_key) = settings.llm_api_key() else {
        warn!("no model API key configured; code generation is disabled");
        return Ok(Arc::new(UnconfiguredLanguageModel));
    };
    let model = OpenAiCompatibleModel::new(
        settings.llm_provider(),
        settings.llm_base_url(),
        Zeroizing::new(api_key.to_owned()),
    )
    .map_err(|err| io::Error::other(format!("language model client: {err}")))?;
    info!(
        provider = settings.llm_provider(),
        base_url = settings.llm_base_url(),
        "language model configured"
    );
    Ok(Arc::new(model))
}

/// Build the shared HTTP state from the configured adapters.
///
/// # Errors
///
/// Returns an I/O error when the blob root cannot be opened or the model
/// client cannot be built.
pub(super) fn build_http_state(config: &ServerConfig) -> io::Result<web::Data<HttpState>> {
    let settings = &config.settings;
    let blob_root = settings.blob_root();
    let blobs = Arc::new(CapStdBlobStore::open(&blob_root).map_err(|err| {
        io::Error::other(format!("open blob root {}: {err}", blob_root.display()))
    })?);
    let model = build_language_model(settings)?;
    let generator = GenerationService::new(model, Arc::clone(&blobs), settings.models())
        .with_progress_interval(settings.progress_interval());
    let RepositoryPorts {
        accounts,
        projects,
        recommender,
        social,
    } = build_repository_ports(config);

    Ok(web::Data::new(HttpState {
        accounts,
        projects,
        recommender,
        social,
        generator: Arc::new(generator),
        files: Arc::new(FilesService::new(blobs)),
    }))
}
