//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the id pool, randomness, the language model
//! and the blob store) are implemented by outbound adapters. Driving ports
//! are implemented by domain services and consumed by HTTP handlers.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod blob_store;
mod code_generator;
mod language_model;
mod project_id_pool;
mod project_recommender;
mod project_repository;
mod project_service;
mod random_source;
mod social_repository;
mod social_service;
mod user_files;
mod user_repository;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::AccountService;
#[cfg(test)]
pub use blob_store::MockBlobStore;
pub use blob_store::{BlobStore, BlobStoreError};
#[cfg(test)]
pub use code_generator::MockCodeGenerator;
pub use code_generator::{CodeGenerator, GenerationStream};
#[cfg(test)]
pub use language_model::MockLanguageModel;
pub use language_model::{
    CompletionRequest, LanguageModel, LanguageModelError, TextStream, UnconfiguredLanguageModel,
};
#[cfg(test)]
pub use project_id_pool::MockProjectIdPool;
pub use project_id_pool::{PROJECT_ID_POOL_CAPACITY, ProjectIdPool};
#[cfg(test)]
pub use project_recommender::MockProjectRecommender;
pub use project_recommender::ProjectRecommender;
#[cfg(test)]
pub use project_repository::MockProjectRepository;
pub use project_repository::{ProjectPersistenceError, ProjectRepository};
#[cfg(test)]
pub use project_service::MockProjectService;
pub use project_service::ProjectService;
#[cfg(test)]
pub use random_source::MockRandomSource;
pub use random_source::RandomSource;
#[cfg(test)]
pub use social_repository::MockSocialRepository;
pub use social_repository::{SocialPersistenceError, SocialRepository};
#[cfg(test)]
pub use social_service::MockSocialService;
pub use social_service::SocialService;
#[cfg(test)]
pub use user_files::MockUserFiles;
pub use user_files::UserFiles;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
