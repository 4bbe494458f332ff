//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel rows and domain types and hold no
//! business rules. Row structs (`models.rs`) and table definitions
//! (`schema.rs`) stay private to this module.
//!
//! ```ignore
//! use codetok::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/codetok")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_project_repository;
mod diesel_social_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_project_repository::DieselProjectRepository;
pub use diesel_social_repository::DieselSocialRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
