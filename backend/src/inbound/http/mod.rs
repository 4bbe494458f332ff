//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every resource module exposes a `configure` function registering its
//! scope; [`api`] mounts them all under `/api`.

pub mod ai;
pub mod auth;
pub mod cache_control;
pub mod dto;
pub mod error;
pub mod files;
pub mod health;
pub mod i18n;
pub mod projects;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod social;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api` resource. The caller provides the enclosing scope.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use codetok::domain::DEFAULT_UPLOAD_LIMIT;
/// use codetok::inbound::http::api;
///
/// let _app = App::new().service(web::scope("/api").configure(api(DEFAULT_UPLOAD_LIMIT)));
/// ```
pub fn api(upload_limit: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.configure(auth::configure)
            .configure(users::configure)
            .configure(projects::configure)
            .configure(social::configure)
            .configure(ai::configure)
            .configure(files::configure(upload_limit))
            .configure(i18n::configure);
    }
}
