//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data<HttpState>` and depend only on
//! the driving ports, so they can be exercised with mocks or the in-memory
//! adapters.

use std::sync::Arc;

use crate::domain::ports::{
    AccountService, CodeGenerator, ProjectRecommender, ProjectService, SocialService, UserFiles,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub projects: Arc<dyn ProjectService>,
    pub recommender: Arc<dyn ProjectRecommender>,
    pub social: Arc<dyn SocialService>,
    pub generator: Arc<dyn CodeGenerator>,
    pub files: Arc<dyn UserFiles>,
}
