use std::sync::Arc;

use mg_context::ContextRetriever;
use mg_domain::config::Config;
use mg_sessions::{SessionPool, UserResolver};

use crate::models::ModelRegistry;

/// Shared application state passed to all API handlers.
///
/// Everything here is immutable after startup except the session pool's
/// internal map and the cookie jars inside each session, both of which
/// synchronize internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<UserResolver>,
    pub models: Arc<ModelRegistry>,
    pub pool: Arc<SessionPool>,
    /// `None` when context retrieval is disabled.
    pub retriever: Option<Arc<ContextRetriever>>,
}
