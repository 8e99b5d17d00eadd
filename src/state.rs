use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use std::sync::Arc;

use crate::{
    config::Config, db::RatingStore, ratings::email_policy::EmailPolicy, search::SearchClient,
};

/// Collaborators every handler needs, built once at startup and injected.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RatingStore>,
    /// `None` when no search API key is configured.
    pub search: Option<Arc<dyn SearchClient>>,
    pub email_policy: Arc<EmailPolicy>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RatingStore>,
        search: Option<Arc<dyn SearchClient>>,
        config: Config,
    ) -> Self {
        let email_policy = EmailPolicy::default().with_extra_domains(
            &config.extra_allowed_email_domains,
            &config.extra_blocked_email_domains,
        );

        Self {
            store,
            search,
            email_policy: Arc::new(email_policy),
            config: Arc::new(config),
        }
    }
}

pub type RedisClient = Pool<RedisConnectionManager>;
