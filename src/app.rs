// Application state shared across handlers
use chrono::Duration;
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    services::{AuthGuard, CredentialService, LinkShortener, PostService},
    store::Store,
    utils::url_validator::UrlValidator,
};

// Ten years
const MAX_SESSION_TTL_SECS: u64 = 315_360_000;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub credentials: CredentialService,
    pub auth_guard: AuthGuard,
    pub shortener: LinkShortener,
    pub posts: PostService,
}

impl AppState {
    /// Wire every service onto `store`
    pub fn new(config: AppConfig, store: Store) -> Self {
        let credentials = CredentialService::new(store.users.clone(), config.password.clone());

        let session_ttl = Duration::seconds(config.session_ttl_secs.min(MAX_SESSION_TTL_SECS) as i64);
        let auth_guard = AuthGuard::new(
            credentials.clone(),
            store.sessions.clone(),
            session_ttl,
            config.authorization_policy(),
        );

        let shortener = LinkShortener::new(
            store.links.clone(),
            UrlValidator::new(&config.service_host),
            config.short_code_max_retries,
        );

        let posts = PostService::new(store.posts.clone());

        Self {
            config: Arc::new(config),
            store,
            credentials,
            auth_guard,
            shortener,
            posts,
        }
    }
}
