use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::app_config::AppConfig;

/// CORS for the presentation layer
///
/// Development reflects any origin; elsewhere only the service host itself is
/// allowed, with credentials so the session cookie travels.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .allow_credentials(true);

    if config.is_development() {
        debug!("CORS: reflecting request origin in development");
        return base.allow_origin(AllowOrigin::mirror_request());
    }

    let origin = format!("https://{}", config.service_host);
    match HeaderValue::from_str(&origin) {
        Ok(value) => base.allow_origin(value),
        Err(e) => {
            warn!("CORS: service host {} is not a valid origin: {}", origin, e);
            base
        },
    }
}
