use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::AppState;

/// GET /health - Store reachability
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let backend = state.store.health.backend_name();

    let (healthy, store_health) = match state.store.health.ping().await {
        Ok(()) => (
            true,
            json!({
                "status": "healthy",
                "backend": backend,
                "error": null
            }),
        ),
        Err(e) => {
            tracing::error!("Store health check failed: {}", e);
            (
                false,
                json!({
                    "status": "unhealthy",
                    "backend": backend,
                    "error": e.to_string()
                }),
            )
        },
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "service": "hix-backend",
        "timestamp": timestamp,
        "components": {
            "store": store_health
        }
    });

    if healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
