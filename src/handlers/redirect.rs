// Short code redirects
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::{app::AppState, utils::service_error::ServiceError};

/// GET /{short} - 302 to the target, counting the hit
pub async fn follow(
    State(state): State<AppState>,
    Path(short): Path<String>,
) -> Result<Response, ServiceError> {
    let target = state.shortener.resolve_and_record_hit(&short).await?;
    info!("Redirecting {} to {}", short, target);

    Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response())
}
