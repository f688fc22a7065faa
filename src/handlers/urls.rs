// Short link listing and creation
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    app::AppState,
    handlers::{form_credentials, form_fields},
    middleware::{
        auth::{header_credentials, session_cookie, session_token},
        ClientOrigin,
    },
    models::short_link::{LinkSummary, ShortLinkResponse},
    services::AuthRequest,
    utils::service_error::ServiceError,
};

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub limit: Option<i64>,
}

/// GET /urls/summary and GET /urls - Most visited and most recent links
pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<LinkSummary>, ServiceError> {
    let limit = params.limit.unwrap_or(state.config.summary_limit);
    Ok(Json(state.shortener.summary(limit).await?))
}

/// POST /urls - Shorten the `url` form field
///
/// Authenticates from the session cookie, then from `email`/`password` form
/// fields or headers. Anonymous requests are allowed from trusted netblocks.
pub async fn create(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let fields = form_fields(&body);
    let request = AuthRequest {
        session_token: session_token(&jar, &state.config.session_cookie_name),
        credentials: form_credentials(&fields).or_else(|| header_credentials(&headers)),
        origin,
    };

    let outcome = match state.auth_guard.authenticate(&request).await {
        Ok(outcome) => Some(outcome),
        Err(ServiceError::AuthenticationRequired) => None,
        Err(e) => return Err(e),
    };

    // A session opened from credentials is returned even when the link is refused
    let jar = match outcome.as_ref().and_then(|o| o.new_session_token.clone()) {
        Some(token) => jar.add(session_cookie(
            &state.config,
            token,
            state.auth_guard.session_ttl(),
        )),
        None => jar,
    };

    let user = outcome.as_ref().map(|o| &o.user);
    let created = match state.auth_guard.authorize(user, origin) {
        Ok(()) => {
            let raw_url = fields.get("url").map(String::as_str).unwrap_or_default();
            state
                .shortener
                .shorten(raw_url, user.map(|u| u.email.as_str()), origin)
                .await
        },
        Err(e) => Err(e),
    };

    match created {
        Ok(link) => Ok((jar, Json(ShortLinkResponse::from(&link))).into_response()),
        Err(e) => Ok((jar, e).into_response()),
    }
}
