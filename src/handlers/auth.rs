// Session endpoints: who-am-I, login, profile update, logout
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    app::AppState,
    handlers::{form_credentials, form_fields},
    middleware::{
        auth::{header_credentials, removal_cookie, session_cookie, session_token},
        AuthenticatedUser, ClientOrigin, MaybeUser,
    },
    models::user::UserResponse,
    services::{AuthRequest, ProfileUpdate},
    utils::service_error::ServiceError,
};

/// GET /auth - Current identity, or `{}` when anonymous
pub async fn who_am_i(maybe_user: MaybeUser) -> Json<Value> {
    match maybe_user.user {
        Some(user) => Json(json!(UserResponse::from(&user))),
        None => Json(json!({})),
    }
}

/// POST /auth - Log in with form fields or `email`/`password` headers
pub async fn login(
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

    let outcome = state.auth_guard.authenticate(&request).await?;
    let body = Json(UserResponse::from(&outcome.user));

    match outcome.new_session_token {
        Some(token) => {
            let cookie = session_cookie(&state.config, token, state.auth_guard.session_ttl());
            Ok((jar.add(cookie), body).into_response())
        },
        None => Ok(body.into_response()),
    }
}

/// PATCH /auth - Update display name and/or password
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    body: Bytes,
) -> Result<Json<UserResponse>, ServiceError> {
    let mut fields = form_fields(&body);
    let update = ProfileUpdate {
        name: fields.remove("name"),
        password: fields.remove("password"),
    };

    let updated = state.credentials.update_profile(&user.email, update).await?;
    Ok(Json(UserResponse::from(&updated)))
}

/// DELETE /auth - Drop the session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ServiceError> {
    if let Some(token) = session_token(&jar, &state.config.session_cookie_name) {
        state.auth_guard.logout(&token).await?;
    } else {
        debug!("Logout without a session cookie");
    }

    Ok((jar.add(removal_cookie(&state.config)), Json("")))
}
