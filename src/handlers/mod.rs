// HTTP handlers and route builders

pub mod auth;
pub mod health;
pub mod posts;
pub mod redirect;
pub mod urls;

use std::collections::HashMap;

use crate::app::AppState;
use crate::services::auth_guard::Credentials;
use axum::{body::Bytes, routing::get, Router};

// Session routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route(
        "/auth",
        get(auth::who_am_i)
            .post(auth::login)
            .patch(auth::update_profile)
            .delete(auth::logout),
    )
}

// Short link routes; the catch-all code route is registered last by the caller
pub fn url_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", get(urls::summary).post(urls::create))
        .route("/urls/summary", get(urls::summary))
}

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(posts::list))
        .route("/posts/search", get(posts::search))
        .route("/posts/{id}", get(posts::detail))
}

/// Decode an `application/x-www-form-urlencoded` body. Later keys win.
pub(crate) fn form_fields(body: &Bytes) -> HashMap<String, String> {
    url::form_urlencoded::parse(body)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// `email` and `password` form fields, when both are present
pub(crate) fn form_credentials(fields: &HashMap<String, String>) -> Option<Credentials> {
    Some(Credentials {
        identity: fields.get("email")?.clone(),
        secret: fields.get("password")?.clone(),
    })
}
