// Published posts: listing, search, detail
use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    app::AppState,
    models::post::{PageParams, Post, PostPage, SearchParams},
    utils::service_error::ServiceError,
};

/// GET /posts?offset&limit
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<PostPage>, ServiceError> {
    Ok(Json(state.posts.list(&page).await?))
}

/// GET /posts/search?q&offset&limit
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<PostPage>, ServiceError> {
    let query = params.q.as_deref().unwrap_or_default();
    Ok(Json(state.posts.search(query, &params.page()).await?))
}

/// GET /posts/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ServiceError> {
    // Non-numeric ids are just unknown posts
    let id = id.parse::<i64>().map_err(|_| ServiceError::NotFound)?;
    Ok(Json(state.posts.detail(id).await?))
}
