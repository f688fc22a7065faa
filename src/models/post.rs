// Blog post model (read-only through the API)

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};

use crate::schema::posts;

/// Search queries longer than this are truncated before splitting into terms
pub const MAX_SEARCH_LENGTH: usize = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i64,
    pub user_email: String,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Posts are authored outside this service; only the in-memory store inserts them
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_email: String,
    pub title: String,
    pub body: String,
    pub published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPage {
    pub count: i64,
    pub posts: Vec<Post>,
}

/// `offset`/`limit` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchParams {
    pub fn page(&self) -> PageParams {
        PageParams {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Split a raw query into search terms. Empty result means "match nothing".
pub fn search_terms(raw: &str) -> Vec<String> {
    let truncated: String = raw.chars().take(MAX_SEARCH_LENGTH).collect();
    truncated.split_whitespace().map(str::to_string).collect()
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

const SEARCH_PREDICATE: &str = "published AND to_tsvector('english', title || ' ' || body) \
                                @@ plainto_tsquery('english', $1)";

impl Post {
    /// Published posts in update order
    pub async fn published(
        conn: &mut AsyncPgConnection,
        offset: i64,
        limit: i64,
    ) -> QueryResult<Vec<Self>> {
        posts::table
            .filter(posts::published.eq(true))
            .order((posts::updated_at.asc(), posts::id.asc()))
            .offset(offset)
            .limit(limit)
            .select(Post::as_select())
            .load(conn)
            .await
    }

    pub async fn count_published(conn: &mut AsyncPgConnection) -> QueryResult<i64> {
        posts::table
            .filter(posts::published.eq(true))
            .count()
            .get_result(conn)
            .await
    }

    pub async fn find_published(conn: &mut AsyncPgConnection, post_id: i64) -> QueryResult<Option<Self>> {
        posts::table
            .filter(posts::id.eq(post_id))
            .filter(posts::published.eq(true))
            .select(Post::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Full-text search over title and body; every term must match.
    pub async fn search(
        conn: &mut AsyncPgConnection,
        terms: &[String],
        offset: i64,
        limit: i64,
    ) -> QueryResult<PostPage> {
        let query_text = terms.join(" ");

        let count = diesel::sql_query(format!("SELECT count(*) AS count FROM posts WHERE {}", SEARCH_PREDICATE))
            .bind::<Text, _>(&query_text)
            .get_result::<CountRow>(conn)
            .await?
            .count;

        let posts = diesel::sql_query(format!(
            "SELECT id, user_email, title, body, published, created_at, updated_at \
             FROM posts WHERE {} ORDER BY updated_at ASC, id ASC OFFSET $2 LIMIT $3",
            SEARCH_PREDICATE
        ))
        .bind::<Text, _>(&query_text)
        .bind::<BigInt, _>(offset)
        .bind::<BigInt, _>(limit)
        .load::<Post>(conn)
        .await?;

        Ok(PostPage { count, posts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_terms() {
        assert_eq!(search_terms("  rust   axum\tdiesel "), vec!["rust", "axum", "diesel"]);
        assert!(search_terms("").is_empty());
        assert!(search_terms("   \n ").is_empty());
    }

    #[test]
    fn test_search_terms_truncates_long_queries() {
        let long = format!("{} tail", "a".repeat(MAX_SEARCH_LENGTH));
        let terms = search_terms(&long);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].len(), MAX_SEARCH_LENGTH);
    }

    #[test]
    fn test_page_params_clamping() {
        let params = PageParams::default();
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);

        let params = PageParams {
            offset: Some(-5),
            limit: Some(10_000),
        };
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
    }
}
