// PostgreSQL store backed by the diesel-async bb8 pool

use async_trait::async_trait;
use bb8::PooledConnection;
use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use super::{
    LinkStore, PostStore, SessionStore, StoreError, StoreHealth, UniqueField, UserStore,
};
use crate::db::DieselPool;
use crate::models::{
    post::{Post, PostPage},
    session::{NewSession, Session},
    short_link::{LinkHit, NewShortLink, ShortLink},
    user::{NewUser, User, UserChanges},
};

type PgConn<'a> = PooledConnection<'a, AsyncDieselConnectionManager<AsyncPgConnection>>;

#[derive(Clone)]
pub struct PostgresStore {
    pool: DieselPool,
}

impl PostgresStore {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<PgConn<'_>, StoreError> {
        self.pool.get().await.map_err(|e| {
            tracing::error!("Failed to get database connection: {}", e);
            StoreError::Pool(e.to_string())
        })
    }
}

/// Map diesel failures onto store errors, naming the unique constraints we handle
fn map_diesel_error(error: DieselError) -> StoreError {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            match info.constraint_name() {
                Some("users_pkey") => StoreError::UniqueViolation(UniqueField::UserEmail),
                Some("urls_short_key") => StoreError::UniqueViolation(UniqueField::LinkShort),
                Some("urls_url_key") => StoreError::UniqueViolation(UniqueField::LinkUrl),
                Some("sessions_token_hash_key") => {
                    StoreError::UniqueViolation(UniqueField::SessionToken)
                },
                other => StoreError::Database(format!(
                    "unique violation on {}: {}",
                    other.unwrap_or("unknown constraint"),
                    info.message()
                )),
            }
        },
        other => StoreError::Database(other.to_string()),
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn().await?;
        User::find_by_email(&mut conn, email)
            .await
            .map_err(map_diesel_error)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut conn = self.conn().await?;
        User::create(&mut conn, &new_user)
            .await
            .map_err(map_diesel_error)
    }

    async fn update(&self, email: &str, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn().await?;
        User::update(&mut conn, email, &changes)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl LinkStore for PostgresStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<ShortLink>, StoreError> {
        let mut conn = self.conn().await?;
        ShortLink::find_by_url(&mut conn, url)
            .await
            .map_err(map_diesel_error)
    }

    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError> {
        let mut conn = self.conn().await?;
        ShortLink::create(&mut conn, &new_link)
            .await
            .map_err(map_diesel_error)
    }

    async fn record_hit(&self, short: &str) -> Result<Option<LinkHit>, StoreError> {
        let mut conn = self.conn().await?;
        ShortLink::record_hit(&mut conn, short)
            .await
            .map_err(map_diesel_error)
    }

    async fn top(&self, limit: i64) -> Result<Vec<ShortLink>, StoreError> {
        let mut conn = self.conn().await?;
        ShortLink::top(&mut conn, limit)
            .await
            .map_err(map_diesel_error)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<ShortLink>, StoreError> {
        let mut conn = self.conn().await?;
        ShortLink::latest(&mut conn, limit)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn insert(&self, new_session: NewSession) -> Result<Session, StoreError> {
        let mut conn = self.conn().await?;
        Session::create(&mut conn, &new_session)
            .await
            .map_err(map_diesel_error)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        let mut conn = self.conn().await?;
        Session::find_by_token_hash(&mut conn, token_hash)
            .await
            .map_err(map_diesel_error)
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        Session::delete_by_token_hash(&mut conn, token_hash)
            .await
            .map(|deleted| deleted > 0)
            .map_err(map_diesel_error)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut conn = self.conn().await?;
        Session::delete_expired(&mut conn, now)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl PostStore for PostgresStore {
    async fn published(&self, offset: i64, limit: i64) -> Result<PostPage, StoreError> {
        let mut conn = self.conn().await?;
        let count = Post::count_published(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let posts = Post::published(&mut conn, offset, limit)
            .await
            .map_err(map_diesel_error)?;
        Ok(PostPage { count, posts })
    }

    async fn find_published(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let mut conn = self.conn().await?;
        Post::find_published(&mut conn, id)
            .await
            .map_err(map_diesel_error)
    }

    async fn search(&self, terms: &[String], offset: i64, limit: i64) -> Result<PostPage, StoreError> {
        if terms.is_empty() {
            return Ok(PostPage {
                count: 0,
                posts: Vec::new(),
            });
        }

        let mut conn = self.conn().await?;
        Post::search(&mut conn, terms, offset, limit)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl StoreHealth for PostgresStore {
    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
