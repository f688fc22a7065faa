// Persistence seams for users, links, sessions and posts
//
// Services only talk to these traits. The PostgreSQL backend enforces every
// invariant with constraints and single-statement updates; the in-memory
// backend applies each operation under one lock.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::db::DieselPool;
use crate::models::{
    post::{Post, PostPage},
    session::{NewSession, Session},
    short_link::{LinkHit, NewShortLink, ShortLink},
    user::{NewUser, User, UserChanges},
};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Unique constraints the services know how to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    UserEmail,
    LinkShort,
    LinkUrl,
    SessionToken,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated on {0:?}")]
    UniqueViolation(UniqueField),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn update(&self, email: &str, changes: UserChanges) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn find_by_url(&self, url: &str) -> Result<Option<ShortLink>, StoreError>;
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError>;
    /// Atomically add one hit and return the target with the new count.
    async fn record_hit(&self, short: &str) -> Result<Option<LinkHit>, StoreError>;
    async fn top(&self, limit: i64) -> Result<Vec<ShortLink>, StoreError>;
    async fn latest(&self, limit: i64) -> Result<Vec<ShortLink>, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, new_session: NewSession) -> Result<Session, StoreError>;
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, StoreError>;
    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, StoreError>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn published(&self, offset: i64, limit: i64) -> Result<PostPage, StoreError>;
    async fn find_published(&self, id: i64) -> Result<Option<Post>, StoreError>;
    async fn search(&self, terms: &[String], offset: i64, limit: i64) -> Result<PostPage, StoreError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    fn backend_name(&self) -> &'static str;
    async fn ping(&self) -> Result<(), StoreError>;
}

/// The set of stores the application runs on, built once at startup
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub links: Arc<dyn LinkStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub posts: Arc<dyn PostStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl Store {
    pub fn postgres(pool: DieselPool) -> Self {
        let backend = Arc::new(PostgresStore::new(pool));
        Self {
            users: backend.clone(),
            links: backend.clone(),
            sessions: backend.clone(),
            posts: backend.clone(),
            health: backend,
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::default()))
    }

    /// Share an existing in-memory backend (lets callers seed data first)
    pub fn from_memory(backend: Arc<MemoryStore>) -> Self {
        Self {
            users: backend.clone(),
            links: backend.clone(),
            sessions: backend.clone(),
            posts: backend.clone(),
            health: backend,
        }
    }
}
