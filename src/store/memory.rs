// In-memory store for local development and tests
//
// Every operation runs under a single RwLock, which gives the same per-operation
// atomicity the PostgreSQL constraints provide.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{
    LinkStore, PostStore, SessionStore, StoreError, StoreHealth, UniqueField, UserStore,
};
use crate::models::{
    post::{NewPost, Post, PostPage},
    session::{NewSession, Session},
    short_link::{LinkHit, NewShortLink, ShortLink},
    user::{NewUser, User, UserChanges},
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    links: Vec<ShortLink>,
    sessions: HashMap<String, Session>,
    posts: Vec<Post>,
    next_link_id: i64,
    next_session_id: i64,
    next_post_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a post directly; posts have no write path through the API.
    pub async fn insert_post(&self, new_post: NewPost) -> Post {
        let mut tables = self.tables.write().await;
        tables.next_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: tables.next_post_id,
            user_email: new_post.user_email,
            title: new_post.title,
            body: new_post.body,
            published: new_post.published,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        post
    }

    /// Set or clear a user's disable timestamp
    pub async fn set_disable_on(&self, email: &str, disable_on: Option<DateTime<Utc>>) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(email) {
            Some(user) => {
                user.disable_on = disable_on;
                true
            },
            None => false,
        }
    }

    pub async fn link_count(&self) -> usize {
        self.tables.read().await.links.len()
    }

    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }
}

fn sorted_published(posts: &[Post]) -> Vec<Post> {
    let mut published: Vec<Post> = posts.iter().filter(|p| p.published).cloned().collect();
    published.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
    published
}

fn page(posts: Vec<Post>, offset: i64, limit: i64) -> PostPage {
    let count = posts.len() as i64;
    let posts = posts
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    PostPage { count, posts }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(email).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&new_user.email) {
            return Err(StoreError::UniqueViolation(UniqueField::UserEmail));
        }

        let now = Utc::now();
        let user = User {
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            api_secret: new_user.api_secret,
            disable_on: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, email: &str, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(email) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = changes.updated_at.unwrap_or_else(Utc::now);
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<ShortLink>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.links.iter().find(|link| link.url == url).cloned())
    }

    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.links.iter().any(|link| link.url == new_link.url) {
            return Err(StoreError::UniqueViolation(UniqueField::LinkUrl));
        }
        if tables.links.iter().any(|link| link.short == new_link.short) {
            return Err(StoreError::UniqueViolation(UniqueField::LinkShort));
        }

        tables.next_link_id += 1;
        let link = ShortLink {
            id: tables.next_link_id,
            short: new_link.short,
            url: new_link.url,
            user_email: new_link.user_email,
            source_ip: new_link.source_ip,
            hits: 0,
            created_at: Utc::now(),
        };
        tables.links.push(link.clone());
        Ok(link)
    }

    async fn record_hit(&self, short: &str) -> Result<Option<LinkHit>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .links
            .iter_mut()
            .find(|link| link.short == short)
            .map(|link| {
                link.hits += 1;
                LinkHit {
                    url: link.url.clone(),
                    hits: link.hits,
                }
            }))
    }

    async fn top(&self, limit: i64) -> Result<Vec<ShortLink>, StoreError> {
        let tables = self.tables.read().await;
        let mut links = tables.links.clone();
        links.sort_by(|a, b| b.hits.cmp(&a.hits).then(a.id.cmp(&b.id)));
        links.truncate(limit.max(0) as usize);
        Ok(links)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<ShortLink>, StoreError> {
        let tables = self.tables.read().await;
        let mut links = tables.links.clone();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        links.truncate(limit.max(0) as usize);
        Ok(links)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, new_session: NewSession) -> Result<Session, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(&new_session.token_hash) {
            return Err(StoreError::UniqueViolation(UniqueField::SessionToken));
        }

        tables.next_session_id += 1;
        let session = Session {
            id: tables.next_session_id,
            token_hash: new_session.token_hash,
            user_email: new_session.user_email,
            source_ip: new_session.source_ip,
            created_at: Utc::now(),
            expires_at: new_session.expires_at,
        };
        tables
            .sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.tables.read().await.sessions.get(token_hash).cloned())
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .write()
            .await
            .sessions
            .remove(token_hash)
            .is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| session.expires_at > now);
        Ok(before - tables.sessions.len())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn published(&self, offset: i64, limit: i64) -> Result<PostPage, StoreError> {
        let tables = self.tables.read().await;
        Ok(page(sorted_published(&tables.posts), offset, limit))
    }

    async fn find_published(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|post| post.id == id && post.published)
            .cloned())
    }

    async fn search(&self, terms: &[String], offset: i64, limit: i64) -> Result<PostPage, StoreError> {
        if terms.is_empty() {
            return Ok(PostPage {
                count: 0,
                posts: Vec::new(),
            });
        }

        let tables = self.tables.read().await;
        let needles: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let matches = sorted_published(&tables.posts)
            .into_iter()
            .filter(|post| {
                let haystack = format!("{} {}", post.title, post.body).to_lowercase();
                needles.iter().all(|needle| haystack.contains(needle.as_str()))
            })
            .collect();
        Ok(page(matches, offset, limit))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_link(short: &str, url: &str) -> NewShortLink {
        NewShortLink {
            short: short.to_string(),
            url: url.to_string(),
            user_email: None,
            source_ip: "127.0.0.1".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_link_unique_constraints() {
        let store = MemoryStore::new();
        LinkStore::insert(&store, new_link("aaaaaaa", "https://a.example/"))
            .await
            .unwrap();

        let dup_url = LinkStore::insert(&store, new_link("bbbbbbb", "https://a.example/")).await;
        assert!(matches!(
            dup_url,
            Err(StoreError::UniqueViolation(UniqueField::LinkUrl))
        ));

        let dup_code = LinkStore::insert(&store, new_link("aaaaaaa", "https://b.example/")).await;
        assert!(matches!(
            dup_code,
            Err(StoreError::UniqueViolation(UniqueField::LinkShort))
        ));
        assert_eq!(store.link_count().await, 1);
    }

    #[tokio::test]
    async fn test_search_requires_every_term() {
        let store = MemoryStore::new();
        for (title, body, published) in [
            ("Rust and axum", "routing with tower", true),
            ("Rust only", "nothing else", true),
            ("Draft about axum", "rust", false),
        ] {
            store
                .insert_post(NewPost {
                    user_email: "mahlon@martini.nu".into(),
                    title: title.into(),
                    body: body.into(),
                    published,
                })
                .await;
        }

        let page = PostStore::search(&store, &["rust".into(), "AXUM".into()], 0, 10)
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.posts[0].title, "Rust and axum");
    }
}
