// Read-only access to published posts
use std::sync::Arc;
use tracing::debug;

use crate::models::post::{search_terms, PageParams, Post, PostPage};
use crate::store::PostStore;
use crate::utils::service_error::ServiceError;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }

    pub async fn list(&self, page: &PageParams) -> Result<PostPage, ServiceError> {
        Ok(self.posts.published(page.offset(), page.limit()).await?)
    }

    pub async fn detail(&self, id: i64) -> Result<Post, ServiceError> {
        self.posts
            .find_published(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Every whitespace-separated term must match; a blank query matches nothing.
    pub async fn search(&self, query: &str, page: &PageParams) -> Result<PostPage, ServiceError> {
        let terms = search_terms(query);
        debug!("Post search for {:?}", terms);
        Ok(self.posts.search(&terms, page.offset(), page.limit()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::NewPost;
    use crate::store::MemoryStore;

    async fn seeded() -> (PostService, Vec<Post>) {
        let store = Arc::new(MemoryStore::new());
        let mut posts = Vec::new();
        for (title, published) in [("First", true), ("Second", true), ("Draft", false), ("Third", true)] {
            posts.push(
                store
                    .insert_post(NewPost {
                        user_email: "mahlon@martini.nu".into(),
                        title: title.into(),
                        body: format!("{} post body", title),
                        published,
                    })
                    .await,
            );
        }
        (PostService::new(store), posts)
    }

    #[tokio::test]
    async fn test_list_hides_drafts_and_pages() {
        let (service, _) = seeded().await;

        let page = service.list(&PageParams::default()).await.unwrap();
        assert_eq!(page.count, 3);
        let titles: Vec<_> = page.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);

        let page = service
            .list(&PageParams {
                offset: Some(1),
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].title, "Second");
    }

    #[tokio::test]
    async fn test_detail() {
        let (service, posts) = seeded().await;

        assert_eq!(service.detail(posts[0].id).await.unwrap().title, "First");
        assert!(matches!(service.detail(posts[2].id).await, Err(ServiceError::NotFound)));
        assert!(matches!(service.detail(9999).await, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_search() {
        let (service, _) = seeded().await;

        let page = service.search("second BODY", &PageParams::default()).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.posts[0].title, "Second");

        let page = service.search("draft", &PageParams::default()).await.unwrap();
        assert_eq!(page.count, 0);

        let page = service.search("   ", &PageParams::default()).await.unwrap();
        assert_eq!(page.count, 0);
        assert!(page.posts.is_empty());
    }
}
