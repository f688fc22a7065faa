pub mod post;
pub mod session;
pub mod short_link;
pub mod user;

// Re-export common types
pub use post::{NewPost, PageParams, Post, PostPage, SearchParams};
pub use session::{NewSession, Session, SessionToken};
pub use short_link::{LinkHit, LinkSummary, NewShortLink, ShortLink, ShortLinkResponse};
pub use user::{NewUser, User, UserChanges, UserResponse};
