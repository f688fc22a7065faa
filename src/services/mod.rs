// Services module for the hix.io backend
// Business logic layer; every service talks to storage through the store traits

pub mod auth_guard;
pub mod credentials;
pub mod posts;
pub mod short_code;
pub mod shortener;

// Re-export commonly used services
pub use auth_guard::{
    AuthGuard, AuthOutcome, AuthRequest, AuthState, AuthorizationPolicy, Credentials,
};
pub use credentials::{CredentialService, ProfileUpdate};
pub use posts::PostService;
pub use shortener::LinkShortener;
