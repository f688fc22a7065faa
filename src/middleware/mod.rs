// Request extractors and layers shared by the handlers

pub mod auth;
pub mod client_origin;
pub mod cors;

pub use auth::{AuthenticatedUser, MaybeUser};
pub use client_origin::ClientOrigin;
pub use cors::cors_layer;
