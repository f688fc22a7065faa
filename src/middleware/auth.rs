// Session extraction for handlers
//
// `MaybeUser` resolves the session cookie and never rejects; `AuthenticatedUser`
// rejects with 401 when no valid session is present. Neither consults
// credentials: handlers that accept credentials go through `AuthGuard::authenticate`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use std::net::IpAddr;

use crate::app::AppState;
use crate::app_config::AppConfig;
use crate::middleware::client_origin::ClientOrigin;
use crate::models::user::User;
use crate::services::auth_guard::Credentials;
use crate::utils::service_error::ServiceError;

/// Optional identity resolved from the session cookie
#[derive(Debug, Clone)]
pub struct MaybeUser {
    pub user: Option<User>,
    pub origin: IpAddr,
}

/// Identity resolved from the session cookie; 401 otherwise
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub origin: IpAddr,
}

pub fn session_token(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    jar.get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// `email` and `password` request headers, when both are present
pub fn header_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    Some(Credentials {
        identity: value("email")?,
        secret: value("password")?,
    })
}

pub fn session_cookie(config: &AppConfig, token: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.session_cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ClientOrigin(origin) = ClientOrigin::from_request_parts(parts, state).await?;
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&jar, &state.config.session_cookie_name);

        let user = state
            .auth_guard
            .check_session(token.as_deref(), origin)
            .await?;

        Ok(MaybeUser { user, origin })
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser { user, origin } = MaybeUser::from_request_parts(parts, state).await?;

        user.map(|user| AuthenticatedUser { user, origin })
            .ok_or(ServiceError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_from_jar() {
        let jar = CookieJar::new().add(("hix_io_session", "abc123"));
        assert_eq!(session_token(&jar, "hix_io_session"), Some("abc123".to_string()));
        assert_eq!(session_token(&jar, "other"), None);

        let jar = CookieJar::new().add(("hix_io_session", ""));
        assert_eq!(session_token(&jar, "hix_io_session"), None);
    }

    #[test]
    fn test_header_credentials_need_both_halves() {
        let mut headers = HeaderMap::new();
        headers.insert("email", HeaderValue::from_static("mahlon@martini.nu"));
        assert!(header_credentials(&headers).is_none());

        headers.insert("password", HeaderValue::from_static("secret"));
        let credentials = header_credentials(&headers).unwrap();
        assert_eq!(credentials.identity, "mahlon@martini.nu");
        assert_eq!(credentials.secret, "secret");
    }

    #[test]
    fn test_cookies() {
        let config = AppConfig::default();

        let cookie = session_cookie(&config, "tok".to_string(), Duration::hours(1));
        assert_eq!(cookie.name(), "hix_io_session");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(1)));

        let removal = removal_cookie(&config);
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(time::Duration::ZERO));
    }
}
