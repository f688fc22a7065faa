// Per-request authentication state machine and write authorization
//
// Unauthenticated -> SessionCheck -> CredentialCheck -> Authenticated | Rejected
//
// A session is honored only from the origin that created it. Anything wrong with
// a session (unknown, expired, foreign origin, disabled owner) falls through to
// the credential check instead of producing its own error.

use chrono::{Duration, Utc};
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, trace};

use crate::models::session::{hash_token, NewSession, SessionToken};
use crate::models::user::User;
use crate::services::credentials::CredentialService;
use crate::store::SessionStore;
use crate::utils::audit_logger::{AuditAction, AuditEntry, AuditLogger};
use crate::utils::service_error::ServiceError;

/// Who may create links
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationPolicy {
    /// Any authenticated identity
    Permissive,
    /// Any request from inside these blocks, authenticated or not
    Netblock(Vec<IpNetwork>),
}

impl AuthorizationPolicy {
    pub fn allows_origin(&self, origin: IpAddr) -> bool {
        match self {
            AuthorizationPolicy::Permissive => false,
            AuthorizationPolicy::Netblock(blocks) => {
                blocks.iter().any(|block| block.contains(origin))
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub session_token: Option<String>,
    pub credentials: Option<Credentials>,
    pub origin: IpAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    SessionCheck,
    CredentialCheck,
    Authenticated,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: User,
    /// Set when credentials were checked and a new session was opened
    pub new_session_token: Option<String>,
}

#[derive(Clone)]
pub struct AuthGuard {
    credentials: CredentialService,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
    policy: AuthorizationPolicy,
}

impl AuthGuard {
    pub fn new(
        credentials: CredentialService,
        sessions: Arc<dyn SessionStore>,
        session_ttl: Duration,
        policy: AuthorizationPolicy,
    ) -> Self {
        Self {
            credentials,
            sessions,
            session_ttl,
            policy,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Resolve a request to an identity, opening a session when credentials were used.
    pub async fn authenticate(&self, request: &AuthRequest) -> Result<AuthOutcome, ServiceError> {
        let mut state = AuthState::Unauthenticated;
        let mut outcome = None;

        loop {
            trace!(?state, origin = %request.origin, "auth state");

            state = match state {
                AuthState::Unauthenticated => {
                    if request.session_token.is_some() {
                        AuthState::SessionCheck
                    } else {
                        AuthState::CredentialCheck
                    }
                },
                AuthState::SessionCheck => {
                    let user = self
                        .check_session(request.session_token.as_deref(), request.origin)
                        .await?;
                    match user {
                        Some(user) => {
                            outcome = Some(AuthOutcome {
                                user,
                                new_session_token: None,
                            });
                            AuthState::Authenticated
                        },
                        None => AuthState::CredentialCheck,
                    }
                },
                AuthState::CredentialCheck => match &request.credentials {
                    Some(credentials) => {
                        outcome = self.check_credentials(credentials, request.origin).await?;
                        if outcome.is_some() {
                            AuthState::Authenticated
                        } else {
                            AuthState::Rejected
                        }
                    },
                    None => AuthState::Rejected,
                },
                AuthState::Authenticated => return outcome.ok_or(ServiceError::InternalError),
                AuthState::Rejected => return Err(ServiceError::AuthenticationRequired),
            };
        }
    }

    /// Session-only resolution. `None` for a missing, unknown, expired or foreign session.
    pub async fn check_session(
        &self,
        token: Option<&str>,
        origin: IpAddr,
    ) -> Result<Option<User>, ServiceError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let token_hash = hash_token(token);
        let Some(session) = self.sessions.find_by_token_hash(&token_hash).await? else {
            debug!("Unknown session token");
            return Ok(None);
        };

        if session.is_expired_at(Utc::now()) {
            debug!("Session for {} expired at {}", session.user_email, session.expires_at);
            self.sessions.delete_by_token_hash(&token_hash).await?;
            return Ok(None);
        }

        if session.origin() != origin {
            AuditLogger::record(
                AuditEntry::new(AuditAction::SessionOriginMismatch, "session")
                    .identity(Some(session.user_email.as_str()))
                    .origin(origin)
                    .details(format!("session bound to {}", session.origin())),
            );
            return Ok(None);
        }

        let user = self.credentials.find_by_identity(&session.user_email).await?;
        Ok(user.filter(|u| u.is_active()))
    }

    async fn check_credentials(
        &self,
        credentials: &Credentials,
        origin: IpAddr,
    ) -> Result<Option<AuthOutcome>, ServiceError> {
        let user = match self.credentials.find_by_identity(&credentials.identity).await? {
            Some(user) => user,
            None => {
                self.credentials.verify_unknown(&credentials.secret).await;
                self.record_login_failure(&credentials.identity, origin);
                return Ok(None);
            },
        };

        if !self.credentials.verify_secret(&user, &credentials.secret).await || !user.is_active() {
            self.record_login_failure(&user.email, origin);
            return Ok(None);
        }

        let token = SessionToken::generate();
        self.sessions
            .insert(NewSession {
                token_hash: token.token_hash,
                user_email: user.email.clone(),
                source_ip: IpNetwork::from(origin),
                expires_at: Utc::now() + self.session_ttl,
            })
            .await?;

        AuditLogger::record(
            AuditEntry::new(AuditAction::LoginSucceeded, "session")
                .identity(Some(user.email.as_str()))
                .origin(origin),
        );

        Ok(Some(AuthOutcome {
            user,
            new_session_token: Some(token.token),
        }))
    }

    fn record_login_failure(&self, identity: &str, origin: IpAddr) {
        AuditLogger::record(
            AuditEntry::new(AuditAction::LoginFailed, "session")
                .identity(Some(identity))
                .origin(origin),
        );
    }

    /// May this (possibly anonymous) requester create links from `origin`?
    pub fn authorize(&self, user: Option<&User>, origin: IpAddr) -> Result<(), ServiceError> {
        if self.policy.allows_origin(origin) {
            return Ok(());
        }

        match (&self.policy, user) {
            (AuthorizationPolicy::Permissive, Some(_)) => Ok(()),
            (AuthorizationPolicy::Netblock(_), Some(user)) => {
                AuditLogger::record(
                    AuditEntry::new(AuditAction::AuthorizationDenied, "url")
                        .identity(Some(user.email.as_str()))
                        .origin(origin),
                );
                Err(ServiceError::Forbidden)
            },
            (_, None) => Err(ServiceError::AuthenticationRequired),
        }
    }

    /// Drop the session behind `token`. Unknown tokens are fine.
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        let token_hash = hash_token(token);
        let session = self.sessions.find_by_token_hash(&token_hash).await?;

        if self.sessions.delete_by_token_hash(&token_hash).await? {
            AuditLogger::record(
                AuditEntry::new(AuditAction::Logout, "session")
                    .identity(session.as_ref().map(|s| s.user_email.as_str())),
            );
        }
        Ok(())
    }

    /// Remove every expired session; returns how many were dropped
    pub async fn purge_expired_sessions(&self) -> usize {
        match self.sessions.delete_expired(Utc::now()).await {
            Ok(purged) => {
                if purged > 0 {
                    debug!("Purged {} expired sessions", purged);
                }
                purged
            },
            Err(e) => {
                error!("Failed to purge expired sessions: {}", e);
                0
            },
        }
    }
}
