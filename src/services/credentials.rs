// Credential store: user lookup, creation and secret verification
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha512};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::models::user::{NewUser, User, UserChanges};
use crate::store::UserStore;
use crate::utils::audit_logger::{AuditAction, AuditEntry, AuditLogger};
use crate::utils::password::{hash_password_with_config, verify_password, PasswordConfig};
use crate::utils::service_error::ServiceError;

const API_SECRET_BYTES: usize = 128;

/// Optional profile fields; `None` leaves the value unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserStore>,
    password: PasswordConfig,
    /// Hash of a random secret, verified against when the identity is unknown
    decoy_hash: Arc<OnceCell<String>>,
}

/// Identities are compared lowercased with surrounding whitespace removed
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// SHA-512 hex digest of fresh random bytes
fn generate_api_secret() -> String {
    let mut bytes = [0u8; API_SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let mut hasher = Sha512::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserStore>, password: PasswordConfig) -> Self {
        Self {
            users,
            password,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Build the decoy hash ahead of the first failed login
    pub async fn prepare_decoy(&self) -> Result<(), ServiceError> {
        self.decoy_hash().await.map(|_| ())
    }

    async fn decoy_hash(&self) -> Result<&String, ServiceError> {
        self.decoy_hash
            .get_or_try_init(|| async {
                let secret = generate_api_secret();
                self.hash_secret(&secret).await
            })
            .await
    }

    pub async fn find_by_identity(&self, identity: &str) -> Result<Option<User>, ServiceError> {
        let email = normalize_identity(identity);
        if email.is_empty() {
            return Ok(None);
        }
        Ok(self.users.find_by_email(&email).await?)
    }

    pub async fn create(
        &self,
        identity: &str,
        raw_secret: &str,
        name: Option<&str>,
    ) -> Result<User, ServiceError> {
        let email = normalize_identity(identity);
        if !validator::validate_email(email.as_str()) {
            return Err(ServiceError::ValidationError("Invalid email address.".to_string()));
        }
        if raw_secret.is_empty() {
            return Err(ServiceError::ValidationError("Password is required.".to_string()));
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        let password_hash = self.hash_secret(raw_secret).await?;

        let user = self
            .users
            .insert(NewUser {
                email,
                name,
                password_hash,
                api_secret: generate_api_secret(),
            })
            .await?;

        info!("Created user {}", user.email);
        AuditLogger::record(
            AuditEntry::new(AuditAction::UserCreated, "user").identity(Some(user.email.as_str())),
        );

        Ok(user)
    }

    /// Check a raw secret against the user's stored hash.
    ///
    /// A malformed stored hash counts as a mismatch.
    pub async fn verify_secret(&self, user: &User, raw_secret: &str) -> bool {
        self.verify_against(raw_secret, user.password_hash.clone(), &user.email)
            .await
    }

    /// Spend the same Argon2 work as `verify_secret` for an identity that does
    /// not exist. Always false.
    pub async fn verify_unknown(&self, raw_secret: &str) -> bool {
        match self.decoy_hash().await {
            Ok(hash) => {
                self.verify_against(raw_secret, hash.clone(), "unknown identity")
                    .await;
            },
            Err(e) => error!("Decoy hash unavailable: {}", e),
        }
        false
    }

    async fn verify_against(&self, raw_secret: &str, hash: String, who: &str) -> bool {
        let raw = raw_secret.to_string();

        match tokio::task::spawn_blocking(move || verify_password(&raw, &hash)).await {
            Ok(Ok(matched)) => matched,
            Ok(Err(e)) => {
                error!("Password verification failed for {}: {}", who, e);
                false
            },
            Err(e) => {
                error!("Password verification task failed: {}", e);
                false
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn decoy_ready(&self) -> bool {
        self.decoy_hash.initialized()
    }

    pub async fn update_profile(
        &self,
        identity: &str,
        update: ProfileUpdate,
    ) -> Result<User, ServiceError> {
        let email = normalize_identity(identity);

        let name = match update.name.as_deref().map(str::trim) {
            Some("") => {
                return Err(ServiceError::ValidationError("Name cannot be empty.".to_string()))
            },
            other => other.map(str::to_string),
        };

        let password_hash = match update.password.as_deref() {
            Some("") => {
                return Err(ServiceError::ValidationError("Password cannot be empty.".to_string()))
            },
            Some(password) => Some(self.hash_secret(password).await?),
            None => None,
        };

        let changes = UserChanges {
            name,
            password_hash,
            updated_at: Some(Utc::now()),
        };

        let user = self
            .users
            .update(&email, changes)
            .await?
            .ok_or(ServiceError::NotFound)?;

        debug!("Profile updated for {}", user.email);
        AuditLogger::record(
            AuditEntry::new(AuditAction::ProfileUpdated, "user").identity(Some(user.email.as_str())),
        );

        Ok(user)
    }

    async fn hash_secret(&self, raw_secret: &str) -> Result<String, ServiceError> {
        let raw = raw_secret.to_string();
        let config = self.password.clone();

        tokio::task::spawn_blocking(move || hash_password_with_config(&raw, &config))
            .await
            .map_err(|e| {
                error!("Password hashing task failed: {}", e);
                ServiceError::InternalError
            })?
            .map_err(|e| {
                error!("Password hashing failed: {}", e);
                ServiceError::InternalError
            })
    }
}
