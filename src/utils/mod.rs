// Utility modules for the hix.io backend

pub mod audit_logger;
pub mod password;
pub mod service_error;
pub mod url_validator;

pub use audit_logger::{AuditAction, AuditEntry, AuditLogger};
pub use password::{hash_password_with_config, verify_password, PasswordConfig, PasswordError};
pub use service_error::ServiceError;
pub use url_validator::{UrlValidationError, UrlValidator};
