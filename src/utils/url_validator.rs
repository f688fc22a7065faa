// URL validation for link creation
// Parses, canonicalizes and rejects links that would loop back to this service

use thiserror::Error;
use url::Url;

/// Longest accepted URL, checked before and after canonicalization.
/// Keeps the unique index on `urls.url` within PostgreSQL's btree row limit.
pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Invalid URL.")]
    InvalidUrl,

    #[error("Unacceptable URL.")]
    SelfReferential,
}

/// Validates target URLs against the host this service answers on
#[derive(Debug, Clone)]
pub struct UrlValidator {
    service_host: String,
}

impl UrlValidator {
    pub fn new(service_host: &str) -> Self {
        Self {
            service_host: normalize_host(service_host),
        }
    }

    pub fn service_host(&self) -> &str {
        &self.service_host
    }

    /// Parse `raw` into an absolute URL with a scheme and a host.
    ///
    /// The returned `Url` serializes to the canonical form: lowercase scheme and
    /// host, default port dropped, empty path rendered as `/`.
    pub fn validate(&self, raw: &str) -> Result<Url, UrlValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_URL_LENGTH {
            return Err(UrlValidationError::InvalidUrl);
        }

        let url = Url::parse(trimmed).map_err(|_| UrlValidationError::InvalidUrl)?;
        // Percent-encoding can grow the canonical form
        if url.as_str().len() > MAX_URL_LENGTH {
            return Err(UrlValidationError::InvalidUrl);
        }

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(UrlValidationError::InvalidUrl),
        };

        if self.is_own_host(host) {
            return Err(UrlValidationError::SelfReferential);
        }

        Ok(url)
    }

    /// True for the service host itself or any subdomain of it.
    pub fn is_own_host(&self, host: &str) -> bool {
        let host = normalize_host(host);
        host == self.service_host
            || host
                .strip_suffix(self.service_host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> UrlValidator {
        UrlValidator::new("hix.io")
    }

    #[test]
    fn test_length_limit() {
        let v = validator();
        let prefix = "https://example.com/";

        let longest = format!("{}{}", prefix, "a".repeat(MAX_URL_LENGTH - prefix.len()));
        assert!(v.validate(&longest).is_ok());

        let too_long = format!("{}a", longest);
        assert_eq!(v.validate(&too_long), Err(UrlValidationError::InvalidUrl));

        // Spaces become %20 in the canonical form
        let expands = format!("{}{}", prefix, " x".repeat(1000));
        assert!(expands.len() <= MAX_URL_LENGTH);
        assert_eq!(v.validate(&expands), Err(UrlValidationError::InvalidUrl));
    }

    #[test]
    fn test_valid_urls() {
        let v = validator();
        for raw in [
            "https://example.com",
            "http://example.com/path?q=1#frag",
            "ftp://files.example.org/pub",
            "  https://example.com/trimmed  ",
        ] {
            assert!(v.validate(raw).is_ok(), "{} should be accepted", raw);
        }
    }

    #[test]
    fn test_invalid_urls() {
        let v = validator();
        for raw in [
            "",
            "   ",
            "not a url",
            "example.com/no-scheme",
            "mailto:someone@example.com",
            "javascript:alert(1)",
            "file:///etc/passwd",
            "http://",
        ] {
            assert_eq!(
                v.validate(raw),
                Err(UrlValidationError::InvalidUrl),
                "{} should be invalid",
                raw
            );
        }
    }

    #[test]
    fn test_self_referential_urls_are_refused() {
        let v = validator();
        for raw in [
            "https://hix.io/",
            "https://hix.io/abc1234",
            "http://HIX.IO/some/deep/path?x=1",
            "https://hix.io./abc",
            "https://www.hix.io/posts/1",
            "https://a.b.Hix.Io.:8443/",
        ] {
            assert_eq!(
                v.validate(raw),
                Err(UrlValidationError::SelfReferential),
                "{} should be refused",
                raw
            );
        }
    }

    #[test]
    fn test_lookalike_hosts_are_not_own_host() {
        let v = validator();
        assert!(v.validate("https://nothix.io/").is_ok());
        assert!(v.validate("https://hix.io.example.com/").is_ok());
    }

    #[test]
    fn test_canonical_form() {
        let v = validator();
        assert_eq!(
            v.validate("HTTPS://Example.COM").unwrap().to_string(),
            "https://example.com/"
        );
        assert_eq!(
            v.validate("http://example.com:80/a").unwrap().to_string(),
            "http://example.com/a"
        );
    }

    #[test]
    fn test_service_host_is_normalized() {
        let v = UrlValidator::new(" HIX.io. ");
        assert_eq!(v.service_host(), "hix.io");
        assert!(v.is_own_host("hix.io"));
    }
}
