// Link shortener: validated creation, resolution with hit counting, summaries
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use ipnetwork::IpNetwork;

use crate::models::short_link::{LinkSummary, NewShortLink, ShortLink, ShortLinkResponse};
use crate::services::short_code::{derive_code, is_valid_code};
use crate::store::{LinkStore, StoreError, UniqueField};
use crate::utils::audit_logger::{AuditAction, AuditEntry, AuditLogger};
use crate::utils::service_error::ServiceError;
use crate::utils::url_validator::UrlValidator;

pub const MAX_LISTING: i64 = 100;

#[derive(Clone)]
pub struct LinkShortener {
    links: Arc<dyn LinkStore>,
    validator: UrlValidator,
    max_retries: u32,
}

impl LinkShortener {
    pub fn new(links: Arc<dyn LinkStore>, validator: UrlValidator, max_retries: u32) -> Self {
        Self {
            links,
            validator,
            max_retries,
        }
    }

    pub fn service_host(&self) -> &str {
        self.validator.service_host()
    }

    /// Shorten `raw_url`, or return the existing record for the same canonical URL.
    pub async fn shorten(
        &self,
        raw_url: &str,
        owner: Option<&str>,
        source_ip: IpAddr,
    ) -> Result<ShortLink, ServiceError> {
        let canonical = self.validator.validate(raw_url)?.to_string();

        if let Some(existing) = self.links.find_by_url(&canonical).await? {
            debug!("URL already shortened as {}", existing.short);
            return Ok(existing);
        }

        for attempt in 0..=self.max_retries {
            let short = derive_code(&canonical, attempt);
            let new_link = NewShortLink {
                short: short.clone(),
                url: canonical.clone(),
                user_email: owner.map(str::to_string),
                source_ip: IpNetwork::from(source_ip),
            };

            match self.links.insert(new_link).await {
                Ok(link) => {
                    info!("Shortened {} as {}", link.url, link.short);
                    AuditLogger::record(
                        AuditEntry::new(AuditAction::LinkCreated, "url")
                            .identity(owner)
                            .resource(link.short.clone())
                            .origin(source_ip),
                    );
                    return Ok(link);
                },
                Err(StoreError::UniqueViolation(UniqueField::LinkUrl)) => {
                    // Created concurrently by another request
                    return self
                        .links
                        .find_by_url(&canonical)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::DatabaseError(format!(
                                "url {} vanished after unique violation",
                                canonical
                            ))
                        });
                },
                Err(StoreError::UniqueViolation(UniqueField::LinkShort)) => {
                    warn!("Short code {} collided on attempt {}", short, attempt);
                },
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Conflict(format!(
            "no free short code for {} after {} retries",
            canonical, self.max_retries
        )))
    }

    /// Count one traversal of `short` and return its target.
    pub async fn resolve_and_record_hit(&self, short: &str) -> Result<String, ServiceError> {
        if !is_valid_code(short) {
            return Err(ServiceError::NotFound);
        }

        let hit = self
            .links
            .record_hit(short)
            .await?
            .ok_or(ServiceError::NotFound)?;

        debug!("{} -> {} (hit {})", short, hit.url, hit.hits);
        Ok(hit.url)
    }

    pub async fn top(&self, n: i64) -> Result<Vec<ShortLink>, ServiceError> {
        Ok(self.links.top(clamp_listing(n)).await?)
    }

    pub async fn latest(&self, n: i64) -> Result<Vec<ShortLink>, ServiceError> {
        Ok(self.links.latest(clamp_listing(n)).await?)
    }

    pub async fn summary(&self, n: i64) -> Result<LinkSummary, ServiceError> {
        let top = self.top(n).await?;
        let latest = self.latest(n).await?;

        Ok(LinkSummary {
            host: self.service_host().to_string(),
            top: top.iter().map(ShortLinkResponse::from).collect(),
            latest: latest.iter().map(ShortLinkResponse::from).collect(),
        })
    }
}

fn clamp_listing(n: i64) -> i64 {
    n.clamp(1, MAX_LISTING)
}
