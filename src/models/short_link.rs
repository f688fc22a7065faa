// Short link model: code -> target URL mapping with an atomic hit counter

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::schema::urls;

// =============================================================================
// DATABASE MODELS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = urls)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShortLink {
    pub id: i64,
    pub short: String,
    pub url: String,
    pub user_email: Option<String>,
    pub source_ip: IpNetwork,
    pub hits: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = urls)]
pub struct NewShortLink {
    pub short: String,
    pub url: String,
    pub user_email: Option<String>,
    pub source_ip: IpNetwork,
}

/// Result of a single hit increment
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct LinkHit {
    pub url: String,
    pub hits: i64,
}

// =============================================================================
// API MODELS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortLinkResponse {
    pub short: String,
    pub url: String,
    pub hits: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&ShortLink> for ShortLinkResponse {
    fn from(link: &ShortLink) -> Self {
        Self {
            short: link.short.clone(),
            url: link.url.clone(),
            hits: link.hits,
            created_at: link.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSummary {
    pub host: String,
    pub top: Vec<ShortLinkResponse>,
    pub latest: Vec<ShortLinkResponse>,
}

// =============================================================================
// QUERIES
// =============================================================================

impl ShortLink {
    pub async fn find_by_url(
        conn: &mut AsyncPgConnection,
        target: &str,
    ) -> QueryResult<Option<Self>> {
        urls::table
            .filter(urls::url.eq(target))
            .select(ShortLink::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_link: &NewShortLink,
    ) -> QueryResult<Self> {
        diesel::insert_into(urls::table)
            .values(new_link)
            .returning(ShortLink::as_returning())
            .get_result(conn)
            .await
    }

    /// Single-statement increment; concurrent traversals never lose an update.
    pub async fn record_hit(
        conn: &mut AsyncPgConnection,
        code: &str,
    ) -> QueryResult<Option<LinkHit>> {
        diesel::update(urls::table.filter(urls::short.eq(code)))
            .set(urls::hits.eq(urls::hits + 1))
            .returning((urls::url, urls::hits))
            .get_result::<LinkHit>(conn)
            .await
            .optional()
    }

    pub async fn top(conn: &mut AsyncPgConnection, limit: i64) -> QueryResult<Vec<Self>> {
        urls::table
            .order((urls::hits.desc(), urls::id.asc()))
            .limit(limit)
            .select(ShortLink::as_select())
            .load(conn)
            .await
    }

    pub async fn latest(conn: &mut AsyncPgConnection, limit: i64) -> QueryResult<Vec<Self>> {
        urls::table
            .order((urls::created_at.desc(), urls::id.asc()))
            .limit(limit)
            .select(ShortLink::as_select())
            .load(conn)
            .await
    }
}
