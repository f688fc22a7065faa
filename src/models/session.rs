// Server-side login sessions bound to the origin that created them
//
// Clients hold a random token; the table only stores its SHA-256 digest.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use ipnetwork::IpNetwork;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::net::IpAddr;

use crate::schema::sessions;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub id: i64,
    pub token_hash: String,
    pub user_email: String,
    pub source_ip: IpNetwork,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub token_hash: String,
    pub user_email: String,
    pub source_ip: IpNetwork,
    pub expires_at: DateTime<Utc>,
}

/// A freshly minted session token. `token` goes to the client, `token_hash` to the store.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub token_hash: String,
}

impl SessionToken {
    pub fn generate() -> Self {
        // 256 bits of entropy
        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);

        let token = BASE64_URL_SAFE_NO_PAD.encode(token_bytes);
        let token_hash = hash_token(&token);

        Self { token, token_hash }
    }
}

/// SHA-256 hex digest of a client-held session token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Session {
    pub fn origin(&self) -> IpAddr {
        self.source_ip.ip()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_session: &NewSession) -> QueryResult<Self> {
        diesel::insert_into(sessions::table)
            .values(new_session)
            .returning(Session::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn find_by_token_hash(
        conn: &mut AsyncPgConnection,
        hash: &str,
    ) -> QueryResult<Option<Self>> {
        sessions::table
            .filter(sessions::token_hash.eq(hash))
            .select(Session::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Returns the number of rows removed (0 or 1)
    pub async fn delete_by_token_hash(conn: &mut AsyncPgConnection, hash: &str) -> QueryResult<usize> {
        diesel::delete(sessions::table.filter(sessions::token_hash.eq(hash)))
            .execute(conn)
            .await
    }

    pub async fn delete_expired(conn: &mut AsyncPgConnection, now: DateTime<Utc>) -> QueryResult<usize> {
        diesel::delete(sessions::table.filter(sessions::expires_at.le(now)))
            .execute(conn)
            .await
    }
}
