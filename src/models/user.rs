// User Database Model
// Identity is the lowercased email; secrets never leave this struct through serde

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};

use crate::schema::users;

/// User database model - queryable from database
#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    pub disable_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub api_secret: String,
}

/// Profile changes; `None` leaves the column untouched
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outward-facing user representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
    pub disable_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            disable_on: user.disable_on,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl User {
    /// An account is inactive once its disable timestamp has passed.
    pub fn is_disabled_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.disable_on, Some(disable_on) if disable_on <= now)
    }

    pub fn is_active(&self) -> bool {
        !self.is_disabled_at(Utc::now())
    }

    /// Find user by email. Callers pass the already-normalized identity.
    pub async fn find_by_email(
        conn: &mut AsyncPgConnection,
        email_str: &str,
    ) -> QueryResult<Option<Self>> {
        users::table
            .filter(users::email.eq(email_str))
            .select(User::as_select())
            .first(conn)
            .await
            .optional()
    }

    /// Create a new user
    pub async fn create(conn: &mut AsyncPgConnection, new_user: &NewUser) -> QueryResult<Self> {
        diesel::insert_into(users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(conn)
            .await
    }

    /// Apply profile changes, returning the updated row if the user exists
    pub async fn update(
        conn: &mut AsyncPgConnection,
        email_str: &str,
        changes: &UserChanges,
    ) -> QueryResult<Option<Self>> {
        diesel::update(users::table.filter(users::email.eq(email_str)))
            .set(changes)
            .returning(User::as_returning())
            .get_result(conn)
            .await
            .optional()
    }
}
