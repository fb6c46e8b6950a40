//! User Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
}

impl User {
    pub fn create(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), username: new.username, email: new.email,
            first_name: new.first_name.unwrap_or_default(), last_name: new.last_name.unwrap_or_default(),
            is_active: true, created_at: now, updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: UserChanges) {
        if let Some(email) = changes.email { self.email = email; }
        if let Some(first_name) = changes.first_name { self.first_name = first_name; }
        if let Some(last_name) = changes.last_name { self.last_name = last_name; }
        if let Some(is_active) = changes.is_active { self.is_active = is_active; }
        self.updated_at = Utc::now();
    }
}
