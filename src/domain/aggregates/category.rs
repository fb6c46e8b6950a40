//! Category Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Category {
    pub fn create(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), name: name.into(), description, created_at: now, updated_at: now }
    }

    pub fn apply(&mut self, changes: CategoryChanges) {
        if let Some(name) = changes.name { self.name = name; }
        if let Some(description) = changes.description { self.description = Some(description); }
        self.updated_at = Utc::now();
    }
}
