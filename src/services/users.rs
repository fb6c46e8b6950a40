//! User directory.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::query::{Page, PageRequest};
use crate::domain::{NewUser, User, UserChanges};
use crate::storage::{Store, UserRepository};
use crate::{Result, TechMarketError};

#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
}

impl UserDirectory {
    pub fn new(store: &Store) -> Self {
        Self { users: store.users.clone() }
    }

    /// Newest first.
    pub async fn list(&self, page: &PageRequest) -> Result<Page<User>> {
        Ok(self.users.list(page).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| TechMarketError::not_found("User not found"))
    }

    #[instrument(skip(self, new), fields(username = %new.username))]
    pub async fn create(&self, new: NewUser) -> Result<User> {
        self.ensure_email_free(&new.email, None).await?;
        if self.users.find_by_username(&new.username).await?.is_some() {
            return Err(TechMarketError::Conflict("Username already taken".into()));
        }
        let user = User::create(new);
        self.users.insert(&user).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User> {
        let mut user = self.get(id).await?;
        if let Some(email) = &changes.email {
            self.ensure_email_free(email, Some(id)).await?;
        }
        user.apply(changes);
        if !self.users.update(&user).await? {
            return Err(TechMarketError::not_found("User not found"));
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.users.delete(id).await? {
            return Err(TechMarketError::not_found("User not found"));
        }
        info!("user deleted");
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<()> {
        match self.users.find_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => {
                Err(TechMarketError::Conflict("Email already in use".into()))
            }
            _ => Ok(()),
        }
    }
}
