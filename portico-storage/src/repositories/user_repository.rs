//! User repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{users, Users};
use crate::error::{StorageError, StorageResult};

pub struct UserRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<users::Model>> {
        Ok(Users::find_by_id(id).one(self.db).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> StorageResult<users::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("User", id))
    }

    /// Lookup by email, including soft-deleted rows. Callers decide how a
    /// deleted or unverified row affects registration.
    pub async fn find_by_email(&self, email: &str) -> StorageResult<Option<users::Model>> {
        Ok(Users::find()
            .filter(users::Column::Email.eq(email))
            .one(self.db)
            .await?)
    }

    pub async fn create(
        &self,
        email: &str,
        name: &str,
        identity_provider: users::IdentityProvider,
        password_hash: Option<String>,
        email_verified: bool,
    ) -> StorageResult<users::Model> {
        let now = Utc::now();
        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            identity_provider: Set(identity_provider),
            password_hash: Set(password_hash),
            email_verified: Set(email_verified),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(self.db).await?)
    }

    /// Re-registration path: an unverified email-provider user registers
    /// again, so the stored name and password are replaced.
    pub async fn overwrite_unverified(
        &self,
        user: users::Model,
        name: &str,
        password_hash: String,
    ) -> StorageResult<users::Model> {
        let mut active: users::ActiveModel = user.into();
        active.name = Set(name.to_string());
        active.password_hash = Set(Some(password_hash));
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn mark_email_verified(&self, user_id: Uuid) -> StorageResult<()> {
        let user = self.get_by_id(user_id).await?;
        let mut active: users::ActiveModel = user.into();
        active.email_verified = Set(true);
        active.updated_at = Set(Utc::now());
        active.update(self.db).await?;
        Ok(())
    }

    pub async fn soft_delete(&self, user_id: Uuid) -> StorageResult<()> {
        let user = self.get_by_id(user_id).await?;
        let mut active: users::ActiveModel = user.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());
        active.update(self.db).await?;
        Ok(())
    }
}
