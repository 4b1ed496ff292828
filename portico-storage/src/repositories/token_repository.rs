//! Verification and refresh token repository
//!
//! Only HMAC digests are stored. Refresh token lookups prune expired rows
//! lazily instead of relying on a background job.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{user_refresh_tokens, user_verifications, UserRefreshTokens, UserVerifications};
use crate::error::StorageResult;

pub struct TokenRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TokenRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    // Verification tokens

    pub async fn create_verification(
        &self,
        user_id: Uuid,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<user_verifications::Model> {
        Ok(user_verifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(token_hash.to_string()),
            email: Set(email.to_string()),
            expires_at: Set(expires_at),
            used_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(self.db)
        .await?)
    }

    pub async fn find_verification_by_hash(
        &self,
        token_hash: &str,
    ) -> StorageResult<Option<user_verifications::Model>> {
        Ok(UserVerifications::find()
            .filter(user_verifications::Column::TokenHash.eq(token_hash))
            .one(self.db)
            .await?)
    }

    pub async fn mark_verification_used(
        &self,
        verification: user_verifications::Model,
    ) -> StorageResult<user_verifications::Model> {
        let mut active: user_verifications::ActiveModel = verification.into();
        active.used_at = Set(Some(Utc::now()));
        Ok(active.update(self.db).await?)
    }

    /// Invalidate every unused verification for a user, ahead of issuing a
    /// fresh one on re-registration.
    pub async fn delete_unused_verifications(&self, user_id: Uuid) -> StorageResult<u64> {
        let result = UserVerifications::delete_many()
            .filter(user_verifications::Column::UserId.eq(user_id))
            .filter(user_verifications::Column::UsedAt.is_null())
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }

    // Refresh tokens

    pub async fn create_refresh_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<user_refresh_tokens::Model> {
        Ok(user_refresh_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(token_hash.to_string()),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
        }
        .insert(self.db)
        .await?)
    }

    /// Valid-token lookup. Expired rows encountered here are deleted.
    pub async fn find_valid_refresh_token(
        &self,
        token_hash: &str,
    ) -> StorageResult<Option<user_refresh_tokens::Model>> {
        let Some(token) = UserRefreshTokens::find()
            .filter(user_refresh_tokens::Column::TokenHash.eq(token_hash))
            .one(self.db)
            .await?
        else {
            return Ok(None);
        };

        if token.expires_at <= Utc::now() {
            token.delete(self.db).await?;
            return Ok(None);
        }

        Ok(Some(token))
    }

    /// Logout: delete only the presented token.
    pub async fn delete_refresh_token(&self, token_hash: &str) -> StorageResult<()> {
        UserRefreshTokens::delete_many()
            .filter(user_refresh_tokens::Column::TokenHash.eq(token_hash))
            .exec(self.db)
            .await?;
        Ok(())
    }
}
