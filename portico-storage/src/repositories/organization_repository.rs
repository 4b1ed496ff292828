//! Organization and membership repository
//!
//! The last-admin invariant lives here: removals and role downgrades that
//! would leave an organization without an admin are rejected.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{
    organization_invitations, organization_memberships, organizations, OrganizationInvitations,
    OrganizationMemberships, Organizations,
};
use crate::error::{StorageError, StorageResult};

pub struct OrganizationRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> OrganizationRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<organizations::Model>> {
        Ok(Organizations::find_by_id(id)
            .filter(organizations::Column::DeletedAt.is_null())
            .one(self.db)
            .await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> StorageResult<organizations::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("Organization", id))
    }

    pub async fn find_by_stripe_customer_id(
        &self,
        stripe_customer_id: &str,
    ) -> StorageResult<Option<organizations::Model>> {
        Ok(Organizations::find()
            .filter(organizations::Column::StripeCustomerId.eq(stripe_customer_id))
            .one(self.db)
            .await?)
    }

    /// Create an organization with its first admin membership.
    pub async fn create(&self, name: &str, admin_user_id: Uuid) -> StorageResult<organizations::Model> {
        let now = Utc::now();
        let org = organizations::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            stripe_customer_id: Set(None),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?;

        organization_memberships::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(org.id),
            user_id: Set(admin_user_id),
            role: Set(organization_memberships::OrganizationRole::Admin),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?;

        Ok(org)
    }

    pub async fn set_stripe_customer_id(
        &self,
        organization_id: Uuid,
        stripe_customer_id: &str,
    ) -> StorageResult<()> {
        let org = self.get_by_id(organization_id).await?;
        let mut active: organizations::ActiveModel = org.into();
        active.stripe_customer_id = Set(Some(stripe_customer_id.to_string()));
        active.updated_at = Set(Utc::now());
        active.update(self.db).await?;
        Ok(())
    }

    pub async fn find_membership(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Option<organization_memberships::Model>> {
        Ok(OrganizationMemberships::find()
            .filter(organization_memberships::Column::OrganizationId.eq(organization_id))
            .filter(organization_memberships::Column::UserId.eq(user_id))
            .one(self.db)
            .await?)
    }

    pub async fn list_memberships(
        &self,
        organization_id: Uuid,
    ) -> StorageResult<Vec<organization_memberships::Model>> {
        Ok(OrganizationMemberships::find()
            .filter(organization_memberships::Column::OrganizationId.eq(organization_id))
            .all(self.db)
            .await?)
    }

    pub async fn list_memberships_for_user(
        &self,
        user_id: Uuid,
    ) -> StorageResult<Vec<organization_memberships::Model>> {
        Ok(OrganizationMemberships::find()
            .filter(organization_memberships::Column::UserId.eq(user_id))
            .all(self.db)
            .await?)
    }

    pub async fn count_members(&self, organization_id: Uuid) -> StorageResult<u64> {
        Ok(OrganizationMemberships::find()
            .filter(organization_memberships::Column::OrganizationId.eq(organization_id))
            .count(self.db)
            .await?)
    }

    pub async fn add_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: organization_memberships::OrganizationRole,
    ) -> StorageResult<organization_memberships::Model> {
        let now = Utc::now();
        Ok(organization_memberships::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            user_id: Set(user_id),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?)
    }

    /// Remove a member. Rejected when it would remove the last admin.
    pub async fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> StorageResult<()> {
        let membership = self
            .find_membership(organization_id, user_id)
            .await?
            .ok_or_else(|| StorageError::not_found("OrganizationMembership", user_id))?;

        if membership.role == organization_memberships::OrganizationRole::Admin
            && self.count_admins(organization_id).await? <= 1
        {
            return Err(StorageError::constraint(
                "cannot remove the last admin of an organization",
            ));
        }

        membership.delete(self.db).await?;
        Ok(())
    }

    /// Change a member's role. Downgrading the last admin is rejected.
    pub async fn update_member_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: organization_memberships::OrganizationRole,
    ) -> StorageResult<organization_memberships::Model> {
        let membership = self
            .find_membership(organization_id, user_id)
            .await?
            .ok_or_else(|| StorageError::not_found("OrganizationMembership", user_id))?;

        if membership.role == organization_memberships::OrganizationRole::Admin
            && role == organization_memberships::OrganizationRole::Member
            && self.count_admins(organization_id).await? <= 1
        {
            return Err(StorageError::constraint(
                "cannot downgrade the last admin of an organization",
            ));
        }

        let mut active: organization_memberships::ActiveModel = membership.into();
        active.role = Set(role);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    async fn count_admins(&self, organization_id: Uuid) -> StorageResult<u64> {
        Ok(OrganizationMemberships::find()
            .filter(organization_memberships::Column::OrganizationId.eq(organization_id))
            .filter(
                organization_memberships::Column::Role
                    .eq(organization_memberships::OrganizationRole::Admin),
            )
            .count(self.db)
            .await?)
    }

    // Invitations

    pub async fn create_invitation(
        &self,
        organization_id: Uuid,
        email: &str,
        role: organization_memberships::OrganizationRole,
        token_hash: &str,
        invited_by_user_id: Uuid,
        expires_at: chrono::DateTime<Utc>,
    ) -> StorageResult<organization_invitations::Model> {
        let now = Utc::now();
        Ok(organization_invitations::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            email: Set(email.to_string()),
            role: Set(role),
            token_hash: Set(token_hash.to_string()),
            status: Set(organization_invitations::InvitationStatus::Pending),
            invited_by_user_id: Set(invited_by_user_id),
            email_metadata: Set(None),
            expires_at: Set(expires_at),
            used_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?)
    }

    pub async fn find_invitation_by_token_hash(
        &self,
        token_hash: &str,
    ) -> StorageResult<Option<organization_invitations::Model>> {
        Ok(OrganizationInvitations::find()
            .filter(organization_invitations::Column::TokenHash.eq(token_hash))
            .one(self.db)
            .await?)
    }

    pub async fn list_invitations(
        &self,
        organization_id: Uuid,
    ) -> StorageResult<Vec<organization_invitations::Model>> {
        Ok(OrganizationInvitations::find()
            .filter(organization_invitations::Column::OrganizationId.eq(organization_id))
            .all(self.db)
            .await?)
    }

    pub async fn update_invitation_status(
        &self,
        invitation: organization_invitations::Model,
        status: organization_invitations::InvitationStatus,
        used: bool,
    ) -> StorageResult<organization_invitations::Model> {
        let mut active: organization_invitations::ActiveModel = invitation.into();
        active.status = Set(status);
        if used {
            active.used_at = Set(Some(Utc::now()));
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn set_invitation_email_metadata(
        &self,
        invitation_id: Uuid,
        metadata: serde_json::Value,
    ) -> StorageResult<()> {
        let invitation = OrganizationInvitations::find_by_id(invitation_id)
            .one(self.db)
            .await?
            .ok_or_else(|| StorageError::not_found("OrganizationInvitation", invitation_id))?;
        let mut active: organization_invitations::ActiveModel = invitation.into();
        active.email_metadata = Set(Some(metadata));
        active.updated_at = Set(Utc::now());
        active.update(self.db).await?;
        Ok(())
    }
}
