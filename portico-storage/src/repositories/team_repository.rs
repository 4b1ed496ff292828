//! Team and team membership repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{team_memberships, teams, TeamMemberships, Teams};
use crate::error::{StorageError, StorageResult};

pub struct TeamRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TeamRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<teams::Model>> {
        Ok(Teams::find_by_id(id).one(self.db).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> StorageResult<teams::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("Team", id))
    }

    pub async fn create(
        &self,
        organization_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> StorageResult<teams::Model> {
        let now = Utc::now();
        Ok(teams::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            name: Set(name.to_string()),
            description: Set(description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?)
    }

    pub async fn list_by_organization(&self, organization_id: Uuid) -> StorageResult<Vec<teams::Model>> {
        Ok(Teams::find()
            .filter(teams::Column::OrganizationId.eq(organization_id))
            .all(self.db)
            .await?)
    }

    pub async fn delete(&self, team: teams::Model) -> StorageResult<()> {
        team.delete(self.db).await?;
        Ok(())
    }

    pub async fn add_member(&self, team_id: Uuid, user_id: Uuid) -> StorageResult<team_memberships::Model> {
        Ok(team_memberships::ActiveModel {
            id: Set(Uuid::new_v4()),
            team_id: Set(team_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        }
        .insert(self.db)
        .await?)
    }

    pub async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> StorageResult<()> {
        let membership = TeamMemberships::find()
            .filter(team_memberships::Column::TeamId.eq(team_id))
            .filter(team_memberships::Column::UserId.eq(user_id))
            .one(self.db)
            .await?
            .ok_or_else(|| StorageError::not_found("TeamMembership", user_id))?;
        membership.delete(self.db).await?;
        Ok(())
    }

    pub async fn list_members(&self, team_id: Uuid) -> StorageResult<Vec<team_memberships::Model>> {
        Ok(TeamMemberships::find()
            .filter(team_memberships::Column::TeamId.eq(team_id))
            .all(self.db)
            .await?)
    }

    /// Ids of the user's teams within one organization. This is the set the
    /// allowed-team intersection checks run against.
    pub async fn team_ids_for_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Vec<Uuid>> {
        let rows = TeamMemberships::find()
            .find_also_related(Teams)
            .filter(team_memberships::Column::UserId.eq(user_id))
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(membership, team)| {
                team.filter(|t| t.organization_id == organization_id)
                    .map(|_| membership.team_id)
            })
            .collect())
    }
}
