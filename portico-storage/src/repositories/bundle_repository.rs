//! MCP server bundle repository

use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{mcp_server_bundles, McpServerBundles};
use crate::error::{StorageError, StorageResult};

/// Alphabet for bundle keys: unambiguous lowercase alphanumerics.
const BUNDLE_KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const BUNDLE_KEY_LEN: usize = 36;

/// Generate an opaque 36-char bundle key. The key is a capability displayed
/// verbatim to end users, so it is stored in cleartext and never hashed.
pub fn generate_bundle_key() -> String {
    let mut rng = rand::rng();
    (0..BUNDLE_KEY_LEN)
        .map(|_| BUNDLE_KEY_ALPHABET[rng.random_range(0..BUNDLE_KEY_ALPHABET.len())] as char)
        .collect()
}

/// Preserve insertion order, drop duplicates.
pub fn dedup_preserving_order(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

pub struct BundleRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> BundleRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<mcp_server_bundles::Model>> {
        Ok(McpServerBundles::find_by_id(id).one(self.db).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> StorageResult<mcp_server_bundles::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("MCPServerBundle", id))
    }

    pub async fn find_by_key(&self, bundle_key: &str) -> StorageResult<Option<mcp_server_bundles::Model>> {
        Ok(McpServerBundles::find()
            .filter(mcp_server_bundles::Column::BundleKey.eq(bundle_key))
            .one(self.db)
            .await?)
    }

    pub async fn create(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        name: &str,
        description: Option<String>,
        configuration_ids: Vec<Uuid>,
    ) -> StorageResult<mcp_server_bundles::Model> {
        let now = Utc::now();
        let configuration_ids = dedup_preserving_order(configuration_ids);
        Ok(mcp_server_bundles::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            user_id: Set(user_id),
            name: Set(name.to_string()),
            description: Set(description),
            bundle_key: Set(generate_bundle_key()),
            mcp_server_configuration_ids: Set(
                serde_json::to_value(&configuration_ids).unwrap_or_default()
            ),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?)
    }

    pub async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> StorageResult<Vec<mcp_server_bundles::Model>> {
        Ok(McpServerBundles::find()
            .filter(mcp_server_bundles::Column::OrganizationId.eq(organization_id))
            .all(self.db)
            .await?)
    }

    pub async fn list_by_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Vec<mcp_server_bundles::Model>> {
        Ok(McpServerBundles::find()
            .filter(mcp_server_bundles::Column::OrganizationId.eq(organization_id))
            .filter(mcp_server_bundles::Column::UserId.eq(user_id))
            .all(self.db)
            .await?)
    }

    /// Bundles in the org whose configuration list contains the given id.
    /// The membership check runs on the decoded list, not in SQL, matching
    /// the JSON storage of the list.
    pub async fn list_by_organization_containing(
        &self,
        organization_id: Uuid,
        configuration_id: Uuid,
    ) -> StorageResult<Vec<mcp_server_bundles::Model>> {
        let bundles = self.list_by_organization(organization_id).await?;
        Ok(bundles
            .into_iter()
            .filter(|bundle| bundle.configuration_ids().contains(&configuration_id))
            .collect())
    }

    /// Single write path for bundle membership edits: preserves insertion
    /// order and removes duplicates before persisting.
    pub async fn update_configuration_ids(
        &self,
        bundle: mcp_server_bundles::Model,
        configuration_ids: Vec<Uuid>,
    ) -> StorageResult<mcp_server_bundles::Model> {
        let configuration_ids = dedup_preserving_order(configuration_ids);
        let mut active: mcp_server_bundles::ActiveModel = bundle.into();
        active.mcp_server_configuration_ids =
            Set(serde_json::to_value(&configuration_ids).unwrap_or_default());
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn delete(&self, bundle: mcp_server_bundles::Model) -> StorageResult<()> {
        bundle.delete(self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_key_shape() {
        let key = generate_bundle_key();
        assert_eq!(key.len(), BUNDLE_KEY_LEN);
        assert!(key.bytes().all(|b| BUNDLE_KEY_ALPHABET.contains(&b)));
        // Two keys colliding would mean the RNG is broken
        assert_ne!(generate_bundle_key(), generate_bundle_key());
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert_eq!(
            dedup_preserving_order(vec![b, a, b, c, a]),
            vec![b, a, c]
        );
    }
}
