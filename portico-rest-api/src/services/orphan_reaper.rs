//! Orphan record reaper
//!
//! Eager, in-transaction clean-up of records that become unreachable when
//! allowed-teams, configurations or team memberships change. The decision
//! logic is pure: `plan_*` functions take snapshots and return the removal
//! plan, and the `apply_*` wrappers fetch those snapshots and execute the
//! plan through the repositories inside the caller's transaction.

use sea_orm::ConnectionTrait;
use tracing::info;
use uuid::Uuid;

use portico_api_types::ConnectedAccountOwnership;
use portico_rbac::access::check_configuration_accessibility;
use portico_storage::repositories::{
    BundleRepository, ConfigurationRepository, ConnectedAccountRepository,
};

use crate::errors::RestResult;

/// Snapshot of one connected account, as the planner sees it.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub configuration_id: Uuid,
    pub ownership: ConnectedAccountOwnership,
}

/// Snapshot of one bundle's membership list.
#[derive(Debug, Clone)]
pub struct BundleSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub configuration_ids: Vec<Uuid>,
}

/// The removal plan: accounts to delete and `(bundle, configuration)`
/// references to drop.
#[derive(Debug, Default, PartialEq)]
pub struct ReaperPlan {
    pub connected_accounts: Vec<Uuid>,
    pub bundles_configurations_removed: Vec<(Uuid, Uuid)>,
}

impl ReaperPlan {
    pub fn is_empty(&self) -> bool {
        self.connected_accounts.is_empty() && self.bundles_configurations_removed.is_empty()
    }
}

/// Allowed-teams changed on one configuration: individual accounts whose
/// owner lost access are deleted, and the configuration is dropped from
/// bundles whose owner lost access. Shared and operational accounts are
/// never orphaned by team changes.
pub fn plan_on_configuration_allowed_teams_updated(
    configuration_id: Uuid,
    accounts: &[AccountSnapshot],
    bundles: &[BundleSnapshot],
    user_has_access: impl Fn(Uuid) -> bool,
) -> ReaperPlan {
    let mut plan = ReaperPlan::default();

    for account in accounts {
        if account.configuration_id != configuration_id {
            continue;
        }
        if account.ownership != ConnectedAccountOwnership::Individual {
            continue;
        }
        if !user_has_access(account.user_id) {
            plan.connected_accounts.push(account.id);
        }
    }

    for bundle in bundles {
        if !bundle.configuration_ids.contains(&configuration_id) {
            continue;
        }
        if !user_has_access(bundle.user_id) {
            plan.bundles_configurations_removed
                .push((bundle.id, configuration_id));
        }
    }

    plan
}

/// A configuration was deleted: its connected accounts are gone through the
/// database cascade, so only bundle references remain to drop.
pub fn plan_on_configuration_deleted(
    configuration_id: Uuid,
    bundles: &[BundleSnapshot],
) -> ReaperPlan {
    ReaperPlan {
        connected_accounts: Vec::new(),
        bundles_configurations_removed: bundles
            .iter()
            .filter(|bundle| bundle.configuration_ids.contains(&configuration_id))
            .map(|bundle| (bundle.id, configuration_id))
            .collect(),
    }
}

/// A user left a team: their individual accounts on configurations they can
/// no longer reach are deleted, and those configurations are dropped from
/// their bundles. Configurations that no longer exist are dropped too.
pub fn plan_on_user_removed_from_team(
    user_accounts: &[AccountSnapshot],
    user_bundles: &[BundleSnapshot],
    configuration_accessible: impl Fn(Uuid) -> Option<bool>,
) -> ReaperPlan {
    let mut plan = ReaperPlan::default();

    for account in user_accounts {
        if account.ownership != ConnectedAccountOwnership::Individual {
            continue;
        }
        if configuration_accessible(account.configuration_id) != Some(true) {
            plan.connected_accounts.push(account.id);
        }
    }

    for bundle in user_bundles {
        for configuration_id in &bundle.configuration_ids {
            if configuration_accessible(*configuration_id) != Some(true) {
                plan.bundles_configurations_removed
                    .push((bundle.id, *configuration_id));
            }
        }
    }

    plan
}

/// Execute a plan inside the caller's transaction.
pub async fn apply_plan<C: ConnectionTrait>(db: &C, plan: &ReaperPlan) -> RestResult<()> {
    if plan.is_empty() {
        return Ok(());
    }
    info!(
        accounts = plan.connected_accounts.len(),
        bundle_refs = plan.bundles_configurations_removed.len(),
        "applying orphan removal plan"
    );

    let accounts = ConnectedAccountRepository::new(db);
    for account_id in &plan.connected_accounts {
        accounts.delete_by_id(*account_id).await?;
    }

    let bundles = BundleRepository::new(db);
    for (bundle_id, configuration_id) in &plan.bundles_configurations_removed {
        if let Some(bundle) = bundles.find_by_id(*bundle_id).await? {
            let remaining: Vec<Uuid> = bundle
                .configuration_ids()
                .into_iter()
                .filter(|id| id != configuration_id)
                .collect();
            bundles.update_configuration_ids(bundle, remaining).await?;
        }
    }

    Ok(())
}

/// Snapshot + plan + apply for an allowed-teams update.
pub async fn on_configuration_allowed_teams_updated<C: ConnectionTrait>(
    db: &C,
    configuration: &portico_storage::entities::mcp_server_configurations::Model,
) -> RestResult<ReaperPlan> {
    let account_models = ConnectedAccountRepository::new(db)
        .list_by_configuration(configuration.id)
        .await?;
    let bundle_models = BundleRepository::new(db)
        .list_by_organization_containing(configuration.organization_id, configuration.id)
        .await?;

    // Pre-compute accessibility per distinct user so the pure planner stays
    // synchronous.
    let mut access: std::collections::HashMap<Uuid, bool> = std::collections::HashMap::new();
    for user_id in account_models
        .iter()
        .map(|account| account.user_id)
        .chain(bundle_models.iter().map(|bundle| bundle.user_id))
    {
        if let std::collections::hash_map::Entry::Vacant(entry) = access.entry(user_id) {
            entry.insert(check_configuration_accessibility(db, user_id, configuration).await?);
        }
    }

    let accounts: Vec<AccountSnapshot> = account_models
        .iter()
        .map(|account| AccountSnapshot {
            id: account.id,
            user_id: account.user_id,
            configuration_id: account.mcp_server_configuration_id,
            ownership: account.ownership.into(),
        })
        .collect();
    let bundles: Vec<BundleSnapshot> = bundle_models
        .iter()
        .map(|bundle| BundleSnapshot {
            id: bundle.id,
            user_id: bundle.user_id,
            configuration_ids: bundle.configuration_ids(),
        })
        .collect();

    let plan = plan_on_configuration_allowed_teams_updated(
        configuration.id,
        &accounts,
        &bundles,
        |user_id| access.get(&user_id).copied().unwrap_or(false),
    );
    apply_plan(db, &plan).await?;
    Ok(plan)
}

/// Snapshot + plan + apply after a configuration delete. The delete must
/// already have happened (cascade removes its accounts).
pub async fn on_configuration_deleted<C: ConnectionTrait>(
    db: &C,
    organization_id: Uuid,
    configuration_id: Uuid,
) -> RestResult<ReaperPlan> {
    let bundle_models = BundleRepository::new(db)
        .list_by_organization_containing(organization_id, configuration_id)
        .await?;
    let bundles: Vec<BundleSnapshot> = bundle_models
        .iter()
        .map(|bundle| BundleSnapshot {
            id: bundle.id,
            user_id: bundle.user_id,
            configuration_ids: bundle.configuration_ids(),
        })
        .collect();

    let plan = plan_on_configuration_deleted(configuration_id, &bundles);
    apply_plan(db, &plan).await?;
    Ok(plan)
}

/// Snapshot + plan + apply after a user was removed from a team.
pub async fn on_user_removed_from_team<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    organization_id: Uuid,
) -> RestResult<ReaperPlan> {
    let account_models = ConnectedAccountRepository::new(db).list_by_user(user_id).await?;
    let bundle_models = BundleRepository::new(db)
        .list_by_user(organization_id, user_id)
        .await?;

    let configurations = ConfigurationRepository::new(db);
    let mut accessible: std::collections::HashMap<Uuid, Option<bool>> =
        std::collections::HashMap::new();
    for configuration_id in account_models
        .iter()
        .map(|account| account.mcp_server_configuration_id)
        .chain(bundle_models.iter().flat_map(|bundle| bundle.configuration_ids()))
    {
        if accessible.contains_key(&configuration_id) {
            continue;
        }
        let value = match configurations.find_by_id(configuration_id).await? {
            Some(configuration) => {
                Some(check_configuration_accessibility(db, user_id, &configuration).await?)
            }
            None => None,
        };
        accessible.insert(configuration_id, value);
    }

    let accounts: Vec<AccountSnapshot> = account_models
        .iter()
        .map(|account| AccountSnapshot {
            id: account.id,
            user_id: account.user_id,
            configuration_id: account.mcp_server_configuration_id,
            ownership: account.ownership.into(),
        })
        .collect();
    let bundles: Vec<BundleSnapshot> = bundle_models
        .iter()
        .map(|bundle| BundleSnapshot {
            id: bundle.id,
            user_id: bundle.user_id,
            configuration_ids: bundle.configuration_ids(),
        })
        .collect();

    let plan = plan_on_user_removed_from_team(&accounts, &bundles, |configuration_id| {
        accessible.get(&configuration_id).copied().flatten()
    });
    apply_plan(db, &plan).await?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(user: Uuid, config: Uuid, ownership: ConnectedAccountOwnership) -> AccountSnapshot {
        AccountSnapshot {
            id: Uuid::new_v4(),
            user_id: user,
            configuration_id: config,
            ownership,
        }
    }

    #[test]
    fn allowed_teams_update_removes_only_inaccessible_individuals() {
        // Configuration allowed_teams narrowed to [T2]: U (in T1 only) loses
        // access, V (in T2) keeps it.
        let config = Uuid::new_v4();
        let user_u = Uuid::new_v4();
        let user_v = Uuid::new_v4();

        let account_u = account(user_u, config, ConnectedAccountOwnership::Individual);
        let account_v = account(user_v, config, ConnectedAccountOwnership::Individual);
        let shared = account(user_u, config, ConnectedAccountOwnership::Shared);

        let bundle_u = BundleSnapshot {
            id: Uuid::new_v4(),
            user_id: user_u,
            configuration_ids: vec![config],
        };
        let bundle_v = BundleSnapshot {
            id: Uuid::new_v4(),
            user_id: user_v,
            configuration_ids: vec![config],
        };

        let plan = plan_on_configuration_allowed_teams_updated(
            config,
            &[account_u.clone(), account_v.clone(), shared.clone()],
            &[bundle_u.clone(), bundle_v.clone()],
            |user| user == user_v,
        );

        assert_eq!(plan.connected_accounts, vec![account_u.id]);
        assert_eq!(
            plan.bundles_configurations_removed,
            vec![(bundle_u.id, config)]
        );
    }

    #[test]
    fn shared_accounts_survive_team_changes() {
        let config = Uuid::new_v4();
        let user = Uuid::new_v4();
        let shared = account(user, config, ConnectedAccountOwnership::Shared);
        let operational = account(user, config, ConnectedAccountOwnership::Operational);

        let plan = plan_on_configuration_allowed_teams_updated(
            config,
            &[shared, operational],
            &[],
            |_| false,
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn configuration_delete_sweeps_every_referencing_bundle() {
        let config = Uuid::new_v4();
        let other = Uuid::new_v4();
        let bundle_a = BundleSnapshot {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            configuration_ids: vec![config, other],
        };
        let bundle_b = BundleSnapshot {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            configuration_ids: vec![other],
        };

        let plan = plan_on_configuration_deleted(config, &[bundle_a.clone(), bundle_b]);
        assert_eq!(plan.bundles_configurations_removed, vec![(bundle_a.id, config)]);
    }

    #[test]
    fn user_removed_from_team_loses_unreachable_accounts_and_bundle_refs() {
        let reachable = Uuid::new_v4();
        let unreachable = Uuid::new_v4();
        let deleted_config = Uuid::new_v4();
        let user = Uuid::new_v4();

        let accounts = vec![
            account(user, reachable, ConnectedAccountOwnership::Individual),
            account(user, unreachable, ConnectedAccountOwnership::Individual),
        ];
        let bundle = BundleSnapshot {
            id: Uuid::new_v4(),
            user_id: user,
            configuration_ids: vec![reachable, unreachable, deleted_config],
        };

        let plan = plan_on_user_removed_from_team(&accounts, &[bundle.clone()], |config| {
            if config == reachable {
                Some(true)
            } else if config == unreachable {
                Some(false)
            } else {
                None // configuration no longer exists
            }
        });

        assert_eq!(plan.connected_accounts, vec![accounts[1].id]);
        assert_eq!(
            plan.bundles_configurations_removed,
            vec![(bundle.id, unreachable), (bundle.id, deleted_config)]
        );
    }
}
