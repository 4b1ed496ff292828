//! Entitlement resolution and usage checks
//!
//! The effective entitlement is the plan's fields overlaid field-wise by a
//! non-expired override. `None` caps mean unlimited.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::Serialize;
use uuid::Uuid;

use portico_storage::entities::{entitlement_overrides, subscription_plans};
use portico_storage::repositories::{
    McpServerRepository, OrganizationRepository, SubscriptionRepository,
};

use crate::errors::RestResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub seat_count: Option<i32>,
    pub max_custom_mcp_servers: Option<i32>,
    pub log_retention_days: Option<i32>,
}

/// Overlay a non-expired override onto plan-derived caps, field by field.
pub fn merge_entitlement(
    plan_seats: Option<i32>,
    plan: &subscription_plans::Model,
    override_row: Option<&entitlement_overrides::Model>,
    now: DateTime<Utc>,
) -> Entitlement {
    let mut entitlement = Entitlement {
        seat_count: plan_seats,
        max_custom_mcp_servers: plan.max_custom_mcp_servers,
        log_retention_days: plan.log_retention_days,
    };

    if let Some(override_row) = override_row {
        let expired = override_row
            .expires_at
            .map(|expires_at| expires_at <= now)
            .unwrap_or(false);
        if !expired {
            if let Some(seats) = override_row.seat_count {
                entitlement.seat_count = Some(seats);
            }
            if let Some(servers) = override_row.max_custom_mcp_servers {
                entitlement.max_custom_mcp_servers = Some(servers);
            }
            if let Some(days) = override_row.log_retention_days {
                entitlement.log_retention_days = Some(days);
            }
        }
    }

    entitlement
}

/// Resolve the effective entitlement for an organization. Without a
/// subscription row the org is on the free plan at its max seat count.
pub async fn get_organization_entitlement<C: ConnectionTrait>(
    db: &C,
    organization_id: Uuid,
) -> RestResult<Entitlement> {
    let subscriptions = SubscriptionRepository::new(db);
    let override_row = subscriptions.find_override(organization_id).await?;

    let (plan, seats) = match subscriptions.find_subscription(organization_id).await? {
        Some(subscription) => {
            let plan = portico_storage::entities::SubscriptionPlans::find_by_id(
                subscription.subscription_plan_id,
            )
            .one(db)
            .await
            .map_err(portico_storage::StorageError::from)?
            .ok_or_else(|| {
                portico_storage::StorageError::not_found(
                    "SubscriptionPlan",
                    subscription.subscription_plan_id,
                )
            })?;
            (plan, Some(subscription.seat_count))
        }
        None => {
            let free = subscriptions.get_free_plan().await?;
            let seats = Some(free.max_seats);
            (free, seats)
        }
    };

    Ok(merge_entitlement(seats, &plan, override_row.as_ref(), Utc::now()))
}

/// Whether an entitlement covers the organization's existing usage: seats
/// already occupied and custom servers already registered.
pub async fn fulfills_existing_usage<C: ConnectionTrait>(
    db: &C,
    organization_id: Uuid,
    entitlement: &Entitlement,
) -> RestResult<bool> {
    let seats_in_use = OrganizationRepository::new(db)
        .count_members(organization_id)
        .await? as i32;
    if let Some(seat_count) = entitlement.seat_count {
        if seat_count < seats_in_use {
            return Ok(false);
        }
    }

    let custom_servers = McpServerRepository::new(db)
        .count_custom(organization_id)
        .await? as i32;
    if let Some(max_custom) = entitlement.max_custom_mcp_servers {
        if max_custom < custom_servers {
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn plan(max_custom: Option<i32>, retention: Option<i32>) -> subscription_plans::Model {
        subscription_plans::Model {
            id: Uuid::new_v4(),
            plan_code: "TEAM".to_string(),
            display_name: "Team".to_string(),
            is_free: false,
            is_public: true,
            stripe_price_id: Some("price_1".to_string()),
            min_seats: 1,
            max_seats: 50,
            max_custom_mcp_servers: max_custom,
            log_retention_days: retention,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn override_row(
        seats: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> entitlement_overrides::Model {
        entitlement_overrides::Model {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            seat_count: seats,
            max_custom_mcp_servers: None,
            log_retention_days: Some(365),
            expires_at,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn override_replaces_only_set_fields() {
        let now = Utc::now();
        let merged = merge_entitlement(
            Some(10),
            &plan(Some(3), Some(30)),
            Some(&override_row(Some(25), None)),
            now,
        );
        assert_eq!(merged.seat_count, Some(25));
        assert_eq!(merged.max_custom_mcp_servers, Some(3));
        assert_eq!(merged.log_retention_days, Some(365));
    }

    #[test]
    fn expired_override_is_ignored() {
        let now = Utc::now();
        let merged = merge_entitlement(
            Some(10),
            &plan(Some(3), Some(30)),
            Some(&override_row(Some(25), Some(now - Duration::hours(1)))),
            now,
        );
        assert_eq!(merged.seat_count, Some(10));
        assert_eq!(merged.log_retention_days, Some(30));
    }

    #[test]
    fn none_caps_mean_unlimited() {
        let merged = merge_entitlement(Some(10), &plan(None, None), None, Utc::now());
        assert_eq!(merged.max_custom_mcp_servers, None);
        assert_eq!(merged.log_retention_days, None);
    }
}
