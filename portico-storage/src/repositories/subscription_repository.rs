//! Subscription, plan, entitlement-override and Stripe-event repository

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{
    entitlement_overrides, organization_subscriptions, stripe_events, subscription_plans,
    EntitlementOverrides, OrganizationSubscriptions, StripeEvents, SubscriptionPlans,
};
use crate::error::{StorageError, StorageResult};

pub struct SubscriptionRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

/// All fields reconciled from a Stripe subscription pull.
pub struct SubscriptionUpsert {
    pub subscription_plan_id: Uuid,
    pub seat_count: i32,
    pub stripe_subscription_id: String,
    pub stripe_subscription_item_id: String,
    pub stripe_subscription_status: String,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub subscription_start_date: Option<DateTime<Utc>>,
}

impl<'a, C: ConnectionTrait> SubscriptionRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    // Plans

    pub async fn find_plan_by_code(&self, plan_code: &str) -> StorageResult<Option<subscription_plans::Model>> {
        Ok(SubscriptionPlans::find()
            .filter(subscription_plans::Column::PlanCode.eq(plan_code))
            .filter(subscription_plans::Column::ArchivedAt.is_null())
            .one(self.db)
            .await?)
    }

    pub async fn find_plan_by_stripe_price_id(
        &self,
        stripe_price_id: &str,
    ) -> StorageResult<Option<subscription_plans::Model>> {
        Ok(SubscriptionPlans::find()
            .filter(subscription_plans::Column::StripePriceId.eq(stripe_price_id))
            .one(self.db)
            .await?)
    }

    pub async fn get_free_plan(&self) -> StorageResult<subscription_plans::Model> {
        SubscriptionPlans::find()
            .filter(subscription_plans::Column::IsFree.eq(true))
            .filter(subscription_plans::Column::ArchivedAt.is_null())
            .one(self.db)
            .await?
            .ok_or_else(|| StorageError::not_found("SubscriptionPlan", "free"))
    }

    pub async fn list_public_plans(&self) -> StorageResult<Vec<subscription_plans::Model>> {
        Ok(SubscriptionPlans::find()
            .filter(subscription_plans::Column::IsPublic.eq(true))
            .filter(subscription_plans::Column::ArchivedAt.is_null())
            .all(self.db)
            .await?)
    }

    // Organization subscriptions

    pub async fn find_subscription(
        &self,
        organization_id: Uuid,
    ) -> StorageResult<Option<organization_subscriptions::Model>> {
        Ok(OrganizationSubscriptions::find()
            .filter(organization_subscriptions::Column::OrganizationId.eq(organization_id))
            .one(self.db)
            .await?)
    }

    pub async fn find_subscription_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
    ) -> StorageResult<Option<organization_subscriptions::Model>> {
        Ok(OrganizationSubscriptions::find()
            .filter(
                organization_subscriptions::Column::StripeSubscriptionId.eq(stripe_subscription_id),
            )
            .one(self.db)
            .await?)
    }

    pub async fn upsert_subscription(
        &self,
        organization_id: Uuid,
        data: SubscriptionUpsert,
    ) -> StorageResult<organization_subscriptions::Model> {
        let now = Utc::now();
        match self.find_subscription(organization_id).await? {
            Some(existing) => {
                let mut active: organization_subscriptions::ActiveModel = existing.into();
                active.subscription_plan_id = Set(data.subscription_plan_id);
                active.seat_count = Set(data.seat_count);
                active.stripe_subscription_id = Set(data.stripe_subscription_id);
                active.stripe_subscription_item_id = Set(data.stripe_subscription_item_id);
                active.stripe_subscription_status = Set(data.stripe_subscription_status);
                active.current_period_start = Set(data.current_period_start);
                active.current_period_end = Set(data.current_period_end);
                active.cancel_at_period_end = Set(data.cancel_at_period_end);
                active.subscription_start_date = Set(data.subscription_start_date);
                active.updated_at = Set(now);
                Ok(active.update(self.db).await?)
            }
            None => Ok(organization_subscriptions::ActiveModel {
                id: Set(Uuid::new_v4()),
                organization_id: Set(organization_id),
                subscription_plan_id: Set(data.subscription_plan_id),
                seat_count: Set(data.seat_count),
                stripe_subscription_id: Set(data.stripe_subscription_id),
                stripe_subscription_item_id: Set(data.stripe_subscription_item_id),
                stripe_subscription_status: Set(data.stripe_subscription_status),
                current_period_start: Set(data.current_period_start),
                current_period_end: Set(data.current_period_end),
                cancel_at_period_end: Set(data.cancel_at_period_end),
                subscription_start_date: Set(data.subscription_start_date),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(self.db)
            .await?),
        }
    }

    /// Delete by Stripe subscription id; the org falls back to the free plan.
    pub async fn delete_subscription_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
    ) -> StorageResult<()> {
        if let Some(subscription) = self
            .find_subscription_by_stripe_id(stripe_subscription_id)
            .await?
        {
            subscription.delete(self.db).await?;
        }
        Ok(())
    }

    // Entitlement overrides

    pub async fn find_override(
        &self,
        organization_id: Uuid,
    ) -> StorageResult<Option<entitlement_overrides::Model>> {
        Ok(EntitlementOverrides::find()
            .filter(entitlement_overrides::Column::OrganizationId.eq(organization_id))
            .one(self.db)
            .await?)
    }

    // Stripe events

    /// Record an event id; `false` means the event was already processed and
    /// the caller must skip reconciliation.
    pub async fn record_stripe_event(
        &self,
        stripe_event_id: &str,
        event_type: &str,
    ) -> StorageResult<bool> {
        let result = stripe_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            stripe_event_id: Set(stripe_event_id.to_string()),
            event_type: Set(event_type.to_string()),
            processed_at: Set(Utc::now()),
        }
        .insert(self.db)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let storage_err = StorageError::Database(err);
                if storage_err.is_unique_violation() {
                    Ok(false)
                } else {
                    Err(storage_err)
                }
            }
        }
    }

    pub async fn find_stripe_event(
        &self,
        stripe_event_id: &str,
    ) -> StorageResult<Option<stripe_events::Model>> {
        Ok(StripeEvents::find()
            .filter(stripe_events::Column::StripeEventId.eq(stripe_event_id))
            .one(self.db)
            .await?)
    }
}
