//! Subscription lifecycle and Stripe reconciliation
//!
//! Plan changes are validated against existing usage before any Stripe
//! call. Webhook reconciliation never trusts event payloads: the referenced
//! subscription is re-pulled from Stripe and folded through a small state
//! machine.

use chrono::{DateTime, Utc};
use portico_api_types::ErrorCode;
use portico_http::{StripeClient, StripeSubscription};
use sea_orm::ConnectionTrait;
use tracing::{error, info};
use uuid::Uuid;

use portico_storage::entities::{organizations, subscription_plans};
use portico_storage::repositories::subscription_repository::SubscriptionUpsert;
use portico_storage::repositories::{OrganizationRepository, SubscriptionRepository};

use crate::errors::{RestError, RestResult};
use crate::services::entitlement::{fulfills_existing_usage, Entitlement};

/// What a plan change resolves to.
pub enum ChangeOutcome {
    /// Free → paid: the caller redirects to this hosted checkout URL
    Checkout { url: String },
    /// Paid → paid: the existing subscription item was updated in place
    Updated,
    /// → free: nothing to bill
    Downgraded,
}

/// What a pulled Stripe subscription status means for our row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// active | past_due
    Upsert,
    /// canceled | incomplete_expired: drop the row, org falls back to free
    Delete,
    /// incomplete: not yet billable, ignore
    Ignore,
    /// unpaid | paused | trialing: unexpected for this product
    Reject,
}

pub fn reconcile_action(status: &str) -> ReconcileAction {
    match status {
        "active" | "past_due" => ReconcileAction::Upsert,
        "canceled" | "incomplete_expired" => ReconcileAction::Delete,
        "incomplete" => ReconcileAction::Ignore,
        _ => ReconcileAction::Reject,
    }
}

/// Validate and execute a plan change request.
pub async fn change_subscription<C: ConnectionTrait>(
    db: &C,
    stripe: &StripeClient,
    organization: &organizations::Model,
    plan_code: &str,
    requested_seats: i32,
    checkout_success_url: &str,
    checkout_cancel_url: &str,
    billing_email: &str,
) -> RestResult<ChangeOutcome> {
    let subscriptions = SubscriptionRepository::new(db);
    let plan = subscriptions
        .find_plan_by_code(plan_code)
        .await?
        .filter(|plan| plan.is_public)
        .ok_or_else(|| RestError::api(ErrorCode::PlanNotAvailable, "Plan not available"))?;

    // Free plans pin the seat count to the plan max
    let seat_count = if plan.is_free {
        plan.max_seats
    } else {
        requested_seats
    };

    if seat_count < plan.min_seats || seat_count > plan.max_seats {
        return Err(RestError::api(
            ErrorCode::RequestedSubscriptionInvalid,
            "Seat count outside the plan's bounds",
        ));
    }

    let requested = Entitlement {
        seat_count: Some(seat_count),
        max_custom_mcp_servers: plan.max_custom_mcp_servers,
        log_retention_days: plan.log_retention_days,
    };
    if !fulfills_existing_usage(db, organization.id, &requested).await? {
        return Err(RestError::api(
            ErrorCode::RequestedSubscriptionInvalid,
            "Requested subscription does not cover current usage",
        ));
    }

    if plan.is_free {
        // Cancellation path handles the Stripe side; here the org simply has
        // no paid row to create.
        return Ok(ChangeOutcome::Downgraded);
    }

    let price_id = plan.stripe_price_id.as_deref().ok_or_else(|| {
        error!(plan_code = %plan.plan_code, "paid plan is missing a stripe price id");
        RestError::api(ErrorCode::StripeOperationError, "Plan is not purchasable")
    })?;

    match subscriptions.find_subscription(organization.id).await? {
        // Paid → paid: update the existing item, Stripe invoices the
        // proration immediately and emits the webhook that updates our row.
        Some(existing) => {
            stripe
                .update_subscription_item(
                    &existing.stripe_subscription_item_id,
                    price_id,
                    seat_count as i64,
                )
                .await?;
            Ok(ChangeOutcome::Updated)
        }
        // Free → paid: hosted checkout
        None => {
            let customer_id = match &organization.stripe_customer_id {
                Some(customer_id) => customer_id.clone(),
                None => {
                    let customer = stripe.create_customer(&organization.name, billing_email).await?;
                    OrganizationRepository::new(db)
                        .set_stripe_customer_id(organization.id, &customer.id)
                        .await?;
                    customer.id
                }
            };
            let session = stripe
                .create_checkout_session(
                    &customer_id,
                    price_id,
                    seat_count as i64,
                    checkout_success_url,
                    checkout_cancel_url,
                )
                .await?;
            let url = session.url.ok_or_else(|| {
                RestError::api(ErrorCode::StripeOperationError, "Checkout session has no URL")
            })?;
            Ok(ChangeOutcome::Checkout { url })
        }
    }
}

/// Set `cancel_at_period_end`; the terminal webhook event removes the row.
pub async fn cancel_subscription<C: ConnectionTrait>(
    db: &C,
    stripe: &StripeClient,
    organization_id: Uuid,
) -> RestResult<()> {
    let subscription = SubscriptionRepository::new(db)
        .find_subscription(organization_id)
        .await?
        .ok_or_else(|| {
            RestError::api(ErrorCode::RequestedSubscriptionInvalid, "No paid subscription")
        })?;
    stripe
        .cancel_at_period_end(&subscription.stripe_subscription_id)
        .await?;
    Ok(())
}

/// Reconcile one subscription pulled from Stripe into our row.
pub async fn reconcile_subscription<C: ConnectionTrait>(
    db: &C,
    subscription: &StripeSubscription,
) -> RestResult<()> {
    let subscriptions = SubscriptionRepository::new(db);

    let organization = OrganizationRepository::new(db)
        .find_by_stripe_customer_id(&subscription.customer)
        .await?
        .ok_or_else(|| {
            error!(customer = %subscription.customer, "no organization for stripe customer");
            RestError::api(ErrorCode::OrganizationNotFound, "Unknown Stripe customer")
        })?;

    if subscription.items.data.len() != 1 {
        return Err(RestError::api(
            ErrorCode::StripeOperationError,
            format!("Expected 1 subscription item, got {}", subscription.items.data.len()),
        ));
    }
    let item = &subscription.items.data[0];

    match reconcile_action(&subscription.status) {
        ReconcileAction::Ignore => Ok(()),
        ReconcileAction::Delete => {
            info!(organization_id = %organization.id, "removing terminated subscription");
            subscriptions
                .delete_subscription_by_stripe_id(&subscription.id)
                .await?;
            Ok(())
        }
        ReconcileAction::Upsert => {
            let plan: subscription_plans::Model = subscriptions
                .find_plan_by_stripe_price_id(&item.price.id)
                .await?
                .ok_or_else(|| {
                    error!(price = %item.price.id, "no plan for stripe price");
                    RestError::api(ErrorCode::StripeOperationError, "Unknown Stripe price")
                })?;

            subscriptions
                .upsert_subscription(
                    organization.id,
                    SubscriptionUpsert {
                        subscription_plan_id: plan.id,
                        seat_count: item.quantity.unwrap_or(0) as i32,
                        stripe_subscription_id: subscription.id.clone(),
                        stripe_subscription_item_id: item.id.clone(),
                        stripe_subscription_status: subscription.status.clone(),
                        current_period_start: item.current_period_start.map(timestamp_to_datetime),
                        current_period_end: item.current_period_end.map(timestamp_to_datetime),
                        cancel_at_period_end: subscription.cancel_at_period_end,
                        subscription_start_date: subscription.start_date.map(timestamp_to_datetime),
                    },
                )
                .await?;
            Ok(())
        }
        ReconcileAction::Reject => {
            error!(status = %subscription.status, "unsupported subscription status");
            Err(RestError::api(
                ErrorCode::StripeOperationError,
                format!("Unsupported subscription status {}", subscription.status),
            ))
        }
    }
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_matches_stripe_lifecycle() {
        assert_eq!(reconcile_action("active"), ReconcileAction::Upsert);
        assert_eq!(reconcile_action("past_due"), ReconcileAction::Upsert);
        assert_eq!(reconcile_action("canceled"), ReconcileAction::Delete);
        assert_eq!(reconcile_action("incomplete_expired"), ReconcileAction::Delete);
        assert_eq!(reconcile_action("incomplete"), ReconcileAction::Ignore);
        assert_eq!(reconcile_action("unpaid"), ReconcileAction::Reject);
        assert_eq!(reconcile_action("paused"), ReconcileAction::Reject);
        assert_eq!(reconcile_action("trialing"), ReconcileAction::Reject);
    }
}
