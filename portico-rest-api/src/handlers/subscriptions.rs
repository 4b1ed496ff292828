//! Subscription endpoints and the Stripe webhook

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use portico_api_types::ErrorCode;
use sea_orm::EntityTrait;
use tracing::{error, info};
use uuid::Uuid;

use portico_http::stripe::verify_webhook;
use portico_storage::repositories::{OrganizationRepository, SubscriptionRepository};

use crate::context::AppContext;
use crate::errors::{RestError, RestResult};
use crate::models::subscriptions::{
    ChangeSubscriptionRequest, ChangeSubscriptionResponse, SubscriptionStatusResponse,
};
use crate::services::entitlement::get_organization_entitlement;
use crate::services::subscription::{
    cancel_subscription, change_subscription, reconcile_subscription, ChangeOutcome,
};

/// `GET /organizations/{id}/subscription-status`
pub async fn subscription_status(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(organization_id): Path<Uuid>,
) -> RestResult<Json<SubscriptionStatusResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if context.organization_id() != organization_id {
        return Err(RestError::not_permitted());
    }

    let subscriptions = SubscriptionRepository::new(&txn);
    let entitlement = get_organization_entitlement(&txn, organization_id).await?;

    let response = match subscriptions.find_subscription(organization_id).await? {
        Some(subscription) => {
            let plan = portico_storage::entities::SubscriptionPlans::find_by_id(
                subscription.subscription_plan_id,
            )
            .one(&txn)
            .await
            .map_err(portico_storage::StorageError::from)?;
            SubscriptionStatusResponse {
                plan_code: plan.map(|plan| plan.plan_code).unwrap_or_default(),
                seat_count: Some(subscription.seat_count),
                entitlement,
                cancel_at_period_end: subscription.cancel_at_period_end,
                current_period_end: subscription.current_period_end,
            }
        }
        None => {
            let free = subscriptions.get_free_plan().await?;
            SubscriptionStatusResponse {
                plan_code: free.plan_code,
                seat_count: entitlement.seat_count,
                entitlement,
                cancel_at_period_end: false,
                current_period_end: None,
            }
        }
    };
    txn.commit().await?;
    Ok(Json(response))
}

/// `POST /organizations/{id}/change-subscription`: admin only.
pub async fn change_subscription_handler(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<ChangeSubscriptionRequest>,
) -> RestResult<Json<ChangeSubscriptionResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if context.organization_id() != organization_id || !context.is_admin() {
        return Err(RestError::not_permitted());
    }

    let organization = OrganizationRepository::new(&txn)
        .get_by_id(organization_id)
        .await?;

    let frontend = &ctx.config.server.frontend_url;
    let outcome = change_subscription(
        &txn,
        &ctx.stripe,
        &organization,
        &request.plan_code,
        request.seat_count.unwrap_or(0),
        &format!("{}/billing/success", frontend),
        &format!("{}/billing/cancel", frontend),
        &context.user.email,
    )
    .await?;
    txn.commit().await?;

    Ok(Json(match outcome {
        ChangeOutcome::Checkout { url } => ChangeSubscriptionResponse::SubscriptionCheckout { url },
        ChangeOutcome::Updated | ChangeOutcome::Downgraded => {
            ChangeSubscriptionResponse::SubscriptionUpdated
        }
    }))
}

/// `POST /organizations/{id}/cancel-subscription`
pub async fn cancel_subscription_handler(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(organization_id): Path<Uuid>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if context.organization_id() != organization_id || !context.is_admin() {
        return Err(RestError::not_permitted());
    }

    cancel_subscription(&txn, &ctx.stripe, organization_id).await?;
    txn.commit().await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /subscription/stripe/webhook`
///
/// Only a signature failure earns a 4xx. Everything after a recorded event
/// returns 200 so Stripe's redelivery semantics hold; reconciliation errors
/// are logged, and redelivery is a no-op thanks to the event-id uniqueness.
pub async fn stripe_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: String,
) -> RestResult<StatusCode> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| RestError::api(ErrorCode::ValidationFailed, "Missing signature"))?;

    let event = verify_webhook(&body, signature, &ctx.config.stripe.webhook_secret)
        .map_err(|_| RestError::api(ErrorCode::ValidationFailed, "Invalid signature"))?;

    if !matches!(
        event.event_type.as_str(),
        "customer.subscription.created"
            | "customer.subscription.updated"
            | "customer.subscription.deleted"
            | "checkout.session.completed"
    ) {
        return Ok(StatusCode::OK);
    }

    let txn = ctx.begin().await?;

    // Idempotency: first delivery wins, replays are acknowledged untouched
    let fresh = SubscriptionRepository::new(&txn)
        .record_stripe_event(&event.id, &event.event_type)
        .await?;
    if !fresh {
        info!(event_id = %event.id, "duplicate stripe event acknowledged");
        txn.commit().await?;
        return Ok(StatusCode::OK);
    }

    // Pull the referenced subscription from Stripe; payload fields are not
    // trusted beyond the object id.
    let subscription_id = match event.event_type.as_str() {
        "checkout.session.completed" => event.data.object["subscription"]
            .as_str()
            .map(str::to_string),
        _ => event.data.object["id"].as_str().map(str::to_string),
    };

    if let Some(subscription_id) = subscription_id {
        match ctx.stripe.retrieve_subscription(&subscription_id).await {
            Ok(subscription) => {
                if let Err(err) = reconcile_subscription(&txn, &subscription).await {
                    error!(%err, event_id = %event.id, "subscription reconciliation failed");
                }
            }
            Err(err) => error!(%err, event_id = %event.id, "failed to pull subscription from stripe"),
        }
    }

    txn.commit().await?;
    Ok(StatusCode::OK)
}

