//! Subscription endpoint types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::entitlement::Entitlement;

#[derive(Debug, Deserialize)]
pub struct ChangeSubscriptionRequest {
    pub plan_code: String,
    #[serde(default)]
    pub seat_count: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeSubscriptionResponse {
    /// Free → paid: complete payment through this hosted checkout URL
    SubscriptionCheckout { url: String },
    /// The subscription was changed in place
    SubscriptionUpdated,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub plan_code: String,
    pub seat_count: Option<i32>,
    pub entitlement: Entitlement,
    pub cancel_at_period_end: bool,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_response_carries_url_under_kind_tag() {
        let response = ChangeSubscriptionResponse::SubscriptionCheckout {
            url: "https://checkout.stripe.com/c/pay/cs_123".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["kind"], "subscription_checkout");
        assert_eq!(json["url"], "https://checkout.stripe.com/c/pay/cs_123");

        let updated = serde_json::to_value(ChangeSubscriptionResponse::SubscriptionUpdated).unwrap();
        assert_eq!(updated["kind"], "subscription_updated");
    }
}
