//! Stripe REST client and webhook signature verification
//!
//! Only the handful of calls the subscription service needs. Webhook
//! reconciliation never trusts event payload fields: the caller re-pulls the
//! subscription through [`StripeClient::retrieve_subscription`].

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::HttpError;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Signature tolerance for webhook timestamps, in seconds.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    pub customer: String,
    pub cancel_at_period_end: bool,
    pub start_date: Option<i64>,
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub id: String,
    pub price: StripePrice,
    pub quantity: Option<i64>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// Envelope of a webhook event; data fields beyond the object id are
/// deliberately not modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

impl StripeClient {
    pub fn new(http: reqwest::Client, secret_key: &str) -> Self {
        Self {
            http,
            secret_key: secret_key.to_string(),
            api_base: STRIPE_API_BASE.to_string(),
        }
    }

    /// Point the client at a mock server in tests.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, HttpError> {
        let response = self
            .http
            .get(format!("{}/subscriptions/{}", self.api_base, subscription_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn create_customer(&self, organization_name: &str, email: &str) -> Result<StripeCustomer, HttpError> {
        let response = self
            .http
            .post(format!("{}/customers", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("name", organization_name), ("email", email)])
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Hosted checkout for the free → paid upgrade.
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        quantity: i64,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<StripeCheckoutSession, HttpError> {
        let quantity = quantity.to_string();
        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("mode", "subscription"),
                ("customer", customer_id),
                ("line_items[0][price]", price_id),
                ("line_items[0][quantity]", quantity.as_str()),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
            ])
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Paid → paid change: swap the price/quantity on the existing item and
    /// invoice the proration immediately.
    pub async fn update_subscription_item(
        &self,
        item_id: &str,
        price_id: &str,
        quantity: i64,
    ) -> Result<StripeSubscriptionItem, HttpError> {
        let quantity = quantity.to_string();
        let response = self
            .http
            .post(format!("{}/subscription_items/{}", self.api_base, item_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("price", price_id),
                ("quantity", quantity.as_str()),
                ("proration_behavior", "always_invoice"),
            ])
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Cancellation: Stripe emits the terminal event at period end.
    pub async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, HttpError> {
        let response = self
            .http
            .post(format!("{}/subscriptions/{}", self.api_base, subscription_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("cancel_at_period_end", "true")])
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HttpError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Verify a `Stripe-Signature` header against the raw payload and decode the
/// event. The scheme is `t=<ts>,v1=<hmac_sha256(ts + "." + payload)>` with a
/// bounded timestamp skew.
pub fn verify_webhook(
    payload: &str,
    signature_header: &str,
    webhook_secret: &str,
) -> Result<StripeEvent, HttpError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(HttpError::InvalidSignature)?;
    if (Utc::now().timestamp() - timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(HttpError::InvalidSignature);
    }

    let mut mac = HmacSha256::new_from_slice(webhook_secret.as_bytes())
        .map_err(|_| HttpError::InvalidSignature)?;
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());

    // verify_slice compares in constant time; never string-compare digests
    let verified = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !verified {
        return Err(HttpError::InvalidSignature);
    }

    Ok(serde_json::from_str(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &str, secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    const EVENT: &str = r#"{
        "id": "evt_123",
        "type": "customer.subscription.updated",
        "data": {"object": {"id": "sub_123"}}
    }"#;

    #[test]
    fn valid_signature_decodes_event() {
        let header = sign(EVENT, "whsec_test", Utc::now().timestamp());
        let event = verify_webhook(EVENT, &header, "whsec_test").unwrap();
        assert_eq!(event.id, "evt_123");
        assert_eq!(event.event_type, "customer.subscription.updated");
        assert_eq!(event.data.object["id"], "sub_123");
    }

    #[test]
    fn wrong_secret_rejected() {
        let header = sign(EVENT, "whsec_test", Utc::now().timestamp());
        assert!(matches!(
            verify_webhook(EVENT, &header, "whsec_other"),
            Err(HttpError::InvalidSignature)
        ));
    }

    #[test]
    fn stale_timestamp_rejected() {
        let header = sign(EVENT, "whsec_test", Utc::now().timestamp() - 3600);
        assert!(matches!(
            verify_webhook(EVENT, &header, "whsec_test"),
            Err(HttpError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_rejected() {
        let header = sign(EVENT, "whsec_test", Utc::now().timestamp());
        let tampered = EVENT.replace("sub_123", "sub_999");
        assert!(matches!(
            verify_webhook(&tampered, &header, "whsec_test"),
            Err(HttpError::InvalidSignature)
        ));
    }
}
