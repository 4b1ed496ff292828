//! Outbound HTTP client and provider integrations
//!
//! One shared `reqwest` client (per-host pooling, 30 s default timeout)
//! plus the three thin REST integrations the control plane calls out to:
//! the email provider, the embedding provider and Stripe.

pub mod client;
pub mod email;
pub mod embeddings;
pub mod errors;
pub mod stripe;

pub use client::shared_client;
pub use email::EmailClient;
pub use embeddings::EmbeddingClient;
pub use errors::HttpError;
pub use stripe::{StripeClient, StripeSubscription, StripeSubscriptionItem};
