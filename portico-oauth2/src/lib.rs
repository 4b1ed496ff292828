//! OAuth2 client manager
//!
//! Implements the provider-facing half of connected-account auth: RFC 9728 /
//! RFC 8414 / OIDC metadata discovery, dynamic client registration,
//! authorization-code-with-PKCE URL construction, code exchange and token
//! refresh. State round-trips through a signed JWT.

pub mod error;
pub mod manager;
pub mod metadata;
pub mod pkce;
pub mod registration;
pub mod state;

pub use error::{OAuth2Error, OAuth2Result};
pub use manager::{OAuth2Manager, TokenResponse};
pub use metadata::{discover_metadata, OAuthMetadata};
pub use pkce::PkcePair;
pub use registration::{register_client, ClientRegistration};
pub use state::{OAuth2State, StateCodec};
