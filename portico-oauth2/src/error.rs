//! OAuth2 error types

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Error, Debug)]
pub enum OAuth2Error {
    #[error("Metadata discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("Dynamic client registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("State parameter invalid")]
    StateInvalid,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}
