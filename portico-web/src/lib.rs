//! Reusable web middleware and utilities for Portico APIs
//!
//! Owns the pieces every HTTP surface shares: JWT issuing/verification with
//! act-as claims, bearer extraction, request-id propagation, refresh-cookie
//! construction and one-time-token hashing.

pub mod errors;
pub mod middleware;
pub mod utils;

pub use errors::{WebError, WebResult};
pub use middleware::auth::{ActAs, AuthClaims, BearerClaims, JwtManager};
pub use middleware::request_id::{request_id_middleware, RequestId};
pub use utils::cookies::{clear_refresh_token_cookie, refresh_token_cookie};
pub use utils::tokens::TokenHasher;
