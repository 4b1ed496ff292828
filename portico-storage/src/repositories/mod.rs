//! Repository layer
//!
//! Every repository borrows a [`sea_orm::ConnectionTrait`] implementor, so
//! the same methods run on the pool or inside a transaction started by the
//! request handler. Raw statements appear only where SeaORM has no
//! vocabulary: pgvector reads/writes, `FOR UPDATE` row locks.

pub mod bundle_repository;
pub mod configuration_repository;
pub mod connected_account_repository;
pub mod mcp_server_repository;
pub mod mcp_tool_repository;
pub mod organization_repository;
pub mod session_repository;
pub mod subscription_repository;
pub mod team_repository;
pub mod token_repository;
pub mod tool_call_log_repository;
pub mod user_repository;

pub use bundle_repository::BundleRepository;
pub use configuration_repository::ConfigurationRepository;
pub use connected_account_repository::ConnectedAccountRepository;
pub use mcp_server_repository::McpServerRepository;
pub use mcp_tool_repository::McpToolRepository;
pub use organization_repository::OrganizationRepository;
pub use session_repository::SessionRepository;
pub use subscription_repository::SubscriptionRepository;
pub use team_repository::TeamRepository;
pub use token_repository::TokenRepository;
pub use tool_call_log_repository::ToolCallLogRepository;
pub use user_repository::UserRepository;

/// Render an embedding as the pgvector text literal (`[0.1,0.2,...]`).
pub(crate) fn vector_literal(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10 + 2);
    out.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::vector_literal;

    #[test]
    fn vector_literal_format() {
        assert_eq!(vector_literal(&[1.0, -0.5, 0.25]), "[1,-0.5,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }
}
