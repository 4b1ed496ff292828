//! Application state and request context resolution
//!
//! Two resolution modes: strict (a valid `act_as` is required; membership
//! and role are re-checked against the database) and lax (profile and
//! org-creation endpoints, where the bearer alone suffices).

use axum::http::HeaderMap;
use portico_api_types::{ErrorCode, OrganizationRole};
use portico_config::PorticoConfig;
use portico_http::{EmailClient, EmbeddingClient, StripeClient};
use portico_oauth2::{OAuth2Manager, StateCodec};
use portico_rbac::{Acl, Principal};
use portico_storage::entities::users;
use portico_storage::repositories::{OrganizationRepository, TeamRepository, UserRepository};
use portico_storage::DatabaseConnection;
use portico_web::{ActAs, JwtManager, TokenHasher};
use sea_orm::{ConnectionTrait, TransactionTrait};
use std::sync::Arc;

use crate::errors::{RestError, RestResult};

/// Shared application state for every control-plane handler.
#[derive(Clone)]
pub struct AppContext {
    pub db: DatabaseConnection,
    pub config: Arc<PorticoConfig>,
    pub http: reqwest::Client,
    pub jwt: JwtManager,
    pub token_hasher: TokenHasher,
    pub acl: Arc<Acl>,
    pub email: EmailClient,
    pub embeddings: EmbeddingClient,
    pub stripe: StripeClient,
    pub oauth2: OAuth2Manager,
    pub state_codec: StateCodec,
    pub upstream: portico_mcp::UpstreamClient,
}

/// Fully resolved acting identity for strict-mode endpoints.
pub struct RequestContext {
    pub user: users::Model,
    pub principal: Principal,
}

impl RequestContext {
    pub fn organization_id(&self) -> uuid::Uuid {
        self.principal.organization_id
    }

    pub fn is_admin(&self) -> bool {
        self.principal.role == OrganizationRole::Admin
    }
}

/// Bearer-only identity for lax-mode endpoints.
pub struct LaxContext {
    pub user: users::Model,
}

impl AppContext {
    /// Open the per-request transaction. All control-plane work runs at
    /// REPEATABLE READ.
    pub async fn begin(&self) -> Result<sea_orm::DatabaseTransaction, sea_orm::DbErr> {
        self.db
            .begin_with_config(Some(sea_orm::IsolationLevel::RepeatableRead), None)
            .await
    }

    /// Strict resolution: verify the JWT, require `act_as`, and confirm the
    /// membership still exists with a sufficient role. Admins may downshift
    /// to member; members may not claim admin.
    pub async fn request_context<C: ConnectionTrait>(
        &self,
        db: &C,
        headers: &HeaderMap,
    ) -> RestResult<RequestContext> {
        let claims = self.jwt.claims_from_headers(headers)?;
        let Some(act_as) = claims.act_as else {
            return Err(RestError::api(
                ErrorCode::TokenInvalid,
                "Token is missing an act_as claim",
            ));
        };

        let user = self.load_live_user(db, claims.sub).await?;

        let membership = OrganizationRepository::new(db)
            .find_membership(act_as.organization_id, user.id)
            .await?
            .ok_or_else(RestError::not_permitted)?;

        let membership_role: OrganizationRole = membership.role.into();
        if act_as.role == OrganizationRole::Admin && membership_role != OrganizationRole::Admin {
            return Err(RestError::not_permitted());
        }

        let team_ids = TeamRepository::new(db)
            .team_ids_for_user(act_as.organization_id, user.id)
            .await?;

        Ok(RequestContext {
            principal: Principal {
                user_id: user.id,
                organization_id: act_as.organization_id,
                role: act_as.role,
                team_ids,
            },
            user,
        })
    }

    /// Lax resolution: a valid bearer is enough; `act_as` is ignored.
    pub async fn lax_context<C: ConnectionTrait>(
        &self,
        db: &C,
        headers: &HeaderMap,
    ) -> RestResult<LaxContext> {
        let claims = self.jwt.claims_from_headers(headers)?;
        let user = self.load_live_user(db, claims.sub).await?;
        Ok(LaxContext { user })
    }

    async fn load_live_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: uuid::Uuid,
    ) -> RestResult<users::Model> {
        let user = UserRepository::new(db)
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| RestError::api(ErrorCode::TokenInvalid, "Unknown user"))?;
        if user.deleted_at.is_some() {
            return Err(RestError::api(
                ErrorCode::AccountDeletionInProgress,
                "Account deletion in progress",
            ));
        }
        Ok(user)
    }

    /// Issue an access token for a user. `act_as` is validated against the
    /// membership table before being embedded.
    pub async fn issue_token<C: ConnectionTrait>(
        &self,
        db: &C,
        user: &users::Model,
        act_as: Option<ActAs>,
    ) -> RestResult<String> {
        if let Some(act_as) = &act_as {
            let membership = OrganizationRepository::new(db)
                .find_membership(act_as.organization_id, user.id)
                .await?
                .ok_or_else(RestError::not_permitted)?;
            let membership_role: OrganizationRole = membership.role.into();
            if act_as.role == OrganizationRole::Admin && membership_role != OrganizationRole::Admin {
                return Err(RestError::not_permitted());
            }
        }
        Ok(self.jwt.issue(user.id, &user.email, &user.name, act_as)?)
    }
}
