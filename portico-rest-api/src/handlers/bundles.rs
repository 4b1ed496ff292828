//! Bundle endpoints

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::info;
use uuid::Uuid;

use portico_rbac::access::{resource_from_bundle, resource_from_configuration};
use portico_rbac::{is_action_permitted, Action};
use portico_storage::entities::mcp_server_bundles;
use portico_storage::repositories::{BundleRepository, ConfigurationRepository};

use crate::context::AppContext;
use crate::errors::{RestError, RestResult};
use crate::models::bundles::{BundleResponse, CreateBundleRequest};

fn bundle_response(bundle: mcp_server_bundles::Model) -> BundleResponse {
    BundleResponse {
        id: bundle.id,
        organization_id: bundle.organization_id,
        user_id: bundle.user_id,
        name: bundle.name.clone(),
        description: bundle.description.clone(),
        bundle_key: bundle.bundle_key.clone(),
        mcp_server_configuration_ids: bundle.configuration_ids(),
        created_at: bundle.created_at,
    }
}

/// `POST /mcp-server-bundles`: the caller must hold bundle access to every
/// configuration in the list.
pub async fn create_bundle(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<CreateBundleRequest>,
) -> RestResult<(StatusCode, Json<BundleResponse>)> {
    if request.mcp_server_configuration_ids.is_empty() {
        return Err(RestError::validation("A bundle needs at least one configuration"));
    }

    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !is_action_permitted(&ctx.acl, &context.principal, Action::BundleCreate, None) {
        return Err(RestError::not_permitted());
    }

    let configurations = ConfigurationRepository::new(&txn);
    for configuration_id in &request.mcp_server_configuration_ids {
        let configuration = configurations.get_by_id(*configuration_id).await?;
        let resource = resource_from_configuration(&configuration);
        if !is_action_permitted(
            &ctx.acl,
            &context.principal,
            Action::ConfigurationCreateBundleOn,
            Some(&resource),
        ) {
            return Err(RestError::not_permitted());
        }
    }

    let bundle = BundleRepository::new(&txn)
        .create(
            context.organization_id(),
            context.user.id,
            request.name.trim(),
            request.description,
            request.mcp_server_configuration_ids,
        )
        .await?;
    txn.commit().await?;

    info!(bundle_id = %bundle.id, "bundle created");
    Ok((StatusCode::CREATED, Json(bundle_response(bundle))))
}

/// `GET /mcp-server-bundles`: admins see the org's bundles, members their
/// own.
pub async fn list_bundles(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> RestResult<Json<Vec<BundleResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !is_action_permitted(&ctx.acl, &context.principal, Action::BundleList, None) {
        return Err(RestError::not_permitted());
    }

    let bundles = BundleRepository::new(&txn);
    let rows = if context.is_admin() {
        bundles.list_by_organization(context.organization_id()).await?
    } else {
        bundles
            .list_by_user(context.organization_id(), context.user.id)
            .await?
    };
    txn.commit().await?;
    Ok(Json(rows.into_iter().map(bundle_response).collect()))
}

/// `GET /mcp-server-bundles/{id}`
pub async fn get_bundle(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(bundle_id): Path<Uuid>,
) -> RestResult<Json<BundleResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let bundle = BundleRepository::new(&txn).get_by_id(bundle_id).await?;
    let resource = resource_from_bundle(&bundle);
    if !is_action_permitted(&ctx.acl, &context.principal, Action::BundleRead, Some(&resource)) {
        return Err(RestError::not_permitted());
    }
    txn.commit().await?;
    Ok(Json(bundle_response(bundle)))
}

/// `DELETE /mcp-server-bundles/{id}`
pub async fn delete_bundle(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(bundle_id): Path<Uuid>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let bundles = BundleRepository::new(&txn);
    let bundle = bundles.get_by_id(bundle_id).await?;
    let resource = resource_from_bundle(&bundle);
    if !is_action_permitted(&ctx.acl, &context.principal, Action::BundleDelete, Some(&resource)) {
        return Err(RestError::not_permitted());
    }

    bundles.delete(bundle).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
