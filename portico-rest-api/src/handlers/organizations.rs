//! Organization, team and invitation endpoints

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Duration, Utc};
use portico_api_types::ErrorCode;
use tracing::{info, warn};
use uuid::Uuid;

use portico_rbac::{is_action_permitted, Action, Resource};
use portico_storage::entities::organization_invitations::InvitationStatus;
use portico_storage::repositories::{OrganizationRepository, TeamRepository};

use crate::context::AppContext;
use crate::errors::{RestError, RestResult};
use crate::models::organizations::{
    AcceptInvitationRequest, AddTeamMemberRequest, CreateInvitationRequest,
    CreateOrganizationRequest, CreateTeamRequest, InvitationResponse, MemberResponse,
    OrganizationResponse, TeamResponse, UpdateMemberRoleRequest,
};
use crate::services::entitlement::get_organization_entitlement;
use crate::services::orphan_reaper;

/// `POST /organizations`: lax mode; the creator becomes the first admin.
pub async fn create_organization(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<CreateOrganizationRequest>,
) -> RestResult<(StatusCode, Json<OrganizationResponse>)> {
    if request.name.trim().is_empty() {
        return Err(RestError::validation("Organization name must not be empty"));
    }

    let txn = ctx.begin().await?;
    let lax = ctx.lax_context(&txn, &headers).await?;
    let organization = OrganizationRepository::new(&txn)
        .create(request.name.trim(), lax.user.id)
        .await?;
    txn.commit().await?;

    info!(organization_id = %organization.id, "organization created");
    Ok((
        StatusCode::CREATED,
        Json(OrganizationResponse {
            id: organization.id,
            name: organization.name,
            created_at: organization.created_at,
        }),
    ))
}

/// `GET /organizations/{id}/members`
pub async fn list_members(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(organization_id): Path<Uuid>,
) -> RestResult<Json<Vec<MemberResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    let resource = Resource::Organization { id: organization_id };
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::OrganizationListMember,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    let memberships = OrganizationRepository::new(&txn)
        .list_memberships(organization_id)
        .await?;
    txn.commit().await?;

    Ok(Json(
        memberships
            .into_iter()
            .map(|membership| MemberResponse {
                user_id: membership.user_id,
                role: membership.role.into(),
                created_at: membership.created_at,
            })
            .collect(),
    ))
}

/// `DELETE /organizations/{id}/members/{user_id}`: removes the member from
/// every team first and reaps records the user can no longer reach.
pub async fn remove_member(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((organization_id, user_id)): Path<(Uuid, Uuid)>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    let resource = Resource::Organization { id: organization_id };
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::OrganizationRemoveMember,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    let teams = TeamRepository::new(&txn);
    for team_id in teams.team_ids_for_user(organization_id, user_id).await? {
        teams.remove_member(team_id, user_id).await?;
    }
    orphan_reaper::on_user_removed_from_team(&txn, user_id, organization_id).await?;

    // Last-admin invariant enforced in the repository
    OrganizationRepository::new(&txn)
        .remove_member(organization_id, user_id)
        .await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /organizations/{id}/members/{user_id}`
pub async fn update_member_role(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((organization_id, user_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateMemberRoleRequest>,
) -> RestResult<Json<MemberResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    let resource = Resource::Organization { id: organization_id };
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::OrganizationUpdateMemberRole,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    let membership = OrganizationRepository::new(&txn)
        .update_member_role(organization_id, user_id, request.role.into())
        .await?;
    txn.commit().await?;

    Ok(Json(MemberResponse {
        user_id: membership.user_id,
        role: membership.role.into(),
        created_at: membership.created_at,
    }))
}

// Teams

/// `POST /organizations/{id}/teams`
pub async fn create_team(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<CreateTeamRequest>,
) -> RestResult<(StatusCode, Json<TeamResponse>)> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if context.organization_id() != organization_id {
        return Err(RestError::not_permitted());
    }
    if !is_action_permitted(&ctx.acl, &context.principal, Action::TeamCreate, None) {
        return Err(RestError::not_permitted());
    }

    let team = TeamRepository::new(&txn)
        .create(organization_id, request.name.trim(), request.description)
        .await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse {
            id: team.id,
            organization_id: team.organization_id,
            name: team.name,
            description: team.description,
        }),
    ))
}

/// `GET /organizations/{id}/teams`
pub async fn list_teams(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(organization_id): Path<Uuid>,
) -> RestResult<Json<Vec<TeamResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if context.organization_id() != organization_id {
        return Err(RestError::not_permitted());
    }
    if !is_action_permitted(&ctx.acl, &context.principal, Action::TeamList, None) {
        return Err(RestError::not_permitted());
    }

    let teams = TeamRepository::new(&txn)
        .list_by_organization(organization_id)
        .await?;
    txn.commit().await?;

    Ok(Json(
        teams
            .into_iter()
            .map(|team| TeamResponse {
                id: team.id,
                organization_id: team.organization_id,
                name: team.name,
                description: team.description,
            })
            .collect(),
    ))
}

/// `DELETE /organizations/{id}/teams/{team_id}`: removes every member
/// first so the reaper sees the team-less world, then deletes the team.
pub async fn delete_team(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((organization_id, team_id)): Path<(Uuid, Uuid)>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let teams = TeamRepository::new(&txn);
    let team = teams.get_by_id(team_id).await?;
    if team.organization_id != organization_id {
        return Err(RestError::not_permitted());
    }
    let resource = portico_rbac::access::resource_from_team(&team);
    if !is_action_permitted(&ctx.acl, &context.principal, Action::TeamDelete, Some(&resource)) {
        return Err(RestError::not_permitted());
    }

    let members = teams.list_members(team_id).await?;
    for membership in &members {
        teams.remove_member(team_id, membership.user_id).await?;
    }
    for membership in &members {
        orphan_reaper::on_user_removed_from_team(&txn, membership.user_id, organization_id).await?;
    }

    teams.delete(team).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /organizations/{id}/teams/{team_id}/members`
pub async fn add_team_member(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((organization_id, team_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AddTeamMemberRequest>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let teams = TeamRepository::new(&txn);
    let team = teams.get_by_id(team_id).await?;
    if team.organization_id != organization_id {
        return Err(RestError::not_permitted());
    }
    let resource = portico_rbac::access::resource_from_team(&team);
    if !is_action_permitted(&ctx.acl, &context.principal, Action::TeamAddMember, Some(&resource)) {
        return Err(RestError::not_permitted());
    }

    // The user must already be a member of the team's organization
    OrganizationRepository::new(&txn)
        .find_membership(organization_id, request.user_id)
        .await?
        .ok_or_else(|| RestError::validation("User is not a member of this organization"))?;

    teams.add_member(team_id, request.user_id).await?;
    txn.commit().await?;
    Ok(StatusCode::CREATED)
}

/// `DELETE /organizations/{id}/teams/{team_id}/members/{user_id}`: the
/// reaper runs in the same transaction.
pub async fn remove_team_member(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((organization_id, team_id, user_id)): Path<(Uuid, Uuid, Uuid)>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let teams = TeamRepository::new(&txn);
    let team = teams.get_by_id(team_id).await?;
    if team.organization_id != organization_id {
        return Err(RestError::not_permitted());
    }
    let resource = portico_rbac::access::resource_from_team(&team);
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::TeamRemoveMember,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    teams.remove_member(team_id, user_id).await?;
    let plan = orphan_reaper::on_user_removed_from_team(&txn, user_id, organization_id).await?;
    if !plan.is_empty() {
        info!(%user_id, accounts = plan.connected_accounts.len(), "reaped orphan records after team removal");
    }
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

// Invitations

/// `POST /organizations/{id}/invitations`: seat entitlement is checked
/// before the invite goes out.
pub async fn create_invitation(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<CreateInvitationRequest>,
) -> RestResult<(StatusCode, Json<InvitationResponse>)> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    let resource = Resource::Organization { id: organization_id };
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::OrganizationCreateInvitation,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    let organizations = OrganizationRepository::new(&txn);
    let organization = organizations.get_by_id(organization_id).await?;

    let entitlement = get_organization_entitlement(&txn, organization_id).await?;
    let members = organizations.count_members(organization_id).await? as i32;
    if let Some(seat_count) = entitlement.seat_count {
        if members + 1 > seat_count {
            return Err(RestError::api(
                ErrorCode::RequestedSubscriptionInvalid,
                "Organization is at its seat limit",
            ));
        }
    }

    let (token, token_hash) = ctx.token_hasher.generate();
    let invitation = organizations
        .create_invitation(
            organization_id,
            request.email.trim().to_lowercase().as_str(),
            request.role.into(),
            &token_hash,
            context.user.id,
            Utc::now() + Duration::days(ctx.config.auth.invitation_days as i64),
        )
        .await?;
    txn.commit().await?;

    let accept_url = format!(
        "{}/invitations/accept?token={}",
        ctx.config.server.frontend_url, token
    );
    match ctx
        .email
        .send(portico_http::EmailClient::invitation_email(
            &invitation.email,
            &organization.name,
            &accept_url,
        ))
        .await
    {
        Ok(receipt) => {
            let txn = ctx.begin().await?;
            OrganizationRepository::new(&txn)
                .set_invitation_email_metadata(
                    invitation.id,
                    serde_json::json!({
                        "provider_message_id": receipt.provider_message_id,
                        "delivered": receipt.delivered,
                    }),
                )
                .await?;
            txn.commit().await?;
        }
        Err(err) => warn!(%err, "failed to send invitation email"),
    }

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse {
            id: invitation.id,
            email: invitation.email,
            role: invitation.role.into(),
            status: "pending".to_string(),
            expires_at: invitation.expires_at,
        }),
    ))
}

/// `GET /organizations/{id}/invitations`
pub async fn list_invitations(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(organization_id): Path<Uuid>,
) -> RestResult<Json<Vec<InvitationResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    let resource = Resource::Organization { id: organization_id };
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::OrganizationListInvitation,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    let invitations = OrganizationRepository::new(&txn)
        .list_invitations(organization_id)
        .await?;
    txn.commit().await?;

    Ok(Json(
        invitations
            .into_iter()
            .map(|invitation| InvitationResponse {
                id: invitation.id,
                email: invitation.email,
                role: invitation.role.into(),
                status: format!("{:?}", invitation.status).to_lowercase(),
                expires_at: invitation.expires_at,
            })
            .collect(),
    ))
}

/// `DELETE /organizations/{id}/invitations/{invitation_id}`
pub async fn cancel_invitation(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((organization_id, invitation_id)): Path<(Uuid, Uuid)>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    let resource = Resource::Organization { id: organization_id };
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::OrganizationCancelInvitation,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    let organizations = OrganizationRepository::new(&txn);
    let invitation = organizations
        .list_invitations(organization_id)
        .await?
        .into_iter()
        .find(|invitation| invitation.id == invitation_id)
        .ok_or_else(|| RestError::validation("Invitation not found"))?;
    organizations
        .update_invitation_status(invitation, InvitationStatus::Canceled, false)
        .await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /organizations/invitations/accept`: lax mode, the user accepts
/// with a bearer but without an act_as (they are not yet a member).
pub async fn accept_invitation(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<AcceptInvitationRequest>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let lax = ctx.lax_context(&txn, &headers).await?;

    let organizations = OrganizationRepository::new(&txn);
    let invitation = organizations
        .find_invitation_by_token_hash(&ctx.token_hasher.hash(&request.token))
        .await?
        .ok_or_else(|| RestError::validation("Invitation not found"))?;

    if invitation.status != InvitationStatus::Pending || invitation.used_at.is_some() {
        return Err(RestError::validation("Invitation is no longer valid"));
    }
    if invitation.expires_at <= Utc::now() {
        organizations
            .update_invitation_status(invitation, InvitationStatus::Expired, false)
            .await?;
        txn.commit().await?;
        return Err(RestError::validation("Invitation expired"));
    }
    if !invitation.email.eq_ignore_ascii_case(&lax.user.email) {
        return Err(RestError::not_permitted());
    }

    // Seat entitlement still applies at accept time
    let entitlement = get_organization_entitlement(&txn, invitation.organization_id).await?;
    let members = organizations.count_members(invitation.organization_id).await? as i32;
    if let Some(seat_count) = entitlement.seat_count {
        if members + 1 > seat_count {
            return Err(RestError::api(
                ErrorCode::RequestedSubscriptionInvalid,
                "Organization is at its seat limit",
            ));
        }
    }

    organizations
        .add_member(invitation.organization_id, lax.user.id, invitation.role)
        .await?;
    organizations
        .update_invitation_status(invitation, InvitationStatus::Accepted, true)
        .await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
