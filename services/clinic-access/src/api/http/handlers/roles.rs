//! 权限目录与角色管理（需要 `roles.manage`）

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::http::dto::{PermissionView, RoleRequest, RoleResponse};
use crate::api::http::error::ApiResult;
use crate::api::http::extract::CurrentSession;
use crate::api::http::state::AppState;
use crate::application::role::{CreateRoleCommand, DeleteRoleCommand, UpdateRoleCommand};
use crate::domain::permission::Permission;

pub async fn list_permissions(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Json<Vec<PermissionView>>> {
    state.guard.authorize(&session, Permission::RolesManage).await?;
    Ok(Json(Permission::ALL.into_iter().map(PermissionView::from).collect()))
}

pub async fn list_roles(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    state.guard.authorize(&session, Permission::RolesManage).await?;
    let roles = state.role_queries.list_roles().await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

pub async fn get_role(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    state.guard.authorize(&session, Permission::RolesManage).await?;
    let role = state.role_queries.get_role(&id).await?;
    Ok(Json(role.into()))
}

pub async fn create_role(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<RoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let actor = state.guard.authorize(&session, Permission::RolesManage).await?;
    let role = state
        .role_commands
        .handle_create(CreateRoleCommand {
            name: req.name,
            description: req.description,
            permissions: req.permissions,
            performed_by: Some(actor.user_id),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

pub async fn update_role(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(req): Json<RoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let actor = state.guard.authorize(&session, Permission::RolesManage).await?;
    let role = state
        .role_commands
        .handle_update(UpdateRoleCommand {
            role_id: id,
            name: req.name,
            description: req.description,
            permissions: req.permissions,
            performed_by: Some(actor.user_id),
        })
        .await?;
    Ok(Json(role.into()))
}

pub async fn delete_role(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let actor = state.guard.authorize(&session, Permission::RolesManage).await?;
    state
        .role_commands
        .handle_delete(DeleteRoleCommand {
            role_id: id,
            performed_by: Some(actor.user_id),
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
