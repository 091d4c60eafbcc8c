//! 用户管理（需要 `users.manage`）

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::http::dto::{AssignRoleRequest, CreateUserRequest, UserResponse};
use crate::api::http::error::ApiResult;
use crate::api::http::extract::CurrentSession;
use crate::api::http::state::AppState;
use crate::application::user::{AssignRoleCommand, CreateUserCommand, DeleteUserCommand};
use crate::domain::permission::Permission;

pub async fn list_users(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Json<Vec<UserResponse>>> {
    state.guard.authorize(&session, Permission::UsersManage).await?;
    let users = state.user_queries.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let actor = state.guard.authorize(&session, Permission::UsersManage).await?;
    let user = state
        .user_commands
        .handle_create(CreateUserCommand {
            username: req.username,
            password: req.password,
            role_id: req.role_id,
            performed_by: actor,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn assign_role(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let actor = state.guard.authorize(&session, Permission::UsersManage).await?;
    let user = state
        .user_commands
        .handle_assign_role(AssignRoleCommand {
            user_id: id,
            role_id: req.role_id,
            performed_by: actor,
        })
        .await?;
    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let actor = state.guard.authorize(&session, Permission::UsersManage).await?;
    state
        .user_commands
        .handle_delete(DeleteUserCommand {
            user_id: id,
            performed_by: actor,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
