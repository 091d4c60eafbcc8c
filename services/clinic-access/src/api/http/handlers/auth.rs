//! 登录、登出与落地页

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};

use crate::api::http::dto::{DashboardResponse, LoginForm, LoginRequest, LoginResponse, PermissionView};
use crate::api::http::error::ApiResult;
use crate::api::http::extract::CurrentSession;
use crate::api::http::state::AppState;
use crate::error::AccessError;

pub async fn login_form(State(state): State<AppState>) -> Json<LoginForm> {
    Json(LoginForm {
        action: state.routes.login_path.clone(),
        method: "POST",
        fields: ["username", "password"],
    })
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    let outcome = state.login.login(&req.username, &req.password).await?;
    let cookie = state.cookie.session_cookie(&outcome.token.token);

    let body = LoginResponse {
        user_id: outcome.user.id.to_string(),
        username: outcome.user.username,
        role_id: outcome.user.role_id.0,
        expires_at: outcome.token.expires_at,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// 清除会话 Cookie 并回到登录页
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.cookie.expired_cookie())],
        Redirect::to(&state.routes.login_path),
    )
        .into_response()
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResult<Json<DashboardResponse>> {
    let user = session.user().cloned().ok_or(AccessError::Unauthenticated)?;
    let permissions = state.guard.effective_permissions(&user).await?;

    Ok(Json(DashboardResponse {
        user,
        permissions: permissions.into_iter().map(PermissionView::from).collect(),
    }))
}
