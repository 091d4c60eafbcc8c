//! HTTP 接口

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod route_gate;
pub mod state;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use handlers::{auth, roles, system, users};
pub use route_gate::{RouteDecision, RouteRules, decide, session_gate};
pub use state::{AppState, CookieSettings};

/// 构建完整路由
///
/// 门控中间件覆盖全部路由与 fallback，豁免路径在中间件内部直接放行
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/dashboard", get(auth::dashboard))
        .route("/api/permissions", get(roles::list_permissions))
        .route("/api/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/api/roles/{id}",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{id}", delete(users::delete_user))
        .route("/api/users/{id}/role", put(users::assign_role))
        .fallback(system::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
