//! 路由中间件
//!
//! 每个请求解析一次会话，按路径分类决定放行或重定向：
//! - 豁免路径：不解析会话，直接放行
//! - 仅限未登录路径 + 已登录：重定向到落地页
//! - 其他路径 + 未登录：重定向到登录页
//! - 其余情况放行，会话写入请求扩展供处理器使用

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use clinic_config::{RouteConfig, path_matches};
use tracing::{debug, error};

use super::error::{ApiError, LoginRequired};
use super::state::AppState;
use crate::domain::session::Session;

/// 路由分类规则
#[derive(Debug, Clone)]
pub struct RouteRules {
    pub login_path: String,
    pub landing_path: String,
    pub public_only: Vec<String>,
    pub exempt: Vec<String>,
}

impl From<&RouteConfig> for RouteRules {
    fn from(config: &RouteConfig) -> Self {
        Self {
            login_path: config.login_path.clone(),
            landing_path: config.landing_path.clone(),
            public_only: config.public_only.clone(),
            exempt: config.exempt.clone(),
        }
    }
}

impl RouteRules {
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt.iter().any(|p| path_matches(path, p))
    }

    pub fn is_public_only(&self, path: &str) -> bool {
        self.public_only.iter().any(|p| path_matches(path, p))
    }
}

/// 路由决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Continue,
    Redirect(String),
}

/// 纯函数的路由决策
pub fn decide(path: &str, session: &Session, rules: &RouteRules) -> RouteDecision {
    if rules.is_exempt(path) {
        return RouteDecision::Continue;
    }

    let public_only = rules.is_public_only(path);
    match (public_only, session.is_authenticated()) {
        (true, true) => RouteDecision::Redirect(rules.landing_path.clone()),
        (false, false) => RouteDecision::Redirect(rules.login_path.clone()),
        _ => RouteDecision::Continue,
    }
}

/// 从 `Authorization: Bearer` 或会话 Cookie 中取令牌
pub fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}

/// 读请求用 307 保留方法；其余方法用 303，浏览器随后以 GET 访问目标页
fn redirect_for(method: &Method, to: &str) -> Response {
    if *method == Method::GET || *method == Method::HEAD {
        Redirect::temporary(to).into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

/// 会话门控中间件
pub async fn session_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    if state.routes.is_exempt(&path) {
        return next.run(request).await;
    }

    let token = extract_token(request.headers(), &state.cookie.name);
    let session = match state.resolver.resolve(token).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, path = %path, "Session resolution failed");
            return ApiError::from(e).into_response();
        }
    };

    match decide(&path, &session, &state.routes) {
        RouteDecision::Redirect(to) => {
            debug!(path = %path, to = %to, authenticated = session.is_authenticated(), "Redirecting");
            redirect_for(&method, &to)
        }
        RouteDecision::Continue => {
            request.extensions_mut().insert(session);
            let response = next.run(request).await;

            // 处理器报告未认证时同样送回登录页
            if response.extensions().get::<LoginRequired>().is_some() {
                return redirect_for(&method, &state.routes.login_path);
            }
            response
        }
    }
}
