//! 请求提取器

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::session::Session;

/// 当前会话
///
/// 由 `session_gate` 写入请求扩展；未经过中间件的路由视为匿名
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(
            parts.extensions.get::<Session>().cloned().unwrap_or_default(),
        ))
    }
}
