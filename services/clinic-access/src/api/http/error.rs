//! HTTP 错误边界

use axum::response::{IntoResponse, Response};
use clinic_errors::AppError;
use tracing::error;

use crate::error::AccessError;

/// 响应扩展标记：处理器判定需要登录，由路由中间件改写为重定向
#[derive(Debug, Clone, Copy)]
pub struct LoginRequired;

/// 处理器错误
///
/// 未认证附带 [`LoginRequired`] 标记；其余错误渲染为 Problem Details
#[derive(Debug)]
pub struct ApiError(pub AccessError);

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let login_required = matches!(self.0, AccessError::Unauthenticated);
        let app: AppError = self.0.into();

        if app.is_storage_failure() {
            error!(error = %app, "Request failed on storage");
        }

        let mut response = app.into_response();
        if login_required {
            response.extensions_mut().insert(LoginRequired);
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
