//! clinic-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 外键约束阻止了写入或删除
    #[error("Referential integrity violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn foreign_key_violation(msg: impl Into<String>) -> Self {
        Self::ForeignKeyViolation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Unauthenticated(_) => 401,
            Self::Forbidden(_) => 403,
            Self::Conflict(_) => 409,
            Self::ForeignKeyViolation(_) => 409,
            Self::Internal(_) => 500,
            Self::Database(_) => 500,
        }
    }

    /// 是否为存储层故障（对当前请求致命）
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: self.problem_type(),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail: self.public_detail(),
            instance: None,
        }
    }

    fn problem_type(&self) -> String {
        let slug = match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::ForeignKeyViolation(_) => "referential-integrity",
            Self::Internal(_) => "internal",
            Self::Database(_) => "database",
        };
        format!("https://clinic.example/problems/{}", slug)
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::Unauthenticated(_) => "Unauthenticated",
            Self::Forbidden(_) => "Forbidden",
            Self::Conflict(_) => "Conflict",
            Self::ForeignKeyViolation(_) => "Referential Integrity Violation",
            Self::Internal(_) => "Internal Server Error",
            Self::Database(_) => "Database Error",
        }
    }

    /// 存储层错误细节不对外暴露
    fn public_detail(&self) -> String {
        match self {
            Self::Internal(_) | Self::Database(_) => self.problem_title().to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_string(&self.to_problem_details()).unwrap_or_default();

        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            body,
        )
            .into_response()
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::not_found("role").status_code(), 404);
        assert_eq!(AppError::forbidden("x").status_code(), 403);
        assert_eq!(AppError::unauthenticated("x").status_code(), 401);
        assert_eq!(AppError::conflict("x").status_code(), 409);
        assert_eq!(AppError::foreign_key_violation("x").status_code(), 409);
        assert_eq!(AppError::database("x").status_code(), 500);
    }

    #[test]
    fn test_database_detail_is_hidden() {
        let problem = AppError::database("password=secret host=db").to_problem_details();
        assert_eq!(problem.status, 500);
        assert!(!problem.detail.contains("secret"));
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = AppError::conflict("Role name 'Auditor' already exists").to_problem_details();
        let json = serde_json::to_value(&problem).unwrap();

        assert_eq!(json["status"], 409);
        assert_eq!(json["title"], "Conflict");
        assert!(json["type"].as_str().unwrap().ends_with("/conflict"));
        assert!(json.get("instance").is_none());
    }

    #[test]
    fn test_into_response_sets_problem_content_type() {
        let response = AppError::not_found("Role not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
