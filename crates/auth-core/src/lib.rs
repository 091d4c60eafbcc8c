//! clinic-auth-core - 认证核心库
//!
//! 会话令牌签发/校验与密码哈希

mod password;

pub use password::{hash_password, verify_password, verify_unknown_user};

use chrono::{DateTime, Duration, Utc};
use clinic_common::UserId;
use clinic_errors::{AppError, AppResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 会话令牌 Claims
///
/// `role` 是登录时的角色快照，服务端每次请求仍会重新读取用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub role: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// JWT ID
    pub jti: String,
    /// Issuer
    pub iss: String,
}

impl SessionClaims {
    pub fn user_id(&self) -> AppResult<UserId> {
        UserId::parse(&self.sub)
            .map_err(|_| AppError::unauthenticated("Invalid user ID in session token"))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// 已签发的令牌
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// 会话令牌服务
#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
    issuer: String,
}

impl SessionTokenService {
    pub fn new(secret: &str, ttl_secs: i64, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            issuer: issuer.into(),
        }
    }

    /// 登录成功后签发会话令牌
    pub fn issue(&self, user_id: &UserId, username: &str, role: &str) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.ttl_secs);
        let claims = SessionClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// 校验令牌签名、签发者与过期时间
    pub fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::unauthenticated(format!("Invalid session token: {}", e)))?
            .claims;

        if claims.jti.is_empty() {
            return Err(AppError::unauthenticated("Session token ID (jti) missing"));
        }

        Ok(claims)
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, ttl: i64) -> SessionTokenService {
        SessionTokenService::new(secret, ttl, "clinic-access")
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("test_secret", 3600);
        let user_id = UserId::new();

        let issued = tokens.issue(&user_id, "recepcion", "frontdesk").unwrap();
        let claims = tokens.verify(&issued.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.username, "recepcion");
        assert_eq!(claims.role, "frontdesk");
        assert_eq!(claims.expires_at().unwrap().timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service("test_secret", -3600);
        let issued = tokens.issue(&UserId::new(), "u", "r").unwrap();

        let err = tokens.verify(&issued.token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issued = service("wrong_secret", 3600)
            .issue(&UserId::new(), "u", "r")
            .unwrap();

        assert!(service("correct_secret", 3600).verify(&issued.token).is_err());
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let other = SessionTokenService::new("test_secret", 3600, "someone-else");
        let issued = other.issue(&UserId::new(), "u", "r").unwrap();

        assert!(service("test_secret", 3600).verify(&issued.token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(service("s", 3600).verify("not.a.jwt").is_err());
        assert!(service("s", 3600).verify("").is_err());
    }
}
