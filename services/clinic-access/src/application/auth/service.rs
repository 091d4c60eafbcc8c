//! 登录服务

use std::sync::Arc;

use clinic_auth_core::{IssuedToken, SessionTokenService, verify_password, verify_unknown_user};
use tracing::{info, warn};

use crate::domain::user::{User, UserRepository};
use crate::error::{AccessError, AccessResult};

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: IssuedToken,
}

pub struct LoginService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<SessionTokenService>,
}

impl LoginService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<SessionTokenService>) -> Self {
        Self { users, tokens }
    }

    /// 校验用户名与密码并签发会话令牌
    ///
    /// 用户不存在与密码错误返回同一个错误，且都要付出一次 Argon2 校验
    pub async fn login(&self, username: &str, password: &str) -> AccessResult<LoginOutcome> {
        let Some(user) = self.users.find_by_username(username.trim()).await? else {
            verify_unknown_user(password);
            warn!(username, "Login failed: unknown user");
            return Err(AccessError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AccessError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&user.id, &user.username, user.role_id.as_str())?;

        info!(user_id = %user.id, role_id = %user.role_id, "User logged in");
        Ok(LoginOutcome { user, token })
    }

    pub fn session_ttl_secs(&self) -> i64 {
        self.tokens.ttl_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::RoleId;
    use crate::domain::user::MockUserRepository;
    use clinic_auth_core::hash_password;

    fn tokens() -> Arc<SessionTokenService> {
        Arc::new(SessionTokenService::new("login-secret", 3600, "clinic-access"))
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let user = User::new(
            "recepcion".into(),
            hash_password("correct-horse").unwrap(),
            RoleId::from("frontdesk"),
        );
        let mut users = MockUserRepository::new();
        let stored = user.clone();
        users.expect_find_by_username().returning(move |name| {
            Ok((name == stored.username).then(|| stored.clone()))
        });
        let service = LoginService::new(Arc::new(users), tokens());

        let unknown = service.login("nadie", "correct-horse").await.unwrap_err();
        let wrong = service.login("recepcion", "wrong").await.unwrap_err();
        assert!(matches!(unknown, AccessError::InvalidCredentials));
        assert!(matches!(wrong, AccessError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());

        let outcome = service.login(" recepcion ", "correct-horse").await.unwrap();
        assert_eq!(outcome.user.id, user.id);
    }
}
