//! 密码哈希 (Argon2id)

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use clinic_errors::{AppError, AppResult};
use once_cell::sync::Lazy;

/// 用户不存在时参与校验的哈希，使其耗时与真实校验一致
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("clinic-unknown-user").ok());

/// 哈希明文密码，返回 PHC 格式字符串
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
}

/// 校验明文密码与已存储的哈希
///
/// 哈希格式损坏视为内部错误，密码不匹配返回 `Ok(false)`
pub fn verify_password(plain: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::internal(format!("Corrupted password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// 对不存在的用户做一次同等代价的 Argon2 校验，结果恒为 `false`
pub fn verify_unknown_user(plain: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
    false
}
