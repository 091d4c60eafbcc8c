//! 角色与用户的 SQL
//!
//! 连接池仓储与事务仓储共用，均作用于 `&mut PgConnection`

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use clinic_common::{AuditInfo, UserId};
use clinic_errors::AppResult;
use sqlx::PgConnection;
use tracing::warn;
use uuid::Uuid;

use super::error_mapper::map_sqlx_error;
use crate::domain::permission::Permission;
use crate::domain::role::{Role, RoleId};
use crate::domain::user::User;

#[derive(sqlx::FromRow)]
pub(crate) struct RoleRow {
    id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}

impl RoleRow {
    fn into_role(self, permissions: BTreeSet<Permission>) -> Role {
        Role {
            id: RoleId(self.id),
            name: self.name,
            description: self.description,
            permissions,
            audit_info: AuditInfo {
                created_at: self.created_at,
                created_by: self.created_by.map(UserId),
                updated_at: self.updated_at,
                updated_by: self.updated_by.map(UserId),
            },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            username: row.username,
            password_hash: row.password_hash,
            role_id: RoleId(row.role_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ROLE_COLUMNS: &str =
    "id, name, description, created_at, created_by, updated_at, updated_by";

const USER_COLUMNS: &str = "id, username, password_hash, role_id, created_at, updated_at";

/// 列表按字节序排序，与内存后端一致，不受数据库 locale 影响
const ROLE_ORDER: &str = "ORDER BY name COLLATE \"C\" ASC";
const USER_ORDER: &str = "ORDER BY username COLLATE \"C\" ASC";

/// 存储中出现目录外的权限标识时跳过该行
fn collect_permissions(role_id: &str, codes: Vec<String>) -> BTreeSet<Permission> {
    codes
        .into_iter()
        .filter_map(|code| match code.parse::<Permission>() {
            Ok(p) => Some(p),
            Err(_) => {
                warn!(role_id, permission = %code, "Ignoring unknown stored permission");
                None
            }
        })
        .collect()
}

// ============ roles ============

pub(crate) async fn insert_role(conn: &mut PgConnection, role: &Role) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO roles (id, name, description, created_at, created_by, updated_at, updated_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(role.id.as_str())
    .bind(&role.name)
    .bind(&role.description)
    .bind(role.audit_info.created_at)
    .bind(role.audit_info.created_by.map(|u| u.0))
    .bind(role.audit_info.updated_at)
    .bind(role.audit_info.updated_by.map(|u| u.0))
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

pub(crate) async fn update_role(conn: &mut PgConnection, role: &Role) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE roles
        SET name = $2, description = $3, updated_at = $4, updated_by = $5
        WHERE id = $1
        "#,
    )
    .bind(role.id.as_str())
    .bind(&role.name)
    .bind(&role.description)
    .bind(role.audit_info.updated_at)
    .bind(role.audit_info.updated_by.map(|u| u.0))
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

pub(crate) async fn delete_role(conn: &mut PgConnection, id: &RoleId) -> AppResult<()> {
    sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(())
}

pub(crate) async fn find_role_by_id(
    conn: &mut PgConnection,
    id: &RoleId,
) -> AppResult<Option<Role>> {
    let sql = format!("SELECT {} FROM roles WHERE id = $1", ROLE_COLUMNS);
    let row = sqlx::query_as::<_, RoleRow>(&sql)
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match row {
        Some(r) => {
            let permissions = role_permissions(conn, &RoleId(r.id.clone())).await?;
            Ok(Some(r.into_role(permissions)))
        }
        None => Ok(None),
    }
}

pub(crate) async fn find_role_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> AppResult<Option<Role>> {
    let sql = format!("SELECT {} FROM roles WHERE name = $1", ROLE_COLUMNS);
    let row = sqlx::query_as::<_, RoleRow>(&sql)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match row {
        Some(r) => {
            let permissions = role_permissions(conn, &RoleId(r.id.clone())).await?;
            Ok(Some(r.into_role(permissions)))
        }
        None => Ok(None),
    }
}

pub(crate) async fn list_roles(conn: &mut PgConnection) -> AppResult<Vec<Role>> {
    let sql = format!("SELECT {} FROM roles {}", ROLE_COLUMNS, ROLE_ORDER);
    let rows = sqlx::query_as::<_, RoleRow>(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    let pairs: Vec<(String, String)> =
        sqlx::query_as("SELECT role_id, permission_id FROM role_permissions")
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

    let mut by_role: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (role_id, permission_id) in pairs {
        by_role.entry(role_id).or_default().push(permission_id);
    }

    Ok(rows
        .into_iter()
        .map(|r| {
            let codes = by_role.remove(&r.id).unwrap_or_default();
            let permissions = collect_permissions(&r.id, codes);
            r.into_role(permissions)
        })
        .collect())
}

// ============ role_permissions ============

pub(crate) async fn role_permissions(
    conn: &mut PgConnection,
    role_id: &RoleId,
) -> AppResult<BTreeSet<Permission>> {
    let codes: Vec<String> =
        sqlx::query_scalar("SELECT permission_id FROM role_permissions WHERE role_id = $1")
            .bind(role_id.as_str())
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

    Ok(collect_permissions(role_id.as_str(), codes))
}

pub(crate) async fn assign_permissions(
    conn: &mut PgConnection,
    role_id: &RoleId,
    permissions: &[Permission],
) -> AppResult<()> {
    if permissions.is_empty() {
        return Ok(());
    }

    let codes: Vec<&str> = permissions.iter().map(|p| p.code()).collect();
    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1::TEXT, UNNEST($2::TEXT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(role_id.as_str())
    .bind(codes)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

pub(crate) async fn clear_permissions(conn: &mut PgConnection, role_id: &RoleId) -> AppResult<()> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
        .bind(role_id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(())
}

// ============ users ============

pub(crate) async fn insert_user(conn: &mut PgConnection, user: &User) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, password_hash, role_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user.id.0)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.role_id.as_str())
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

pub(crate) async fn update_user(conn: &mut PgConnection, user: &User) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET username = $2, password_hash = $3, role_id = $4, updated_at = $5
        WHERE id = $1
        "#,
    )
    .bind(user.id.0)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.role_id.as_str())
    .bind(user.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

pub(crate) async fn delete_user(conn: &mut PgConnection, id: &UserId) -> AppResult<()> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id.0)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(())
}

pub(crate) async fn find_user_by_id(
    conn: &mut PgConnection,
    id: &UserId,
) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(row.map(User::from))
}

pub(crate) async fn find_user_by_username(
    conn: &mut PgConnection,
    username: &str,
) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(row.map(User::from))
}

pub(crate) async fn list_users(conn: &mut PgConnection) -> AppResult<Vec<User>> {
    let sql = format!("SELECT {} FROM users {}", USER_COLUMNS, USER_ORDER);
    let rows = sqlx::query_as::<_, UserRow>(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(rows.into_iter().map(User::from).collect())
}

pub(crate) async fn count_users_by_role(
    conn: &mut PgConnection,
    role_id: &RoleId,
) -> AppResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = $1")
        .bind(role_id.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)
}

pub(crate) async fn count_users(conn: &mut PgConnection) -> AppResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)
}
