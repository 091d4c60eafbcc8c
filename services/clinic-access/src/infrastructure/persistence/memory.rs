//! 进程内存储
//!
//! 开发与测试用后端。写事务由单一写锁串行化，在工作副本上修改，
//! 提交时整体替换已提交状态；未提交的 Unit of Work 被丢弃即回滚。
//! 唯一约束与外键行为与 PostgreSQL schema 保持一致。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use clinic_common::{AuditInfo, UserId};
use clinic_errors::{AppError, AppResult};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::permission::Permission;
use crate::domain::role::{Role, RoleId, RolePermissionRepository, RoleRepository};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::user::{User, UserRepository};

#[derive(Debug, Clone, Default)]
struct StoreState {
    roles: HashMap<RoleId, Role>,
    users: HashMap<UserId, User>,
}

impl StoreState {
    fn seeded() -> Self {
        let superuser = Role {
            id: RoleId::superuser(),
            name: "Superuser".to_string(),
            description: "Full access to every module".to_string(),
            permissions: BTreeSet::new(),
            audit_info: AuditInfo::default(),
        };

        let mut state = Self::default();
        state.roles.insert(superuser.id.clone(), superuser);
        state
    }

    fn name_taken(&self, name: &str, except: Option<&RoleId>) -> bool {
        self.roles
            .values()
            .any(|r| r.name == name && Some(&r.id) != except)
    }

    fn insert_role(&mut self, role: &Role) -> AppResult<()> {
        if self.roles.contains_key(&role.id) {
            return Err(AppError::conflict("Duplicate entry violates unique constraint roles_pkey"));
        }
        if self.name_taken(&role.name, None) {
            return Err(AppError::conflict(
                "Duplicate entry violates unique constraint roles_name_key",
            ));
        }
        // 权限关联只经由 assign_permissions 写入
        let mut stored = role.clone();
        stored.permissions.clear();
        self.roles.insert(role.id.clone(), stored);
        Ok(())
    }

    fn update_role(&mut self, role: &Role) -> AppResult<()> {
        if self.name_taken(&role.name, Some(&role.id)) {
            return Err(AppError::conflict(
                "Duplicate entry violates unique constraint roles_name_key",
            ));
        }
        if let Some(stored) = self.roles.get_mut(&role.id) {
            stored.name = role.name.clone();
            stored.description = role.description.clone();
            stored.audit_info.updated_at = role.audit_info.updated_at;
            stored.audit_info.updated_by = role.audit_info.updated_by;
        }
        Ok(())
    }

    fn delete_role(&mut self, id: &RoleId) -> AppResult<()> {
        if self.users.values().any(|u| &u.role_id == id) {
            return Err(AppError::foreign_key_violation(
                "Foreign key constraint users_role_id_fkey violated",
            ));
        }
        self.roles.remove(id);
        Ok(())
    }

    fn sorted_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    fn assign_permissions(&mut self, role_id: &RoleId, permissions: &[Permission]) -> AppResult<()> {
        let role = self.roles.get_mut(role_id).ok_or_else(|| {
            AppError::foreign_key_violation("Foreign key constraint role_permissions_role_id_fkey violated")
        })?;
        role.permissions.extend(permissions.iter().copied());
        Ok(())
    }

    fn clear_permissions(&mut self, role_id: &RoleId) {
        if let Some(role) = self.roles.get_mut(role_id) {
            role.permissions.clear();
        }
    }

    fn role_permissions(&self, role_id: &RoleId) -> BTreeSet<Permission> {
        self.roles
            .get(role_id)
            .map(|r| r.permissions.clone())
            .unwrap_or_default()
    }

    fn check_user_refs(&self, user: &User) -> AppResult<()> {
        if !self.roles.contains_key(&user.role_id) {
            return Err(AppError::foreign_key_violation(
                "Foreign key constraint users_role_id_fkey violated",
            ));
        }
        if self
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(AppError::conflict(
                "Duplicate entry violates unique constraint users_username_key",
            ));
        }
        Ok(())
    }

    fn insert_user(&mut self, user: &User) -> AppResult<()> {
        if self.users.contains_key(&user.id) {
            return Err(AppError::conflict("Duplicate entry violates unique constraint users_pkey"));
        }
        self.check_user_refs(user)?;
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn update_user(&mut self, user: &User) -> AppResult<()> {
        if !self.users.contains_key(&user.id) {
            return Ok(());
        }
        self.check_user_refs(user)?;
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users.values().find(|u| u.username == username).cloned()
    }

    fn sorted_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    fn count_by_role(&self, role_id: &RoleId) -> i64 {
        self.users.values().filter(|u| &u.role_id == role_id).count() as i64
    }
}

/// 进程内存储（同时是读仓储与 Unit of Work 工厂）
#[derive(Clone)]
pub struct MemoryStore {
    committed: Arc<RwLock<StoreState>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryStore {
    /// 创建仅包含 `superuser` 角色的存储
    pub fn new() -> Self {
        Self {
            committed: Arc::new(RwLock::new(StoreState::seeded())),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// 单语句写入：持有写锁直接修改已提交状态
    async fn write<T>(&self, f: impl FnOnce(&mut StoreState) -> AppResult<T>) -> AppResult<T> {
        let _writer = self.writer.lock().await;
        let mut state = self.committed.write().await;
        let mut draft = state.clone();
        let value = f(&mut draft)?;
        *state = draft;
        Ok(value)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let writer = self.writer.clone().lock_owned().await;
        let working = self.committed.read().await.clone();

        Ok(Box::new(MemoryUnitOfWork {
            _writer: writer,
            working: Mutex::new(working),
            committed: self.committed.clone(),
        }))
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn create(&self, role: &Role) -> AppResult<()> {
        self.write(|s| s.insert_role(role)).await
    }

    async fn update(&self, role: &Role) -> AppResult<()> {
        self.write(|s| s.update_role(role)).await
    }

    async fn delete(&self, id: &RoleId) -> AppResult<()> {
        self.write(|s| s.delete_role(id)).await
    }

    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self.committed.read().await.roles.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let state = self.committed.read().await;
        Ok(state.roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<Role>> {
        Ok(self.committed.read().await.sorted_roles())
    }
}

#[async_trait]
impl RolePermissionRepository for MemoryStore {
    async fn assign_permissions(
        &self,
        role_id: &RoleId,
        permissions: &[Permission],
    ) -> AppResult<()> {
        self.write(|s| s.assign_permissions(role_id, permissions)).await
    }

    async fn get_role_permissions(&self, role_id: &RoleId) -> AppResult<BTreeSet<Permission>> {
        Ok(self.committed.read().await.role_permissions(role_id))
    }

    async fn clear_role_permissions(&self, role_id: &RoleId) -> AppResult<()> {
        self.write(|s| {
            s.clear_permissions(role_id);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> AppResult<()> {
        self.write(|s| s.insert_user(user)).await
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        self.write(|s| s.update_user(user)).await
    }

    async fn delete(&self, id: &UserId) -> AppResult<()> {
        self.write(|s| {
            s.users.remove(id);
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self.committed.read().await.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.committed.read().await.find_user_by_username(username))
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        Ok(self.committed.read().await.sorted_users())
    }

    async fn count_by_role(&self, role_id: &RoleId) -> AppResult<i64> {
        Ok(self.committed.read().await.count_by_role(role_id))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.committed.read().await.users.len() as i64)
    }
}

/// 进程内 Unit of Work
///
/// 持有写锁直到提交或被丢弃
pub struct MemoryUnitOfWork {
    _writer: OwnedMutexGuard<()>,
    working: Mutex<StoreState>,
    committed: Arc<RwLock<StoreState>>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn roles(&self) -> &dyn RoleRepository {
        self
    }

    fn role_permissions(&self) -> &dyn RolePermissionRepository {
        self
    }

    fn users(&self) -> &dyn UserRepository {
        self
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        let working = this.working.into_inner();
        *this.committed.write().await = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for MemoryUnitOfWork {
    async fn create(&self, role: &Role) -> AppResult<()> {
        self.working.lock().await.insert_role(role)
    }

    async fn update(&self, role: &Role) -> AppResult<()> {
        self.working.lock().await.update_role(role)
    }

    async fn delete(&self, id: &RoleId) -> AppResult<()> {
        self.working.lock().await.delete_role(id)
    }

    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        Ok(self.working.lock().await.roles.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let state = self.working.lock().await;
        Ok(state.roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<Role>> {
        Ok(self.working.lock().await.sorted_roles())
    }
}

#[async_trait]
impl RolePermissionRepository for MemoryUnitOfWork {
    async fn assign_permissions(
        &self,
        role_id: &RoleId,
        permissions: &[Permission],
    ) -> AppResult<()> {
        self.working.lock().await.assign_permissions(role_id, permissions)
    }

    async fn get_role_permissions(&self, role_id: &RoleId) -> AppResult<BTreeSet<Permission>> {
        Ok(self.working.lock().await.role_permissions(role_id))
    }

    async fn clear_role_permissions(&self, role_id: &RoleId) -> AppResult<()> {
        self.working.lock().await.clear_permissions(role_id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUnitOfWork {
    async fn create(&self, user: &User) -> AppResult<()> {
        self.working.lock().await.insert_user(user)
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        self.working.lock().await.update_user(user)
    }

    async fn delete(&self, id: &UserId) -> AppResult<()> {
        self.working.lock().await.users.remove(id);
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self.working.lock().await.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.working.lock().await.find_user_by_username(username))
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        Ok(self.working.lock().await.sorted_users())
    }

    async fn count_by_role(&self, role_id: &RoleId) -> AppResult<i64> {
        Ok(self.working.lock().await.count_by_role(role_id))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.working.lock().await.users.len() as i64)
    }
}
