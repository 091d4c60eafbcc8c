//! 角色存储行为（内存后端）

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use clinic_access::application::role::{
    CreateRoleCommand, DeleteRoleCommand, RoleCommandHandler, RoleQueryHandler,
    UpdateRoleCommand,
};
use clinic_access::application::user::{CreateUserCommand, UserCommandHandler};
use clinic_access::domain::permission::Permission;
use clinic_access::domain::role::{
    RoleEvent, RoleId, RolePermissionRepository, RoleRepository,
};
use clinic_access::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use clinic_access::domain::user::UserRepository;
use clinic_access::error::AccessError;
use clinic_access::infrastructure::cache::{MokaCache, MokaCacheConfig, RoleListCache};
use clinic_access::infrastructure::persistence::MemoryStore;
use clinic_errors::{AppError, AppResult};
use common::RecordingSink;

fn create(name: &str, permissions: &[&str]) -> CreateRoleCommand {
    CreateRoleCommand {
        name: name.to_string(),
        description: format!("{} role", name),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        performed_by: None,
    }
}

fn update(id: &RoleId, name: &str, permissions: &[&str]) -> UpdateRoleCommand {
    UpdateRoleCommand {
        role_id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        performed_by: None,
    }
}

fn delete(id: &str) -> DeleteRoleCommand {
    DeleteRoleCommand {
        role_id: id.to_string(),
        performed_by: None,
    }
}

fn handlers(store: &MemoryStore) -> (RoleCommandHandler, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (
        RoleCommandHandler::new(Arc::new(store.clone()), sink.clone()),
        sink,
    )
}

fn queries(store: &MemoryStore) -> RoleQueryHandler {
    let cache = RoleListCache::new(
        Arc::new(MokaCache::new(MokaCacheConfig::default())),
        std::time::Duration::from_secs(60),
    );
    RoleQueryHandler::new(Arc::new(store.clone()), Arc::new(cache))
}

#[tokio::test]
async fn auditor_scenario_replaces_permissions_entirely() {
    let store = MemoryStore::new();
    let (commands, _) = handlers(&store);
    let queries = queries(&store);

    let auditor = commands
        .handle_create(create("Auditor", &["reports.view"]))
        .await
        .unwrap();
    let fetched = queries.get_role(auditor.id.as_str()).await.unwrap();
    assert_eq!(fetched.permissions, BTreeSet::from([Permission::ReportsView]));

    commands
        .handle_update(update(&auditor.id, "Auditor", &[]))
        .await
        .unwrap();
    let fetched = queries.get_role(auditor.id.as_str()).await.unwrap();
    assert!(fetched.permissions.is_empty());
}

#[tokio::test]
async fn duplicate_name_is_rejected_and_store_unchanged() {
    let store = MemoryStore::new();
    let (commands, sink) = handlers(&store);

    commands
        .handle_create(create("Auditor", &["reports.view"]))
        .await
        .unwrap();
    let before = RoleRepository::list_all(&store).await.unwrap();

    let err = commands
        .handle_create(create("Auditor", &["records.view"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::DuplicateName(name) if name == "Auditor"));

    assert_eq!(RoleRepository::list_all(&store).await.unwrap(), before);
    assert_eq!(sink.events().len(), 1);

    // 大小写敏感：不同大小写不算重复
    commands
        .handle_create(create("auditor", &[]))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_to_another_roles_name_is_duplicate() {
    let store = MemoryStore::new();
    let (commands, _) = handlers(&store);

    commands.handle_create(create("Auditor", &[])).await.unwrap();
    let billing = commands.handle_create(create("Billing", &[])).await.unwrap();

    let err = commands
        .handle_update(update(&billing.id, "Auditor", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::DuplicateName(_)));

    // 保留自身名称不算重复
    commands
        .handle_update(update(&billing.id, "Billing", &["reports.view"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_permission_is_rejected_before_any_write() {
    let store = MemoryStore::new();
    let (commands, sink) = handlers(&store);

    let err = commands
        .handle_create(create("Typo", &["reports.view", "reports.veiw"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::UnknownPermission(code) if code == "reports.veiw"));

    assert!(RoleRepository::find_by_name(&store, "Typo").await.unwrap().is_none());
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn update_and_get_of_missing_role_is_not_found() {
    let store = MemoryStore::new();
    let (commands, _) = handlers(&store);

    let err = commands
        .handle_update(update(&RoleId::from("missing"), "X", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::RoleNotFound(_)));

    let err = queries(&store).get_role("missing").await.unwrap_err();
    assert!(matches!(err, AccessError::RoleNotFound(_)));
}

#[tokio::test]
async fn delete_rules() {
    let store = MemoryStore::new();
    let (commands, sink) = handlers(&store);
    let users = UserCommandHandler::new(Arc::new(store.clone()));

    let frontdesk = commands
        .handle_create(create("Front desk", &["patients.checkin"]))
        .await
        .unwrap();
    let unused = commands.handle_create(create("Unused", &["reports.view"])).await.unwrap();

    users
        .handle_create(CreateUserCommand {
            username: "recepcion".to_string(),
            password: "recepcion-pass".to_string(),
            role_id: frontdesk.id.to_string(),
            performed_by: common::superuser_actor(),
        })
        .await
        .unwrap();

    // 被引用的角色
    let err = commands.handle_delete(delete(frontdesk.id.as_str())).await.unwrap_err();
    assert!(matches!(err, AccessError::RoleInUse(_)));
    assert!(RoleRepository::find_by_id(&store, &frontdesk.id).await.unwrap().is_some());

    // 保留角色，无论是否被引用
    let err = commands.handle_delete(delete("superuser")).await.unwrap_err();
    assert!(matches!(err, AccessError::ProtectedRole(_)));

    // 不存在
    let err = commands.handle_delete(delete("missing")).await.unwrap_err();
    assert!(matches!(err, AccessError::RoleNotFound(_)));

    // 未被引用：删除并级联清理权限关联
    commands.handle_delete(delete(unused.id.as_str())).await.unwrap();
    assert!(RoleRepository::find_by_id(&store, &unused.id).await.unwrap().is_none());
    assert!(
        store
            .get_role_permissions(&unused.id)
            .await
            .unwrap()
            .is_empty()
    );

    let last = sink.events().pop().unwrap();
    assert!(matches!(last, RoleEvent::RoleDeleted { id, .. } if id == unused.id));
}

#[tokio::test]
async fn role_list_is_sorted_and_invalidated_by_mutations() {
    let store = MemoryStore::new();
    let cache = Arc::new(RoleListCache::new(
        Arc::new(MokaCache::new(MokaCacheConfig::default())),
        std::time::Duration::from_secs(60),
    ));
    let commands = RoleCommandHandler::new(Arc::new(store.clone()), cache.clone());
    let queries = RoleQueryHandler::new(Arc::new(store.clone()), cache);

    let names = |roles: Vec<clinic_access::domain::role::Role>| {
        roles.into_iter().map(|r| r.name).collect::<Vec<_>>()
    };

    assert_eq!(names(queries.list_roles().await.unwrap()), vec!["Superuser"]);

    commands.handle_create(create("Billing", &[])).await.unwrap();
    let auditor = commands.handle_create(create("Auditor", &[])).await.unwrap();
    assert_eq!(
        names(queries.list_roles().await.unwrap()),
        vec!["Auditor", "Billing", "Superuser"]
    );

    commands.handle_delete(delete(auditor.id.as_str())).await.unwrap();
    assert_eq!(
        names(queries.list_roles().await.unwrap()),
        vec!["Billing", "Superuser"]
    );
}

// ============ 故障注入：权限写入失败时整体回滚 ============

struct FailOnAssign {
    inner: Box<dyn UnitOfWork>,
}

#[async_trait]
impl UnitOfWork for FailOnAssign {
    fn roles(&self) -> &dyn RoleRepository {
        self.inner.roles()
    }

    fn role_permissions(&self) -> &dyn RolePermissionRepository {
        self
    }

    fn users(&self) -> &dyn UserRepository {
        self.inner.users()
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        this.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        this.inner.rollback().await
    }
}

#[async_trait]
impl RolePermissionRepository for FailOnAssign {
    async fn assign_permissions(&self, _: &RoleId, _: &[Permission]) -> AppResult<()> {
        Err(AppError::database("injected failure"))
    }

    async fn get_role_permissions(&self, role_id: &RoleId) -> AppResult<BTreeSet<Permission>> {
        self.inner.role_permissions().get_role_permissions(role_id).await
    }

    async fn clear_role_permissions(&self, role_id: &RoleId) -> AppResult<()> {
        self.inner
            .role_permissions()
            .clear_role_permissions(role_id)
            .await
    }
}

struct FaultyFactory {
    store: MemoryStore,
    armed: AtomicBool,
}

#[async_trait]
impl UnitOfWorkFactory for FaultyFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let inner = self.store.begin().await?;
        if self.armed.load(Ordering::SeqCst) {
            Ok(Box::new(FailOnAssign { inner }))
        } else {
            Ok(inner)
        }
    }
}

#[tokio::test]
async fn failed_update_leaves_previous_state() {
    let store = MemoryStore::new();
    let factory = Arc::new(FaultyFactory {
        store: store.clone(),
        armed: AtomicBool::new(false),
    });
    let sink = Arc::new(RecordingSink::default());
    let commands = RoleCommandHandler::new(factory.clone(), sink.clone());

    let role = commands
        .handle_create(create("Nursing", &["records.view", "patients.checkin"]))
        .await
        .unwrap();
    let before = RoleRepository::find_by_id(&store, &role.id).await.unwrap().unwrap();

    factory.armed.store(true, Ordering::SeqCst);
    let err = commands
        .handle_update(update(&role.id, "Nursing staff", &["records.manage"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Store(AppError::Database(_))));

    let after = RoleRepository::find_by_id(&store, &role.id).await.unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.name, "Nursing");
    assert_eq!(
        after.permissions,
        BTreeSet::from([Permission::RecordsView, Permission::PatientsCheckin])
    );

    // 只有成功的创建产生了事件
    assert_eq!(sink.events().len(), 1);

    // 失败的事务释放了写锁，后续操作照常进行
    factory.armed.store(false, Ordering::SeqCst);
    commands
        .handle_update(update(&role.id, "Nursing staff", &["records.manage"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_create_leaves_no_role_row() {
    let store = MemoryStore::new();
    let factory = Arc::new(FaultyFactory {
        store: store.clone(),
        armed: AtomicBool::new(true),
    });
    let commands = RoleCommandHandler::new(factory, Arc::new(RecordingSink::default()));

    let err = commands
        .handle_create(create("Auditor", &["reports.view"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Store(_)));
    assert!(RoleRepository::find_by_name(&store, "Auditor").await.unwrap().is_none());
}
