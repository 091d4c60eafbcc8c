//! 授权守卫与会话解析（内存后端）

use std::collections::BTreeSet;
use std::sync::Arc;

use clinic_access::application::authorization::AuthorizationGuard;
use clinic_access::application::session::SessionResolver;
use clinic_access::domain::permission::Permission;
use clinic_access::domain::role::{Role, RoleId, RolePermissionRepository, RoleRepository};
use clinic_access::domain::session::{Session, SessionUser};
use clinic_access::domain::user::{User, UserRepository};
use clinic_access::error::AccessError;
use clinic_access::infrastructure::persistence::MemoryStore;
use clinic_auth_core::SessionTokenService;
use clinic_common::UserId;

fn session_for(role_id: RoleId) -> Session {
    Session::Authenticated(SessionUser {
        user_id: UserId::new(),
        username: "someone".to_string(),
        role_id,
    })
}

#[tokio::test]
async fn superuser_holds_every_permission_without_rows() {
    let store = MemoryStore::new();
    assert!(
        store
            .get_role_permissions(&RoleId::superuser())
            .await
            .unwrap()
            .is_empty()
    );

    let guard = AuthorizationGuard::new(Arc::new(store));
    let session = session_for(RoleId::superuser());
    for permission in Permission::ALL {
        guard.authorize(&session, permission).await.unwrap();
    }
}

#[tokio::test]
async fn anonymous_and_missing_permission_fail_differently() {
    let store = MemoryStore::new();
    let role = Role::new(
        "Front desk".to_string(),
        String::new(),
        BTreeSet::from([Permission::PatientsCheckin]),
        None,
    );
    RoleRepository::create(&store, &role).await.unwrap();
    store
        .assign_permissions(&role.id, &[Permission::PatientsCheckin])
        .await
        .unwrap();

    let guard = AuthorizationGuard::new(Arc::new(store));

    let err = guard
        .authorize(&Session::Anonymous, Permission::PatientsCheckin)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Unauthenticated));

    let session = session_for(role.id.clone());
    let user = guard
        .authorize(&session, Permission::PatientsCheckin)
        .await
        .unwrap();
    assert_eq!(user.role_id, role.id);

    let err = guard
        .authorize(&session, Permission::RecordsView)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Forbidden { permission } if permission == Permission::RecordsView));
}

#[tokio::test]
async fn resolved_session_follows_current_role_assignment() {
    let store = MemoryStore::new();
    let tokens = Arc::new(SessionTokenService::new("resolver-secret", 3600, "clinic-access"));
    let resolver = SessionResolver::new(tokens.clone(), Arc::new(store.clone()));

    let role = Role::new("Billing".to_string(), String::new(), BTreeSet::new(), None);
    RoleRepository::create(&store, &role).await.unwrap();

    let mut user = User::new("caja".to_string(), "hash".to_string(), RoleId::superuser());
    UserRepository::create(&store, &user).await.unwrap();
    let token = tokens.issue(&user.id, &user.username, user.role_id.as_str()).unwrap().token;

    let session = resolver.resolve(Some(&token)).await.unwrap();
    assert_eq!(session.user().unwrap().role_id, RoleId::superuser());

    user.assign_role(role.id.clone());
    UserRepository::update(&store, &user).await.unwrap();
    let session = resolver.resolve(Some(&token)).await.unwrap();
    assert_eq!(session.user().unwrap().role_id, role.id);

    UserRepository::delete(&store, &user.id).await.unwrap();
    let session = resolver.resolve(Some(&token)).await.unwrap();
    assert_eq!(session, Session::Anonymous);

    assert_eq!(resolver.resolve(None).await.unwrap(), Session::Anonymous);
}
