use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use corventa_core::{AppError, AppResult, ClientId, RoleId, UserId};
use corventa_domain::{
    Access, AccessLevel, AccessMap, ClientConfig, ClientInfoConfig, CollisionPolicy,
    ColumnPermissions, Constraints, ElementId, ElementKind, ElementPermissions, GenericPermissions,
    MenuId, MenuInfo, MenuTreeId, OrgPermissions, PERMISSION_BETA_FUNCTIONS,
    PERMISSION_SHOW_ACCOUNTING, RecordPermissions, Role, TableId, TablePermissions,
};

use crate::role_permissions::{IncludesList, RolePermissionsInclude};
use crate::role_permissions_ports::{ClientRepository, PermissionsRepository, RoleRepository};

use super::{RolePermissions, RolePermissionsService};

const ROLE_ID: RoleId = RoleId::new(1000000);
const USER_ID: UserId = UserId::new(2009);
const CLIENT_ID: ClientId = ClientId::new(1000000);

#[derive(Default)]
struct FakeRoleRepository {
    roles: HashMap<RoleId, Role>,
    lookups: Mutex<usize>,
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        *self.lookups.lock().await += 1;
        Ok(self.roles.get(&role_id).cloned())
    }
}

#[derive(Default)]
struct FakeClientRepository {
    clients: HashMap<ClientId, ClientConfig>,
    client_infos: HashMap<ClientId, ClientInfoConfig>,
}

#[async_trait]
impl ClientRepository for FakeClientRepository {
    async fn find_client(&self, client_id: ClientId) -> AppResult<Option<ClientConfig>> {
        Ok(self.clients.get(&client_id).cloned())
    }

    async fn find_client_info(&self, client_id: ClientId) -> AppResult<Option<ClientInfoConfig>> {
        Ok(self.client_infos.get(&client_id).copied())
    }
}

#[derive(Default)]
struct FakePermissionsRepository {
    org: OrgPermissions,
    table: TablePermissions,
    column: ColumnPermissions,
    record: RecordPermissions,
    elements: HashMap<ElementKind, ElementPermissions>,
    lookups: Mutex<usize>,
}

#[async_trait]
impl PermissionsRepository for FakePermissionsRepository {
    async fn org_permissions(&self, _role: &Role, _user_id: UserId) -> AppResult<OrgPermissions> {
        *self.lookups.lock().await += 1;
        Ok(self.org.clone())
    }

    async fn table_permissions(&self, _role_id: RoleId) -> AppResult<TablePermissions> {
        *self.lookups.lock().await += 1;
        Ok(self.table.clone())
    }

    async fn column_permissions(&self, _role_id: RoleId) -> AppResult<ColumnPermissions> {
        *self.lookups.lock().await += 1;
        Ok(self.column.clone())
    }

    async fn record_permissions(&self, _role_id: RoleId) -> AppResult<RecordPermissions> {
        *self.lookups.lock().await += 1;
        Ok(self.record.clone())
    }

    async fn element_permissions(
        &self,
        _role_id: RoleId,
        _client_id: ClientId,
        kind: ElementKind,
    ) -> AppResult<ElementPermissions> {
        *self.lookups.lock().await += 1;
        Ok(self.elements.get(&kind).cloned().unwrap_or_default())
    }
}

struct Fixture {
    service: RolePermissionsService,
    roles: Arc<FakeRoleRepository>,
    permissions: Arc<FakePermissionsRepository>,
}

fn fixture(
    role: Role,
    client: ClientConfig,
    client_info: ClientInfoConfig,
    permissions: FakePermissionsRepository,
    accounting_module_active: bool,
) -> Fixture {
    let roles = Arc::new(FakeRoleRepository {
        roles: HashMap::from([(role.role_id(), role)]),
        lookups: Mutex::new(0),
    });
    let clients = Arc::new(FakeClientRepository {
        clients: HashMap::from([(client.client_id(), client)]),
        client_infos: HashMap::from([(client_info.client_id(), client_info)]),
    });
    let permissions = Arc::new(permissions);
    let service = RolePermissionsService::new(
        roles.clone(),
        clients,
        permissions.clone(),
        accounting_module_active,
    );

    Fixture {
        service,
        roles,
        permissions,
    }
}

fn default_fixture() -> Fixture {
    fixture(
        role(),
        client(false),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository::default(),
        true,
    )
}

fn role() -> Role {
    role_with_menu(None, None)
}

fn role_with_menu(menu_tree_id: Option<MenuTreeId>, root_menu_id: Option<MenuId>) -> Role {
    role_with_permissions(GenericPermissions::empty(), menu_tree_id, root_menu_id)
}

fn role_with_permissions(
    permissions: GenericPermissions,
    menu_tree_id: Option<MenuTreeId>,
    root_menu_id: Option<MenuId>,
) -> Role {
    Role::new(
        ROLE_ID,
        "Sales Manager",
        CLIENT_ID,
        AccessLevel::ClientPlusOrganization,
        permissions,
        Constraints::none(),
        menu_tree_id,
        root_menu_id,
    )
    .unwrap_or_else(|_| unreachable!())
}

fn client(use_beta_functions: bool) -> ClientConfig {
    ClientConfig::new(CLIENT_ID, "Corventa AG", use_beta_functions)
        .unwrap_or_else(|_| unreachable!())
}

fn table_permissions(entries: &[(u32, Access)]) -> TablePermissions {
    let mut builder = AccessMap::builder();
    for (id, access) in entries {
        builder.grant(TableId::new(*id), *access);
    }
    builder.build()
}

fn element_permissions(entries: &[(u32, Access)]) -> ElementPermissions {
    let mut builder = AccessMap::builder();
    for (id, access) in entries {
        builder.grant(ElementId::new(*id), *access);
    }
    builder.build()
}

fn included_set(
    role_id: u32,
    table: TablePermissions,
    window: ElementPermissions,
) -> Arc<RolePermissions> {
    included_set_with_includes(role_id, table, window, IncludesList::empty())
}

fn included_set_with_includes(
    role_id: u32,
    table: TablePermissions,
    window: ElementPermissions,
    included: IncludesList,
) -> Arc<RolePermissions> {
    Arc::new(RolePermissions {
        name: format!("Included {role_id}"),
        role_id: RoleId::new(role_id),
        user_id: USER_ID,
        client_id: CLIENT_ID,
        user_level: AccessLevel::ClientOnly,
        org_permissions: OrgPermissions::empty(),
        table_permissions: table,
        column_permissions: ColumnPermissions::empty(),
        record_permissions: RecordPermissions::empty(),
        window_permissions: window,
        process_permissions: ElementPermissions::empty(),
        task_permissions: ElementPermissions::empty(),
        workflow_permissions: ElementPermissions::empty(),
        form_permissions: ElementPermissions::empty(),
        misc_permissions: GenericPermissions::empty(),
        constraints: Constraints::none(),
        menu_info: MenuInfo::of(MenuTreeId::new(10), None),
        included,
    })
}

#[tokio::test]
async fn zero_includes_keeps_stored_defaults() {
    let stored = table_permissions(&[(100, Access::ReadOnly), (101, Access::ReadWrite)]);
    let fixture = fixture(
        role(),
        client(false),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository {
            table: stored.clone(),
            ..Default::default()
        },
        true,
    );

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;
    assert!(resolved.is_ok());

    let resolved = resolved.unwrap_or_else(|_| unreachable!());
    assert_eq!(resolved.table_permissions(), &stored);
    assert_eq!(resolved.name(), "Sales Manager");
    assert_eq!(resolved.user_level(), AccessLevel::ClientPlusOrganization);
    assert!(resolved.included().is_empty());
}

#[tokio::test]
async fn build_without_role_id_fails_before_any_lookup() {
    let fixture = default_fixture();

    let result = fixture.service.builder().user_id(USER_ID).build().await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
    assert_eq!(*fixture.roles.lookups.lock().await, 0);
    assert_eq!(*fixture.permissions.lookups.lock().await, 0);
}

#[tokio::test]
async fn build_without_user_id_fails() {
    let fixture = default_fixture();

    let result = fixture.service.builder().role_id(ROLE_ID).build().await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn missing_role_record_is_fatal() {
    let fixture = default_fixture();

    let result = fixture
        .service
        .resolve(RoleId::new(999), USER_ID, CLIENT_ID)
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn client_id_falls_back_to_role_client() {
    let fixture = default_fixture();

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .build()
        .await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.client_id()).ok(),
        Some(CLIENT_ID)
    );
}

#[tokio::test]
async fn role_lookup_happens_once_per_build() {
    let fixture = default_fixture();

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;
    assert!(resolved.is_ok());

    assert_eq!(*fixture.roles.lookups.lock().await, 1);
}

#[tokio::test]
async fn explicit_dimension_skips_stored_default() {
    let stored = table_permissions(&[(100, Access::ReadOnly)]);
    let explicit = table_permissions(&[(200, Access::ReadWrite)]);
    let fixture = fixture(
        role(),
        client(false),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository {
            table: stored,
            ..Default::default()
        },
        true,
    );

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .table_permissions(explicit.clone())
        .build()
        .await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.table_permissions().clone()).ok(),
        Some(explicit)
    );
}

#[tokio::test]
async fn role_menu_tree_wins() {
    let fixture = fixture(
        role_with_menu(Some(MenuTreeId::new(5)), Some(MenuId::new(50))),
        client(false),
        ClientInfoConfig::new(CLIENT_ID, Some(MenuTreeId::new(7))),
        FakePermissionsRepository::default(),
        true,
    );

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.menu_info()).ok(),
        Some(MenuInfo::of(MenuTreeId::new(5), Some(MenuId::new(50))))
    );
}

#[tokio::test]
async fn client_menu_tree_applies_when_role_has_none() {
    let fixture = fixture(
        role_with_menu(None, Some(MenuId::new(50))),
        client(false),
        ClientInfoConfig::new(CLIENT_ID, Some(MenuTreeId::new(7))),
        FakePermissionsRepository::default(),
        true,
    );

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.menu_info()).ok(),
        Some(MenuInfo::of(MenuTreeId::new(7), Some(MenuId::new(50))))
    );
}

#[tokio::test]
async fn menu_falls_back_to_default_tree() {
    let fixture = default_fixture();

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.menu_info()).ok(),
        Some(MenuInfo::of(MenuTreeId::new(10), None))
    );
}

#[tokio::test]
async fn explicit_menu_info_is_kept() {
    let fixture = default_fixture();

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .menu_info(MenuInfo::of(MenuTreeId::new(42), Some(MenuId::new(1))))
        .build()
        .await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.menu_info()).ok(),
        Some(MenuInfo::of(MenuTreeId::new(42), Some(MenuId::new(1))))
    );
}

#[tokio::test]
async fn beta_flag_is_forced_on_when_client_enables_beta() {
    let fixture = fixture(
        role(),
        client(true),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository::default(),
        true,
    );

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.has_permission(PERMISSION_BETA_FUNCTIONS)).ok(),
        Some(true)
    );
}

#[tokio::test]
async fn show_accounting_is_removed_when_module_inactive() {
    let mut base_permissions = GenericPermissions::builder();
    base_permissions.add_permission(PERMISSION_SHOW_ACCOUNTING, CollisionPolicy::Merge);
    let role = role_with_permissions(base_permissions.build(), None, None);

    let fixture = fixture(
        role,
        client(false),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository::default(),
        false,
    );

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.has_permission(PERMISSION_SHOW_ACCOUNTING)).ok(),
        Some(false)
    );
}

#[tokio::test]
async fn show_accounting_survives_when_module_active() {
    let mut base_permissions = GenericPermissions::builder();
    base_permissions.add_permission(PERMISSION_SHOW_ACCOUNTING, CollisionPolicy::Merge);
    let role = role_with_permissions(base_permissions.build(), None, None);

    let fixture = fixture(
        role,
        client(false),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository::default(),
        true,
    );

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.has_permission(PERMISSION_SHOW_ACCOUNTING)).ok(),
        Some(true)
    );
}

#[tokio::test]
async fn constraints_are_taken_verbatim_from_role() {
    let rules = std::collections::BTreeMap::from([(
        "max_login_days".to_owned(),
        serde_json::json!({"days": 90}),
    )]);
    let role = Role::new(
        ROLE_ID,
        "Sales Manager",
        CLIENT_ID,
        AccessLevel::ClientPlusOrganization,
        GenericPermissions::empty(),
        Constraints::new(rules.clone()),
        None,
        None,
    )
    .unwrap_or_else(|_| unreachable!());
    let fixture = fixture(
        role,
        client(false),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository::default(),
        true,
    );

    let resolved = fixture.service.resolve(ROLE_ID, USER_ID, CLIENT_ID).await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved.map(|resolved| resolved.constraints().clone()).ok(),
        Some(Constraints::new(rules))
    );
}

#[tokio::test]
async fn misc_permissions_cannot_be_configured_twice() {
    let fixture = default_fixture();

    let result = fixture
        .service
        .builder()
        .misc_permissions(GenericPermissions::empty())
        .and_then(|builder| builder.misc_permissions(GenericPermissions::empty()));

    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn constraints_cannot_be_configured_twice() {
    let fixture = default_fixture();

    let result = fixture
        .service
        .builder()
        .constraints(Constraints::none())
        .and_then(|builder| builder.constraints(Constraints::none()));

    assert!(matches!(result, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn equal_sequence_numbers_override_conflicting_keys() {
    let fixture = default_fixture();
    let first = included_set(
        7001,
        table_permissions(&[(200, Access::ReadOnly)]),
        ElementPermissions::empty(),
    );
    let second = included_set(
        7002,
        table_permissions(&[(200, Access::ReadWrite)]),
        ElementPermissions::empty(),
    );

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .include_permissions(first, 10)
        .include_permissions(second, 10)
        .build()
        .await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved
            .map(|resolved| resolved.table_permissions().get(&TableId::new(200)))
            .ok()
            .flatten(),
        Some(Access::ReadWrite)
    );
}

#[tokio::test]
async fn differing_sequence_numbers_merge_restrictively() {
    let fixture = default_fixture();
    let first = included_set(
        7001,
        table_permissions(&[(200, Access::ReadOnly)]),
        ElementPermissions::empty(),
    );
    let second = included_set(
        7002,
        table_permissions(&[(200, Access::ReadWrite)]),
        ElementPermissions::empty(),
    );

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .include_permissions(first, 10)
        .include_permissions(second, 20)
        .build()
        .await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved
            .map(|resolved| resolved.table_permissions().get(&TableId::new(200)))
            .ok()
            .flatten(),
        Some(Access::ReadOnly)
    );
}

#[tokio::test]
async fn negative_sequence_numbers_never_override() {
    let fixture = default_fixture();
    let first = included_set(
        7001,
        table_permissions(&[(200, Access::ReadOnly)]),
        ElementPermissions::empty(),
    );
    let second = included_set(
        7002,
        table_permissions(&[(200, Access::ReadWrite)]),
        ElementPermissions::empty(),
    );

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .include_permissions(first, -1)
        .include_permissions(second, -1)
        .build()
        .await;

    assert!(resolved.is_ok());
    assert_eq!(
        resolved
            .map(|resolved| resolved.table_permissions().get(&TableId::new(200)))
            .ok()
            .flatten(),
        Some(Access::ReadOnly)
    );
}

#[tokio::test]
async fn include_keeps_restrictive_base_value_and_inserts_new_keys() {
    let fixture = fixture(
        role(),
        client(false),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository {
            table: table_permissions(&[(1, Access::ReadOnly)]),
            ..Default::default()
        },
        true,
    );
    let include = included_set(
        7001,
        table_permissions(&[(1, Access::ReadWrite), (2, Access::ReadOnly)]),
        ElementPermissions::empty(),
    );

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .include_permissions(include, 1)
        .build()
        .await;

    assert!(resolved.is_ok());
    let resolved = resolved.unwrap_or_else(|_| unreachable!());
    assert_eq!(
        resolved.table_permissions().get(&TableId::new(1)),
        Some(Access::ReadOnly)
    );
    assert_eq!(
        resolved.table_permissions().get(&TableId::new(2)),
        Some(Access::ReadOnly)
    );
    assert_eq!(resolved.included().len(), 1);
}

#[tokio::test]
async fn element_dimensions_merge_through_includes() {
    let fixture = fixture(
        role(),
        client(false),
        ClientInfoConfig::new(CLIENT_ID, None),
        FakePermissionsRepository {
            elements: HashMap::from([(
                ElementKind::Window,
                element_permissions(&[(30, Access::ReadOnly)]),
            )]),
            ..Default::default()
        },
        true,
    );
    let include = included_set(
        7001,
        TablePermissions::empty(),
        element_permissions(&[(30, Access::ReadWrite), (31, Access::ReadWrite)]),
    );

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .include_permissions(include, 1)
        .build()
        .await;

    assert!(resolved.is_ok());
    let resolved = resolved.unwrap_or_else(|_| unreachable!());
    assert_eq!(
        resolved.window_permissions().get(&ElementId::new(30)),
        Some(Access::ReadOnly)
    );
    assert_eq!(
        resolved.window_permissions().get(&ElementId::new(31)),
        Some(Access::ReadWrite)
    );
}

#[tokio::test]
async fn included_record_extends_already_included_and_deduplicates() {
    let fixture = default_fixture();
    let earlier = included_set(7001, TablePermissions::empty(), ElementPermissions::empty());
    let fresh = included_set(7002, TablePermissions::empty(), ElementPermissions::empty());
    let duplicate = included_set(7001, TablePermissions::empty(), ElementPermissions::empty());

    let mut already_included = IncludesList::builder();
    already_included.add(RolePermissionsInclude::of(earlier, 5));

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .already_included(already_included.build())
        .map(|builder| {
            builder
                .include_permissions(fresh, 10)
                .include_permissions(duplicate, 20)
        });
    assert!(resolved.is_ok());

    let resolved = match resolved {
        Ok(builder) => builder.build().await,
        Err(error) => Err(error),
    };

    assert!(resolved.is_ok());
    let resolved = resolved.unwrap_or_else(|_| unreachable!());
    assert_eq!(resolved.included().len(), 2);
    assert!(resolved.included().contains_role(RoleId::new(7001)));
    assert!(resolved.included().contains_role(RoleId::new(7002)));
}

#[tokio::test]
async fn nested_includes_are_not_reexpanded() {
    let fixture = default_fixture();
    let leaf = included_set(7009, TablePermissions::empty(), ElementPermissions::empty());
    let mut inner_includes = IncludesList::builder();
    inner_includes.add(RolePermissionsInclude::of(leaf, 1));
    let inner = included_set_with_includes(
        7001,
        table_permissions(&[(300, Access::ReadOnly)]),
        ElementPermissions::empty(),
        inner_includes.build(),
    );

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .include_permissions(inner, 1)
        .build()
        .await;

    assert!(resolved.is_ok());
    let resolved = resolved.unwrap_or_else(|_| unreachable!());
    assert_eq!(
        resolved.table_permissions().get(&TableId::new(300)),
        Some(Access::ReadOnly)
    );
    assert_eq!(resolved.included().len(), 1);
    assert!(resolved.included().contains_role(RoleId::new(7001)));
    assert!(!resolved.included().contains_role(RoleId::new(7009)));
}

#[tokio::test]
async fn user_level_override_wins_over_role_default() {
    let fixture = default_fixture();

    let resolved = fixture
        .service
        .builder()
        .role_id(ROLE_ID)
        .user_id(USER_ID)
        .client_id(CLIENT_ID)
        .user_level(AccessLevel::All)
        .name("Support Session")
        .build()
        .await;

    assert!(resolved.is_ok());
    let resolved = resolved.unwrap_or_else(|_| unreachable!());
    assert_eq!(resolved.user_level(), AccessLevel::All);
    assert_eq!(resolved.name(), "Support Session");
}
