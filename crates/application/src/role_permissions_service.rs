use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use corventa_core::{AppError, AppResult, ClientId, RoleId, UserId};
use corventa_domain::{
    AccessLevel, AccessMapBuilder, ClientConfig, ClientInfoConfig, CollisionPolicy,
    ColumnPermissions, Constraints, ElementId, ElementKind, ElementPermissions,
    GenericPermissions, MenuInfo, MenuTreeId, OrgPermissions, PERMISSION_BETA_FUNCTIONS,
    PERMISSION_SHOW_ACCOUNTING, RecordPermissions, Role, TablePermissions,
};

use crate::role_permissions::{IncludesList, RolePermissions, RolePermissionsInclude};
use crate::role_permissions_ports::{ClientRepository, PermissionsRepository, RoleRepository};

#[cfg(test)]
mod tests;

/// Menu tree applied when neither the role nor the client configures one.
/// Shall not happen with consistent directory data.
const FALLBACK_MENU_TREE_ID: MenuTreeId = MenuTreeId::new(10);

/// Application service assembling effective role permissions.
#[derive(Clone)]
pub struct RolePermissionsService {
    roles: Arc<dyn RoleRepository>,
    clients: Arc<dyn ClientRepository>,
    permissions: Arc<dyn PermissionsRepository>,
    accounting_module_active: bool,
}

impl RolePermissionsService {
    /// Creates a service from its repository ports and module flags.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        clients: Arc<dyn ClientRepository>,
        permissions: Arc<dyn PermissionsRepository>,
        accounting_module_active: bool,
    ) -> Self {
        Self {
            roles,
            clients,
            permissions,
            accounting_module_active,
        }
    }

    /// Starts a single-shot builder for one resolution request.
    #[must_use]
    pub fn builder(&self) -> RolePermissionsBuilder {
        RolePermissionsBuilder::new(self.clone())
    }

    /// Resolves the permission set for a role, user, and client, taking every
    /// dimension from the stored defaults.
    pub async fn resolve(
        &self,
        role_id: RoleId,
        user_id: UserId,
        client_id: ClientId,
    ) -> AppResult<RolePermissions> {
        self.builder()
            .role_id(role_id)
            .user_id(user_id)
            .client_id(client_id)
            .build()
            .await
    }
}

/// Single-shot builder producing one immutable permission-set snapshot.
///
/// A builder is created per resolution request, configured, then consumed by
/// [`RolePermissionsBuilder::build`]. Role, client, and client-info lookups
/// are memoized so each distinct id is fetched at most once per builder.
pub struct RolePermissionsBuilder {
    service: RolePermissionsService,
    name: Option<String>,
    role_id: Option<RoleId>,
    user_id: Option<UserId>,
    client_id: Option<ClientId>,
    user_level: Option<AccessLevel>,
    menu_info: Option<MenuInfo>,
    role: Option<Role>,
    client: Option<ClientConfig>,
    client_info: Option<ClientInfoConfig>,
    org_permissions: Option<OrgPermissions>,
    table_permissions: Option<TablePermissions>,
    column_permissions: Option<ColumnPermissions>,
    record_permissions: Option<RecordPermissions>,
    element_permissions: BTreeMap<ElementKind, ElementPermissions>,
    misc_permissions: Option<GenericPermissions>,
    constraints: Option<Constraints>,
    already_included: Option<IncludesList>,
    to_include: Vec<RolePermissionsInclude>,
}

impl RolePermissionsBuilder {
    fn new(service: RolePermissionsService) -> Self {
        Self {
            service,
            name: None,
            role_id: None,
            user_id: None,
            client_id: None,
            user_level: None,
            menu_info: None,
            role: None,
            client: None,
            client_info: None,
            org_permissions: None,
            table_permissions: None,
            column_permissions: None,
            record_permissions: None,
            element_permissions: BTreeMap::new(),
            misc_permissions: None,
            constraints: None,
            already_included: None,
            to_include: Vec::new(),
        }
    }

    /// Sets the role whose permissions are resolved, discarding any role
    /// record already loaded for a previous id.
    #[must_use]
    pub fn role_id(mut self, role_id: RoleId) -> Self {
        self.role_id = Some(role_id);
        self.role = None;
        self
    }

    /// Sets the user the resolution applies to.
    #[must_use]
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the client context; when absent the role's own client is used.
    #[must_use]
    pub fn client_id(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    /// Overrides the effective access level; defaults to the role's level.
    #[must_use]
    pub fn user_level(mut self, user_level: AccessLevel) -> Self {
        self.user_level = Some(user_level);
        self
    }

    /// Overrides the display name; defaults to the role name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Supplies menu info explicitly instead of fallback resolution.
    #[must_use]
    pub fn menu_info(mut self, menu_info: MenuInfo) -> Self {
        self.menu_info = Some(menu_info);
        self
    }

    /// Supplies organization permissions instead of the stored defaults.
    #[must_use]
    pub fn org_permissions(mut self, permissions: OrgPermissions) -> Self {
        self.org_permissions = Some(permissions);
        self
    }

    /// Supplies table permissions instead of the stored defaults.
    #[must_use]
    pub fn table_permissions(mut self, permissions: TablePermissions) -> Self {
        self.table_permissions = Some(permissions);
        self
    }

    /// Supplies table-column permissions instead of the stored defaults.
    #[must_use]
    pub fn column_permissions(mut self, permissions: ColumnPermissions) -> Self {
        self.column_permissions = Some(permissions);
        self
    }

    /// Supplies record permissions instead of the stored defaults.
    #[must_use]
    pub fn record_permissions(mut self, permissions: RecordPermissions) -> Self {
        self.record_permissions = Some(permissions);
        self
    }

    /// Supplies one element dimension instead of the stored defaults.
    #[must_use]
    pub fn element_permissions(
        mut self,
        kind: ElementKind,
        permissions: ElementPermissions,
    ) -> Self {
        self.element_permissions.insert(kind, permissions);
        self
    }

    /// Supplies misc feature permissions instead of deriving them from the
    /// role and client; fails on a second assignment.
    pub fn misc_permissions(mut self, permissions: GenericPermissions) -> AppResult<Self> {
        if self.misc_permissions.is_some() {
            return Err(AppError::Configuration(
                "misc permissions are already configured".to_owned(),
            ));
        }

        self.misc_permissions = Some(permissions);
        Ok(self)
    }

    /// Supplies constraints instead of taking them from the role; fails on a
    /// second assignment.
    pub fn constraints(mut self, constraints: Constraints) -> AppResult<Self> {
        if self.constraints.is_some() {
            return Err(AppError::Configuration(
                "constraints are already configured".to_owned(),
            ));
        }

        self.constraints = Some(constraints);
        Ok(self)
    }

    /// Records permission sets folded in by an earlier resolution; fails on a
    /// second assignment.
    pub fn already_included(mut self, includes: IncludesList) -> AppResult<Self> {
        if self.already_included.is_some() {
            return Err(AppError::Configuration(
                "already-included permissions are already configured".to_owned(),
            ));
        }

        self.already_included = Some(includes);
        Ok(self)
    }

    /// Declares an included permission set with its sequence number.
    ///
    /// Declaration order is significant: includes are folded in exactly this
    /// order at build time.
    #[must_use]
    pub fn include_permissions(mut self, permissions: Arc<RolePermissions>, seq_no: i32) -> Self {
        self.to_include
            .push(RolePermissionsInclude::of(permissions, seq_no));
        self
    }

    /// Assembles the immutable permission set, consuming the builder.
    ///
    /// Fails with a configuration error before any backing-store lookup when
    /// the role id or user id is unset.
    pub async fn build(mut self) -> AppResult<RolePermissions> {
        let role_id = self.require_role_id()?;
        let user_id = self.require_user_id()?;
        let client_id = self.resolve_client_id().await?;

        let mut org_permissions = match self.org_permissions.take() {
            Some(explicit) => explicit,
            None => {
                let role = self.resolve_role().await?;
                self.service
                    .permissions
                    .org_permissions(&role, user_id)
                    .await?
            }
        };
        let mut table_permissions = match self.table_permissions.take() {
            Some(explicit) => explicit,
            None => self.service.permissions.table_permissions(role_id).await?,
        };
        let mut column_permissions = match self.column_permissions.take() {
            Some(explicit) => explicit,
            None => self.service.permissions.column_permissions(role_id).await?,
        };
        let mut record_permissions = match self.record_permissions.take() {
            Some(explicit) => explicit,
            None => self.service.permissions.record_permissions(role_id).await?,
        };
        let mut element_permissions: BTreeMap<ElementKind, ElementPermissions> = BTreeMap::new();
        for kind in ElementKind::all() {
            let resolved = match self.element_permissions.remove(kind) {
                Some(explicit) => explicit,
                None => {
                    self.service
                        .permissions
                        .element_permissions(role_id, client_id, *kind)
                        .await?
                }
            };
            element_permissions.insert(*kind, resolved);
        }

        let misc_permissions = match self.misc_permissions.take() {
            Some(explicit) => explicit,
            None => {
                let role = self.resolve_role().await?;
                let client = self.resolve_client().await?;
                self.derive_misc_permissions(&role, &client)
            }
        };

        let constraints = match self.constraints.take() {
            Some(explicit) => explicit,
            None => self.resolve_role().await?.constraints().clone(),
        };

        let mut included = IncludesList::builder();
        if let Some(already_included) = self.already_included.take() {
            included.add_all(&already_included);
        }

        let to_include = std::mem::take(&mut self.to_include);
        if !to_include.is_empty() {
            let mut org_builder = org_permissions.to_builder();
            let mut table_builder = table_permissions.to_builder();
            let mut column_builder = column_permissions.to_builder();
            let mut record_builder = record_permissions.to_builder();
            let mut element_builders: BTreeMap<ElementKind, AccessMapBuilder<ElementId>> =
                element_permissions
                    .iter()
                    .map(|(kind, permissions)| (*kind, permissions.to_builder()))
                    .collect();

            let mut last_seq_no: Option<i32> = None;
            for include in to_include {
                // Equal non-negative sequence numbers form an explicit
                // override chain; differing or negative numbers always merge.
                let policy = if include.seq_no() >= 0 && last_seq_no == Some(include.seq_no()) {
                    CollisionPolicy::Override
                } else {
                    CollisionPolicy::Merge
                };

                // Only the include's flattened dimension values are folded
                // in; its own includes are not re-expanded.
                let permissions = include.permissions();
                org_builder.add_permissions(permissions.org_permissions(), policy);
                table_builder.add_permissions(permissions.table_permissions(), policy);
                column_builder.add_permissions(permissions.column_permissions(), policy);
                record_builder.add_permissions(permissions.record_permissions(), policy);
                for kind in ElementKind::all() {
                    if let Some(builder) = element_builders.get_mut(kind) {
                        builder.add_permissions(permissions.element_permissions(*kind), policy);
                    }
                }

                last_seq_no = Some(include.seq_no());
                included.add(include);
            }

            org_permissions = org_builder.build();
            table_permissions = table_builder.build();
            column_permissions = column_builder.build();
            record_permissions = record_builder.build();
            element_permissions = element_builders
                .into_iter()
                .map(|(kind, builder)| (kind, builder.build()))
                .collect();
        }

        let role = self.resolve_role().await?;
        let name = match self.name.take() {
            Some(name) => name,
            None => role.name().to_owned(),
        };
        let user_level = self.resolve_user_level().await?;
        let menu_info = self.resolve_menu_info().await?;
        let included = included.build();

        debug!(
            role_id = %role_id,
            user_id = %user_id,
            client_id = %client_id,
            includes = included.len(),
            "assembled role permissions"
        );

        Ok(RolePermissions {
            name,
            role_id,
            user_id,
            client_id,
            user_level,
            org_permissions,
            table_permissions,
            column_permissions,
            record_permissions,
            window_permissions: element_permissions
                .remove(&ElementKind::Window)
                .unwrap_or_default(),
            process_permissions: element_permissions
                .remove(&ElementKind::Process)
                .unwrap_or_default(),
            task_permissions: element_permissions
                .remove(&ElementKind::Task)
                .unwrap_or_default(),
            workflow_permissions: element_permissions
                .remove(&ElementKind::Workflow)
                .unwrap_or_default(),
            form_permissions: element_permissions
                .remove(&ElementKind::Form)
                .unwrap_or_default(),
            misc_permissions,
            constraints,
            menu_info,
            included,
        })
    }

    fn require_role_id(&self) -> AppResult<RoleId> {
        self.role_id.ok_or_else(|| {
            AppError::Configuration("role id must be set before build".to_owned())
        })
    }

    fn require_user_id(&self) -> AppResult<UserId> {
        self.user_id.ok_or_else(|| {
            AppError::Configuration("user id must be set before build".to_owned())
        })
    }

    async fn resolve_role(&mut self) -> AppResult<Role> {
        if let Some(role) = &self.role {
            return Ok(role.clone());
        }

        let role_id = self.require_role_id()?;
        let role = self
            .service
            .roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' must exist")))?;
        self.role = Some(role.clone());
        Ok(role)
    }

    async fn resolve_client_id(&mut self) -> AppResult<ClientId> {
        if let Some(client_id) = self.client_id {
            return Ok(client_id);
        }

        // Fallback: the role's own client.
        Ok(self.resolve_role().await?.client_id())
    }

    async fn resolve_client(&mut self) -> AppResult<ClientConfig> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        let client_id = self.resolve_client_id().await?;
        let client = self
            .service
            .clients
            .find_client(client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("client '{client_id}' must exist")))?;
        self.client = Some(client.clone());
        Ok(client)
    }

    async fn resolve_client_info(&mut self) -> AppResult<ClientInfoConfig> {
        if let Some(client_info) = self.client_info {
            return Ok(client_info);
        }

        let client_id = self.resolve_client_id().await?;
        let client_info = self
            .service
            .clients
            .find_client_info(client_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("client info for client '{client_id}' must exist"))
            })?;
        self.client_info = Some(client_info);
        Ok(client_info)
    }

    async fn resolve_user_level(&mut self) -> AppResult<AccessLevel> {
        if let Some(user_level) = self.user_level {
            return Ok(user_level);
        }

        Ok(self.resolve_role().await?.user_level())
    }

    /// Three-tier menu fallback: role tree, client-level tree, fixed default.
    async fn resolve_menu_info(&mut self) -> AppResult<MenuInfo> {
        if let Some(menu_info) = self.menu_info {
            return Ok(menu_info);
        }

        let role = self.resolve_role().await?;
        if let Some(menu_tree_id) = role.menu_tree_id() {
            return Ok(MenuInfo::of(menu_tree_id, role.root_menu_id()));
        }

        let client_info = self.resolve_client_info().await?;
        if let Some(menu_tree_id) = client_info.menu_tree_id() {
            return Ok(MenuInfo::of(menu_tree_id, role.root_menu_id()));
        }

        warn!(role_id = %role.role_id(), "no menu tree configured, using fallback tree");
        Ok(MenuInfo::of(FALLBACK_MENU_TREE_ID, None))
    }

    /// Derives misc feature grants from the role's base set: the beta flag is
    /// forced on when the client enables it, then the accounting flag is
    /// dropped when the accounting module is inactive.
    fn derive_misc_permissions(&self, role: &Role, client: &ClientConfig) -> GenericPermissions {
        let mut permissions = role.permissions().to_builder();

        if client.use_beta_functions() {
            permissions.add_permission(PERMISSION_BETA_FUNCTIONS, CollisionPolicy::Override);
        }

        if !self.service.accounting_module_active {
            permissions.remove_permission(PERMISSION_SHOW_ACCOUNTING);
        }

        permissions.build()
    }
}
