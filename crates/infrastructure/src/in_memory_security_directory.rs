use std::collections::HashMap;

use async_trait::async_trait;
use corventa_application::{ClientRepository, PermissionsRepository, RoleRepository};
use corventa_core::{AppError, AppResult, ClientId, RoleId, UserId};
use corventa_domain::{
    ClientConfig, ClientInfoConfig, ColumnPermissions, ElementKind, ElementPermissions,
    OrgPermissions, RecordPermissions, Role, TablePermissions,
};
use tokio::sync::RwLock;

/// In-memory security directory implementing every permission lookup port.
///
/// Holds role and client records plus the stored per-dimension permission
/// defaults. Lookups are read-only; a referenced permission default that was
/// never registered is reported as missing rather than substituted with an
/// empty container.
#[derive(Debug, Default)]
pub struct InMemorySecurityDirectory {
    roles: RwLock<HashMap<RoleId, Role>>,
    clients: RwLock<HashMap<ClientId, ClientConfig>>,
    client_infos: RwLock<HashMap<ClientId, ClientInfoConfig>>,
    org_permissions: RwLock<HashMap<(RoleId, UserId), OrgPermissions>>,
    table_permissions: RwLock<HashMap<RoleId, TablePermissions>>,
    column_permissions: RwLock<HashMap<RoleId, ColumnPermissions>>,
    record_permissions: RwLock<HashMap<RoleId, RecordPermissions>>,
    element_permissions: RwLock<HashMap<(RoleId, ClientId, ElementKind), ElementPermissions>>,
}

impl InMemorySecurityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a role record.
    pub async fn insert_role(&self, role: Role) {
        self.roles.write().await.insert(role.role_id(), role);
    }

    /// Registers a client record.
    pub async fn insert_client(&self, client: ClientConfig) {
        self.clients.write().await.insert(client.client_id(), client);
    }

    /// Registers client-level settings.
    pub async fn insert_client_info(&self, client_info: ClientInfoConfig) {
        self.client_infos
            .write()
            .await
            .insert(client_info.client_id(), client_info);
    }

    /// Stores organization permission defaults for a role and user.
    pub async fn set_org_permissions(
        &self,
        role_id: RoleId,
        user_id: UserId,
        permissions: OrgPermissions,
    ) {
        self.org_permissions
            .write()
            .await
            .insert((role_id, user_id), permissions);
    }

    /// Stores table permission defaults for a role.
    pub async fn set_table_permissions(&self, role_id: RoleId, permissions: TablePermissions) {
        self.table_permissions
            .write()
            .await
            .insert(role_id, permissions);
    }

    /// Stores table-column permission defaults for a role.
    pub async fn set_column_permissions(&self, role_id: RoleId, permissions: ColumnPermissions) {
        self.column_permissions
            .write()
            .await
            .insert(role_id, permissions);
    }

    /// Stores record permission defaults for a role.
    pub async fn set_record_permissions(&self, role_id: RoleId, permissions: RecordPermissions) {
        self.record_permissions
            .write()
            .await
            .insert(role_id, permissions);
    }

    /// Stores element permission defaults of one kind for a role in a client.
    pub async fn set_element_permissions(
        &self,
        role_id: RoleId,
        client_id: ClientId,
        kind: ElementKind,
        permissions: ElementPermissions,
    ) {
        self.element_permissions
            .write()
            .await
            .insert((role_id, client_id, kind), permissions);
    }
}

#[async_trait]
impl RoleRepository for InMemorySecurityDirectory {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }
}

#[async_trait]
impl ClientRepository for InMemorySecurityDirectory {
    async fn find_client(&self, client_id: ClientId) -> AppResult<Option<ClientConfig>> {
        Ok(self.clients.read().await.get(&client_id).cloned())
    }

    async fn find_client_info(&self, client_id: ClientId) -> AppResult<Option<ClientInfoConfig>> {
        Ok(self.client_infos.read().await.get(&client_id).copied())
    }
}

#[async_trait]
impl PermissionsRepository for InMemorySecurityDirectory {
    async fn org_permissions(&self, role: &Role, user_id: UserId) -> AppResult<OrgPermissions> {
        self.org_permissions
            .read()
            .await
            .get(&(role.role_id(), user_id))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "org permissions for role '{}' and user '{user_id}' do not exist",
                    role.role_id()
                ))
            })
    }

    async fn table_permissions(&self, role_id: RoleId) -> AppResult<TablePermissions> {
        self.table_permissions
            .read()
            .await
            .get(&role_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("table permissions for role '{role_id}' do not exist"))
            })
    }

    async fn column_permissions(&self, role_id: RoleId) -> AppResult<ColumnPermissions> {
        self.column_permissions
            .read()
            .await
            .get(&role_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "column permissions for role '{role_id}' do not exist"
                ))
            })
    }

    async fn record_permissions(&self, role_id: RoleId) -> AppResult<RecordPermissions> {
        self.record_permissions
            .read()
            .await
            .get(&role_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "record permissions for role '{role_id}' do not exist"
                ))
            })
    }

    async fn element_permissions(
        &self,
        role_id: RoleId,
        client_id: ClientId,
        kind: ElementKind,
    ) -> AppResult<ElementPermissions> {
        self.element_permissions
            .read()
            .await
            .get(&(role_id, client_id, kind))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} permissions for role '{role_id}' in client '{client_id}' do not exist",
                    kind.as_str()
                ))
            })
    }
}
