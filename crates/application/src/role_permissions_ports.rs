use async_trait::async_trait;
use corventa_core::{AppResult, ClientId, RoleId, UserId};
use corventa_domain::{
    ClientConfig, ClientInfoConfig, ColumnPermissions, ElementKind, ElementPermissions,
    OrgPermissions, RecordPermissions, Role, TablePermissions,
};

/// Repository port for role lookups.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by its identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;
}

/// Repository port for client configuration lookups.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Finds client configuration flags by client identifier.
    async fn find_client(&self, client_id: ClientId) -> AppResult<Option<ClientConfig>>;

    /// Finds the client-level settings consulted for menu fallback.
    async fn find_client_info(&self, client_id: ClientId) -> AppResult<Option<ClientInfoConfig>>;
}

/// Repository port supplying stored per-dimension permission defaults.
#[async_trait]
pub trait PermissionsRepository: Send + Sync {
    /// Retrieves organization permissions for a role and user.
    async fn org_permissions(&self, role: &Role, user_id: UserId) -> AppResult<OrgPermissions>;

    /// Retrieves table permissions for a role.
    async fn table_permissions(&self, role_id: RoleId) -> AppResult<TablePermissions>;

    /// Retrieves table-column permissions for a role.
    async fn column_permissions(&self, role_id: RoleId) -> AppResult<ColumnPermissions>;

    /// Retrieves record permissions for a role.
    async fn record_permissions(&self, role_id: RoleId) -> AppResult<RecordPermissions>;

    /// Retrieves element permissions of one kind for a role within a client.
    async fn element_permissions(
        &self,
        role_id: RoleId,
        client_id: ClientId,
        kind: ElementKind,
    ) -> AppResult<ElementPermissions>;
}
