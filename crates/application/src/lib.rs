//! Application services and ports for permission resolution.

#![forbid(unsafe_code)]

mod role_permissions;
mod role_permissions_ports;
mod role_permissions_service;

pub use role_permissions::{
    IncludesList, IncludesListBuilder, RolePermissions, RolePermissionsInclude,
};
pub use role_permissions_ports::{ClientRepository, PermissionsRepository, RoleRepository};
pub use role_permissions_service::{RolePermissionsBuilder, RolePermissionsService};
