//! Domain entities and invariants for permission resolution.

#![forbid(unsafe_code)]

mod client;
mod menu;
mod permissions;
mod role;

pub use client::{ClientConfig, ClientInfoConfig};
pub use menu::{MenuId, MenuInfo, MenuTreeId};
pub use permissions::{
    Access, AccessMap, AccessMapBuilder, CollisionPolicy, ColumnPermissions, ColumnRef,
    Constraints, ElementId, ElementKind, ElementPermissions, GenericPermissions,
    GenericPermissionsBuilder, OrgId, OrgPermissions, PERMISSION_BETA_FUNCTIONS,
    PERMISSION_SHOW_ACCOUNTING, RecordPermissions, RecordRef, TableId, TablePermissions,
};
pub use role::{AccessLevel, Role};
