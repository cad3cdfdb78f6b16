use std::str::FromStr;

use corventa_core::{AppError, AppResult, ClientId, NonEmptyString, RoleId};
use serde::{Deserialize, Serialize};

use crate::menu::{MenuId, MenuTreeId};
use crate::permissions::{Constraints, GenericPermissions};

/// Scope of data a role may touch, from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Organization-owned data only.
    Organization,
    /// Client-owned data only.
    ClientOnly,
    /// Client- and organization-owned data.
    ClientPlusOrganization,
    /// System-owned data only.
    SystemOnly,
    /// All data regardless of owner.
    All,
}

impl AccessLevel {
    /// Returns a stable storage value for this access level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::ClientOnly => "client",
            Self::ClientPlusOrganization => "client_organization",
            Self::SystemOnly => "system",
            Self::All => "all",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "organization" => Ok(Self::Organization),
            "client" => Ok(Self::ClientOnly),
            "client_organization" => Ok(Self::ClientPlusOrganization),
            "system" => Ok(Self::SystemOnly),
            "all" => Ok(Self::All),
            _ => Err(AppError::Validation(format!(
                "unknown access level '{value}'"
            ))),
        }
    }
}

/// A named bundle of default access-control settings assignable to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    role_id: RoleId,
    name: NonEmptyString,
    client_id: ClientId,
    user_level: AccessLevel,
    permissions: GenericPermissions,
    constraints: Constraints,
    menu_tree_id: Option<MenuTreeId>,
    root_menu_id: Option<MenuId>,
}

impl Role {
    /// Creates a role with a validated name.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        role_id: RoleId,
        name: impl Into<String>,
        client_id: ClientId,
        user_level: AccessLevel,
        permissions: GenericPermissions,
        constraints: Constraints,
        menu_tree_id: Option<MenuTreeId>,
        root_menu_id: Option<MenuId>,
    ) -> AppResult<Self> {
        Ok(Self {
            role_id,
            name: NonEmptyString::new(name)?,
            client_id,
            user_level,
            permissions,
            constraints,
            menu_tree_id,
            root_menu_id,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the role display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the client owning this role.
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Returns the default access level for users holding this role.
    #[must_use]
    pub fn user_level(&self) -> AccessLevel {
        self.user_level
    }

    /// Returns the base feature grants attached to this role.
    #[must_use]
    pub fn permissions(&self) -> &GenericPermissions {
        &self.permissions
    }

    /// Returns the validation-rule bundle attached to this role.
    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Returns the role's own menu tree, if one is configured.
    #[must_use]
    pub fn menu_tree_id(&self) -> Option<MenuTreeId> {
        self.menu_tree_id
    }

    /// Returns the role's root menu, if one is configured.
    #[must_use]
    pub fn root_menu_id(&self) -> Option<MenuId> {
        self.root_menu_id
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use corventa_core::{ClientId, RoleId};

    use super::{AccessLevel, Role};
    use crate::permissions::{Constraints, GenericPermissions};

    #[test]
    fn access_level_roundtrip_storage_value() {
        let level = AccessLevel::ClientPlusOrganization;
        let restored = AccessLevel::from_str(level.as_str());
        assert!(restored.is_ok());
        assert_eq!(restored.unwrap_or(AccessLevel::SystemOnly), level);
    }

    #[test]
    fn unknown_access_level_is_rejected() {
        assert!(AccessLevel::from_str("tenant").is_err());
    }

    #[test]
    fn role_rejects_blank_name() {
        let result = Role::new(
            RoleId::new(1000000),
            "  ",
            ClientId::new(1000000),
            AccessLevel::ClientOnly,
            GenericPermissions::empty(),
            Constraints::none(),
            None,
            None,
        );
        assert!(result.is_err());
    }
}
