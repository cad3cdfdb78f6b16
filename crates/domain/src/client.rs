use corventa_core::{AppResult, ClientId, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::menu::MenuTreeId;

/// Client configuration flags consulted during permission assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    client_id: ClientId,
    name: NonEmptyString,
    use_beta_functions: bool,
}

impl ClientConfig {
    /// Creates a client configuration with a validated name.
    pub fn new(
        client_id: ClientId,
        name: impl Into<String>,
        use_beta_functions: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            client_id,
            name: NonEmptyString::new(name)?,
            use_beta_functions,
        })
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Returns the client display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns whether beta functionality is enabled for this client.
    #[must_use]
    pub fn use_beta_functions(&self) -> bool {
        self.use_beta_functions
    }
}

/// Client-level settings consulted for menu-tree fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfoConfig {
    client_id: ClientId,
    menu_tree_id: Option<MenuTreeId>,
}

impl ClientInfoConfig {
    /// Creates client-level settings.
    #[must_use]
    pub fn new(client_id: ClientId, menu_tree_id: Option<MenuTreeId>) -> Self {
        Self {
            client_id,
            menu_tree_id,
        }
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Returns the client-level menu tree, if one is configured.
    #[must_use]
    pub fn menu_tree_id(&self) -> Option<MenuTreeId> {
        self.menu_tree_id
    }
}
