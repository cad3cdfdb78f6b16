use serde::{Deserialize, Serialize};

/// Identifier of a menu tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MenuTreeId(u32);

impl MenuTreeId {
    /// Creates a menu tree identifier from a repository value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Maps a legacy integer to an identifier.
    ///
    /// Tree references use `0` as "not configured", so any value below `1`
    /// is treated as absent.
    #[must_use]
    pub fn from_legacy(value: i32) -> Option<Self> {
        u32::try_from(value).ok().filter(|value| *value > 0).map(Self)
    }

    /// Returns the underlying repository value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for MenuTreeId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a single menu node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MenuId(u32);

impl MenuId {
    /// Creates a menu node identifier from a repository value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Maps a legacy integer to an identifier.
    ///
    /// Menu references use `0` as "not configured", so any value below `1`
    /// is treated as absent.
    #[must_use]
    pub fn from_legacy(value: i32) -> Option<Self> {
        u32::try_from(value).ok().filter(|value| *value > 0).map(Self)
    }

    /// Returns the underlying repository value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for MenuId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Menu tree applying to a role, with an optional root-menu restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuInfo {
    menu_tree_id: MenuTreeId,
    root_menu_id: Option<MenuId>,
}

impl MenuInfo {
    /// Creates menu info for a tree and an optional root menu.
    #[must_use]
    pub fn of(menu_tree_id: MenuTreeId, root_menu_id: Option<MenuId>) -> Self {
        Self {
            menu_tree_id,
            root_menu_id,
        }
    }

    /// Returns the applying menu tree.
    #[must_use]
    pub fn menu_tree_id(&self) -> MenuTreeId {
        self.menu_tree_id
    }

    /// Returns the root-menu restriction, if any.
    #[must_use]
    pub fn root_menu_id(&self) -> Option<MenuId> {
        self.root_menu_id
    }
}
