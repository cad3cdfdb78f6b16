//! Repository identifiers for roles, users, and clients.
//!
//! All three are immutable non-negative integer values. Legacy call sites
//! still traffic in raw integers where `-1` means "no identifier"; the
//! `from_legacy`/`to_legacy` pairs normalize that encoding to `Option`.

use serde::{Deserialize, Serialize};

/// Identifier of a security role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(u32);

impl RoleId {
    /// The unrestricted system role.
    pub const SYSTEM: RoleId = RoleId(0);

    /// Creates a role identifier from a repository value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Maps a legacy integer to an identifier, treating negatives as absent.
    #[must_use]
    pub fn from_legacy(value: i32) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }

    /// Maps an optional identifier back to the legacy integer encoding.
    #[must_use]
    pub fn to_legacy(id: Option<Self>) -> i32 {
        id.map_or(-1, |id| id.0 as i32)
    }

    /// Returns the underlying repository value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns whether this is the unrestricted system role.
    #[must_use]
    pub fn is_system(&self) -> bool {
        *self == Self::SYSTEM
    }

    /// Returns whether this is any role other than the system role.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        !self.is_system()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(u32);

impl UserId {
    /// Creates a user identifier from a repository value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Maps a legacy integer to an identifier, treating negatives as absent.
    #[must_use]
    pub fn from_legacy(value: i32) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }

    /// Maps an optional identifier back to the legacy integer encoding.
    #[must_use]
    pub fn to_legacy(id: Option<Self>) -> i32 {
        id.map_or(-1, |id| id.0 as i32)
    }

    /// Returns the underlying repository value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a client (the top-level tenant unit of the system).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(u32);

impl ClientId {
    /// Creates a client identifier from a repository value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Maps a legacy integer to an identifier, treating negatives as absent.
    #[must_use]
    pub fn from_legacy(value: i32) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }

    /// Maps an optional identifier back to the legacy integer encoding.
    #[must_use]
    pub fn to_legacy(id: Option<Self>) -> i32 {
        id.map_or(-1, |id| id.0 as i32)
    }

    /// Returns the underlying repository value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{RoleId, UserId};

    #[test]
    fn system_role_is_zero() {
        assert!(RoleId::new(0).is_system());
        assert!(RoleId::new(1000000).is_regular());
    }

    #[test]
    fn legacy_negative_means_absent() {
        assert_eq!(RoleId::from_legacy(-1), None);
        assert_eq!(RoleId::from_legacy(0), Some(RoleId::SYSTEM));
        assert_eq!(UserId::from_legacy(2156423), Some(UserId::new(2156423)));
    }

    #[test]
    fn legacy_roundtrip_restores_encoding() {
        assert_eq!(RoleId::to_legacy(None), -1);
        assert_eq!(RoleId::to_legacy(RoleId::from_legacy(540004)), 540004);
    }
}
