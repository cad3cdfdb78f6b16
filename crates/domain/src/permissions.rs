//! Permission containers and their merge rules.
//!
//! Every access dimension is an immutable map from a dimension-specific key
//! to an [`Access`] decision, with a companion mutable builder. Builders
//! combine containers under a [`CollisionPolicy`]; the union rule for
//! [`CollisionPolicy::Merge`] keeps the most restrictive decision on keys
//! both sides define.

use std::collections::{BTreeMap, BTreeSet};

use corventa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Feature flag enabling beta functionality for a client's users.
pub const PERMISSION_BETA_FUNCTIONS: &str = "feature.beta_functions";

/// Feature flag exposing accounting data in the UI.
pub const PERMISSION_SHOW_ACCOUNTING: &str = "feature.show_accounting";

/// Rule governing how two permission containers combine when both define a
/// value for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Union both sides; conflicting keys keep the most restrictive decision.
    Merge,
    /// The permissions being folded in replace conflicting keys.
    Override,
}

/// Access decision recorded for one dimension key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// The key may be read but not changed.
    ReadOnly,
    /// The key may be read and changed.
    ReadWrite,
}

impl Access {
    /// Combines two decisions for the same key; the most restrictive wins.
    ///
    /// Commutative and idempotent, which keeps repeated merges stable.
    #[must_use]
    pub fn restrictive_union(self, other: Access) -> Access {
        match (self, other) {
            (Access::ReadWrite, Access::ReadWrite) => Access::ReadWrite,
            _ => Access::ReadOnly,
        }
    }

    /// Returns whether the decision allows writing.
    #[must_use]
    pub fn is_read_write(&self) -> bool {
        matches!(self, Access::ReadWrite)
    }
}

/// Identifier of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(u32);

impl OrgId {
    /// Creates an organization identifier from a repository value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying repository value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Identifier of a data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(u32);

impl TableId {
    /// Creates a table identifier from a repository value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying repository value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Identifier of a UI element (window, process, task, workflow, or form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u32);

impl ElementId {
    /// Creates an element identifier from a repository value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying repository value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Table column addressed by its owning table and column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    table_id: TableId,
    column_name: String,
}

impl ColumnRef {
    /// Creates a column reference with a validated column name.
    pub fn new(table_id: TableId, column_name: impl Into<String>) -> AppResult<Self> {
        let column_name = column_name.into();
        if column_name.trim().is_empty() {
            return Err(AppError::Validation(
                "column name must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            table_id,
            column_name,
        })
    }

    /// Returns the owning table.
    #[must_use]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Returns the column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        self.column_name.as_str()
    }
}

/// Single data record addressed by its owning table and record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordRef {
    table_id: TableId,
    record_id: u32,
}

impl RecordRef {
    /// Creates a record reference.
    #[must_use]
    pub const fn new(table_id: TableId, record_id: u32) -> Self {
        Self {
            table_id,
            record_id,
        }
    }

    /// Returns the owning table.
    #[must_use]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Returns the record id within the table.
    #[must_use]
    pub fn record_id(&self) -> u32 {
        self.record_id
    }
}

/// The five client-scoped element dimensions sharing [`ElementPermissions`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Window access.
    Window,
    /// Process access.
    Process,
    /// Task access.
    Task,
    /// Workflow access.
    Workflow,
    /// Form access.
    Form,
}

impl ElementKind {
    /// Returns a stable storage value for this element kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Process => "process",
            Self::Task => "task",
            Self::Workflow => "workflow",
            Self::Form => "form",
        }
    }

    /// Returns all element kinds in resolution order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ElementKind] = &[
            ElementKind::Window,
            ElementKind::Process,
            ElementKind::Task,
            ElementKind::Workflow,
            ElementKind::Form,
        ];

        ALL
    }
}

/// Organization access container.
pub type OrgPermissions = AccessMap<OrgId>;
/// Table access container.
pub type TablePermissions = AccessMap<TableId>;
/// Table-column access container.
pub type ColumnPermissions = AccessMap<ColumnRef>;
/// Record access container.
pub type RecordPermissions = AccessMap<RecordRef>;
/// Element access container shared by the five client-scoped dimensions.
pub type ElementPermissions = AccessMap<ElementId>;

/// Immutable mapping from a dimension key to an access decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMap<K: Ord> {
    entries: BTreeMap<K, Access>,
}

impl<K: Ord + Clone> AccessMap<K> {
    /// Returns a container with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> AccessMapBuilder<K> {
        AccessMapBuilder {
            entries: BTreeMap::new(),
        }
    }

    /// Snapshot-copies the container into a mutable builder, leaving the
    /// container untouched.
    #[must_use]
    pub fn to_builder(&self) -> AccessMapBuilder<K> {
        AccessMapBuilder {
            entries: self.entries.clone(),
        }
    }

    /// Returns the decision recorded for a key, if any.
    pub fn get(&self, key: &K) -> Option<Access> {
        self.entries.get(key).copied()
    }

    /// Returns whether any decision is recorded for a key.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of recorded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the container carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, Access)> {
        self.entries.iter().map(|(key, access)| (key, *access))
    }
}

impl<K: Ord + Clone> Default for AccessMap<K> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Mutable accumulator for an [`AccessMap`].
#[derive(Debug)]
pub struct AccessMapBuilder<K: Ord> {
    entries: BTreeMap<K, Access>,
}

impl<K: Ord + Clone> AccessMapBuilder<K> {
    /// Records a decision for a key, replacing any previous decision.
    pub fn grant(&mut self, key: K, access: Access) -> &mut Self {
        self.entries.insert(key, access);
        self
    }

    /// Folds another container in under the collision policy.
    ///
    /// Keys absent from the accumulator are inserted regardless of policy.
    /// Keys present on both sides are replaced under
    /// [`CollisionPolicy::Override`] and combined via
    /// [`Access::restrictive_union`] under [`CollisionPolicy::Merge`].
    pub fn add_permissions(&mut self, other: &AccessMap<K>, policy: CollisionPolicy) -> &mut Self {
        for (key, other_access) in other.iter() {
            let merged = match (self.entries.get(key), policy) {
                (None, _) | (Some(_), CollisionPolicy::Override) => other_access,
                (Some(existing), CollisionPolicy::Merge) => {
                    existing.restrictive_union(other_access)
                }
            };
            self.entries.insert(key.clone(), merged);
        }

        self
    }

    /// Freezes the accumulator into an immutable container.
    #[must_use]
    pub fn build(self) -> AccessMap<K> {
        AccessMap {
            entries: self.entries,
        }
    }
}

impl<K: Ord + Clone> Default for AccessMapBuilder<K> {
    fn default() -> Self {
        AccessMap::builder()
    }
}

/// Named feature-flag grants attached to a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericPermissions {
    names: BTreeSet<String>,
}

impl GenericPermissions {
    /// Returns a set with no grants.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Starts an empty builder.
    #[must_use]
    pub fn builder() -> GenericPermissionsBuilder {
        GenericPermissionsBuilder {
            names: BTreeSet::new(),
        }
    }

    /// Snapshot-copies the set into a mutable builder.
    #[must_use]
    pub fn to_builder(&self) -> GenericPermissionsBuilder {
        GenericPermissionsBuilder {
            names: self.names.clone(),
        }
    }

    /// Returns whether the named grant is present.
    pub fn has_permission(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns the number of grants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether the set carries no grants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates grant names in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Mutable accumulator for [`GenericPermissions`].
#[derive(Debug, Default)]
pub struct GenericPermissionsBuilder {
    names: BTreeSet<String>,
}

impl GenericPermissionsBuilder {
    /// Adds one named grant.
    ///
    /// A named flag has no value to collide on, so both policies insert.
    pub fn add_permission(
        &mut self,
        name: impl Into<String>,
        _policy: CollisionPolicy,
    ) -> &mut Self {
        self.names.insert(name.into());
        self
    }

    /// Removes one named grant if present.
    pub fn remove_permission(&mut self, name: &str) -> &mut Self {
        self.names.remove(name);
        self
    }

    /// Folds every grant of another set in.
    pub fn add_permissions(
        &mut self,
        other: &GenericPermissions,
        policy: CollisionPolicy,
    ) -> &mut Self {
        for name in other.iter() {
            self.add_permission(name, policy);
        }

        self
    }

    /// Freezes the accumulator into an immutable set.
    #[must_use]
    pub fn build(self) -> GenericPermissions {
        GenericPermissions { names: self.names }
    }
}

/// Opaque validation-rule bundle sourced from a role.
///
/// Constraints are never merged between permission sets; the last configured
/// bundle wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    rules: BTreeMap<String, Value>,
}

impl Constraints {
    /// Returns the empty rule bundle.
    #[must_use]
    pub fn none() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Creates a bundle from named rule payloads.
    #[must_use]
    pub fn new(rules: BTreeMap<String, Value>) -> Self {
        Self { rules }
    }

    /// Returns the payload of one named rule, if present.
    pub fn rule(&self, name: &str) -> Option<&Value> {
        self.rules.get(name)
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether the bundle carries no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
