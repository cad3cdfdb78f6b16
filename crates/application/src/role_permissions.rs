use std::sync::Arc;

use corventa_core::{ClientId, RoleId, UserId};
use corventa_domain::{
    AccessLevel, ColumnPermissions, Constraints, ElementKind, ElementPermissions,
    GenericPermissions, MenuInfo, OrgPermissions, RecordPermissions, TablePermissions,
};

/// One fully resolved permission set folded into another resolution, tagged
/// with its declared sequence number.
#[derive(Debug, Clone)]
pub struct RolePermissionsInclude {
    permissions: Arc<RolePermissions>,
    seq_no: i32,
}

impl RolePermissionsInclude {
    /// Pairs a resolved permission set with its declared sequence number.
    #[must_use]
    pub fn of(permissions: Arc<RolePermissions>, seq_no: i32) -> Self {
        Self {
            permissions,
            seq_no,
        }
    }

    /// Returns the included permission set.
    #[must_use]
    pub fn permissions(&self) -> &RolePermissions {
        self.permissions.as_ref()
    }

    /// Returns the declared sequence number.
    ///
    /// Negative sequence numbers never group into override chains.
    #[must_use]
    pub fn seq_no(&self) -> i32 {
        self.seq_no
    }
}

/// Ordered, deduplicated record of the permission sets folded into one
/// resolution.
#[derive(Debug, Clone, Default)]
pub struct IncludesList {
    entries: Vec<RolePermissionsInclude>,
}

impl IncludesList {
    /// Returns the empty record.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Starts an empty accumulator.
    #[must_use]
    pub fn builder() -> IncludesListBuilder {
        IncludesListBuilder {
            entries: Vec::new(),
        }
    }

    /// Returns whether a role's permission set was already folded in.
    pub fn contains_role(&self, role_id: RoleId) -> bool {
        self.entries
            .iter()
            .any(|include| include.permissions().role_id() == role_id)
    }

    /// Iterates includes in fold order.
    pub fn iter(&self) -> impl Iterator<Item = &RolePermissionsInclude> {
        self.entries.iter()
    }

    /// Returns the number of recorded includes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the record is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulator for an [`IncludesList`].
#[derive(Debug, Default)]
pub struct IncludesListBuilder {
    entries: Vec<RolePermissionsInclude>,
}

impl IncludesListBuilder {
    /// Appends one include unless its role was already recorded.
    pub fn add(&mut self, include: RolePermissionsInclude) -> &mut Self {
        let role_id = include.permissions().role_id();
        let already_recorded = self
            .entries
            .iter()
            .any(|entry| entry.permissions().role_id() == role_id);
        if !already_recorded {
            self.entries.push(include);
        }

        self
    }

    /// Appends every include of an existing record, keeping first occurrences.
    pub fn add_all(&mut self, includes: &IncludesList) -> &mut Self {
        for include in includes.iter() {
            self.add(include.clone());
        }

        self
    }

    /// Freezes the accumulator.
    #[must_use]
    pub fn build(self) -> IncludesList {
        IncludesList {
            entries: self.entries,
        }
    }
}

/// Immutable snapshot of every permission dimension resolved for one role,
/// user, and client context.
#[derive(Debug, Clone)]
pub struct RolePermissions {
    pub(crate) name: String,
    pub(crate) role_id: RoleId,
    pub(crate) user_id: UserId,
    pub(crate) client_id: ClientId,
    pub(crate) user_level: AccessLevel,
    pub(crate) org_permissions: OrgPermissions,
    pub(crate) table_permissions: TablePermissions,
    pub(crate) column_permissions: ColumnPermissions,
    pub(crate) record_permissions: RecordPermissions,
    pub(crate) window_permissions: ElementPermissions,
    pub(crate) process_permissions: ElementPermissions,
    pub(crate) task_permissions: ElementPermissions,
    pub(crate) workflow_permissions: ElementPermissions,
    pub(crate) form_permissions: ElementPermissions,
    pub(crate) misc_permissions: GenericPermissions,
    pub(crate) constraints: Constraints,
    pub(crate) menu_info: MenuInfo,
    pub(crate) included: IncludesList,
}

impl RolePermissions {
    /// Returns the display name of the resolution (role name by default).
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the resolved role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the user the resolution applies to.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the client context of the resolution.
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Returns the effective access level.
    #[must_use]
    pub fn user_level(&self) -> AccessLevel {
        self.user_level
    }

    /// Returns organization access.
    #[must_use]
    pub fn org_permissions(&self) -> &OrgPermissions {
        &self.org_permissions
    }

    /// Returns table access.
    #[must_use]
    pub fn table_permissions(&self) -> &TablePermissions {
        &self.table_permissions
    }

    /// Returns table-column access.
    #[must_use]
    pub fn column_permissions(&self) -> &ColumnPermissions {
        &self.column_permissions
    }

    /// Returns record access.
    #[must_use]
    pub fn record_permissions(&self) -> &RecordPermissions {
        &self.record_permissions
    }

    /// Returns window access.
    #[must_use]
    pub fn window_permissions(&self) -> &ElementPermissions {
        &self.window_permissions
    }

    /// Returns process access.
    #[must_use]
    pub fn process_permissions(&self) -> &ElementPermissions {
        &self.process_permissions
    }

    /// Returns task access.
    #[must_use]
    pub fn task_permissions(&self) -> &ElementPermissions {
        &self.task_permissions
    }

    /// Returns workflow access.
    #[must_use]
    pub fn workflow_permissions(&self) -> &ElementPermissions {
        &self.workflow_permissions
    }

    /// Returns form access.
    #[must_use]
    pub fn form_permissions(&self) -> &ElementPermissions {
        &self.form_permissions
    }

    /// Returns element access for one client-scoped dimension.
    #[must_use]
    pub fn element_permissions(&self, kind: ElementKind) -> &ElementPermissions {
        match kind {
            ElementKind::Window => &self.window_permissions,
            ElementKind::Process => &self.process_permissions,
            ElementKind::Task => &self.task_permissions,
            ElementKind::Workflow => &self.workflow_permissions,
            ElementKind::Form => &self.form_permissions,
        }
    }

    /// Returns the misc feature grants.
    #[must_use]
    pub fn misc_permissions(&self) -> &GenericPermissions {
        &self.misc_permissions
    }

    /// Returns whether a named feature grant is present.
    pub fn has_permission(&self, name: &str) -> bool {
        self.misc_permissions.has_permission(name)
    }

    /// Returns the validation-rule bundle.
    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Returns the resolved menu tree.
    #[must_use]
    pub fn menu_info(&self) -> MenuInfo {
        self.menu_info
    }

    /// Returns the record of permission sets folded into this resolution.
    #[must_use]
    pub fn included(&self) -> &IncludesList {
        &self.included
    }
}
