//! Resolved authorization session.
//!
//! The back office checks permissions constantly (every guarded button and
//! route), so the session holds the principal together with the resolved
//! role → permission map and answers lookups without IO. It is passed
//! explicitly to whatever needs a check — there is no ambient global.
//!
//! Role grants can change while a session is live: the backend pushes a
//! `RolePermissionsUpdated` message (distributed in-process via the event
//! bus) and the session applies it, so the next lookup reflects the new
//! grants immediately.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{AuthzError, Permission, Principal, Role, authorize};

/// Notification that a role's granted permissions changed.
///
/// Published on the event bus by whichever component learns of the change;
/// every live [`Session`] holding that role applies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionsUpdated {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// An authenticated principal plus its resolved role grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    principal: Principal,
    role_permissions: HashMap<Role, Vec<Permission>>,
}

impl Session {
    pub fn new(principal: Principal, role_permissions: HashMap<Role, Vec<Permission>>) -> Self {
        Self {
            principal,
            role_permissions,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Check whether this session grants `required`.
    ///
    /// Grants come from the membership's explicit permissions (wildcard
    /// included) or from any of the principal's roles.
    pub fn has_permission(&self, required: &Permission) -> bool {
        if authorize(&self.principal, required).is_ok() {
            return true;
        }

        self.principal.membership.roles.iter().any(|role| {
            self.role_permissions
                .get(role)
                .is_some_and(|perms| perms.iter().any(|p| p.is_wildcard() || p == required))
        })
    }

    /// Like [`Self::has_permission`] but surfaces the denial.
    pub fn require(&self, required: &Permission) -> Result<(), AuthzError> {
        if self.has_permission(required) {
            Ok(())
        } else {
            tracing::warn!(permission = required.as_str(), "permission denied");
            Err(AuthzError::Forbidden(required.as_str().to_string()))
        }
    }

    /// Apply a pushed role update to the resolved map.
    ///
    /// Updates for roles this principal does not hold are still recorded:
    /// the resolved map is a cache of role grants, not of the principal's
    /// roles, and a later membership change may start using them.
    pub fn apply_role_update(&mut self, update: &RolePermissionsUpdated) {
        self.role_permissions
            .insert(update.role.clone(), update.permissions.clone());
    }
}
