//! `backstock-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP, cookies and storage.
//! Token validation and the transport that delivers permission updates are
//! external collaborators; what lives here is the decision logic.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod session;

pub use authorize::{AuthzError, authorize};
pub use permissions::Permission;
pub use principal::{BranchMembership, Principal, PrincipalId};
pub use roles::Role;
pub use session::{RolePermissionsUpdated, Session};
