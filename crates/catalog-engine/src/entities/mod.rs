//! The seven entities of the policy catalog.
//!
//! Every entity carries a stable opaque string identifier, creation and
//! last-modification timestamps, an optional deletion timestamp and
//! deleter identifier (soft-delete), and a monotonically non-decreasing
//! `version` integer. Resource and Action form leaves; Role references
//! Permission only indirectly through RolePermission.

pub mod action;
pub mod permission;
pub mod resource;
pub mod role;
pub mod role_permission;
pub mod service_role_mapping;
pub mod user_role;

pub use action::Action;
pub use permission::Permission;
pub use resource::Resource;
pub use role::{Role, RoleScope};
pub use role_permission::RolePermission;
pub use service_role_mapping::ServiceRoleMapping;
pub use user_role::UserRole;
