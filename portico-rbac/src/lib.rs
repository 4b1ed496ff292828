//! Declarative access control for the Portico control plane
//!
//! Permissions are declared per role as `{action, resource_type,
//! allowed_resource_criteria}` entries. Criteria are OR'd; the predicates
//! inside one criterion are AND'd. The resolver core is pure: it evaluates
//! a [`Principal`] against a [`Resource`] snapshot. The `access` module
//! binds it to the storage layer for lazy resource lookup and the
//! allowed-team intersection check.

pub mod access;
pub mod acl;
pub mod definitions;
pub mod error;
pub mod resolver;

pub use access::{
    check_configuration_accessibility, is_action_permitted_by_id, load_resource,
    resource_from_configuration,
};
pub use acl::{default_acl, Acl, AclBuilder};
pub use definitions::{Action, AllowedResourceCriterion, Permission, Resource, ResourceScope};
pub use error::{RbacError, RbacResult};
pub use resolver::{is_action_permitted, Principal};
