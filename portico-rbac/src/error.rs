//! RBAC error types

use thiserror::Error;

pub type RbacResult<T> = Result<T, RbacError>;

#[derive(Error, Debug)]
pub enum RbacError {
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    #[error("Ambiguous resource reference: pass either a resource or a resource id, not both")]
    AmbiguousResource,

    #[error("Duplicate action {0} declared for one role")]
    DuplicateAction(String),

    #[error("Storage error during access check: {0}")]
    Storage(#[from] portico_storage::StorageError),
}
