//! Permission model and checking

pub mod checker;
pub mod models;

pub use checker::{PermissionChecker, PermissionOutcome};
pub use models::{Context, Permission, Scheme};
