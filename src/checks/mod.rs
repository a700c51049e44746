//! Bundled check groups.
//!
//! Each submodule registers its checks into a [`Registry`] against a shared
//! [`TargetEnvironment`] snapshot, and has matching entries in
//! [`Catalog::builtin`](crate::catalog::Catalog::builtin).

pub mod operator;

use crate::engine::registry::Registry;
use crate::error::RegistryError;
use crate::target::TargetEnvironment;
use std::sync::Arc;

/// Register every bundled check.
pub fn register_all(registry: &mut Registry, env: &Arc<TargetEnvironment>) -> Result<(), RegistryError> {
    operator::register(registry, env)?;
    Ok(())
}

/// `(group, check id)` of every bundled check, in registration order.
pub fn list_checks() -> Vec<(&'static str, &'static str)> {
    operator::CHECK_IDS
        .iter()
        .map(|id| (operator::GROUP, *id))
        .collect()
}
