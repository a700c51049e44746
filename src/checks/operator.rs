//! Operator checks.
//!
//! Inspect the installed operators' ClusterServiceVersions. Both checks skip
//! when the target has no CSVs.

use crate::engine::check::{Check, CheckContext, CheckFnError, Verdict};
use crate::engine::registry::Registry;
use crate::error::RegistryError;
use crate::target::{CsvPhase, TargetEnvironment};
use std::sync::Arc;

pub const GROUP: &str = "operator";

pub const INSTALL_STATUS_SUCCEEDED: &str = "operator-install-status-succeeded";
pub const NO_PRIVILEGES: &str = "operator-no-privileges";

pub const CHECK_IDS: [&str; 2] = [INSTALL_STATUS_SUCCEEDED, NO_PRIVILEGES];

const NO_CSVS_REASON: &str = "No CSVs to perform test, skipping.";

pub fn register(registry: &mut Registry, env: &Arc<TargetEnvironment>) -> Result<(), RegistryError> {
    let skip_env = Arc::clone(env);
    let check_env = Arc::clone(env);
    registry.add_check(
        Check::new(GROUP, INSTALL_STATUS_SUCCEEDED, move |ctx| {
            install_phase_succeeded(&check_env, ctx)
        })
        .with_labels(["common", INSTALL_STATUS_SUCCEEDED])
        .with_skip_check_fn(move || no_csvs(&skip_env)),
    )?;

    let skip_env = Arc::clone(env);
    let check_env = Arc::clone(env);
    registry.add_check(
        Check::new(GROUP, NO_PRIVILEGES, move |ctx| installed_without_privileges(&check_env, ctx))
            .with_labels(["common", NO_PRIVILEGES])
            .with_skip_check_fn(move || no_csvs(&skip_env)),
    )?;

    Ok(())
}

fn no_csvs(env: &TargetEnvironment) -> Option<String> {
    env.csvs.is_empty().then(|| NO_CSVS_REASON.to_string())
}

pub fn install_phase_succeeded(env: &TargetEnvironment, ctx: &mut CheckContext) -> Result<Verdict, CheckFnError> {
    let mut bad_csvs = Vec::new();
    for csv in &env.csvs {
        if csv.phase != CsvPhase::Succeeded {
            ctx.log(format!(
                "CSV {} (ns {}) is in phase {}. Expected phase is {}",
                csv.name,
                csv.namespace,
                csv.phase,
                CsvPhase::Succeeded
            ));
            bad_csvs.push(csv.qualified_name());
        }
    }

    if bad_csvs.is_empty() {
        Ok(Verdict::Pass)
    } else {
        Ok(Verdict::Fail(format!(
            "Found {} CSVs whose phase is not {}.",
            bad_csvs.len(),
            CsvPhase::Succeeded
        )))
    }
}

pub fn installed_without_privileges(env: &TargetEnvironment, ctx: &mut CheckContext) -> Result<Verdict, CheckFnError> {
    let mut bad_csvs = Vec::new();
    for csv in &env.csvs {
        if csv.cluster_permissions.is_empty() {
            tracing::debug!(csv = %csv.name, namespace = %csv.namespace, "no clusterPermissions found");
            continue;
        }
        if let Some(n) = csv.privileged_resource_names() {
            ctx.log(format!(
                "CSV {} (ns {}) has cluster permissions on {} resource names.",
                csv.name, csv.namespace, n
            ));
            bad_csvs.push(csv.qualified_name());
        }
    }

    if bad_csvs.is_empty() {
        Ok(Verdict::Pass)
    } else {
        Ok(Verdict::Fail(format!(
            "Found {} CSVs with privileges on some resource names.",
            bad_csvs.len()
        )))
    }
}
