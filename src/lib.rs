//! certcheck library
//!
//! Compliance-check execution engine. Runs a registry of named checks,
//! grouped by category, against a target environment; enforces a global
//! deadline and operator interrupts; and records one claim-shaped result per
//! check.
//!
//! # Example
//!
//! ```no_run
//! use certcheck::catalog::Catalog;
//! use certcheck::engine::check::{Check, Verdict};
//! use certcheck::engine::registry::Registry;
//! use certcheck::engine::runner::Runner;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = Registry::new();
//! registry.add_check(Check::new("networking", "networking-icmp-v4", |ctx| {
//!     ctx.log("pinging pods");
//!     Ok(Verdict::Pass)
//! }))?;
//!
//! let runner = Runner::new(registry, Catalog::builtin());
//! let report = runner.run_checks("", Duration::from_secs(600)).await?;
//! println!("{:?}", report.summary.counts("networking"));
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod target;
pub mod version;

pub use catalog::{Catalog, CatalogEntry, ClaimId};
pub use config::EngineConfig;
pub use engine::check::{Check, CheckContext, CheckResult, Verdict};
pub use engine::group::ChecksGroup;
pub use engine::interrupt::{AbortReason, CancellationToken, InterruptHandle, Interrupts};
pub use engine::recorder::ResultRecord;
pub use engine::registry::Registry;
pub use engine::runner::{Reporter, RunReport, Runner};
pub use engine::summary::{FailedCheckLog, ResultsSummary};
pub use error::{GroupError, RecordError, RegistryError, RunError, RunFailure};
