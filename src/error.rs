//! Error types for certcheck operations.
//!
//! Check outcomes (failed, skipped, errored checks) are never errors here;
//! they are recorded results. These types cover the engine itself.

use crate::engine::runner::RunReport;
use std::path::PathBuf;
use thiserror::Error;

/// Registration-time failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("check {check_id} is already registered")]
    DuplicateCheck { check_id: String },
    #[error("group {group} is already registered")]
    DuplicateGroup { group: String },
}

/// Failure of a group's own execution machinery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("group {group}: before-all hook failed: {reason}")]
    BeforeAll { group: String, reason: String },
    #[error("group {group}: after-all hook failed: {reason}")]
    AfterAll { group: String, reason: String },
    #[error("group {group}: check {check_id} panicked")]
    CheckPanicked { group: String, check_id: String },
    #[error("group {group}: execution task failed: {message}")]
    Task { group: String, message: String },
}

/// Catalog integrity violations found while recording results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("check {check_id} has no corresponding claim id")]
    MissingClaimId { check_id: String },
    #[error("catalog lookup failed for check {check_id} (claim id {claim_id})")]
    MissingCatalogEntry { check_id: String, claim_id: String },
}

/// One entry of a run's aggregate error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunFailure {
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Aggregate error returned by a run that hit group or recording failures.
/// The report is still complete: every group was visited and reported.
#[derive(Debug, Error)]
#[error("{} errors found in checks/groups", .failures.len())]
pub struct RunError {
    pub failures: Vec<RunFailure>,
    pub report: RunReport,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("failed to read target environment {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse target environment {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
