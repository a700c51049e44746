//! Target environment snapshot.
//!
//! Checks inspect a snapshot of the target system rather than talking to it
//! directly; the snapshot is loaded from JSON once before the run. Only the
//! objects the bundled checks inspect are modelled and unknown fields are
//! ignored.

use crate::error::TargetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Operator install phase as reported by OLM.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CsvPhase {
    Pending,
    InstallReady,
    Installing,
    Succeeded,
    Failed,
    Replacing,
    Deleting,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for CsvPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default)]
    pub resource_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPermission {
    #[serde(default)]
    pub service_account_name: String,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// ClusterServiceVersion of an installed operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Csv {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub phase: CsvPhase,
    #[serde(default)]
    pub cluster_permissions: Vec<ClusterPermission>,
}

impl Csv {
    /// `namespace.name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Resource-name count of the first cluster permission rule that names
    /// any resources.
    pub fn privileged_resource_names(&self) -> Option<usize> {
        self.cluster_permissions
            .iter()
            .flat_map(|permission| permission.rules.iter())
            .map(|rule| rule.resource_names.len())
            .find(|&n| n > 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEnvironment {
    #[serde(default)]
    pub csvs: Vec<Csv>,
}

impl TargetEnvironment {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, TargetError> {
        let content = std::fs::read_to_string(path).map_err(|source| TargetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| TargetError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
