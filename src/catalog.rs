//! Static check metadata.
//!
//! Maps a check identity to its claim identity, and a claim identity to the
//! documentation and classification carried into every result record.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub const EXTENDED: &str = "Extended";
pub const FAR_EDGE: &str = "FarEdge";
pub const NON_TELCO: &str = "NonTelco";
pub const TELCO: &str = "Telco";

pub const MANDATORY: &str = "Mandatory";
pub const OPTIONAL: &str = "Optional";

/// External identity of a check in the claim document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimId {
    pub id: String,
    pub suite: String,
    #[serde(default)]
    pub tags: String,
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.suite, self.id)
    }
}

/// Documentation and classification for one claim identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub description: String,
    #[serde(default)]
    pub remediation: String,
    #[serde(default)]
    pub best_practice_reference: String,
    #[serde(default)]
    pub exception_process: String,
    /// Scenario name (`Extended`, `FarEdge`, `NonTelco`, `Telco`) to
    /// `Mandatory`/`Optional`.
    #[serde(default)]
    pub category_classification: BTreeMap<String, String>,
}

impl CatalogEntry {
    pub fn classification(&self, scenario: &str) -> String {
        self.category_classification
            .get(scenario)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFileEntry {
    check_id: String,
    claim_id: ClaimId,
    #[serde(flatten)]
    entry: CatalogEntry,
}

/// Lookup tables keyed by check identity and claim identity.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    claim_ids: BTreeMap<String, ClaimId>,
    entries: BTreeMap<ClaimId, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `check_id` to `claim_id` and store `entry` under it.
    pub fn insert(&mut self, check_id: impl Into<String>, claim_id: ClaimId, entry: CatalogEntry) {
        self.claim_ids.insert(check_id.into(), claim_id.clone());
        self.entries.insert(claim_id, entry);
    }

    /// Claim identity registered for `check_id`.
    pub fn claim_id(&self, check_id: &str) -> Option<&ClaimId> {
        self.claim_ids.get(check_id)
    }

    /// Documentation and classification for `claim_id`.
    pub fn entry(&self, claim_id: &ClaimId) -> Option<&CatalogEntry> {
        self.entries.get(claim_id)
    }

    pub fn len(&self) -> usize {
        self.claim_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claim_ids.is_empty()
    }

    /// Merge `other` into `self`; entries in `other` win. A claim id that
    /// no check maps to any more loses its entry.
    pub fn extend(&mut self, other: Catalog) {
        for (check_id, claim_id) in other.claim_ids {
            let Some(previous) = self.claim_ids.insert(check_id, claim_id.clone()) else {
                continue;
            };
            if previous != claim_id && !self.claim_ids.values().any(|id| *id == previous) {
                self.entries.remove(&previous);
            }
        }
        self.entries.extend(other.entries);
    }

    /// Parse a JSON array of `{check_id, claim_id, description, ...}`.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let file_entries: Vec<CatalogFileEntry> = serde_json::from_str(json)?;
        let mut catalog = Catalog::new();
        for item in file_entries {
            catalog.insert(item.check_id, item.claim_id, item.entry);
        }
        Ok(catalog)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Entries for the bundled check groups.
    pub fn builtin() -> Self {
        let mut catalog = Catalog::new();
        let classification = |telco: &str| {
            BTreeMap::from([
                (EXTENDED.to_string(), MANDATORY.to_string()),
                (FAR_EDGE.to_string(), MANDATORY.to_string()),
                (NON_TELCO.to_string(), MANDATORY.to_string()),
                (TELCO.to_string(), telco.to_string()),
            ])
        };

        catalog.insert(
            crate::checks::operator::INSTALL_STATUS_SUCCEEDED,
            ClaimId {
                id: crate::checks::operator::INSTALL_STATUS_SUCCEEDED.to_string(),
                suite: crate::checks::operator::GROUP.to_string(),
                tags: "common".to_string(),
            },
            CatalogEntry {
                description: "Ensures that the target CNF operators report \"Succeeded\" as their installation status.".to_string(),
                remediation: "Make sure all the CNF operators have been successfully installed by OLM.".to_string(),
                best_practice_reference: "https://redhat-best-practices-for-k8s.github.io/guide/#k8s-best-practices-cnf-operator-requirements".to_string(),
                exception_process: "No exceptions".to_string(),
                category_classification: classification(MANDATORY),
            },
        );
        catalog.insert(
            crate::checks::operator::NO_PRIVILEGES,
            ClaimId {
                id: crate::checks::operator::NO_PRIVILEGES.to_string(),
                suite: crate::checks::operator::GROUP.to_string(),
                tags: "common".to_string(),
            },
            CatalogEntry {
                description: "The operator is not installed with privileged rights. Test passes if clusterPermissions is not present in the CSV manifest or is present with no resourceNames under its rules.".to_string(),
                remediation: "Ensure all the CNF operators have no privileges on cluster resources.".to_string(),
                best_practice_reference: "https://redhat-best-practices-for-k8s.github.io/guide/#k8s-best-practices-cnf-operator-requirements".to_string(),
                exception_process: "No exceptions".to_string(),
                category_classification: classification(MANDATORY),
            },
        );
        catalog
    }
}
