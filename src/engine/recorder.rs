//! Result recording.
//!
//! Turns a finished check into its claim-shaped [`ResultRecord`], enriched
//! with catalog metadata, and keeps one record per check identity.

use crate::catalog::{Catalog, ClaimId, EXTENDED, FAR_EDGE, NON_TELCO, TELCO};
use crate::engine::check::CheckSnapshot;
use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryClassification {
    #[serde(rename = "Extended")]
    pub extended: String,
    #[serde(rename = "FarEdge")]
    pub far_edge: String,
    #[serde(rename = "NonTelco")]
    pub non_telco: String,
    #[serde(rename = "Telco")]
    pub telco: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogInfo {
    pub description: String,
    pub remediation: String,
    pub best_practice_reference: String,
    pub exception_process: String,
}

/// Per-check result document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    #[serde(rename = "testID")]
    pub test_id: ClaimId,
    pub state: String,
    pub start_time: String,
    pub end_time: String,
    /// Whole seconds.
    pub duration: i64,
    pub failure_reason: String,
    pub captured_test_output: String,
    pub category_classification: CategoryClassification,
    pub catalog_info: CatalogInfo,
}

/// Shared store of result records plus the catalog used to build them.
#[derive(Debug, Clone)]
pub struct ResultRecorder {
    catalog: Arc<Catalog>,
    store: Arc<Mutex<BTreeMap<String, ResultRecord>>>,
}

impl ResultRecorder {
    /// Empty store enriching records from `catalog`.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        ResultRecorder {
            catalog,
            store: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ResultRecord>> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Build and store the record for `check`, overwriting any previous one.
    pub fn record_check_result(&self, check: &CheckSnapshot) -> Result<(), RecordError> {
        let record = build_record(&self.catalog, check)?;
        tracing::info!(
            check_id = %check.id,
            state = %check.state.result,
            claim_id = %record.test_id,
            "recording check result"
        );
        self.lock().insert(check.id.clone(), record);
        Ok(())
    }

    /// Record for `check_id`, if one was stored.
    pub fn get(&self, check_id: &str) -> Option<ResultRecord> {
        self.lock().get(check_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every stored record.
    pub fn snapshot(&self) -> BTreeMap<String, ResultRecord> {
        self.lock().clone()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    /// Results as a JSON object keyed by check identity, for embedding in a
    /// claim document.
    pub fn reconciled_results(&self) -> serde_json::Map<String, serde_json::Value> {
        self.lock()
            .iter()
            .filter_map(|(check_id, record)| {
                serde_json::to_value(record)
                    .ok()
                    .map(|value| (check_id.clone(), value))
            })
            .collect()
    }
}

fn build_record(catalog: &Catalog, check: &CheckSnapshot) -> Result<ResultRecord, RecordError> {
    let claim_id = catalog
        .claim_id(&check.id)
        .ok_or_else(|| RecordError::MissingClaimId {
            check_id: check.id.clone(),
        })?;
    let entry = catalog
        .entry(claim_id)
        .ok_or_else(|| RecordError::MissingCatalogEntry {
            check_id: check.id.clone(),
            claim_id: claim_id.to_string(),
        })?;

    let state = &check.state;
    Ok(ResultRecord {
        test_id: claim_id.clone(),
        state: state.result.to_string(),
        start_time: state.start_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
        end_time: state.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
        duration: check.duration_secs(),
        failure_reason: state.failure_reason.clone(),
        captured_test_output: state.captured_output.clone(),
        category_classification: CategoryClassification {
            extended: entry.classification(EXTENDED),
            far_edge: entry.classification(FAR_EDGE),
            non_telco: entry.classification(NON_TELCO),
            telco: entry.classification(TELCO),
        },
        catalog_info: CatalogInfo {
            description: entry.description.clone(),
            remediation: entry.remediation.clone(),
            best_practice_reference: entry.best_practice_reference.clone(),
            exception_process: entry.exception_process.clone(),
        },
    })
}
