//! JSON record of a deployment run.
//!
//! A report is written after every on-chain run. When a run stops part way,
//! the report of that run can be fed back through `RESUME_FROM` so the steps
//! already on chain are not deployed again.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use fuels::prelude::ContractId;
use serde::{Deserialize, Serialize};

use crate::error::{DeploymentError, ReportError};
use crate::plan::{DeploymentPlan, DeploymentStep};
use crate::sequencer::DeploymentResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed { failed_index: usize, cause: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub index: usize,
    pub name: String,
    pub artifact: String,
    pub contract_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub migration: String,
    pub network: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: RunStatus,
    pub contracts: Vec<ReportEntry>,
}

impl DeploymentReport {
    pub fn completed(
        migration: &str,
        network: &str,
        started_at: DateTime<Utc>,
        results: &[DeploymentResult],
    ) -> Self {
        Self::new(migration, network, started_at, RunStatus::Completed, results)
    }

    pub fn failed(
        migration: &str,
        network: &str,
        started_at: DateTime<Utc>,
        err: &DeploymentError,
    ) -> Self {
        let failed_index = match err {
            DeploymentError::DeploymentFailed(failed) => failed.failed_index,
            DeploymentError::UnresolvedReference { step, .. } => *step,
            DeploymentError::ResumeMismatch { index, .. } => *index,
            DeploymentError::EmptyPlan | DeploymentError::DuplicateStep { .. } => 0,
        };
        let status = RunStatus::Failed {
            failed_index,
            cause: err.to_string(),
        };
        Self::new(migration, network, started_at, status, err.completed())
    }

    fn new(
        migration: &str,
        network: &str,
        started_at: DateTime<Utc>,
        status: RunStatus,
        results: &[DeploymentResult],
    ) -> Self {
        Self {
            migration: migration.to_string(),
            network: network.to_string(),
            started_at,
            finished_at: Utc::now(),
            status,
            contracts: results
                .iter()
                .map(|r| ReportEntry {
                    index: r.index,
                    name: r.step.name.clone(),
                    artifact: r.step.artifact.name.clone(),
                    contract_id: format!("{:#x}", r.address),
                })
                .collect(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn contract_id(&self, name: &str) -> Option<ContractId> {
        self.contracts
            .iter()
            .find(|entry| entry.name == name)
            .and_then(|entry| ContractId::from_str(&entry.contract_id).ok())
    }

    /// Turns the recorded contracts back into sequencer results for `plan`.
    /// Entries are matched to plan steps by index; the sequencer checks that
    /// names line up before resuming.
    pub fn completed_results(
        &self,
        plan: &DeploymentPlan,
    ) -> Result<Vec<DeploymentResult>, ReportError> {
        self.contracts
            .iter()
            .map(|entry| -> Result<DeploymentResult, ReportError> {
                let address = ContractId::from_str(&entry.contract_id).map_err(|_| {
                    ReportError::InvalidContractId {
                        index: entry.index,
                        value: entry.contract_id.clone(),
                    }
                })?;
                let step = plan
                    .steps()
                    .get(entry.index)
                    .filter(|step| step.name == entry.name)
                    .cloned()
                    // The recorded contract is on chain but not part of this plan at
                    // this index. Keep its recorded identity so the sequencer rejects
                    // the resume and still reports the address.
                    .unwrap_or_else(|| {
                        DeploymentStep::new(entry.artifact.clone(), vec![]).named(entry.name.clone())
                    });
                Ok(DeploymentResult {
                    index: entry.index,
                    step,
                    address,
                })
            })
            .collect()
    }

    pub fn read_from(path: &Path) -> Result<Self, ReportError> {
        let raw = fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
