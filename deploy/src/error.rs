use std::path::PathBuf;

use fuels::types::errors::Error as FuelsError;
use thiserror::Error;

use crate::plan::DeploymentStep;
use crate::sequencer::DeploymentResult;

/// Failure to resolve a compiled artifact on disk.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed ABI file {path}: {source}")]
    Abi {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{artifact} configurable {configurable} is {expected}, got a {given} argument")]
    ArgumentType {
        artifact: String,
        configurable: String,
        expected: String,
        given: &'static str,
    },
    #[error("{artifact} declares {declared} configurables but {given} arguments were given")]
    TooManyArguments {
        artifact: String,
        declared: usize,
        given: usize,
    },
}

/// Cause reported by a deployer for a single step.
#[derive(Debug, Error)]
pub enum DeployerError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Fuels(#[from] FuelsError),
    #[error("{0}")]
    Rejected(String),
}

/// A step whose deployment was rejected, with everything deployed before it.
#[derive(Debug)]
pub struct FailedDeployment {
    pub failed_index: usize,
    pub step: DeploymentStep,
    pub cause: DeployerError,
    pub completed: Vec<DeploymentResult>,
}

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("deployment plan has no steps")]
    EmptyPlan,
    #[error("step {step} refers to {reference}, which is not an earlier step")]
    UnresolvedReference {
        step: usize,
        reference: String,
        completed: Vec<DeploymentResult>,
    },
    #[error("step name {name} is used more than once")]
    DuplicateStep { name: String },
    #[error("previous run recorded {found} at step {index}, plan expects {expected}")]
    ResumeMismatch {
        index: usize,
        expected: String,
        found: String,
        completed: Vec<DeploymentResult>,
    },
    #[error(
        "step {} ({}) failed after {} completed deployments: {}",
        .0.failed_index,
        .0.step.artifact,
        .0.completed.len(),
        .0.cause
    )]
    DeploymentFailed(Box<FailedDeployment>),
}

impl DeploymentError {
    /// Results that reached the chain before the run stopped.
    pub fn completed(&self) -> &[DeploymentResult] {
        match self {
            DeploymentError::DeploymentFailed(failed) => &failed.completed,
            DeploymentError::UnresolvedReference { completed, .. }
            | DeploymentError::ResumeMismatch { completed, .. } => completed,
            DeploymentError::EmptyPlan | DeploymentError::DuplicateStep { .. } => &[],
        }
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed plan file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("plan file declares no migrations")]
    NoMigrations,
    #[error("unknown migration: {0}")]
    UnknownMigration(String),
    #[error("invalid {kind} literal {value}: {reason}")]
    InvalidLiteral {
        kind: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid migration {migration}: {source}")]
    Invalid {
        migration: String,
        #[source]
        source: DeploymentError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load .env file: {0}")]
    Env(#[from] dotenvy::Error),
    #[error("missing env var {0}")]
    Missing(&'static str),
    #[error("invalid env var {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to access report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("report entry {index} has invalid contract id {value}")]
    InvalidContractId { index: usize, value: String },
}

/// Everything that can stop a deployment run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error("network error: {0}")]
    Network(#[from] FuelsError),
}
