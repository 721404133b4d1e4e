//! Deployment plans and the JSON plan file they are loaded from.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use fuels::prelude::ContractId;
use serde::Deserialize;

use crate::artifact::ArtifactReference;
use crate::error::{DeploymentError, PlanError};

/// A literal constructor argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    ContractId(ContractId),
    U64(u64),
    Bool(bool),
    B256([u8; 32]),
}

impl Value {
    /// Name of the variant, as written in plan files.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::ContractId(_) => "contract_id",
            Value::U64(_) => "u64",
            Value::Bool(_) => "bool",
            Value::B256(_) => "b256",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ContractId(id) => write!(f, "{:#x}", id),
            Value::U64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::B256(bytes) => {
                f.write_str("0x")?;
                bytes.iter().try_for_each(|b| write!(f, "{:02x}", b))
            }
        }
    }
}

/// Reference to the address produced by an earlier step of the same plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StepRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepRef::Index(i) => write!(f, "step #{}", i),
            StepRef::Name(name) => write!(f, "step {:?}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArg {
    Literal(Value),
    Prior(StepRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStep {
    pub name: String,
    pub artifact: ArtifactReference,
    pub args: Vec<StepArg>,
}

impl DeploymentStep {
    /// A step named after its artifact.
    pub fn new(artifact: impl Into<String>, args: Vec<StepArg>) -> Self {
        let artifact = ArtifactReference::new(artifact);
        Self {
            name: artifact.name.clone(),
            artifact,
            args,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A validated, immutable sequence of deployment steps.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    steps: Vec<DeploymentStep>,
}

impl DeploymentPlan {
    /// Rejects empty plans, duplicate step names and any reference that does
    /// not point at a strictly earlier step.
    pub fn new(steps: Vec<DeploymentStep>) -> Result<Self, DeploymentError> {
        if steps.is_empty() {
            return Err(DeploymentError::EmptyPlan);
        }
        let mut names = HashSet::new();
        for (index, step) in steps.iter().enumerate() {
            for arg in &step.args {
                if let StepArg::Prior(reference) = arg {
                    if position_of(&steps[..index], reference).is_none() {
                        return Err(DeploymentError::UnresolvedReference {
                            step: index,
                            reference: reference.to_string(),
                            completed: Vec::new(),
                        });
                    }
                }
            }
            if !names.insert(step.name.as_str()) {
                return Err(DeploymentError::DuplicateStep {
                    name: step.name.clone(),
                });
            }
        }
        Ok(Self { steps })
    }

    #[cfg(test)]
    pub(crate) fn unchecked(steps: Vec<DeploymentStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[DeploymentStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Index of the step `reference` points at within `earlier`, if any.
fn position_of(earlier: &[DeploymentStep], reference: &StepRef) -> Option<usize> {
    match reference {
        StepRef::Index(i) => (*i < earlier.len()).then_some(*i),
        StepRef::Name(name) => earlier.iter().position(|s| &s.name == name),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ArgDecl {
    Step(StepRef),
    ContractId(String),
    U64(u64),
    Bool(bool),
    B256(String),
}

#[derive(Debug, Deserialize)]
struct StepDecl {
    name: Option<String>,
    artifact: String,
    #[serde(default)]
    args: Vec<ArgDecl>,
}

#[derive(Debug, Deserialize)]
struct MigrationDecl {
    name: String,
    steps: Vec<StepDecl>,
}

#[derive(Debug, Deserialize)]
struct PlanFile {
    migrations: Vec<MigrationDecl>,
}

/// A named deployment plan; one plan file may hold several alternatives.
#[derive(Debug, Clone)]
pub struct Migration {
    pub name: String,
    pub plan: DeploymentPlan,
}

pub fn load_migrations(path: &Path) -> Result<Vec<Migration>, PlanError> {
    let raw = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_migrations(&raw)
}

pub fn parse_migrations(raw: &str) -> Result<Vec<Migration>, PlanError> {
    let file: PlanFile = serde_json::from_str(raw)?;
    if file.migrations.is_empty() {
        return Err(PlanError::NoMigrations);
    }
    file.migrations
        .into_iter()
        .map(|decl| -> Result<Migration, PlanError> {
            let steps = decl
                .steps
                .into_iter()
                .map(step_from_decl)
                .collect::<Result<Vec<_>, _>>()?;
            let plan = DeploymentPlan::new(steps).map_err(|source| PlanError::Invalid {
                migration: decl.name.clone(),
                source,
            })?;
            Ok(Migration {
                name: decl.name,
                plan,
            })
        })
        .collect()
}

/// Picks `name`, or the first migration when no name is given.
pub fn select_migration(
    migrations: Vec<Migration>,
    name: Option<&str>,
) -> Result<Migration, PlanError> {
    match name {
        Some(name) => migrations
            .into_iter()
            .find(|m| m.name == name)
            .ok_or_else(|| PlanError::UnknownMigration(name.to_string())),
        None => migrations.into_iter().next().ok_or(PlanError::NoMigrations),
    }
}

fn step_from_decl(decl: StepDecl) -> Result<DeploymentStep, PlanError> {
    let args = decl
        .args
        .into_iter()
        .map(arg_from_decl)
        .collect::<Result<Vec<_>, _>>()?;
    let step = DeploymentStep::new(decl.artifact, args);
    Ok(match decl.name {
        Some(name) => step.named(name),
        None => step,
    })
}

fn arg_from_decl(decl: ArgDecl) -> Result<StepArg, PlanError> {
    let value = match decl {
        ArgDecl::Step(reference) => return Ok(StepArg::Prior(reference)),
        ArgDecl::ContractId(raw) => {
            let id = ContractId::from_str(&raw).map_err(|reason| PlanError::InvalidLiteral {
                kind: "contract_id",
                value: raw.clone(),
                reason: reason.to_string(),
            })?;
            Value::ContractId(id)
        }
        ArgDecl::U64(v) => Value::U64(v),
        ArgDecl::Bool(v) => Value::Bool(v),
        ArgDecl::B256(raw) => Value::B256(parse_b256(&raw)?),
    };
    Ok(StepArg::Literal(value))
}

fn parse_b256(raw: &str) -> Result<[u8; 32], PlanError> {
    let invalid = |reason: &str| PlanError::InvalidLiteral {
        kind: "b256",
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    if hex.len() != 64 || !hex.is_ascii() {
        return Err(invalid("expected 32 hex-encoded bytes"));
    }
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| invalid("not a hex string"))?;
    }
    Ok(bytes)
}
