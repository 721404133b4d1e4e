//! Strictly ordered execution of a deployment plan.
//!
//! Steps are deployed one at a time in declaration order. A step starts only
//! after the previous deployment was confirmed, because its arguments may
//! carry the address that deployment produced. The first failure stops the
//! run; contracts deployed before it stay on chain and are handed back in the
//! error so the operator can resume instead of redeploying them.

use fuels::prelude::ContractId;
use tracing::{error, info};

use crate::deployer::Deployer;
use crate::error::{DeploymentError, FailedDeployment};
use crate::plan::{DeploymentPlan, DeploymentStep, StepArg, StepRef, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    pub index: usize,
    pub step: DeploymentStep,
    pub address: ContractId,
}

pub async fn run<D>(
    plan: &DeploymentPlan,
    deployer: &mut D,
) -> Result<Vec<DeploymentResult>, DeploymentError>
where
    D: Deployer + ?Sized,
{
    resume(plan, Vec::new(), deployer).await
}

/// Continues `plan` after the steps recorded in `completed`, which must be a
/// prefix of the plan.
pub async fn resume<D>(
    plan: &DeploymentPlan,
    completed: Vec<DeploymentResult>,
    deployer: &mut D,
) -> Result<Vec<DeploymentResult>, DeploymentError>
where
    D: Deployer + ?Sized,
{
    let mut completed = check_prefix(plan, completed)?;
    if !completed.is_empty() {
        info!("Resuming after {} deployed steps", completed.len());
    }

    for (index, step) in plan.steps().iter().enumerate().skip(completed.len()) {
        let args = match resolve_args(index, step, &completed) {
            Ok(args) => args,
            Err(reference) => {
                error!("Step {} refers to {}, which has not been deployed", step.name, reference);
                return Err(DeploymentError::UnresolvedReference {
                    step: index,
                    reference: reference.to_string(),
                    completed,
                });
            }
        };
        info!("Deploying {} ({}/{})...", step.artifact, index + 1, plan.len());
        match deployer.deploy(&step.artifact, &args).await {
            Ok(address) => {
                info!("{} deployed at {:#x}", step.name, address);
                completed.push(DeploymentResult {
                    index,
                    step: step.clone(),
                    address,
                });
            }
            Err(cause) => {
                error!("Deployment of {} failed: {}", step.name, cause);
                return Err(DeploymentError::DeploymentFailed(Box::new(FailedDeployment {
                    failed_index: index,
                    step: step.clone(),
                    cause,
                    completed,
                })));
            }
        }
    }
    Ok(completed)
}

/// Hands `completed` back when it is a prefix of `plan`. On mismatch the
/// error still carries it, since those contracts are on chain either way.
fn check_prefix(
    plan: &DeploymentPlan,
    completed: Vec<DeploymentResult>,
) -> Result<Vec<DeploymentResult>, DeploymentError> {
    let mismatch = completed.iter().enumerate().find_map(|(index, result)| {
        let expected = plan.steps().get(index);
        let matches = result.index == index
            && expected.map_or(false, |step| {
                step.name == result.step.name && step.artifact == result.step.artifact
            });
        (!matches).then(|| {
            (
                index,
                expected.map_or_else(|| "no step".to_string(), |s| s.name.clone()),
                result.step.name.clone(),
            )
        })
    });
    match mismatch {
        Some((index, expected, found)) => Err(DeploymentError::ResumeMismatch {
            index,
            expected,
            found,
            completed,
        }),
        None => Ok(completed),
    }
}

/// Substitutes every prior-step reference with the address that step
/// produced, or returns the first reference that has no result yet.
fn resolve_args<'a>(
    index: usize,
    step: &'a DeploymentStep,
    completed: &[DeploymentResult],
) -> Result<Vec<Value>, &'a StepRef> {
    step.args
        .iter()
        .map(|arg| match arg {
            StepArg::Literal(value) => Ok(*value),
            StepArg::Prior(reference) => {
                let position = match reference {
                    StepRef::Index(i) => Some(*i),
                    StepRef::Name(name) => completed.iter().position(|r| &r.step.name == name),
                };
                position
                    .filter(|&position| position < index)
                    .and_then(|position| completed.get(position))
                    .map(|result| Value::ContractId(result.address))
                    .ok_or(reference)
            }
        })
        .collect()
}
