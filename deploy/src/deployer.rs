use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use fuels::core::codec::{ABIEncoder, EncoderConfig};
use fuels::core::traits::Tokenizable;
use fuels::core::Configurables;
use fuels::prelude::{Contract, ContractId, LoadConfiguration, TxPolicies, WalletUnlocked};
use fuels::types::Token;
use rand::Rng;
use tracing::{info, warn};

use crate::artifact::{ArtifactLoader, ArtifactReference, CompiledArtifact};
use crate::error::{ArtifactError, DeployerError, Error};
use crate::plan::{load_migrations, select_migration, Migration, Value};
use crate::report::DeploymentReport;
use crate::sequencer::{self, DeploymentResult};
use crate::shared::{config, get_wallet};

/// Publishes one compiled artifact and returns the id it was deployed at.
#[async_trait]
pub trait Deployer: Send {
    async fn deploy(
        &mut self,
        artifact: &ArtifactReference,
        args: &[Value],
    ) -> Result<ContractId, DeployerError>;
}

/// Deploys Forc artifacts with a funded wallet. Arguments are written into
/// the artifact's configurables, in the order the ABI declares them.
pub struct FuelDeployer {
    wallet: WalletUnlocked,
    loader: ArtifactLoader,
    tx_policies: TxPolicies,
}

impl FuelDeployer {
    pub fn new(wallet: WalletUnlocked, loader: ArtifactLoader) -> Self {
        Self {
            wallet,
            loader,
            tx_policies: TxPolicies::default(),
        }
    }

    pub fn with_tx_policies(mut self, tx_policies: TxPolicies) -> Self {
        self.tx_policies = tx_policies;
        self
    }
}

#[async_trait]
impl Deployer for FuelDeployer {
    async fn deploy(
        &mut self,
        artifact: &ArtifactReference,
        args: &[Value],
    ) -> Result<ContractId, DeployerError> {
        let compiled = self.loader.load(artifact)?;
        let configurables = configurables_for(&compiled, args)?;
        let salt: [u8; 32] = rand::thread_rng().gen();
        let id = Contract::load_from(
            &compiled.binary_path,
            LoadConfiguration::default().with_configurables(configurables),
        )?
        .with_salt(salt)
        .deploy(&self.wallet, self.tx_policies)
        .await?
        .into();
        Ok(id)
    }
}

fn token_of(value: &Value) -> Token {
    match value {
        Value::ContractId(id) => (*id).into_token(),
        Value::U64(v) => Token::U64(*v),
        Value::Bool(v) => Token::Bool(*v),
        Value::B256(bytes) => Token::B256(*bytes),
    }
}

/// Encodes `args[i]` into the i-th configurable slot of `artifact`. Every
/// argument must match the slot's declared type.
pub fn configurables_for(
    artifact: &CompiledArtifact,
    args: &[Value],
) -> Result<Configurables, DeployerError> {
    if args.len() > artifact.configurables.len() {
        return Err(ArtifactError::TooManyArguments {
            artifact: artifact.reference.name.clone(),
            declared: artifact.configurables.len(),
            given: args.len(),
        }
        .into());
    }
    if let Some((slot, value)) = artifact
        .configurables
        .iter()
        .zip(args)
        .find(|(slot, value)| !slot.accepts(value))
    {
        return Err(ArtifactError::ArgumentType {
            artifact: artifact.reference.name.clone(),
            configurable: slot.name.clone(),
            expected: slot.type_name.clone(),
            given: value.kind(),
        }
        .into());
    }
    let encoder = ABIEncoder::new(EncoderConfig::default());
    let offsets_with_data = artifact
        .configurables
        .iter()
        .zip(args)
        .map(|(slot, value)| -> Result<(u64, Vec<u8>), DeployerError> {
            Ok((slot.offset, encoder.encode(&[token_of(value)])?))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Configurables::new(offsets_with_data))
}

pub struct LocalDeployParams {
    pub deployer_wallet: WalletUnlocked,
    pub loader: ArtifactLoader,
    pub migration: Migration,
    pub completed: Vec<DeploymentResult>,
}

pub enum DeployTarget {
    Local(LocalDeployParams),
    OnChain,
}

/// Runs one migration end to end and returns its report. For on-chain runs
/// the report is written to the configured path whether or not the run
/// succeeded.
pub async fn deploy(target: DeployTarget) -> Result<DeploymentReport, Error> {
    match target {
        DeployTarget::Local(p) => {
            let mut deployer = FuelDeployer::new(p.deployer_wallet, p.loader);
            let (report, outcome) =
                run_migration(&p.migration, p.completed, &mut deployer, "local").await;
            outcome.map(|_| report)
        }
        DeployTarget::OnChain => {
            let config = config()?;
            let wallet = get_wallet(&config).await?;
            info!("Deployer wallet address: {}", wallet.address());

            let migration =
                select_migration(load_migrations(&config.plan_path)?, config.migration.as_deref())?;
            info!("Migration {} with {} steps", migration.name, migration.plan.len());

            let completed = match &config.resume_from {
                Some(path) => DeploymentReport::read_from(path)?.completed_results(&migration.plan)?,
                None => Vec::new(),
            };

            let loader = ArtifactLoader::new(&config.artifacts_dir, &config.build_profile);
            let mut deployer = FuelDeployer::new(wallet, loader);
            let (report, outcome) =
                run_migration(&migration, completed, &mut deployer, &config.fuel_url).await;
            persist_report(report, &config.report_path, outcome)
        }
    }
}

/// Writes `report` to `path`. A failed run keeps its deployment error even
/// when the write fails too; the write failure is only logged then.
pub fn persist_report(
    report: DeploymentReport,
    path: &Path,
    outcome: Result<(), Error>,
) -> Result<DeploymentReport, Error> {
    match (report.write_to(path), outcome) {
        (Ok(()), outcome) => {
            info!("Report written to {}", path.display());
            outcome.map(|_| report)
        }
        (Err(write_err), Err(err)) => {
            warn!("{}", write_err);
            Err(err)
        }
        (Err(write_err), Ok(())) => Err(write_err.into()),
    }
}

/// Runs the sequencer and always produces a report, so deployed addresses
/// survive a failure.
pub async fn run_migration<D>(
    migration: &Migration,
    completed: Vec<DeploymentResult>,
    deployer: &mut D,
    network: &str,
) -> (DeploymentReport, Result<(), Error>)
where
    D: Deployer + ?Sized,
{
    let started_at = Utc::now();
    match sequencer::resume(&migration.plan, completed, deployer).await {
        Ok(results) => {
            for result in &results {
                info!("{}: {:#x}", result.step.name, result.address);
            }
            let report =
                DeploymentReport::completed(&migration.name, network, started_at, &results);
            (report, Ok(()))
        }
        Err(err) => {
            for result in err.completed() {
                warn!("Already deployed {}: {:#x}", result.step.name, result.address);
            }
            let report = DeploymentReport::failed(&migration.name, network, started_at, &err);
            (report, Err(err.into()))
        }
    }
}
