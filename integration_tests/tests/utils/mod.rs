use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use deploy::artifact::ArtifactReference;
use deploy::error::DeployerError;
use deploy::plan::Value;
use fuels::prelude::*;
use maplit::hashmap;
use rand::Rng;

pub const FILM_RENTAL_SERVICE: &str = "FilmRentalService";
pub const EBOOK_DOWNLOAD_SERVICE: &str = "EBookDownloadService";
pub const SERVICE_PROVIDER: &str = "ServiceProvider";

pub const PLAN: &str = r#"{
    "migrations": [
        {
            "name": "2_deploy_contracts",
            "steps": [
                { "artifact": "FilmRentalService" },
                { "artifact": "EBookDownloadService" }
            ]
        },
        {
            "name": "2_deploy_service_provider",
            "steps": [
                { "artifact": "FilmRentalService" },
                { "artifact": "ServiceProvider", "args": [ { "step": 0 } ] }
            ]
        }
    ]
}"#;

pub fn address_of(artifact: &str) -> ContractId {
    let n: u8 = match artifact {
        FILM_RENTAL_SERVICE => 0xa1,
        EBOOK_DOWNLOAD_SERVICE => 0xa2,
        SERVICE_PROVIDER => 0xa3,
        _ => 0xff,
    };
    ContractId::from([n; 32])
}

/// Stand-in for a network: records every call and fails on request.
pub struct FakeDeployer {
    pub calls: Vec<(String, Vec<Value>)>,
    addresses: HashMap<&'static str, ContractId>,
    failures: HashMap<&'static str, &'static str>,
}

impl FakeDeployer {
    pub fn new() -> Self {
        Self {
            calls: vec![],
            addresses: hashmap! {
                FILM_RENTAL_SERVICE => address_of(FILM_RENTAL_SERVICE),
                EBOOK_DOWNLOAD_SERVICE => address_of(EBOOK_DOWNLOAD_SERVICE),
                SERVICE_PROVIDER => address_of(SERVICE_PROVIDER),
            },
            failures: HashMap::new(),
        }
    }

    pub fn failing(artifact: &'static str, cause: &'static str) -> Self {
        let mut deployer = Self::new();
        deployer.failures = hashmap! { artifact => cause };
        deployer
    }

    pub fn deployed(&self) -> Vec<&str> {
        self.calls.iter().map(|(name, _)| name.as_str()).collect()
    }
}

#[async_trait]
impl deploy::deployer::Deployer for FakeDeployer {
    async fn deploy(
        &mut self,
        artifact: &ArtifactReference,
        args: &[Value],
    ) -> std::result::Result<ContractId, DeployerError> {
        self.calls.push((artifact.name.clone(), args.to_vec()));
        if let Some(cause) = self.failures.get(artifact.name.as_str()) {
            return Err(DeployerError::Rejected(cause.to_string()));
        }
        Ok(self
            .addresses
            .get(artifact.name.as_str())
            .copied()
            .unwrap_or_else(|| address_of(&artifact.name)))
    }
}

/// Fresh directory under the system temp dir.
pub fn scratch_dir(prefix: &str) -> PathBuf {
    let mut rng = rand::thread_rng();
    let dir = std::env::temp_dir().join(format!("{}-{:016x}", prefix, rng.gen::<u64>()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Lays out a Forc-style artifact with the given ABI configurables.
pub fn write_artifact(root: &Path, name: &str, configurables: &[(&str, &str, u64)]) {
    let out = root.join(name).join("out").join("release");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join(format!("{}.bin", name)), [0u8; 8]).unwrap();
    let concrete_types: Vec<serde_json::Value> = configurables
        .iter()
        .enumerate()
        .map(|(i, (_, type_name, _))| {
            serde_json::json!({ "type": type_name, "concreteTypeId": format!("{:02x}", i) })
        })
        .collect();
    let configurables: Vec<serde_json::Value> = configurables
        .iter()
        .enumerate()
        .map(|(i, (name, _, offset))| {
            serde_json::json!({
                "name": name,
                "concreteTypeId": format!("{:02x}", i),
                "offset": offset
            })
        })
        .collect();
    let abi = serde_json::json!({
        "functions": [],
        "concreteTypes": concrete_types,
        "configurables": configurables
    });
    fs::write(out.join(format!("{}-abi.json", name)), abi.to_string()).unwrap();
}

pub async fn get_custom_wallet() -> WalletUnlocked {
    let wallets = launch_custom_provider_and_get_wallets(
        WalletsConfig::new(Some(1), Some(2), Some(1_000_000_000)),
        None,
        None,
    )
        .await
        .unwrap();
    wallets[0].clone()
}
