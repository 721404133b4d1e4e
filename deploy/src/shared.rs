use std::path::PathBuf;
use std::str::FromStr;

use dotenvy::dotenv;
use fuels::crypto::SecretKey;
use fuels::prelude::{Provider, WalletUnlocked};

use crate::error::{ConfigError, Error};

#[derive(Clone, Debug)]
pub struct Config {
    pub fuel_url: String,
    pub deployer_pk: String,
    pub plan_path: PathBuf,
    pub migration: Option<String>,
    pub artifacts_dir: PathBuf,
    pub build_profile: String,
    pub report_path: PathBuf,
    pub resume_from: Option<PathBuf>,
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::Missing(var))
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.is_empty())
}

/// Reads the deployment settings from the environment, after loading `.env`
/// when one is present.
pub fn config() -> Result<Config, ConfigError> {
    match dotenv() {
        Ok(_) => {}
        Err(err) if err.not_found() => {}
        Err(err) => return Err(err.into()),
    }
    let build_profile = optional("BUILD_PROFILE").unwrap_or_else(|| "release".to_string());
    if build_profile != "release" && build_profile != "debug" {
        return Err(ConfigError::Invalid {
            var: "BUILD_PROFILE",
            reason: format!("{}, must be release or debug", build_profile),
        });
    }
    Ok(Config {
        fuel_url: required("FUEL_URL")?,
        deployer_pk: required("DEPLOYER_PK")?,
        plan_path: optional("DEPLOY_PLAN")
            .unwrap_or_else(|| "deploy.json".to_string())
            .into(),
        migration: optional("MIGRATION"),
        artifacts_dir: optional("ARTIFACTS_DIR").unwrap_or_else(|| "..".to_string()).into(),
        build_profile,
        report_path: optional("DEPLOY_REPORT")
            .unwrap_or_else(|| "deployment-report.json".to_string())
            .into(),
        resume_from: optional("RESUME_FROM").map(PathBuf::from),
    })
}

pub async fn get_wallet(config: &Config) -> Result<WalletUnlocked, Error> {
    let deployer_pk = SecretKey::from_str(&config.deployer_pk).map_err(|err| {
        ConfigError::Invalid {
            var: "DEPLOYER_PK",
            reason: format!("{:?}", err),
        }
    })?;
    let provider = Provider::connect(&config.fuel_url).await?;
    Ok(WalletUnlocked::new_from_private_key(deployer_pk, Some(provider)))
}
