use std::process::ExitCode;

use deploy::deployer::{self, DeployTarget};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    match deployer::deploy(DeployTarget::OnChain).await {
        Ok(report) => {
            info!("Migration {} deployed {} contracts", report.migration, report.contracts.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Deployment failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
