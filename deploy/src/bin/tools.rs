use std::process::ExitCode;

use deploy::artifact::ArtifactLoader;
use deploy::error::Error;
use deploy::plan::{load_migrations, select_migration, StepArg};
use deploy::report::DeploymentReport;
use deploy::shared::config;
use tracing::{error, info, warn, Level};

/// Prints the selected migration, the configurable slots each step writes to,
/// and what a previous report recorded. Nothing is sent to the network.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    match inspect() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn inspect() -> Result<(), Error> {
    let config = config()?;
    let migrations = load_migrations(&config.plan_path)?;
    let names: Vec<&str> = migrations.iter().map(|m| m.name.as_str()).collect();
    info!("Migrations in {}: {:?}", config.plan_path.display(), names);

    let migration = select_migration(migrations, config.migration.as_deref())?;
    let loader = ArtifactLoader::new(&config.artifacts_dir, &config.build_profile);
    info!("Migration {}:", migration.name);
    for (index, step) in migration.plan.steps().iter().enumerate() {
        info!("  #{} {} ({})", index, step.name, step.artifact);
        let slots = match loader.load(&step.artifact) {
            Ok(compiled) => compiled.configurables,
            Err(err) => {
                warn!("    artifact not loadable: {}", err);
                continue;
            }
        };
        if step.args.len() > slots.len() {
            warn!("    {} arguments for {} configurables", step.args.len(), slots.len());
        }
        for (arg, slot) in step.args.iter().zip(&slots) {
            match arg {
                StepArg::Literal(value) => {
                    info!("    {}: {} = {}", slot.name, slot.type_name, value)
                }
                StepArg::Prior(reference) => {
                    info!("    {}: {} = address of {}", slot.name, slot.type_name, reference)
                }
            }
        }
    }

    let report_path = config.resume_from.as_ref().unwrap_or(&config.report_path);
    if report_path.is_file() {
        let report = DeploymentReport::read_from(report_path)?;
        info!(
            "Report {} ({} on {}, {:?}):",
            report_path.display(),
            report.migration,
            report.network,
            report.status
        );
        for entry in &report.contracts {
            info!("  #{} {}: {}", entry.index, entry.name, entry.contract_id);
        }
        if report.migration == migration.name && !report.is_completed() {
            let completed = report.completed_results(&migration.plan)?;
            info!(
                "Resuming would skip {} of {} steps",
                completed.len(),
                migration.plan.len()
            );
        }
    }
    Ok(())
}
