mod utils;

use deploy::artifact::ArtifactLoader;
use deploy::deployer::{self, run_migration, DeployTarget, LocalDeployParams};
use deploy::error::{ArtifactError, DeployerError, DeploymentError, Error};
use deploy::plan::{parse_migrations, select_migration, Migration, Value};
use deploy::report::{DeploymentReport, RunStatus};
use utils::*;

fn migration(name: &str) -> Migration {
    select_migration(parse_migrations(PLAN).unwrap(), Some(name)).unwrap()
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deploy_independent_services() {
        let migration = migration("2_deploy_contracts");
        let mut deployer = FakeDeployer::new();

        let (report, outcome) = run_migration(&migration, vec![], &mut deployer, "local").await;

        assert!(outcome.is_ok());
        assert!(report.is_completed());
        assert_eq!(deployer.deployed(), vec![FILM_RENTAL_SERVICE, EBOOK_DOWNLOAD_SERVICE]);
        assert_eq!(report.contracts.len(), 2);
        assert_eq!(report.contracts[0].index, 0);
        assert_eq!(report.contract_id(FILM_RENTAL_SERVICE), Some(address_of(FILM_RENTAL_SERVICE)));
        assert_eq!(report.contracts[1].index, 1);
        assert_eq!(
            report.contract_id(EBOOK_DOWNLOAD_SERVICE),
            Some(address_of(EBOOK_DOWNLOAD_SERVICE))
        );
    }

    #[tokio::test]
    async fn test_service_provider_receives_rental_service_address() {
        let migration = migration("2_deploy_service_provider");
        let mut deployer = FakeDeployer::new();

        let (report, outcome) = run_migration(&migration, vec![], &mut deployer, "local").await;

        assert!(outcome.is_ok());
        assert_eq!(deployer.calls[0], (FILM_RENTAL_SERVICE.to_string(), vec![]));
        assert_eq!(
            deployer.calls[1],
            (
                SERVICE_PROVIDER.to_string(),
                vec![Value::ContractId(address_of(FILM_RENTAL_SERVICE))]
            )
        );
        assert_eq!(report.contract_id(SERVICE_PROVIDER), Some(address_of(SERVICE_PROVIDER)));
    }

    #[tokio::test]
    async fn test_failed_step_reports_deployed_contracts() {
        let migration = migration("2_deploy_service_provider");
        let mut deployer = FakeDeployer::failing(SERVICE_PROVIDER, "insufficient funds");

        let (report, outcome) = run_migration(&migration, vec![], &mut deployer, "local").await;

        match outcome {
            Err(Error::Deployment(DeploymentError::DeploymentFailed(failed))) => {
                assert_eq!(failed.failed_index, 1);
                assert_eq!(failed.cause.to_string(), "insufficient funds");
                assert_eq!(failed.completed.len(), 1);
                assert_eq!(failed.completed[0].index, 0);
                assert_eq!(failed.completed[0].address, address_of(FILM_RENTAL_SERVICE));
            }
            _ => panic!("expected the service provider deployment to fail"),
        }
        assert!(matches!(report.status, RunStatus::Failed { failed_index: 1, .. }));
        assert_eq!(report.contracts.len(), 1);
        assert_eq!(report.contract_id(FILM_RENTAL_SERVICE), Some(address_of(FILM_RENTAL_SERVICE)));
    }

    #[tokio::test]
    async fn test_resume_from_written_report() {
        let migration = migration("2_deploy_service_provider");
        let dir = scratch_dir("resume");
        let report_path = dir.join("deployment-report.json");

        let mut failing = FakeDeployer::failing(SERVICE_PROVIDER, "insufficient funds");
        let (report, outcome) = run_migration(&migration, vec![], &mut failing, "local").await;
        assert!(outcome.is_err());
        report.write_to(&report_path).unwrap();

        let completed = DeploymentReport::read_from(&report_path)
            .unwrap()
            .completed_results(&migration.plan)
            .unwrap();
        let mut deployer = FakeDeployer::new();
        let (report, outcome) = run_migration(&migration, completed, &mut deployer, "local").await;

        assert!(outcome.is_ok());
        assert_eq!(deployer.deployed(), vec![SERVICE_PROVIDER]);
        assert_eq!(
            deployer.calls[0].1,
            vec![Value::ContractId(address_of(FILM_RENTAL_SERVICE))]
        );
        assert!(report.is_completed());
        assert_eq!(report.contracts.len(), 2);
    }

    #[tokio::test]
    async fn test_resume_with_report_of_other_migration() {
        let dir = scratch_dir("mismatch");
        let report_path = dir.join("deployment-report.json");
        let mut deployer = FakeDeployer::new();
        let (report, _) = run_migration(
            &migration("2_deploy_contracts"),
            vec![],
            &mut deployer,
            "local",
        )
            .await;
        report.write_to(&report_path).unwrap();

        let provider = migration("2_deploy_service_provider");
        let completed = DeploymentReport::read_from(&report_path)
            .unwrap()
            .completed_results(&provider.plan)
            .unwrap();
        let mut deployer = FakeDeployer::new();
        let (report, outcome) = run_migration(&provider, completed, &mut deployer, "local").await;

        assert!(matches!(
            outcome,
            Err(Error::Deployment(DeploymentError::ResumeMismatch { index: 1, .. }))
        ));
        assert!(deployer.calls.is_empty());
        assert!(matches!(report.status, RunStatus::Failed { failed_index: 1, .. }));
        assert_eq!(report.contracts.len(), 2);
        assert_eq!(report.contract_id(FILM_RENTAL_SERVICE), Some(address_of(FILM_RENTAL_SERVICE)));
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_first_step_on_node() {
        let wallet = get_custom_wallet().await;
        let params = LocalDeployParams {
            deployer_wallet: wallet,
            loader: ArtifactLoader::new(scratch_dir("empty"), "release"),
            migration: migration("2_deploy_contracts"),
            completed: vec![],
        };

        let result = deployer::deploy(DeployTarget::Local(params)).await;

        match result {
            Err(Error::Deployment(DeploymentError::DeploymentFailed(failed))) => {
                assert_eq!(failed.failed_index, 0);
                assert!(failed.completed.is_empty());
                assert!(matches!(
                    failed.cause,
                    DeployerError::Artifact(ArtifactError::Io { .. })
                ));
            }
            _ => panic!("expected the first step to fail"),
        }
    }

    #[tokio::test]
    async fn test_extra_arguments_rejected_before_submission() {
        let wallet = get_custom_wallet().await;
        let artifacts = scratch_dir("artifacts");
        write_artifact(&artifacts, FILM_RENTAL_SERVICE, &[]);
        let migration = select_migration(
            parse_migrations(
                r#"{ "migrations": [ { "name": "literal", "steps": [
                    { "artifact": "FilmRentalService", "args": [ { "u64": 30 } ] }
                ] } ] }"#,
            )
                .unwrap(),
            None,
        )
            .unwrap();
        let params = LocalDeployParams {
            deployer_wallet: wallet,
            loader: ArtifactLoader::new(artifacts, "release"),
            migration,
            completed: vec![],
        };

        let result = deployer::deploy(DeployTarget::Local(params)).await;

        match result {
            Err(Error::Deployment(DeploymentError::DeploymentFailed(failed))) => {
                assert_eq!(failed.failed_index, 0);
                assert!(matches!(
                    failed.cause,
                    DeployerError::Artifact(ArtifactError::TooManyArguments {
                        declared: 0,
                        given: 1,
                        ..
                    })
                ));
            }
            _ => panic!("expected the extra argument to be rejected"),
        }
    }
}
