//! Command line interface for scangate.
//!
//! Two subcommands: `report` gates on the findings of an already-completed
//! scan, `rescan` triggers a fresh scan first and waits for it. The verdict
//! is the process exit code, so both slot directly into CI pipelines.

use clap::{Args, Parser, Subcommand};
use scangate_collector::{ScanError, ScanResultCollector};
use scangate_core::{GateConfig, ScanTarget};
use scangate_registry::{HttpScanClient, RegistryError};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Image findings are acceptable (no High or Critical).
const EXIT_ACCEPTABLE: i32 = 0;
/// Findings unacceptable, client setup failed, or the remote scan failed.
const EXIT_UNACCEPTABLE: i32 = 1;
/// Unhandled error (request failure, unexpected status, deadline).
const EXIT_UNHANDLED: i32 = 2;

#[derive(Parser)]
#[command(name = "scangate")]
#[command(about = "Gate CI on container-image vulnerability scan results")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report pass/fail for an already-completed scan
    Report(ScanArgs),

    /// Trigger a new scan, wait for completion, then report pass/fail
    Rescan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Seconds between status polls (default from config)
        #[arg(long)]
        poll_interval_secs: Option<u64>,

        /// Give up polling after this many seconds (default: poll forever)
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Repository holding the image of interest
    #[arg(short, long)]
    repository: String,

    /// Image tag of interest
    #[arg(short, long)]
    tag: String,

    /// Registry account id, when not the default registry
    #[arg(long)]
    registry_id: Option<String>,

    /// Named credential profile from the config file
    #[arg(long)]
    profile: Option<String>,

    /// Registry region
    #[arg(long)]
    region: Option<String>,

    /// Exit 0 even when findings are unacceptable
    #[arg(long)]
    ignore_errors: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    std::process::exit(run(cli).await);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> i32 {
    let (args, poll_interval_secs, deadline_secs, rescan) = match cli.command {
        Commands::Report(args) => (args, None, None, false),
        Commands::Rescan {
            scan,
            poll_interval_secs,
            deadline_secs,
        } => (scan, poll_interval_secs, deadline_secs, true),
    };

    let ignore_errors = args.ignore_errors;
    let outcome = execute(&args, poll_interval_secs, deadline_secs, rescan).await;

    match &outcome {
        Ok(true) => tracing::info!("image is acceptable"),
        Ok(false) => tracing::error!("image has High or Critical findings"),
        Err(e) => tracing::error!("{e}"),
    }

    exit_code(&outcome, ignore_errors)
}

async fn execute(
    args: &ScanArgs,
    poll_interval_secs: Option<u64>,
    deadline_secs: Option<u64>,
    rescan: bool,
) -> Result<bool, ScanError> {
    let target = ScanTarget::new(&args.repository, &args.tag)
        .map_err(|e| ScanError::ClientInit(e.to_string()))?;
    let target = match &args.registry_id {
        Some(registry_id) => target.with_registry_id(registry_id),
        None => target,
    };

    let config = GateConfig::load_with_env().map_err(|e| ScanError::ClientInit(e.to_string()))?;
    let registry = config
        .resolve(args.profile.as_deref(), args.region.as_deref())
        .map_err(|e| ScanError::ClientInit(e.to_string()))?;

    tracing::debug!("using scan endpoint {}", registry.endpoint);
    let client = HttpScanClient::new(&registry.endpoint, registry.auth_token)?;

    let poll_interval = poll_interval_secs.unwrap_or(config.general.poll_interval_secs);
    let mut collector = ScanResultCollector::new(Arc::new(client))
        .with_poll_interval(Duration::from_secs(poll_interval));

    if let Some(deadline) = deadline_secs.or(config.general.deadline_secs) {
        collector = collector.with_deadline(Duration::from_secs(deadline));
    }

    if rescan {
        collector.run_rescan(&target).await
    } else {
        collector.run_report(&target).await
    }
}

/// Map an outcome to the process exit code.
///
/// `--ignore-errors` forces an unacceptable verdict (and client-setup or
/// scan failures) to exit 0; unhandled errors stay at exit 2 regardless.
fn exit_code(outcome: &Result<bool, ScanError>, ignore_errors: bool) -> i32 {
    let code = match outcome {
        Ok(true) => EXIT_ACCEPTABLE,
        Ok(false)
        | Err(ScanError::ClientInit(_) | ScanError::ScanFailed { .. })
        | Err(ScanError::Request(RegistryError::ClientInit(_))) => EXIT_UNACCEPTABLE,
        Err(_) => EXIT_UNHANDLED,
    };

    if ignore_errors && code == EXIT_UNACCEPTABLE {
        EXIT_ACCEPTABLE
    } else {
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_verdicts() {
        assert_eq!(exit_code(&Ok(true), false), EXIT_ACCEPTABLE);
        assert_eq!(exit_code(&Ok(false), false), EXIT_UNACCEPTABLE);
    }

    #[test]
    fn test_exit_code_expected_failures() {
        let client_init = Err(ScanError::ClientInit("no endpoint".to_string()));
        assert_eq!(exit_code(&client_init, false), EXIT_UNACCEPTABLE);

        let scan_failed = Err(ScanError::ScanFailed {
            target: "team/service:v1".to_string(),
        });
        assert_eq!(exit_code(&scan_failed, false), EXIT_UNACCEPTABLE);
    }

    #[test]
    fn test_exit_code_unhandled_failures() {
        let request = Err(ScanError::Request(RegistryError::Api {
            status: 500,
            message: "boom".to_string(),
        }));
        assert_eq!(exit_code(&request, false), EXIT_UNHANDLED);

        let unexpected = Err(ScanError::UnexpectedStatus {
            status: "UNSUPPORTED_IMAGE".to_string(),
        });
        assert_eq!(exit_code(&unexpected, false), EXIT_UNHANDLED);

        let deadline = Err(ScanError::DeadlineExceeded {
            waited: Duration::from_secs(600),
        });
        assert_eq!(exit_code(&deadline, false), EXIT_UNHANDLED);
    }

    #[test]
    fn test_ignore_errors_only_softens_exit_one() {
        assert_eq!(exit_code(&Ok(false), true), EXIT_ACCEPTABLE);

        let client_init = Err(ScanError::ClientInit("no endpoint".to_string()));
        assert_eq!(exit_code(&client_init, true), EXIT_ACCEPTABLE);

        let request = Err(ScanError::Request(RegistryError::Api {
            status: 500,
            message: "boom".to_string(),
        }));
        assert_eq!(exit_code(&request, true), EXIT_UNHANDLED);
    }

    #[test]
    fn test_cli_parses_both_subcommands() {
        let cli = Cli::try_parse_from([
            "scangate", "report", "--repository", "team/service", "--tag", "v1",
        ])
        .expect("parse report");
        assert!(matches!(cli.command, Commands::Report(_)));

        let cli = Cli::try_parse_from([
            "scangate",
            "rescan",
            "--repository",
            "team/service",
            "--tag",
            "v1",
            "--registry-id",
            "123456789012",
            "--ignore-errors",
            "--poll-interval-secs",
            "5",
            "--deadline-secs",
            "300",
        ])
        .expect("parse rescan");

        match cli.command {
            Commands::Rescan {
                scan,
                poll_interval_secs,
                deadline_secs,
            } => {
                assert_eq!(scan.repository, "team/service");
                assert!(scan.ignore_errors);
                assert_eq!(poll_interval_secs, Some(5));
                assert_eq!(deadline_secs, Some(300));
            }
            Commands::Report(_) => panic!("expected rescan"),
        }
    }

    #[test]
    fn test_cli_requires_repository_and_tag() {
        assert!(Cli::try_parse_from(["scangate", "report", "--tag", "v1"]).is_err());
        assert!(Cli::try_parse_from(["scangate", "report", "--repository", "web"]).is_err());
    }
}
