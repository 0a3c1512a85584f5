use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use pg_provisioner::lifecycle::{LifecycleEvent, ResponseStatus};
use pg_provisioner::observability::{LogFormat, init_tracing};
use pg_provisioner::postgres::PostgresConnector;
use pg_provisioner::secrets::StaticSecretStore;
use pg_provisioner::service::Provisioner;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn};

/// Provision a PostgreSQL role and database from a lifecycle event.
///
/// Reads the event JSON, prints the lifecycle response JSON to stdout and
/// exits non-zero when provisioning failed.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Lifecycle event JSON file, `-` for stdin.
    #[arg(long, env = "PG_PROVISIONER_EVENT", default_value = "-")]
    event: PathBuf,

    /// JSON object mapping secret keys to their values.
    #[arg(long, env = "PG_PROVISIONER_SECRETS")]
    secrets: PathBuf,

    /// Seconds to wait for a server connection, 0 to wait indefinitely.
    #[arg(long, env = "PG_PROVISIONER_CONNECT_TIMEOUT", default_value_t = 10)]
    connect_timeout_secs: u64,

    #[arg(long, env = "PG_PROVISIONER_APPLICATION_NAME", default_value = "pg-provisioner")]
    application_name: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    /// Used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn read_event(path: &Path) -> Result<LifecycleEvent, Box<dyn std::error::Error + Send + Sync>> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    init_tracing(args.log_format, &args.log_level)?;

    let event = read_event(&args.event)?;
    let secrets = StaticSecretStore::from_json_file(&args.secrets)?;
    let timeout = (args.connect_timeout_secs > 0).then(|| Duration::from_secs(args.connect_timeout_secs));
    let connector = PostgresConnector::new()
        .with_application_name(args.application_name)
        .with_connect_timeout(timeout);

    let provisioner =
        Provisioner::new(secrets, connector).with_span(info_span!("pg_provisioner"));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling request");
            on_signal.cancel();
        }
    });

    let response = provisioner.respond(&cancel, event).await;
    println!("{}", serde_json::to_string(&response)?);

    Ok(match response.status {
        ResponseStatus::Success => ExitCode::SUCCESS,
        ResponseStatus::Failed => ExitCode::FAILURE,
    })
}
