use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use flannel_operator::controller::Dispatcher;
use flannel_operator::operator::{
    Config, CrdRegistrar, ExponentialBackoff, KubeEventSource, Operator,
};
use flannel_operator::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the operator
    Run(RunArgs),
    /// Show version information
    Version,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Namespace to watch (empty for all namespaces)
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "")]
    namespace: String,

    /// Boot attempts before the process gives up
    #[arg(long, env = "BOOT_ATTEMPTS", default_value_t = 8)]
    boot_attempts: u32,

    /// Base delay between boot attempts, in seconds
    #[arg(long, env = "BOOT_RETRY_DELAY", default_value_t = 15)]
    boot_retry_delay: u64,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    match args.command {
        Commands::Version => {
            println!("flannel-operator v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Run(run_args) => run_operator(run_args).await,
    }
}

async fn run_operator(args: RunArgs) -> Result<(), Error> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    info!(
        "Starting flannel-operator v{}",
        env!("CARGO_PKG_VERSION")
    );

    let client = kube::Client::try_default()
        .await
        .map_err(Error::KubeError)?;

    info!("Connected to Kubernetes cluster");

    let watch_namespace = if args.namespace.is_empty() {
        None
    } else {
        Some(args.namespace)
    };

    let config = Config {
        back_off: Some(Box::new(ExponentialBackoff::new(
            Duration::from_secs(args.boot_retry_delay),
            Duration::from_secs(300),
            args.boot_attempts,
        ))),
        registrar: Some(Arc::new(CrdRegistrar::new(client.clone()))),
        event_source: Some(Arc::new(KubeEventSource::new(client))),
        event_processor: Some(Arc::new(Dispatcher::new())),
        watch_namespace,
        retry_notifier: None,
    };
    let operator = Operator::new(config)?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    // A boot failure propagates out of main as a non-zero exit; the
    // terminal error has already been logged by the supervisor.
    operator.boot(shutdown).await
}
