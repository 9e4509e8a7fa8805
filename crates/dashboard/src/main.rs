use anyhow::Context;
use chain_dashboard::{
    client::JsonRpcClient,
    dashboard::DashboardAssembler,
    display::{OutputFormat, render_snapshot},
    settings::{AppArgs, Command, Settings},
    worker::{BlockWatcher, DashboardRefresher, RefreshReason, RefreshTimer},
};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse();
    let settings = Settings::new(args.config)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&settings.log))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = Arc::new(
        JsonRpcClient::new(settings.rpc.url.clone(), settings.request_timeout())
            .context("Failed to build RPC client")?,
    );
    let assembler = DashboardAssembler::new(client.clone(), settings.dashboard_config());

    match args.command.unwrap_or(Command::Run) {
        Command::Snapshot { format } => snapshot(&assembler, format).await,
        Command::Run => run(&settings, client, assembler).await,
    }
}

async fn snapshot(
    assembler: &DashboardAssembler<JsonRpcClient>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let snapshot = assembler
        .assemble()
        .await
        .context("Failed to assemble dashboard snapshot")?;
    println!("{}", render_snapshot(&snapshot, format)?);
    Ok(())
}

async fn run(
    settings: &Settings,
    client: Arc<JsonRpcClient>,
    assembler: DashboardAssembler<JsonRpcClient>,
) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(settings.metrics_addr)
        .install()?;

    export_build_info();

    info!(
        rpc = %client.url(),
        registry = %settings.chain.registry_address,
        epoch_length = settings.chain.epoch_length.get(),
        refresh_interval_ms = settings.refresh.interval_ms,
        block_poll_interval_ms = settings.refresh.block_poll_interval_ms,
        "Chain Dashboard starting"
    );
    info!("{settings}");

    let shutdown_listener = shutdown_listener();

    let (mut refresher, handle) = DashboardRefresher::new(assembler, settings.refresh_timeout());
    let timer = RefreshTimer::new(settings.refresh_interval());
    let watcher = BlockWatcher::new(
        client,
        settings.block_poll_interval(),
        settings.retry_policy(),
    );
    let on_block = {
        let handle = handle.clone();
        move |height| {
            handle.request(RefreshReason::NewBlock(height));
        }
    };

    tokio::select! {
        biased;
        _ = shutdown_listener.cancelled() => {
            info!("shutdown signal received");
        },
        result = refresher.run(shutdown_listener.clone()) => {
            if let Err(err) = result {
                error!(?err, "dashboard refresher exited with error");
            }
        }
        result = timer.run(handle, shutdown_listener.clone()) => {
            if let Err(err) = result {
                error!(?err, "refresh timer exited with error");
            }
        }
        result = watcher.run(on_block, shutdown_listener.clone()) => {
            if let Err(err) = result {
                error!(?err, "block watcher exited with error");
            }
        }
    }

    info!("Chain Dashboard shutting down");

    Ok(())
}

fn shutdown_listener() -> CancellationToken {
    let cancellation_token = CancellationToken::new();
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("sigterm listener failed");
    tokio::spawn({
        let cancellation_token = cancellation_token.clone();
        async move {
            tokio::select! {
                _ = sigterm.recv() => cancellation_token.cancel(),
                _ = signal::ctrl_c() => cancellation_token.cancel(),
            }
        }
    });

    cancellation_token
}

fn export_build_info() {
    let version = option_env!("BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    let build_commit = option_env!("BUILD_COMMIT").unwrap_or("UNKNOWN");
    let build_date = option_env!("DATE").unwrap_or("UNKNOWN");
    let pkg_version = env!("CARGO_PKG_VERSION");

    metrics::gauge!(
        "chain_dashboard_build_info",
        "version" => version,
        "commit" => build_commit,
        "date" => build_date,
        "pkg_version" => pkg_version
    )
    .set(1);
}
