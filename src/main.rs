use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use site_health_monitor::config::{CliArgs, MonitorConfig};
use site_health_monitor::state::{Collaborators, MonitorState};
use site_health_monitor::{server, trigger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Keep the appender guard alive for the whole process.
    let _log_guard = init_tracing(&args);

    info!("Starting site-health-monitor v{}", env!("CARGO_PKG_VERSION"));
    info!("Monitored site: {}", args.site_url);

    let config = match MonitorConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("State database: {:?}", config.state_db);
    info!("Watched files: {:?}", config.watched_files);
    info!("Commerce signals: {}", config.commerce_enabled);

    let port = config.port;
    let collaborators = Collaborators::from_config(&config)?;
    let state = Arc::new(MonitorState::new(config, collaborators));

    match state.scheduler.initialize(Utc::now()) {
        Ok(true) => info!("First start: weekly delivery clock initialized"),
        Ok(false) => {}
        Err(e) => warn!("Could not initialize weekly delivery clock: {}", e),
    }

    let _trigger_handle = trigger::spawn_delivery_trigger(state.clone());

    let router = server::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Monitor listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Monitor shutting down");
    Ok(())
}

fn init_tracing(args: &CliArgs) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "site_health_monitor=info,tower_http=info".into());
    let stdout = tracing_subscriber::fmt::layer();

    match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "site-health-monitor.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stdout).init();
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
