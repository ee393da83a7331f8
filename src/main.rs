use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hina_monitor::config::DEFAULT_CONFIG_FILE;
use hina_monitor::{
    BackupDirectory, ConnectivityChecker, DashboardOutput, JsonFileStore, MonitorBuilder,
    Settings, SystemSampler, TelegramGateway,
};

#[derive(Parser, Debug)]
#[command(name = "hina-monitor")]
#[command(about = "Health monitor and owner alerting for the Hina Telegram bot")]
struct Args {
    /// Settings file (TOML). Missing files are ignored; HINA__* variables still apply.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Run a single monitoring tick, print the result and exit
    #[arg(long)]
    once: bool,

    /// Log filter used when RUST_LOG is not set (e.g. "info", "hina_monitor=debug")
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let settings = Settings::load(Some(args.config.as_path()))
        .with_context(|| format!("failed to load settings from {}", args.config.display()))?;

    let gateway = TelegramGateway::builder()
        .token(settings.bot_token.clone())
        .api_base(settings.api_base.clone())
        .timeout(settings.probe_timeout)
        .build()?;

    let mut builder = MonitorBuilder::from_settings(&settings)
        .gateway(Arc::new(gateway))
        .directory(Arc::new(BackupDirectory::new(&settings.directory_path)))
        .counter_store(Box::new(JsonFileStore::new(&settings.counter_path)))
        .sampler(Box::new(SystemSampler::new(settings.cpu_window)))
        .output(DashboardOutput::file(&settings.dashboard_path));

    if !settings.connectivity_urls.is_empty() {
        let checker = ConnectivityChecker::new(settings.connectivity_urls.clone())
            .context("failed to build connectivity client")?;
        builder = builder.connectivity(checker);
    }

    let mut monitor = builder.build()?;

    if args.once {
        let report = monitor.tick().await?;
        println!("{}", report.evaluation.level);
        for alert in &report.evaluation.alerts {
            println!("- {}", alert);
        }
        return Ok(());
    }

    info!(
        owner = settings.owner_id,
        interval = ?settings.interval,
        "starting hina monitor"
    );
    let handle = monitor.start();

    let reason = wait_for_signal().await;
    info!(reason, "shutdown requested");
    handle.shutdown(reason).await?;
    Ok(())
}

fn init_tracing(default_filter: &str) -> Result<()> {
    // HTTP client internals are noisy at debug level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter))
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, waiting for ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
            return "interrupted";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "interrupted",
        _ = terminate.recv() => "terminated",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c");
    }
    "interrupted"
}
