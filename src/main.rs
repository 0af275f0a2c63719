use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use sens_capture::config::AppConfig;
use sens_capture::core::{Engine, UpdateManager};
use sens_capture::displayers::ConsoleDisplayer;
use sens_capture_core::{SensorKind, SensorRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// sens-capture - sample thermal zones, regulators and CPU frequencies from sysfs
#[derive(Parser, Debug, Clone)]
#[command(name = "sens-capture")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    /// Sysfs mount point to read sensors from
    #[arg(long = "root", value_name = "PATH")]
    root: Option<PathBuf>,

    /// Sampling period in milliseconds
    #[arg(short = 'p', long = "period-ms", value_name = "MS")]
    period_ms: Option<u64>,

    /// Keep at most this many samples per sensor
    #[arg(long = "history", value_name = "SAMPLES")]
    history: Option<usize>,

    /// Stop after this many ticks
    #[arg(short = 'n', long = "ticks", value_name = "COUNT")]
    ticks: Option<u64>,

    /// Do not print the periodic console report
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// List discovered sensors and exit
    #[arg(short = 'l', long = "list")]
    list_sensors: bool,

    /// Write the effective configuration to the user config file and exit
    #[arg(long = "save-config")]
    save_config: bool,

    /// Configuration file to load instead of the user config
    #[arg(value_name = "CONFIG_FILE")]
    config_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info (normal verbosity)
    // Level 2: debug (detailed)
    // Level 3+: trace (very detailed)
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting sens-capture v{}", env!("CARGO_PKG_VERSION"));

    let config = effective_config(&cli)?;

    if cli.save_config {
        let path = config.save()?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let engine = Engine::new(&config.sampler);

    if cli.list_sensors {
        print_sensors(engine.registry());
        return Ok(());
    }

    if engine.registry().is_empty() {
        warn!(
            "No sensors found under {}, nothing will be sampled",
            config.sampler.sysfs_root.display()
        );
    }

    run(engine, &config, cli.ticks, !cli.quiet).await;
    Ok(())
}

/// Load the configuration file (explicit path, else user config, else
/// defaults) and apply command line overrides
fn effective_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config_file {
        Some(path) => {
            let config = AppConfig::load_from_path(path)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {:#}", e);
            AppConfig::default()
        }),
    };

    if let Some(root) = &cli.root {
        config.sampler.sysfs_root = root.clone();
    }
    if let Some(period_ms) = cli.period_ms {
        config.sampler.sampling_period_ms = period_ms;
    }
    if let Some(history) = cli.history {
        config.sampler.history_capacity = Some(history);
    }

    Ok(config)
}

fn print_sensors(registry: &SensorRegistry) {
    for kind in SensorKind::ALL {
        println!("{} [{}]", kind.panel_title(), registry.count(kind));
        for descriptor in registry.of_kind(kind) {
            println!(
                "  {:<36} {} [{}]",
                descriptor.caption(),
                descriptor.path().display(),
                kind.unit_label()
            );
        }
    }
}

/// Sample until Ctrl-C or the tick limit, printing reports along the way
async fn run(engine: Engine, config: &AppConfig, max_ticks: Option<u64>, report: bool) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let manager = UpdateManager::new(engine).with_max_ticks(max_ticks);
    let displayer = ConsoleDisplayer::new(Arc::clone(manager.registry()), manager.store_reader());

    let report_task = (report && config.report.enabled).then(|| {
        tokio::spawn(
            displayer
                .clone()
                .run(config.report.interval(), shutdown_rx.clone()),
        )
    });

    let interrupted = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupted, stopping"),
            Err(e) => {
                // Without a signal handler only the tick limit ends the run
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        ticks = manager.run(shutdown_rx) => info!("Sampling finished after {} ticks", ticks),
        _ = interrupted => {}
    }

    let _ = shutdown_tx.send(true);
    if let Some(task) = report_task {
        if let Err(e) = task.await {
            warn!("Report task failed: {}", e);
        }
    }

    print!("{}", displayer.summary());
}
