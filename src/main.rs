use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info, warn};
use rflink_prom::config::{AppConfig, ConfigOverrides, NameMap};
use rflink_prom::core::{ExpirationSweeper, Ingestor};
use rflink_prom::exporter::{self, PrometheusSink};
use rflink_prom::sources;
use rflink_prom_core::Registry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

/// rflink-prom - Prometheus exporter for sensors received by an RFLink bridge
#[derive(Parser, Debug, Clone)]
#[command(name = "rflink-prom")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The serial device rflink is connected to
    #[arg(long = "port", value_name = "DEVICE")]
    port: Option<String>,

    /// The baud rate of the serial connection
    #[arg(long = "baud")]
    baud: Option<u32>,

    /// The address to listen on for the Prometheus HTTP endpoint
    #[arg(long = "listen", value_name = "ADDR")]
    listen: Option<String>,

    /// Mapping file to match sensor ids with a name
    #[arg(long = "namemap", value_name = "FILE")]
    namemap: Option<PathBuf>,

    /// Number of seconds to wait before considering a sensor has disappeared
    #[arg(long = "timeout", value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Config file to load instead of the default one
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port.clone(),
            baud: self.baud,
            listen: self.listen.clone(),
            namemap: self.namemap.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!(
        "rflink-prom v{} -- Prometheus exporter for rflink",
        env!("CARGO_PKG_VERSION")
    );

    let app_config = match cli.config {
        Some(ref path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config: {:#}, using defaults", e);
            AppConfig::default()
        }),
    };
    let settings = app_config
        .with_overrides(cli.overrides())
        .validate()
        .context("Invalid configuration")?;

    let names = NameMap::load_or_empty(settings.namemap.as_deref());

    let sink = Arc::new(PrometheusSink::new());
    let registry = Arc::new(Registry::new());

    let http = tokio::spawn(exporter::serve(settings.listen, Arc::clone(&sink)));

    let sweeper = ExpirationSweeper::new(Arc::clone(&registry), settings.timeout);
    info!(
        "Metrics expire after {:?} of silence, checked every {:?}",
        settings.timeout,
        sweeper.period()
    );
    tokio::spawn(async move { sweeper.run().await });

    let mut lines = sources::open_serial(&settings.port, settings.baud)?;
    info!("rflink connection established on {}", settings.port);

    // The serial read blocks, so it gets its own thread. It is not joined on
    // shutdown.
    let ingestor = Ingestor::new(registry, sink, Arc::new(names));
    let (done_tx, done_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("rflink-reader".to_string())
        .spawn(move || {
            let err = ingestor.run(&mut lines);
            let _ = done_tx.send(err);
        })
        .context("Cannot start serial reader thread")?;

    tokio::select! {
        result = done_rx => {
            let err = match result {
                Ok(e) => anyhow::Error::new(e).context("Cannot read from serial"),
                Err(_) => anyhow!("Serial reader stopped unexpectedly"),
            };
            error!("{:#}", err);
            return Err(err);
        }
        result = http => {
            let err = match result {
                Ok(Ok(())) => anyhow!("Prometheus HTTP server stopped"),
                Ok(Err(e)) => e,
                Err(e) => anyhow::Error::new(e).context("Prometheus HTTP server task failed"),
            };
            error!("{:#}", err);
            return Err(err);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Stopping prometheus exporter");
        }
    }

    info!("Bye bye");
    Ok(())
}
