mod cli;

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

use minimotd_core::{
    config, ConfigSnapshot, ConfigStore, ConfigWatcher, IconStore, ReloadEvent, ResponseComposer,
};

use crate::cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_dir)?;

    let config_path = match args.config.clone() {
        Some(path) => path,
        None => config::default_config_path()
            .context("could not determine the user configuration directory")?,
    };
    if config::ensure_default_config(&config_path)? {
        info!("wrote default configuration to {}", config_path.display());
    }

    let store = Arc::new(
        ConfigStore::open(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?,
    );
    let icons_dir = args
        .icons
        .clone()
        .unwrap_or_else(|| config::icons_dir_for(&config_path));
    let icons = Arc::new(IconStore::open(&icons_dir)?);
    let composer = ResponseComposer::new(Arc::clone(&icons));

    print_samples(&composer, &store.current(), &args)?;
    if !args.watch {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel(16);
    let _watcher = ConfigWatcher::spawn(Arc::clone(&store), Arc::clone(&icons), tx)?;
    info!("watching for changes, press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => match event {
                Some(ReloadEvent::Config(snapshot)) => print_samples(&composer, &snapshot, &args)?,
                Some(ReloadEvent::Icons(_)) => print_samples(&composer, &store.current(), &args)?,
                Some(ReloadEvent::Error(err)) => error!("reload failed: {err}"),
                None => break,
            },
        }
    }

    Ok(())
}

fn print_samples(
    composer: &ResponseComposer<Arc<IconStore>>,
    snapshot: &ConfigSnapshot,
    args: &Args,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for _ in 0..args.samples {
        match composer.compose(snapshot, args.online, args.max) {
            Ok(response) => {
                serde_json::to_writer(&mut out, &response)
                    .context("failed to serialize response")?;
                writeln!(out)?;
            }
            Err(err) => {
                warn!(generation = snapshot.generation, "cannot compose response: {err}");
                break;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("minimotd.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
