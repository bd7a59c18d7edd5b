//! sdb - pipeline-driven introspection shell
//!
//! Loads a typed memory snapshot and runs pipelines against it, either from
//! `-c` arguments or interactively from stdin.

use anyhow::Context;
use clap::Parser;
use sdb_rs::{
    backend::{load_snapshot, SnapshotBuilder},
    config::{default_config_path, ShellConfig},
    pipeline::Session,
    shell::Shell,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sdb", version, about = "Pipeline-driven introspection shell")]
struct Cli {
    /// Snapshot to inspect (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run this command line and exit; may be repeated
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Tracing filter, overriding the config file
    #[arg(long)]
    log_filter: Option<String>,

    /// Write the effective config to the config path and exit
    #[arg(long)]
    save_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ShellConfig::load_or_default(cli.config.as_deref());
    if let Some(filter) = &cli.log_filter {
        config.log_filter = filter.clone();
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(sdb_rs::config::DEFAULT_LOG_FILTER))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if cli.save_config {
        let path = cli
            .config
            .clone()
            .or_else(default_config_path)
            .context("no config directory on this platform")?;
        config.save(&path)?;
        tracing::info!("wrote config to {:?}", path);
        return Ok(());
    }

    let program = match cli.snapshot.as_ref().or(config.snapshot.as_ref()) {
        Some(path) => load_snapshot(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?,
        None => {
            tracing::warn!("no snapshot given, starting with an empty target");
            SnapshotBuilder::new().build()
        }
    };

    let session = Session::new(program).with_shell(config.shell.clone());
    let shell = Shell::new(session, config.prompt.clone());

    if !cli.commands.is_empty() {
        let mut failed = false;
        for line in &cli.commands {
            if !shell.run_line(line, &mut io::stderr())? {
                failed = true;
                break;
            }
        }
        if failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let summary = if stdin.is_terminal() {
        shell.run(stdin.lock(), &mut io::stdout(), &mut io::stderr())?
    } else {
        shell.run(stdin.lock(), &mut io::sink(), &mut io::stderr())?
    };
    tracing::debug!("{} commands, {} failed", summary.commands, summary.failures);
    Ok(())
}
