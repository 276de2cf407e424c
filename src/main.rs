//! rechit-export: write calorimeter rechits as ig event display documents.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rechit_export::event::load_events;
use rechit_export::{
    EventLoop, ExportConfig, ExporterConfig, IgPaths, LogSink, MemoryGeometry, StaticSetup,
};

#[derive(Debug, Parser)]
#[command(name = "rechit-export")]
#[command(about = "Export calorimeter rechits and cell geometry as ig documents")]
#[command(version)]
struct Command {
    /// JSON file listing the exporters to run
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Add an exporter without a config file, e.g. EE=ecalRecHit:EcalRecHitsEE:RECO
    #[arg(short = 'x', long = "export", value_parser = parse_export)]
    exports: Vec<ExporterConfig>,

    /// JSON file with the events to process
    #[arg(short, long)]
    events: PathBuf,

    /// JSON file with the cell geometry table
    #[arg(short, long)]
    geometry: PathBuf,

    /// Directory to write ig documents into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_export(s: &str) -> Result<ExporterConfig> {
    let Some((kind, tag)) = s.split_once('=') else {
        bail!("expected <KIND>=<label:instance:process>, got '{s}'");
    };
    Ok(ExporterConfig::new(kind.parse()?, tag))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn run(opts: Command) -> Result<()> {
    let mut config = match &opts.config {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    };
    config.exporters.extend(opts.exports);
    if config.exporters.is_empty() {
        bail!("No exporters configured; pass --config or --export");
    }

    let geometry = MemoryGeometry::load(&opts.geometry)?;
    let setup = StaticSetup::new(&geometry);

    let mut event_loop = EventLoop::from_config(&config, LogSink::new())?;
    let paths = IgPaths::new(&opts.output_dir);

    let events = load_events(&opts.events)?;
    tracing::info!("Processing {} events", events.len());
    for event in &events {
        event_loop.process(event, &setup)?;
        let document = event_loop.finish_event();
        let path = paths.write_event(event.id, &document)?;
        tracing::debug!("Wrote {}", path.display());
    }

    event_loop.log_summary();
    Ok(())
}

fn main() -> Result<()> {
    let opts = Command::parse();
    init_logging(opts.verbose);
    run(opts)
}
