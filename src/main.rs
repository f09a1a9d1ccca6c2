mod catalog;
mod checkbox;
mod cli;
mod config;
mod enumerate;
mod filter;
mod focus;
mod midi;
mod query;
mod report;
mod tui;

use std::path::Path;

use anyhow::Context;
use clap::Parser;

use catalog::Catalog;
use cli::{Cli, Command, SendArgs};
use config::Config;
use midi::{MidirOut, PortError};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path);
    log::debug!("Using config {}", config.path().display());

    match cli.command {
        Some(Command::Ports) => enumerate::ports(config.selected_midi_port()),
        Some(Command::List(args)) => report::list(&load_catalog(&cli.catalog)?, args),
        Some(Command::Send(args)) => send(&load_catalog(&cli.catalog)?, &config, args),
        Some(Command::Duplicates) => report::duplicates(&load_catalog(&cli.catalog)?),
        None => tui::run(&load_catalog(&cli.catalog)?, config),
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let catalog = Catalog::load(path)
        .with_context(|| format!("cannot load preset catalog {}", path.display()))?;
    if catalog.is_empty() {
        log::warn!("Preset catalog {} is empty", path.display());
    }
    Ok(catalog)
}

fn send(catalog: &Catalog, config: &Config, args: SendArgs) -> anyhow::Result<()> {
    let Some(preset) = catalog.find_by_name(&args.preset, args.pack.as_deref()) else {
        match &args.pack {
            Some(pack) => anyhow::bail!("no preset named '{}' in pack '{pack}'", args.preset),
            None => anyhow::bail!("no preset named '{}'", args.preset),
        }
    };
    let port = args
        .port
        .as_deref()
        .or(config.selected_midi_port())
        .ok_or(PortError::NoPortSelected)?;

    midi::send_preset_change(&MidirOut::new(), port, preset, config.settle_delay())?;
    println!(
        "{} ({}/{}) cc0={} pgm={} -> {port}",
        preset.name, preset.pack, preset.kind, preset.cc0, preset.pgm
    );
    Ok(())
}
