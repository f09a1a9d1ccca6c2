use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::query::SortKey;

#[derive(Parser)]
#[command(name = "osmose-presets", about = "Browse synthesizer presets and select them over MIDI")]
pub struct Cli {
    /// Preset catalog (JSON array of preset records)
    #[arg(long, default_value = "OsmosePresets.json")]
    pub catalog: PathBuf,

    /// Config file (default: platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List available MIDI output ports
    Ports,
    /// Print presets as a table
    List(ListArgs),
    /// Select a preset on the device by name
    Send(SendArgs),
    /// Report presets that share a bank/program address
    Duplicates,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Pack to include (repeatable; default: all packs)
    #[arg(long = "pack")]
    pub packs: Vec<String>,

    /// Type to include (repeatable; default: all types)
    #[arg(long = "type")]
    pub types: Vec<String>,

    /// Sort key as field[:asc|desc] (repeatable, most significant first)
    #[arg(long = "sort")]
    pub sort: Vec<SortKey>,

    /// Only presets whose name or characters contain this text
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(clap::Args)]
pub struct SendArgs {
    /// Preset name (case-insensitive)
    pub preset: String,

    /// Pack to look in when the name is not unique
    #[arg(long)]
    pub pack: Option<String>,

    /// MIDI output port (default: the port saved in the config)
    #[arg(long)]
    pub port: Option<String>,
}
