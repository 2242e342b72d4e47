use std::path::PathBuf;

use clap::Parser;

/// Command line options for the billiard table simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Ball bouncing inside circle, ellipse, rectangle and stadium tables")]
pub struct CliOptions {
    /// Path to the run TOML configuration file.
    #[arg(long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Override the step count of single and divergence runs.
    #[arg(long, value_name = "N")]
    pub steps: Option<usize>,

    /// Override the seed of every random initial state.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Display configuration summary without running the simulation.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip PNG and SVG rendering.
    #[arg(long)]
    pub no_plots: bool,
}
