mod cli;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{info, warn};

use billiard_tables::config::{AppConfig, ConfigLoader, InitialStateConfig, RunConfig};
use billiard_tables::output::OutputBundle;
use billiard_tables::simulation::TrajectorySimulator;

use crate::cli::CliOptions;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = CliOptions::parse();

    let config_path = normalize_config_path(&cli.config)?;
    let mut app_config = ConfigLoader::load_from_path(&config_path)?;
    apply_overrides(&cli, &mut app_config)?;

    println!("Configuration summary:");
    for line in app_config.summary_lines() {
        println!("  - {line}");
    }

    let simulator = TrajectorySimulator::from_config(&app_config.simulation)?;
    let boundary = simulator.boundary();
    println!(
        "  -> geometry check: {}, bounding radius {:.3}, tolerance {:.3e}",
        boundary.shape_label(),
        boundary.bounding_radius(),
        boundary.tolerance()
    );

    if cli.dry_run {
        println!("Dry-run requested; exiting without running simulation.");
        return Ok(());
    }

    let start = Instant::now();
    let run = simulator
        .run(&app_config.simulation.run)
        .with_context(|| format!("{} run failed", app_config.simulation.run.mode_label()))?;
    let elapsed = start.elapsed();
    info!(
        "{} run produced {} samples in {elapsed:.3?}",
        run.samples.mode_label(),
        run.samples.len()
    );

    let mut output = app_config.simulation.output.clone();
    if cli.no_plots {
        output.export_png = false;
        output.export_svg = false;
    }
    let bundle = OutputBundle {
        run: &run,
        boundary,
        plot: &app_config.simulation.plot,
        output: &output,
        output_dir: &app_config.resolved_output_dir,
    };
    let csv_files = bundle.write_csv()?;
    let summary_file = bundle.write_summary(elapsed)?;
    let plot_files = bundle.write_plots()?;

    if let Some(result) = &run.dimension {
        match result.dimension {
            Some(dimension) => println!("Box-counting dimension: {dimension:.6}"),
            None => println!("Box-counting dimension: not enough occupied grid levels"),
        }
    }

    println!(
        "Simulation finished in {:.3?}; generated {} CSVs and {} plots.",
        elapsed,
        csv_files.len(),
        plot_files.len()
    );
    for file in csv_files.into_iter().chain(summary_file).chain(plot_files) {
        println!("  -> {}", file.display());
    }
    Ok(())
}

fn normalize_config_path(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    Err(anyhow!(
        "configuration file {} does not exist",
        path.display()
    ))
}

fn apply_overrides(cli: &CliOptions, app_config: &mut AppConfig) -> Result<()> {
    let run = &mut app_config.simulation.run;
    if let Some(new_steps) = cli.steps {
        match run {
            RunConfig::Single { steps, .. } | RunConfig::Divergence { steps, .. } => {
                *steps = new_steps;
            }
            RunConfig::Sweep { .. } => warn!("--steps has no effect on sweep runs"),
        }
    }

    if let Some(new_seed) = cli.seed {
        let initials: Vec<&mut InitialStateConfig> = match run {
            RunConfig::Single { initial, .. } => vec![initial],
            RunConfig::Divergence { first, second, .. } => vec![first, second],
            RunConfig::Sweep { .. } => Vec::new(),
        };
        let mut applied = false;
        for initial in initials {
            if let InitialStateConfig::Random { seed, .. } = initial {
                *seed = new_seed;
                applied = true;
            }
        }
        if !applied {
            warn!("--seed has no effect without a random initial state");
        }
    }

    app_config
        .simulation
        .validate()
        .context("invalid configuration after command line overrides")
}
