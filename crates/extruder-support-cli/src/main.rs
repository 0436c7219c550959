//! extruder-support CLI - build the bracket and export it
//!
//! Runs the modeling pipeline with default or file-supplied parameters and
//! writes binary STL, optionally with the construction history as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extruder_support::{build, Bracket, BracketParams};
use planecad::planecad_ir::Document;
use planecad::Part;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "extruder-support")]
#[command(about = "Parametric extruder mounting bracket generator", long_about = None)]
struct Cli {
    /// Log modeling steps (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the bracket and write it as binary STL
    Build {
        /// TOML parameter file; missing fields keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output STL file
        #[arg(short, long, default_value = "bracket.stl")]
        output: PathBuf,
        /// Also write the construction history as JSON
        #[arg(short, long)]
        document: Option<PathBuf>,
    },
    /// Build the bracket and print the stage table and mass properties
    Info {
        /// TOML parameter file; missing fields keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the build report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the default parameters as TOML
    Params,
    /// Re-evaluate a saved construction history and write STL
    Export {
        /// Construction history JSON written by `build --document`
        input: PathBuf,
        /// Output STL file
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            config,
            output,
            document,
        } => {
            let bracket = build_bracket(config.as_deref())?;
            write_stl(&bracket.part, &output)?;
            if let Some(path) = document {
                let json = bracket.part.to_document().to_json()?;
                fs::write(&path, json)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                println!("Wrote construction history to {}", path.display());
            }
        }
        Commands::Info { config, json } => {
            let bracket = build_bracket(config.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&bracket.report)?);
            } else {
                print_info(&bracket);
            }
        }
        Commands::Params => {
            print!("{}", BracketParams::default().to_toml_string()?);
        }
        Commands::Export { input, output } => {
            let json = fs::read_to_string(&input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            let doc = Document::from_json(&json)
                .with_context(|| format!("{} is not a construction history", input.display()))?;
            let part = Part::from_document(&doc)?;
            write_stl(&part, &output)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_bracket(config: Option<&Path>) -> Result<Bracket> {
    let params = match config {
        Some(path) => BracketParams::load(path)?,
        None => BracketParams::default(),
    };
    tracing::info!("building bracket");
    build(&params).context("bracket build failed")
}

fn write_stl(part: &Part, output: &Path) -> Result<()> {
    part.write_stl(output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    println!(
        "Exported {} triangles to {}",
        part.num_triangles(),
        output.display()
    );
    Ok(())
}

fn print_info(bracket: &Bracket) {
    let report = &bracket.report;
    println!("{:<10} {:>12} {:>9} {:>6}", "stage", "volume", "polygons", "holes");
    for s in &report.stages {
        println!(
            "{:<10} {:>12.2} {:>9} {:>6}",
            s.stage, s.volume, s.polygons, s.holes_drilled
        );
    }
    println!();

    for row in &report.aux_holes {
        println!(
            "aux holes {:<17} {} groups, {} holes",
            row.placement, row.groups, row.holes
        );
    }
    println!("bridge length: {:.2} mm", report.bridge_length);
    println!("side hole span: {:.2} mm", report.hole_sep);
    println!();

    let part = &bracket.part;
    let (min, max) = part.bounding_box();
    let com = part.center_of_mass();
    println!(
        "bounding box: [{:.2}, {:.2}, {:.2}] .. [{:.2}, {:.2}, {:.2}]",
        min[0], min[1], min[2], max[0], max[1], max[2]
    );
    println!("volume: {:.2} mm³", part.volume());
    println!("surface area: {:.2} mm²", part.surface_area());
    println!("center of mass: [{:.2}, {:.2}, {:.2}]", com[0], com[1], com[2]);
    println!("triangles: {}", part.num_triangles());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_defaults() {
        let cli = Cli::try_parse_from(["extruder-support", "build"]).unwrap();
        match cli.command {
            Commands::Build {
                config,
                output,
                document,
            } => {
                assert!(config.is_none());
                assert_eq!(output, PathBuf::from("bracket.stl"));
                assert!(document.is_none());
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["extruder-support", "info", "-v", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Info { json: true, .. }));
    }

    #[test]
    fn export_needs_two_paths() {
        assert!(Cli::try_parse_from(["extruder-support", "export", "a.json"]).is_err());
    }
}
