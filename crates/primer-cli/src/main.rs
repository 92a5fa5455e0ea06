//! Primer CLI - Command-line interface for catalog generation and upkeep

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, generate, providers, reconcile, validate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "primer")]
#[command(about = "Incremental catalog generation and asset reconciliation", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of ~/.primer/config.toml + .primer/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in missing text, images and audio for every seed
    Generate(generate::GenerateArgs),

    /// Compare catalog references against the asset directories
    Reconcile {
        /// Delete orphaned files after the report
        #[arg(long)]
        delete: bool,

        /// Skip the confirmation prompt when deleting
        #[arg(long, short = 'y')]
        yes: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Report catalog entries whose files are missing
    Check {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Remove catalog entries matching the exclusion rules
    Validate {
        /// Delete files and rewrite the catalog (default is a dry run)
        #[arg(long)]
        apply: bool,
    },

    /// List providers, their capabilities and credential status
    Providers,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = commands::load_config(cli.config.as_deref())?;

    let success = match cli.command {
        Commands::Generate(args) => generate::run(config, args)?,
        Commands::Reconcile {
            delete,
            yes,
            format,
        } => reconcile::run(&config, delete, yes, &format)?,
        Commands::Check { format } => check::run(&config, &format)?,
        Commands::Validate { apply } => validate::run(&config, apply)?,
        Commands::Providers => providers::run(&config),
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}
