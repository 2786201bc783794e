//! stylecraft CLI: the main entry point.
//!
//! Commands:
//! - `init`    : Write a default config file
//! - `adapt`   : Adapt a style recipe to a new subject
//! - `prompts` : Print the compiled prompts without calling a model
//! - `parse`   : Run the JSON extractor on a saved model response
//! - `doctor`  : Diagnose configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::inputs::RunInputs;

#[derive(Parser)]
#[command(
    name = "stylecraft",
    about = "stylecraft — adapt saved style recipes to new subjects",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Adapt a style recipe to a new image or prompt
    Adapt {
        #[command(flatten)]
        inputs: RunInputs,

        /// Override the adaptation model
        #[arg(short, long)]
        model: Option<String>,

        /// Write the result JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the compiled prompts and token budget (no network call)
    Prompts {
        #[command(flatten)]
        inputs: RunInputs,

        /// Model whose parse mode to report
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Run the JSON extractor on a saved model response
    Parse {
        /// File holding the raw model response
        file: PathBuf,

        /// Require `promotional_text_visuals`
        #[arg(long)]
        render_text: bool,

        /// Require `logo_visuals`
        #[arg(long)]
        branding: bool,
    },

    /// Diagnose configuration
    Doctor {
        /// Also call the provider's health check
        #[arg(long)]
        check_provider: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Adapt {
            inputs,
            model,
            output,
        } => commands::adapt::run(inputs, model, output).await?,
        Commands::Prompts { inputs, model } => commands::prompts::run(inputs, model).await?,
        Commands::Parse {
            file,
            render_text,
            branding,
        } => commands::parse::run(&file, render_text, branding).await?,
        Commands::Doctor { check_provider } => commands::doctor::run(check_provider).await?,
    }

    Ok(())
}
