//! Selective-Kernel Attention Demo
//!
//! Builds the attention block on the selected backend, runs it on synthetic
//! input and prints a report of the resulting shapes and attention weights.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use sk_attention::Mode;
use sk_attention_demos::{
    create_device, describe, get_backend_name, run_forward, RunConfig, SelectedBackend,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sk-attention")]
#[command(author, version, about = "Selective-kernel attention fusion demos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one forward pass on random input
    Run(RunArgs),

    /// Show the structure of a configuration
    Info {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output path
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override input height
    #[arg(long)]
    height: Option<usize>,

    /// Override input width
    #[arg(long)]
    width: Option<usize>,

    /// Override forward mode ("train" or "eval")
    #[arg(long)]
    mode: Option<Mode>,

    /// Override dilation rates, e.g. `--kernels 6,12,18`
    #[arg(long, value_delimiter = ',')]
    kernels: Option<Vec<usize>>,

    /// Seed for parameters and input
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load_from_path(path),
        None => Ok(RunConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let device = create_device();
    tracing::info!(backend = get_backend_name(), "selected backend");

    match cli.command {
        Commands::Run(args) => {
            let mut config = load_config(args.config.as_ref())?;

            // Apply command line overrides
            if let Some(batch_size) = args.batch_size {
                config.batch_size = batch_size;
            }
            if let Some(height) = args.height {
                config.height = height;
            }
            if let Some(width) = args.width {
                config.width = width;
            }
            if let Some(mode) = args.mode {
                config.mode = mode;
            }
            if let Some(kernels) = args.kernels {
                config.model.kernels = kernels;
            }
            if args.seed.is_some() {
                config.seed = args.seed;
            }

            let report = run_forward::<SelectedBackend>(&config, &device)?;
            tracing::info!(
                fused = ?report.fused_shape,
                embedding = ?report.embedding_shape,
                attention = ?report.attention_shape,
                deviation = report.max_attention_deviation,
                "forward pass completed"
            );

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Input:      {:?}", report.input_shape);
                println!("Fused:      {:?}", report.fused_shape);
                println!("Embedding:  {:?}", report.embedding_shape);
                println!("Attention:  {:?}", report.attention_shape);
                println!("Branches:   {} (dilations {:?})", report.num_branches, report.dilations);
                println!("Bottleneck: {}", report.bottleneck_dim);
                println!("Parameters: {}", report.num_params);
                println!("Max |sum(attention) - 1|: {:e}", report.max_attention_deviation);
            }
        }

        Commands::Info { config, json } => {
            let config = load_config(config.as_ref())?;
            let info = describe::<SelectedBackend>(&config.model, &device)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Selective-kernel attention:");
                println!("  Backend:    {}", get_backend_name());
                println!("  Channels:   {} -> {}", info.channel_in, info.channel);
                println!("  Dilations:  {:?}", info.dilations);
                println!("  Branches:   {}", info.num_branches);
                println!("  Bottleneck: {}", info.bottleneck_dim);
                println!("  Parameters: {}", info.num_params);
            }
        }

        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                bail!(
                    "Refusing to overwrite {} (pass --force to replace it)",
                    output.display()
                );
            }
            RunConfig::default().save_to_path(&output)?;
            tracing::info!(path = %output.display(), "wrote default configuration");
        }
    }

    Ok(())
}
