//! AquaSafe
//!
//! Trains the water contamination model and serves risk predictions.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use aquasafe::commands;
use clap::{Parser, Subcommand};
use config::Config;
use ml_model::TrainingConfig;
use tracing_subscriber::EnvFilter;
use water_structs::FeatureRecord;

/// AquaSafe water contamination predictor
#[derive(Parser)]
#[command(name = "aquasafe")]
#[command(about = "Water contamination risk prediction")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model on the labeled dataset
    Train {
        /// Path to the dataset CSV (searches ../data and data if omitted)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Where to write the trained pipeline
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of trees in the forest
        #[arg(short, long, default_value = "100")]
        trees: usize,

        /// Seed for the split and the forest
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_size: f64,
    },

    /// Run the prediction service
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Path to the trained pipeline
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Classify a single sample
    Predict {
        /// Criteria value (e.g. "Present", "Absent")
        #[arg(short, long)]
        criteria: String,

        /// Percentage measurement
        #[arg(short, long)]
        percentage: f64,

        /// Salt concentration count
        #[arg(short, long)]
        salt_count: f64,

        /// Path to the trained pipeline
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();

    match cli.command {
        Commands::Train {
            data,
            output,
            trees,
            seed,
            test_size,
        } => {
            let training = TrainingConfig::default()
                .with_n_trees(trees)
                .with_seed(seed)
                .with_test_size(test_size);
            let evaluation =
                commands::train::run(&config, data.as_deref(), output.as_deref(), &training)?;
            println!("Accuracy: {}", evaluation.accuracy);
            println!("Confusion Matrix:\n{}", evaluation.confusion);
        }
        Commands::Serve { listen, model } => {
            let listen_addr = match listen {
                Some(addr) => addr,
                None => config.socket_addr()?,
            };
            let model_path = model.unwrap_or(config.model_path);
            commands::serve::run(listen_addr, &model_path).await?;
        }
        Commands::Predict {
            criteria,
            percentage,
            salt_count,
            model,
        } => {
            let model_path = model.unwrap_or(config.model_path);
            let record = FeatureRecord::new(criteria, percentage, salt_count);
            let result = commands::predict::run(&model_path, &record)?;
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
