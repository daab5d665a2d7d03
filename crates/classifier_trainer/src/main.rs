//! ROI classifier CLI
//!
//! Trains classifier models from labelled sessions and applies them to new
//! recordings.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roiclass_core::{Classifier, ClassifierConfig, ClassifierSession, Model};
use roiclass_trainer::{
    load_descriptor_records, read_training_list, train_from_sessions, write_predictions, write_training_list,
};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "roiclass")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and apply ROI cell classifiers", long_about = None)]
struct Args {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model from the sessions named in a training list
    Train {
        /// Training list: one label-file path per line
        #[arg(short, long)]
        list: PathBuf,

        /// Extra label files to append to the list before training
        #[arg(long = "add")]
        add: Vec<PathBuf>,

        /// Descriptor keys, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        keys: Vec<String>,

        /// Output model file
        #[arg(short, long, default_value = "classifier.json")]
        output: PathBuf,

        /// TOML file overriding classifier parameters
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Classify the objects of one recording
    Apply {
        /// Model file
        #[arg(short, long)]
        model: PathBuf,

        /// Descriptor-record file (JSON array)
        #[arg(short, long)]
        stats: PathBuf,

        /// Output `label,probability` file
        #[arg(short, long, default_value = "iscell.csv")]
        output: PathBuf,

        /// Probability above which an object is labelled a cell
        #[arg(short, long, default_value = "0.5")]
        threshold: f64,
    },

    /// Print a model's descriptor keys and training summary
    Inspect {
        /// Model file
        #[arg(short, long)]
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    match args.command {
        Command::Train {
            list,
            add,
            keys,
            output,
            config,
        } => train(list, add, keys, output, config),
        Command::Apply {
            model,
            stats,
            output,
            threshold,
        } => apply(model, stats, output, threshold),
        Command::Inspect { model } => inspect(model),
    }
}

fn train(
    list: PathBuf,
    add: Vec<PathBuf>,
    keys: Vec<String>,
    output: PathBuf,
    config: Option<PathBuf>,
) -> Result<()> {
    info!("ROI classifier trainer v{}", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Some(path) => ClassifierConfig::from_toml_file(&path).context("Failed to load configuration")?,
        None => ClassifierConfig::default(),
    };

    let mut session = ClassifierSession::new(Classifier::new(config.clone()));
    if list.exists() {
        session.set_training_files(read_training_list(&list)?);
    }
    let mut list_changed = false;
    for file in &add {
        list_changed |= session.add_training_file(file);
    }
    if list_changed {
        write_training_list(&list, session.training_files())?;
        info!("Updated training list {}", list.display());
    }

    info!("Populating classifier from {} sessions", session.training_files().len());
    let (model, set) = train_from_sessions(session.training_files(), &keys, &config)?;
    for skipped in &set.skipped {
        warn!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }

    model.save(&output)?;
    info!("✓ Model written to {}", output.display());
    info!("  Objects: {} ({} positive)", set.len(), set.positives());
    info!("  Sessions: {} accepted, {} skipped", set.accepted.len(), set.skipped.len());
    info!("  Hash: {}", model.model_hash);
    Ok(())
}

fn apply(model: PathBuf, stats: PathBuf, output: PathBuf, threshold: f64) -> Result<()> {
    let (classifier, loaded) = Classifier::from_file(ClassifierConfig::default(), &model);
    loaded.context("Failed to load classifier")?;

    let mut session = ClassifierSession::new(classifier);
    session.set_threshold(threshold)?;

    let records = load_descriptor_records(&stats)
        .with_context(|| format!("Failed to read descriptor records from {}", stats.display()))?;
    let predictions = session.classify(&records)?.to_vec();

    write_predictions(&output, &predictions)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some(summary) = session.summary() {
        info!(
            "{} cells / {} non-cells (probability min {:.3}, mid {:.3}, max {:.3})",
            summary.positives, summary.negatives, summary.min, summary.mid, summary.max
        );
    }
    info!("✓ Predictions written to {}", output.display());
    Ok(())
}

fn inspect(path: PathBuf) -> Result<()> {
    let model = Model::load(&path)?;

    println!("model:        {}", path.display());
    println!("hash:         {}", model.model_hash);
    println!("descriptors:  {}", model.keys.join(", "));
    println!(
        "training:     {} objects ({} positive), calibration on {} objects",
        model.training.objects, model.training.positives, model.training.calibration_objects
    );
    for (key, (table, weight)) in model
        .keys
        .iter()
        .zip(model.likelihood.descriptors.iter().zip(&model.calibration.weights))
    {
        println!(
            "  {:<16} range [{}, {}]  bins {}  weight {:.4}",
            key,
            table.grid[0],
            table.grid[table.grid.len() - 1],
            table.rates.len(),
            weight
        );
    }
    println!("bias:         {:.4}", model.calibration.bias);
    Ok(())
}
