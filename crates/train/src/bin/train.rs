//! CLI for training the landmark deepfake detector from scratch.

use std::io::Write;
use std::path::PathBuf;

use candle_core::Device;
use clap::Parser;

use lrnet_common::{LandmarkCorpus, LrNetConfig, Split};
use lrnet_train::{train_branches, BranchSelection};

#[derive(Parser, Debug)]
#[command(name = "lrnet-train", about = "Train the two-branch landmark deepfake detector")]
struct Args {
    /// Run on the first CUDA device instead of the CPU.
    #[arg(short, long)]
    gpu: bool,
    #[arg(short, long, default_value = "DF", value_parser = ["DF", "F2F", "FS", "NT", "FF_all"])]
    dataset: String,
    #[arg(short, long, default_value = "c23", value_parser = ["raw", "c23", "c40"])]
    level: String,
    /// Branch to train: g1, g2, or all.
    #[arg(short, long, default_value = "all")]
    branch: String,
    #[arg(long, default_value = "datasets")]
    data_root: PathBuf,
    #[arg(long, default_value = "weights")]
    weights_dir: PathBuf,
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
    #[arg(long)]
    epochs_g1: Option<usize>,
    #[arg(long)]
    epochs_g2: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Validate the branch selection before touching config, data, or weights.
    let selection: BranchSelection = args.branch.parse()?;

    // Load or create config
    let mut config = if args.config.exists() {
        LrNetConfig::load(&args.config)?
    } else {
        let default = LrNetConfig::default();
        default.save(&args.config)?;
        eprintln!("Created default config at {}", args.config.display());
        default
    };
    if let Some(epochs) = args.epochs_g1 {
        config.epochs_g1 = epochs;
    }
    if let Some(epochs) = args.epochs_g2 {
        config.epochs_g2 = epochs;
    }

    let device = if args.gpu {
        Device::cuda_if_available(0)?
    } else {
        Device::Cpu
    };
    tracing::info!(
        dataset = %args.dataset,
        level = %args.level,
        branch = %args.branch,
        device = ?device,
        weights_dir = %args.weights_dir.display(),
        block_size = config.block_size,
        batch_size = config.batch_size,
        rnn_units = config.rnn_units,
        learning_rate = config.learning_rate,
        epochs_g1 = config.epochs_g1,
        epochs_g2 = config.epochs_g2,
        "starting training run"
    );

    let corpus =
        LandmarkCorpus::load(&args.data_root, &args.dataset, &args.level, config.feature_dim)?;
    eprintln!(
        "Loaded {}/{}: {} train videos, {} test videos",
        args.dataset,
        args.level,
        corpus.num_videos(Split::Train),
        corpus.num_videos(Split::Test)
    );

    let outcomes = train_branches(selection, &corpus, &config, &device, &args.weights_dir)?;

    std::fs::create_dir_all(&args.weights_dir)?;
    for outcome in &outcomes {
        let csv_path = args.weights_dir.join(format!("{}_metrics.csv", outcome.branch));
        let mut f = std::fs::File::create(&csv_path)?;
        writeln!(f, "epoch,loss,train_accuracy,test_accuracy")?;
        for (i, m) in outcome.log.iter().enumerate() {
            writeln!(f, "{},{},{},{}", i + 1, m.loss, m.train_accuracy, m.test_accuracy)?;
        }
        eprintln!(
            "Branch {} done: best test accuracy {:.4}, weights in {}",
            outcome.branch,
            outcome.best_score,
            args.weights_dir.join(outcome.branch.checkpoint_file()).display()
        );
    }
    Ok(())
}
