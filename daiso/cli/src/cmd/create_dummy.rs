use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use daiso_nlp::{ModelConfig, ModelWeights};

#[derive(Args)]
pub struct CreateDummyArgs {
    /// Output path.
    out: PathBuf,

    #[arg(long, default_value_t = ModelConfig::dummy().dim)]
    dim: usize,

    #[arg(long, default_value_t = ModelConfig::dummy().hidden_dim)]
    hidden_dim: usize,

    #[arg(long, default_value_t = ModelConfig::dummy().n_layers)]
    n_layers: usize,

    #[arg(long, default_value_t = ModelConfig::dummy().n_heads)]
    n_heads: usize,

    /// Defaults to --n-heads.
    #[arg(long)]
    n_kv_heads: Option<usize>,

    #[arg(long, default_value_t = ModelConfig::dummy().vocab_size)]
    vocab_size: usize,

    #[arg(long, default_value_t = ModelConfig::dummy().seq_len)]
    seq_len: usize,

    /// Seed for the random weights.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write all-zero weights instead of random ones.
    #[arg(long)]
    zeros: bool,
}

pub fn run(args: CreateDummyArgs) -> Result<()> {
    let config = ModelConfig {
        dim: args.dim,
        hidden_dim: args.hidden_dim,
        n_layers: args.n_layers,
        n_heads: args.n_heads,
        n_kv_heads: args.n_kv_heads.unwrap_or(args.n_heads),
        vocab_size: args.vocab_size,
        seq_len: args.seq_len,
    };
    config.validate().context("Invalid model dimensions")?;

    let weights = if args.zeros {
        ModelWeights::zeros(config)?
    } else {
        ModelWeights::random(config, args.seed)?
    };
    weights
        .save(&args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    log::info!("wrote {} weights to {}", weights.data().len(), args.out.display());
    eprintln!(
        "  Wrote {} ({} weights, {} bytes)",
        args.out.display(),
        weights.data().len(),
        weights.data().len() * 4 + daiso_nlp::HEADER_SIZE
    );
    Ok(())
}
