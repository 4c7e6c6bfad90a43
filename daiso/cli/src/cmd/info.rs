use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use daiso_nlp::{ModelHeader, HEADER_SIZE};

#[derive(Args)]
pub struct InfoArgs {
    /// Path to a model file.
    model: PathBuf,

    /// Print the header as JSON.
    #[arg(long)]
    json: bool,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let mut file =
        File::open(&args.model).with_context(|| format!("Failed to open {}", args.model.display()))?;
    let file_size = file.metadata()?.len();
    let mut bytes = Vec::with_capacity(HEADER_SIZE);
    (&mut file).take(HEADER_SIZE as u64).read_to_end(&mut bytes)?;

    let header = ModelHeader::decode(&bytes)
        .with_context(|| format!("Invalid model header: {}", args.model.display()))?;
    let c = header.config;
    let weights = c.weight_count()?;
    let expected_size = header.file_size()?;

    if args.json {
        let value = serde_json::json!({
            "version": header.version,
            "config": c,
            "head_dim": c.head_dim(),
            "weight_count": weights,
            "file_size": file_size,
            "expected_file_size": expected_size,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File:        {}", args.model.display());
    println!("Version:     {}", header.version);
    println!("dim:         {}", c.dim);
    println!("hidden_dim:  {}", c.hidden_dim);
    println!("n_layers:    {}", c.n_layers);
    println!("n_heads:     {} (head_dim {})", c.n_heads, c.head_dim());
    println!("n_kv_heads:  {}", c.n_kv_heads);
    println!("vocab_size:  {}", c.vocab_size);
    println!("seq_len:     {}", c.seq_len);
    println!("Weights:     {}", weights);
    if file_size == expected_size as u64 {
        println!("Size:        {} bytes", file_size);
    } else {
        println!("Size:        {} bytes (expected {})", file_size, expected_size);
    }
    Ok(())
}
