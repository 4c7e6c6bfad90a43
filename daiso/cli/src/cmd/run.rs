use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;

use daiso_nlp::{ByteTokenizer, GenerationConfig, LogSink, Model, Tokenizer};

#[derive(Args)]
pub struct RunArgs {
    /// Path to a model file.
    model: PathBuf,

    /// Prompt text, encoded byte by byte (needs a vocabulary of at least 256).
    #[arg(long, conflicts_with = "tokens")]
    prompt: Option<String>,

    /// Prompt as comma-separated token IDs.
    #[arg(long, value_delimiter = ',')]
    tokens: Option<Vec<u32>>,

    /// Maximum number of tokens to generate.
    #[arg(long)]
    steps: Option<usize>,

    /// Sampling temperature (0.0 = greedy).
    #[arg(long, allow_negative_numbers = true)]
    temperature: Option<f32>,

    /// Top-k sampling.
    #[arg(long)]
    top_k: Option<usize>,

    /// Nucleus (top-p) sampling.
    #[arg(long)]
    top_p: Option<f32>,

    /// Seed for the random sampler.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON generation config; flags given on the command line override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print tokens as they are generated.
    #[arg(long)]
    stream: bool,
}

fn generation_config(args: &RunArgs) -> Result<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)
            .with_context(|| format!("Failed to read generation config: {}", path.display()))?,
        None => GenerationConfig::default(),
    };
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(t) = args.temperature {
        config.temperature = t;
    }
    if let Some(k) = args.top_k {
        config.top_k = Some(k);
    }
    if let Some(p) = args.top_p {
        config.top_p = p;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn validate_args(config: &GenerationConfig) -> Result<()> {
    if config.temperature < 0.0 {
        bail!("--temperature must be >= 0.0, got {}", config.temperature);
    }
    if config.top_k == Some(0) {
        bail!("--top-k must be > 0");
    }
    if config.top_p <= 0.0 || config.top_p > 1.0 {
        bail!("--top-p must be in (0.0, 1.0], got {}", config.top_p);
    }
    config.validate()?;
    Ok(())
}

/// Render tokens as text when the vocabulary covers bytes, else as IDs.
fn render(tokenizer: Option<&ByteTokenizer>, tokens: &[u32]) -> Result<String> {
    match tokenizer {
        Some(tok) => Ok(tok.decode(tokens)?),
        None => Ok(tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(" ")),
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = generation_config(&args)?;
    validate_args(&config)?;

    let load_start = Instant::now();
    let mut model = Model::load(&args.model, Box::new(LogSink))
        .with_context(|| format!("Failed to load model: {}", args.model.display()))?;
    let model_config = *model.config();
    eprintln!(
        "  Loaded {} in {:.2}s (dim={}, layers={}, vocab={}, seq_len={})",
        args.model.display(),
        load_start.elapsed().as_secs_f64(),
        model_config.dim,
        model_config.n_layers,
        model_config.vocab_size,
        model_config.seq_len
    );

    let tokenizer = ByteTokenizer::new(model_config.vocab_size).ok();
    let prompt = match (&args.tokens, &args.prompt) {
        (Some(ids), _) => ids.clone(),
        (None, Some(text)) => match &tokenizer {
            Some(tok) => tok.encode(text)?,
            None => bail!(
                "--prompt needs a vocabulary of at least 256 tokens (model has {}); use --tokens",
                model_config.vocab_size
            ),
        },
        (None, None) => Vec::new(),
    };

    let mut sampler = config.build_sampler()?;
    eprintln!("---");
    let gen_start = Instant::now();

    let output = if args.stream {
        let mut decoder = tokenizer.as_ref().map(ByteTokenizer::stream_decoder);
        match &mut decoder {
            Some(dec) => {
                for &token in &prompt {
                    print!("{}", dec.push(token)?);
                }
            }
            None => print!("{}", render(None, &prompt)?),
        }
        let mut stdout = io::stdout();
        let tokens = model.generate_stream(&prompt, config.steps, sampler.as_mut(), |token| {
            let piece = match &mut decoder {
                Some(dec) => dec.push(token).unwrap_or_default(),
                None => format!(" {}", token),
            };
            print!("{piece}");
            stdout.flush().is_ok()
        })?;
        if let Some(dec) = &mut decoder {
            print!("{}", dec.finish());
        }
        println!();
        tokens
    } else {
        let tokens = model.generate(&prompt, config.steps, sampler.as_mut())?;
        println!("{}", render(tokenizer.as_ref(), &tokens)?);
        tokens
    };

    let generated = output.len() - prompt.len();
    let elapsed = gen_start.elapsed();
    eprintln!("---");
    eprintln!(
        "  {} tokens in {:.2}s ({:.1} tokens/sec)",
        generated,
        elapsed.as_secs_f64(),
        generated as f64 / elapsed.as_secs_f64().max(1e-9)
    );
    Ok(())
}
