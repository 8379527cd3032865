use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;
use zkp_semaphore::{utils::field_to_hex, Identity};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate a group member identity", long_about = None)]
struct Args {
    /// Derive the identity deterministically from this seed instead of randomly
    #[arg(short, long)]
    seed: Option<String>,

    #[arg(short, long, default_value = "identity.json")]
    output: PathBuf,

    /// Overwrite an existing identity file
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.output.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Identity file already exists: {}. Pass --force to overwrite it.",
            args.output.display()
        ));
    }

    let identity = match &args.seed {
        Some(seed) => {
            info!("Deriving identity from seed");
            Identity::from_seed(seed)
        }
        None => {
            info!("Generating random identity");
            Identity::random(rand::thread_rng())
        }
    };

    let record = identity.to_record();
    let json = serde_json::to_string_pretty(&record).context("Failed to serialize identity")?;
    fs::write(&args.output, json)
        .with_context(|| format!("Failed to write identity file: {}", args.output.display()))?;

    info!("Identity written to {}", args.output.display());
    println!("Identity written to: {}", args.output.display());
    println!("Commitment: {}", field_to_hex(identity.commitment()));
    println!("Add the commitment to the group file; keep the identity file private.");

    Ok(())
}
