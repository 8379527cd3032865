use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use pasta_curves::pallas;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use zkp_semaphore::{
    build_signal_inputs,
    group::load_group,
    utils::{field_to_hex, hash_signal},
    Config, Identity, IdentityRecord, MerkleTree, SignalProofOutput, SignalProver, TREE_DEPTH,
};

const MAX_IDENTITY_FILE_SIZE: u64 = 64 * 1024;

#[derive(Parser, Debug)]
#[command(author, version, about = "Prove an anonymous signal for a group", long_about = None)]
struct Args {
    /// Group file, one member commitment (hex) per line
    #[arg(short, long)]
    group_file: PathBuf,

    #[arg(short, long)]
    identity_file: PathBuf,

    /// External nullifier scoping the signal
    #[arg(short, long)]
    epoch: u64,

    #[arg(short, long)]
    signal: String,

    /// Defaults to `[proof] output_file` from the config
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path),
        None => Ok(Config::default()),
    }
}

fn load_identity(path: &PathBuf) -> Result<Identity> {
    let metadata = fs::metadata(path).context("Failed to read identity file metadata")?;
    if metadata.len() > MAX_IDENTITY_FILE_SIZE {
        return Err(anyhow::anyhow!(
            "Identity file too large: {} bytes",
            metadata.len()
        ));
    }

    let content = fs::read_to_string(path).context("Failed to read identity file")?;
    let record: IdentityRecord =
        serde_json::from_str(&content).context("Failed to parse identity JSON")?;
    Identity::try_from(&record)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let output_path = args.output.unwrap_or_else(|| config.proof.output_file.clone());

    println!("Loading group from: {}", args.group_file.display());
    let members = load_group(&args.group_file)?;
    println!("Loaded {} commitments", members.len());

    let identity = load_identity(&args.identity_file)?;
    debug!("Loaded identity {identity:?}");

    println!("Building Merkle tree...");
    let tree = MerkleTree::from_leaves(TREE_DEPTH, &members)
        .context("Failed to build group tree")?;
    println!("Merkle root: {}", field_to_hex(tree.root()));

    let epoch = pallas::Base::from(args.epoch);
    let signal_hash = hash_signal(args.signal.as_bytes());

    let (public, private) = build_signal_inputs(&identity, &tree, epoch, signal_hash)
        .with_context(|| {
            format!(
                "Identity commitment {} is not a member of group '{}'",
                field_to_hex(identity.commitment()),
                args.group_file.display()
            )
        })?;
    info!(
        "Member found at index {}",
        private.witness.calculate_index()
    );

    println!("Generating ZK proof (this may take a while)...");
    let prover = SignalProver::compile(config.circuit.k).context("Failed to generate keys")?;
    let zkp_proof = prover
        .prove(&public, &private)
        .context("Failed to create proof")?;
    println!("ZK proof generated, size: {} bytes", zkp_proof.len());

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the unix epoch")?
        .as_secs();
    let output = SignalProofOutput::new(&public, Some(args.signal), zkp_proof, timestamp);

    println!("Writing proof to: {}", output_path.display());
    let json_output =
        serde_json::to_string_pretty(&output).context("Failed to serialize proof to JSON")?;
    fs::write(&output_path, json_output).context("Failed to write proof file")?;

    println!("Proof successfully generated and saved!");
    println!("Merkle Root: {}", output.merkle_root);
    println!("Signal Nullifier: {}", output.signal_nullifier);

    Ok(())
}
