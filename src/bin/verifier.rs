use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use pasta_curves::pallas;
use std::fs;
use std::path::PathBuf;
use zkp_semaphore::{
    group::load_group_tree, utils::field_to_hex, Config, NullifierLog, SignalProofOutput,
    SignalProver,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Verify an anonymous signal proof", long_about = None)]
struct Args {
    #[arg(short, long)]
    proof_file: PathBuf,

    /// Group the signal must come from, one member commitment (hex) per line
    #[arg(short, long)]
    group_file: PathBuf,

    /// Epoch the signal must be scoped to
    #[arg(short, long)]
    epoch: u64,

    /// Defaults to `[nullifiers] log_file` from the config
    #[arg(short, long)]
    nullifier_file: Option<PathBuf>,

    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    if !args.proof_file.exists() {
        return Err(anyhow::anyhow!(
            "Proof file does not exist: {}",
            args.proof_file.display()
        ));
    }

    info!("Loading proof from: {}", args.proof_file.display());
    println!("Loading proof from: {}", args.proof_file.display());

    let metadata = fs::metadata(&args.proof_file).context("Failed to read proof file metadata")?;
    debug!("Proof file size: {} bytes", metadata.len());

    if metadata.len() > config.proof.max_file_size {
        return Err(anyhow::anyhow!(
            "Proof file too large: {} bytes (max {} bytes). Raise [proof] max_file_size if the file is genuine.",
            metadata.len(),
            config.proof.max_file_size
        ));
    }

    let proof_content =
        fs::read_to_string(&args.proof_file).context("Failed to read proof file")?;
    let proof: SignalProofOutput =
        serde_json::from_str(&proof_content).context("Failed to parse proof JSON")?;

    if proof.zkp_proof.len() > config.proof.max_zk_proof_size {
        return Err(anyhow::anyhow!(
            "ZK proof size exceeds limit: {} bytes (max {} bytes)",
            proof.zkp_proof.len(),
            config.proof.max_zk_proof_size
        ));
    }

    let group = load_group_tree(&args.group_file, config.tree.depth)?;
    let expected_root = group.root();
    let expected_epoch = pallas::Base::from(args.epoch);
    debug!("Expected group root: {}", field_to_hex(expected_root));

    let public = proof
        .validate_for_group(&config.security, expected_root, expected_epoch)
        .context("Proof validation failed")?;
    info!("Proof validation passed");

    println!("Proof details:");
    println!("  Merkle Root: {}", proof.merkle_root);
    println!("  Epoch: {}", proof.epoch_nullifier);
    println!("  Signal Nullifier: {}", proof.signal_nullifier);
    println!("  Signal Hash: {}", proof.signal_hash);
    if let Some(signal) = &proof.signal {
        println!("  Signal: {signal}");
    }
    println!("  Timestamp: {}", proof.timestamp);
    println!("  ZK Proof Size: {} bytes", proof.zkp_proof.len());

    let nullifier_path = args
        .nullifier_file
        .unwrap_or_else(|| config.nullifiers.log_file.clone());
    let nullifiers = NullifierLog::new(nullifier_path);
    if nullifiers.contains(public.epoch_nullifier, public.signal_nullifier)? {
        error!("Nullifier already recorded for this epoch");
        return Err(anyhow::anyhow!(
            "Double signal: nullifier {} was already used in epoch {}",
            proof.signal_nullifier,
            proof.epoch_nullifier
        ));
    }

    println!("Verifying ZK proof...");
    let prover = SignalProver::compile(config.circuit.k).context("Failed to generate keys")?;
    let valid = prover
        .verify(&public, &proof.zkp_proof)
        .context("Proof verification could not run")?;

    if !valid {
        error!("Proof verification FAILED");
        println!("\n✗ Proof verification FAILED!");
        return Err(anyhow::anyhow!("Proof verification failed"));
    }

    info!("Proof verification PASSED");
    println!("\n✓ Proof verification PASSED!");
    println!("A group member signalled without revealing which one.");

    nullifiers
        .check_and_record(public.epoch_nullifier, public.signal_nullifier)
        .with_context(|| {
            format!(
                "Failed to record nullifier to: {}",
                nullifiers.path().display()
            )
        })?;
    info!("Nullifier recorded to: {}", nullifiers.path().display());
    println!("\nNullifier recorded to: {}", nullifiers.path().display());

    Ok(())
}
