//! Group files: one member commitment (hex) per line.
//!
//! Prover and verifier both rebuild the group tree from the same file, so the
//! verifier checks a proof against the root it computed itself.

use crate::identity::parse_commitment;
use crate::merkle::MerkleTree;
use crate::utils::field_to_bytes;
use anyhow::{Context, Result};
use pasta_curves::pallas;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const MAX_GROUP_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Parses group file contents. Blank lines are skipped; duplicates are an
/// error.
pub fn parse_group(content: &str) -> Result<Vec<pallas::Base>> {
    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let commitment = parse_commitment(line)
            .with_context(|| format!("Invalid commitment on line {}", line_no + 1))?;
        if !seen.insert(field_to_bytes(commitment)) {
            return Err(anyhow::anyhow!(
                "Duplicate commitment on line {}: {}",
                line_no + 1,
                line
            ));
        }
        members.push(commitment);
    }

    if members.is_empty() {
        return Err(anyhow::anyhow!("No commitments found in group file"));
    }
    Ok(members)
}

pub fn load_group(path: &Path) -> Result<Vec<pallas::Base>> {
    let metadata = fs::metadata(path).context("Failed to read group file metadata")?;
    if metadata.len() > MAX_GROUP_FILE_SIZE {
        return Err(anyhow::anyhow!(
            "Group file too large: {} bytes (max {} bytes)",
            metadata.len(),
            MAX_GROUP_FILE_SIZE
        ));
    }

    let content = fs::read_to_string(path).context("Failed to read group file")?;
    parse_group(&content).with_context(|| format!("Invalid group file '{}'", path.display()))
}

/// Loads a group file and builds its tree at `depth`.
pub fn load_group_tree(path: &Path, depth: usize) -> Result<MerkleTree> {
    let members = load_group(path)?;
    MerkleTree::from_leaves(depth, &members).context("Failed to build group tree")
}
