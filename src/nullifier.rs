//! Append-only record of signal nullifiers seen per epoch.
//!
//! One entry per line, `<epoch_hex>:<nullifier_hex>`, lowercase. A nullifier
//! may appear once per epoch; the same value under another epoch is a
//! distinct entry.

use crate::utils::field_to_hex;
use anyhow::{Context, Result};
use log::{debug, warn};
use pasta_curves::pallas;
use std::fs;
use std::io::{BufRead, BufReader, Seek, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct NullifierLog {
    path: PathBuf,
}

fn entry(epoch_nullifier: pallas::Base, signal_nullifier: pallas::Base) -> String {
    format!(
        "{}:{}",
        field_to_hex(epoch_nullifier),
        field_to_hex(signal_nullifier)
    )
}

impl NullifierLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the pair was already recorded. A missing file holds nothing.
    pub fn contains(
        &self,
        epoch_nullifier: pallas::Base,
        signal_nullifier: pallas::Base,
    ) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        let file = fs::File::open(&self.path)
            .with_context(|| format!("Failed to open nullifier file: {}", self.path.display()))?;
        let wanted = entry(epoch_nullifier, signal_nullifier);

        for line in BufReader::new(file).lines() {
            let line = line.context("Failed to read line from nullifier file")?;
            if line.trim().to_lowercase() == wanted {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Records the pair, failing if it is already present.
    pub fn check_and_record(
        &self,
        epoch_nullifier: pallas::Base,
        signal_nullifier: pallas::Base,
    ) -> Result<()> {
        let normalized = entry(epoch_nullifier, signal_nullifier);

        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("Failed to open nullifier file: {}", self.path.display()))?;

        let reader = BufReader::new(&file);
        for line in reader.lines() {
            let line = line.context("Failed to read line from nullifier file")?;
            if line.trim().to_lowercase() == normalized {
                warn!("Nullifier already recorded for this epoch: {normalized}");
                return Err(anyhow::anyhow!(
                    "Double signal: nullifier {} was already used in epoch {}",
                    field_to_hex(signal_nullifier),
                    field_to_hex(epoch_nullifier)
                ));
            }
        }

        let mut writer = std::io::BufWriter::new(&file);
        writer
            .seek(std::io::SeekFrom::End(0))
            .context("Failed to seek to end of file")?;
        writer
            .write_all(normalized.as_bytes())
            .context("Failed to write nullifier")?;
        writer.write_all(b"\n").context("Failed to write newline")?;
        writer.flush().context("Failed to flush writer")?;

        debug!("Nullifier recorded: {normalized}");
        Ok(())
    }
}
