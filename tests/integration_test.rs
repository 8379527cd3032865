use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Binaries {
    identity: PathBuf,
    prover: PathBuf,
    verifier: PathBuf,
}

fn binaries() -> Option<Binaries> {
    let bins = Binaries {
        identity: PathBuf::from("./target/release/identity"),
        prover: PathBuf::from("./target/release/prover"),
        verifier: PathBuf::from("./target/release/verifier"),
    };

    if !bins.identity.exists() || !bins.prover.exists() || !bins.verifier.exists() {
        eprintln!("Skipping integration test: release binaries not found");
        return None;
    }
    Some(bins)
}

fn commitment_from(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Commitment: "))
        .expect("identity binary prints the commitment")
        .trim()
        .to_string()
}

fn make_identity(bins: &Binaries, dir: &Path, name: &str) -> (PathBuf, String) {
    let path = dir.join(format!("{name}.json"));
    let output = Command::new(&bins.identity)
        .arg("--seed")
        .arg(name)
        .arg("--output")
        .arg(&path)
        .output()
        .expect("Failed to execute identity");
    assert!(
        output.status.success(),
        "Identity failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    (path, commitment_from(&output))
}

fn prove(bins: &Binaries, group: &Path, identity: &Path, epoch: u64, proof: &Path) -> Output {
    Command::new(&bins.prover)
        .arg("--group-file")
        .arg(group)
        .arg("--identity-file")
        .arg(identity)
        .arg("--epoch")
        .arg(epoch.to_string())
        .arg("--signal")
        .arg("hello group")
        .arg("--output")
        .arg(proof)
        .output()
        .expect("Failed to execute prover")
}

fn verify(bins: &Binaries, proof: &Path, group: &Path, epoch: u64, nullifiers: &Path) -> Output {
    Command::new(&bins.verifier)
        .arg("--proof-file")
        .arg(proof)
        .arg("--group-file")
        .arg(group)
        .arg("--epoch")
        .arg(epoch.to_string())
        .arg("--nullifier-file")
        .arg(nullifiers)
        .output()
        .expect("Failed to execute verifier")
}

fn setup_group(bins: &Binaries, dir: &Path) -> (PathBuf, PathBuf) {
    let (member, member_commitment) = make_identity(bins, dir, "member");
    let (_, other1) = make_identity(bins, dir, "other1");
    let (_, other2) = make_identity(bins, dir, "other2");

    let group = dir.join("group.txt");
    fs::write(&group, [other1, member_commitment, other2].join("\n"))
        .expect("Failed to write group file");
    (group, member)
}

#[test]
fn test_end_to_end_signal_workflow() {
    let Some(bins) = binaries() else { return };
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (group, member) = setup_group(&bins, temp_dir.path());
    let proof_file = temp_dir.path().join("proof.json");
    let nullifiers = temp_dir.path().join("nullifiers.txt");

    let prover_output = prove(&bins, &group, &member, 1, &proof_file);
    assert!(
        prover_output.status.success(),
        "Prover failed: {}",
        String::from_utf8_lossy(&prover_output.stderr)
    );
    assert!(proof_file.exists(), "Proof file was not created");

    let verifier_output = verify(&bins, &proof_file, &group, 1, &nullifiers);
    assert!(
        verifier_output.status.success(),
        "Verifier failed: {}",
        String::from_utf8_lossy(&verifier_output.stderr)
    );
    let verifier_stdout = String::from_utf8_lossy(&verifier_output.stdout);
    assert!(
        verifier_stdout.contains("Proof verification PASSED"),
        "Proof verification did not pass: {verifier_stdout}"
    );
}

#[test]
fn test_double_signal_rejected_within_epoch() {
    let Some(bins) = binaries() else { return };
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (group, member) = setup_group(&bins, temp_dir.path());
    let nullifiers = temp_dir.path().join("nullifiers.txt");

    let first = temp_dir.path().join("first.json");
    let second = temp_dir.path().join("second.json");
    let next_epoch = temp_dir.path().join("next_epoch.json");
    for (proof, epoch) in [(&first, 5), (&second, 5), (&next_epoch, 6)] {
        let output = prove(&bins, &group, &member, epoch, proof);
        assert!(output.status.success(), "Prover failed for epoch {epoch}");
    }

    assert!(verify(&bins, &first, &group, 5, &nullifiers).status.success());

    let replay = verify(&bins, &second, &group, 5, &nullifiers);
    assert!(!replay.status.success(), "Second signal in epoch 5 must fail");
    assert!(String::from_utf8_lossy(&replay.stderr).contains("Double signal"));

    assert!(verify(&bins, &next_epoch, &group, 6, &nullifiers).status.success());
}

#[test]
fn test_non_member_cannot_prove() {
    let Some(bins) = binaries() else { return };
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (group, _) = setup_group(&bins, temp_dir.path());
    let (outsider, _) = make_identity(&bins, temp_dir.path(), "outsider");
    let proof_file = temp_dir.path().join("proof.json");

    let output = prove(&bins, &group, &outsider, 1, &proof_file);
    assert!(!output.status.success());
    assert!(!proof_file.exists());
}

#[test]
fn test_duplicate_group_member_rejected() {
    let Some(bins) = binaries() else { return };
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (member, commitment) = make_identity(&bins, temp_dir.path(), "member");

    let group = temp_dir.path().join("group.txt");
    fs::write(&group, format!("{commitment}\n{commitment}\n")).unwrap();

    let output = prove(&bins, &group, &member, 1, &temp_dir.path().join("proof.json"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Duplicate commitment"));
}

#[test]
fn test_tampered_signal_rejected() {
    let Some(bins) = binaries() else { return };
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (group, member) = setup_group(&bins, temp_dir.path());
    let proof_file = temp_dir.path().join("proof.json");
    let nullifiers = temp_dir.path().join("nullifiers.txt");

    assert!(prove(&bins, &group, &member, 1, &proof_file).status.success());

    let mut json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&proof_file).unwrap()).unwrap();
    json["signal"] = serde_json::Value::String("goodbye group".to_string());
    fs::write(&proof_file, serde_json::to_string(&json).unwrap()).unwrap();

    let output = verify(&bins, &proof_file, &group, 1, &nullifiers);
    assert!(!output.status.success());
    assert!(!nullifiers.exists() || fs::read_to_string(&nullifiers).unwrap().is_empty());
}

#[test]
fn test_verifier_rejects_proof_over_self_made_group() {
    let Some(bins) = binaries() else { return };
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (group, _) = setup_group(&bins, temp_dir.path());
    let (outsider, outsider_commitment) = make_identity(&bins, temp_dir.path(), "outsider");

    let own_group = temp_dir.path().join("own_group.txt");
    fs::write(&own_group, &outsider_commitment).unwrap();
    let proof_file = temp_dir.path().join("proof.json");
    let nullifiers = temp_dir.path().join("nullifiers.txt");

    assert!(prove(&bins, &own_group, &outsider, 1, &proof_file).status.success());

    let output = verify(&bins, &proof_file, &group, 1, &nullifiers);
    assert!(!output.status.success(), "Proof over another group must fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("expected group root"));
    assert!(!nullifiers.exists());
}

#[test]
fn test_verifier_rejects_unexpected_epoch() {
    let Some(bins) = binaries() else { return };
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (group, member) = setup_group(&bins, temp_dir.path());
    let proof_file = temp_dir.path().join("proof.json");
    let nullifiers = temp_dir.path().join("nullifiers.txt");

    assert!(prove(&bins, &group, &member, 7, &proof_file).status.success());

    let output = verify(&bins, &proof_file, &group, 8, &nullifiers);
    assert!(!output.status.success(), "Proof for epoch 7 must fail in epoch 8");
    assert!(String::from_utf8_lossy(&output.stderr).contains("expected epoch"));
    assert!(!nullifiers.exists());
}
