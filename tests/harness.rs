//! Test harness for fswalk integration tests

use std::path::Path;
use std::process::Command;

/// Run the fswalk binary with the given working directory and arguments.
/// Returns (stdout, stderr, success).
#[allow(dead_code)]
pub fn run_fswalk(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_fswalk"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run fswalk");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}
