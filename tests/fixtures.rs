#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

pub fn samples_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .canonicalize()
        .unwrap()
}

pub fn drell_yan_sample() -> PathBuf {
    samples_dir().join("drell_yan_scale_variations.lhe")
}

/// Writes `content` into `dir` under `name` so the derived output files land
/// next to it inside the temp directory.
pub fn stage_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Copies the committed Drell-Yan sample into `dir` and returns its path.
pub fn stage_drell_yan_sample(dir: &Path) -> PathBuf {
    let path = dir.join("drell_yan_scale_variations.lhe");
    fs::copy(drell_yan_sample(), &path).unwrap();
    path
}
