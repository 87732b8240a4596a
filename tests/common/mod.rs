//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of the sample settings document shipped with the crate.
#[allow(dead_code)]
pub fn sample_config_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("settings/pkgbot_config.yaml")
}

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write `body` as `pkgbot_config.yaml` inside `dir`.
pub fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("pkgbot_config.yaml");
    fs::write(&path, body).expect("Failed to write config");
    path
}

/// Minimal valid document with one environment.
#[allow(dead_code)]
pub const MINIMAL: &str = "JamfPro_Dev:\n  jps_url: https://dev.jps.example.com\n";
