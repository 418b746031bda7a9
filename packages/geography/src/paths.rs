#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for reference data and model files.
//!
//! Defaults are relative to the workspace root and can be overridden with
//! `DAMAGE_MAP_DATA_DIR` and `DAMAGE_MAP_MODELS_DIR`.

use std::path::{Path, PathBuf};

/// Environment variable overriding [`data_dir`].
pub const DATA_DIR_ENV: &str = "DAMAGE_MAP_DATA_DIR";

/// Environment variable overriding [`models_dir`].
pub const MODELS_DIR_ENV: &str = "DAMAGE_MAP_MODELS_DIR";

/// File name of the county-year panel table.
pub const PANEL_FILE: &str = "merged_data_county.csv";

/// File name of the county boundary table.
pub const BOUNDARIES_FILE: &str = "cmap.csv";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`; falls back to the
/// current directory if the manifest is not nested as expected.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the directory holding the serialized regression models.
#[must_use]
pub fn models_dir() -> PathBuf {
    std::env::var_os(MODELS_DIR_ENV).map_or_else(|| project_root().join("models"), PathBuf::from)
}

/// Returns the path of the county-year panel inside `data_dir`.
#[must_use]
pub fn panel_path(data_dir: &Path) -> PathBuf {
    data_dir.join(PANEL_FILE)
}

/// Returns the path of the county boundary table inside `data_dir`.
#[must_use]
pub fn boundaries_path(data_dir: &Path) -> PathBuf {
    data_dir.join(BOUNDARIES_FILE)
}

/// Returns the `data/generated/` directory for output artifacts.
#[must_use]
pub fn generated_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("generated")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
