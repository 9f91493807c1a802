//! Configuration loading for the binary.
//!
//! The types live in `rf_core::config`; this module finds the file, applies
//! `SCHEDULE_*` environment overrides, and validates the result.

pub use rf_core::config::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Locations searched, in order, when no `--config` is given.
const DEFAULT_PATHS: [&str; 3] = [
    "./reelforge.toml",
    "~/.config/reelforge/config.toml",
    "/etc/reelforge/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    tracing::debug!("Loaded config from {:?}", path);
    finalize(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match find_config_file() {
        Some(path) => load_config(&path),
        None => finalize(Config::default()),
    }
}

/// The first default location that exists.
pub fn find_config_file() -> Option<PathBuf> {
    DEFAULT_PATHS
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
        .find(|p| p.exists())
}

/// Apply environment overrides, expand paths, and validate.
///
/// Schedule errors are fatal; everything else is logged as a warning.
fn finalize(mut config: Config) -> Result<Config> {
    config
        .schedule
        .apply_env()
        .context("Invalid SCHEDULE_* environment override")?;
    config.schedule.validate().context("Invalid schedule")?;

    let data_dir = config.storage.data_dir.to_string_lossy().into_owned();
    config.storage.data_dir = PathBuf::from(shellexpand::tilde(&data_dir).as_ref());

    for warning in config.validate() {
        tracing::warn!("Config: {warning}");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_all_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.schedule.interval_hours, 4);
        assert_eq!(config.pipeline.fetch_limit, 20);
    }

    #[test]
    fn malformed_schedule_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[schedule]\npeak_hours = [\"14-12\"]").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid schedule"), "got: {err:#}");
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pipeline]\nmin_rating = 8.0\nrender_style = \"story\"\n\n[storage]\ndata_dir = \"/var/lib/reelforge\""
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.pipeline.min_rating, 8.0);
        assert_eq!(config.pipeline.render_style, rf_core::RenderStyle::Story);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/reelforge"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/reelforge.toml")).is_err());
    }
}
