use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Used when `--aggregator` is not given.
    #[serde(default)]
    pub aggregator: Option<String>,
    /// Used when `--details` is not given.
    #[serde(default)]
    pub details_dir: Option<String>,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            log_dir: default_log_dir(),
            aggregator: None,
            details_dir: None,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("reconcile")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid settings file {}: {e}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ReconcileError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

/// Directories and verbosity for one run, passed explicitly through the
/// pipeline.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub verbosity: u8,
}

impl RunContext {
    /// Flags win over settings.
    pub fn new(settings: &Settings, output: Option<&str>, verbosity: u8) -> Self {
        let output_dir = shellexpand_path(output.unwrap_or(&settings.output_dir));
        Self {
            output_dir,
            log_dir: shellexpand_path(&settings.log_dir),
            verbosity,
        }
    }

    pub fn reconciled_dir(&self) -> PathBuf {
        self.output_dir.join("reconciled")
    }

    pub fn unmatched_dir(&self) -> PathBuf {
        self.output_dir.join("unmatched")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.reconciled_dir(), self.unmatched_dir(), self.log_dir.clone()] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
