// File: config.rs
// Location: /src/config.rs

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppPreferences {
    pub color_scheme: String,
    #[serde(default = "default_live_preview")]
    pub live_preview: bool,
    #[serde(default)]
    pub debug_events: bool,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            color_scheme: "system".to_string(),
            live_preview: true,
            debug_events: false,
        }
    }
}

impl AppPreferences {
    pub fn validate(&self) -> Result<()> {
        match self.color_scheme.as_str() {
            "system" | "light" | "dark" => Ok(()),
            _ => anyhow::bail!("Invalid color scheme"),
        }
    }
}

fn default_live_preview() -> bool {
    true
}

/// Writes through a temporary file in the target directory, so readers
/// either see the old content or the complete new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn load_preferences(path: &Path) -> Result<AppPreferences> {
    let content = std::fs::read_to_string(path)?;
    let prefs: AppPreferences = serde_json::from_str(&content)?;
    prefs.validate()?;
    Ok(prefs)
}

pub fn save_preferences(path: &Path, prefs: &AppPreferences) -> Result<()> {
    prefs.validate()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(prefs)?;
    write_atomic(path, json.as_bytes())?;

    Ok(())
}

pub fn preferences_path() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".config/adw-qrcode/preferences.json"))
        .unwrap_or_else(|_| PathBuf::from("/tmp/adw-qrcode-preferences.json"))
}
