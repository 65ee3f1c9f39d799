use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// User preferences persisted by the settings store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_create_placeholders")]
    pub create_placeholders: bool,
}

fn default_create_placeholders() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            create_placeholders: default_create_placeholders(),
        }
    }
}

impl Settings {
    /// Reads the settings file; a missing file reads through to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse settings: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
        Ok(())
    }

    pub fn with_placeholders(mut self, enabled: bool) -> Self {
        self.create_placeholders = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let mut out = std::env::temp_dir();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let pid = std::process::id();
        out.push(format!("{prefix}-{pid}-{now}"));
        out.push("settings.json");
        out
    }

    #[test]
    fn unset_preference_defaults_to_placeholders() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert!(settings.create_placeholders);
        assert!(Settings::default().create_placeholders);
    }

    #[test]
    fn missing_file_reads_defaults() -> Result<()> {
        let settings = Settings::load(&temp_path("adsweep-missing"))?;
        assert_eq!(settings, Settings::default());
        Ok(())
    }

    #[test]
    fn save_then_load() -> Result<()> {
        let path = temp_path("adsweep-settings");
        Settings::default().with_placeholders(false).save(&path)?;

        let contents = fs::read_to_string(&path)?;
        assert!(contents.contains("createPlaceholders"));
        assert!(!Settings::load(&path)?.create_placeholders);

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
        Ok(())
    }
}
