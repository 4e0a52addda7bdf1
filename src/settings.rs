//! User-level builder settings persisted as JSON in the platform config directory

use crate::constants::document;
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Order of items in a generated choice list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceOrder {
    /// Sorted by member name; item value is the member's numeric value
    Alphabetical,
    /// Declaration order; item value is the member's index
    Declaration,
}

/// Settings shared by every schema node in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Attach mode applied on insertion to nodes whose user never chose one
    pub default_attach_mode: bool,
    pub picker_choice_order: ChoiceOrder,
    pub prebound_choice_order: ChoiceOrder,
    pub debounce_ms: u64,
    pub sibling_scan_cap: usize,
    /// Document units stamped on constructed objects that carry none
    pub units: String,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            default_attach_mode: false,
            picker_choice_order: ChoiceOrder::Alphabetical,
            prebound_choice_order: ChoiceOrder::Declaration,
            debounce_ms: document::NAME_EDIT_DEBOUNCE_MS,
            sibling_scan_cap: document::SIBLING_SCAN_CAP,
            units: document::DEFAULT_UNITS.to_string(),
        }
    }
}

impl BuilderSettings {
    /// Default settings location: `<config dir>/schema-builder/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("schema-builder").join("settings.json"))
    }

    /// Load settings from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        log::info!("Loaded builder settings from {}", path.display());
        Ok(settings)
    }

    /// Load from the default location, falling back to defaults when there is no config dir
    pub fn load_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = BuilderSettings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, BuilderSettings::default());
        assert_eq!(settings.debounce(), Duration::from_millis(400));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "default_attach_mode": true, "units": "mm" }"#).unwrap();

        let settings = BuilderSettings::load(&path).unwrap();
        assert!(settings.default_attach_mode);
        assert_eq!(settings.units, "mm");
        assert_eq!(settings.picker_choice_order, ChoiceOrder::Alphabetical);
        assert_eq!(settings.sibling_scan_cap, 10_000);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(BuilderSettings::load(&path), Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = BuilderSettings {
            prebound_choice_order: ChoiceOrder::Alphabetical,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(BuilderSettings::load(&path).unwrap(), settings);
    }
}
