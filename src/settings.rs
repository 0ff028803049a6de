//! User settings persisted as a flat JSON record.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TEXT_PROMPT: &str =
    "You are the SimpleCASCADE AI assistant. Answer briefly, clearly and to the point.";
pub const DEFAULT_CODE_PROMPT: &str =
    "You are a C++ code generator. Output ONLY code, without explanations. Use modern C++20.";
pub const DEFAULT_MESH_PROMPT: &str =
    "You are a 3D model generator in OBJ format. Output ONLY OBJ code: v, f, vn. No comments.";

const CONFIG_DIR: &str = "SimpleCASCADE";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: String,
    pub text_prompt: String,
    pub code_prompt: String,
    pub mesh_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            text_prompt: DEFAULT_TEXT_PROMPT.to_string(),
            code_prompt: DEFAULT_CODE_PROMPT.to_string(),
            mesh_prompt: DEFAULT_MESH_PROMPT.to_string(),
        }
    }
}

impl Settings {
    /// `~/.config/SimpleCASCADE/settings.json` on every platform, or `None`
    /// when there is no home directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| Self::path_under_home(dirs.home_dir()))
    }

    pub fn path_under_home(home: &Path) -> PathBuf {
        home.join(".config").join(CONFIG_DIR).join(SETTINGS_FILE)
    }

    /// Reads settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Like [`load_from`](Self::load_from) but never fails; errors are logged.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::warn!("no configuration directory available, using default settings");
            return Self::default();
        };
        match Self::load_from(path) {
            Ok(settings) => {
                tracing::info!("loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::warn!("{e:#}; falling back to defaults");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        tracing::info!("saved settings to {}", path.display());
        Ok(())
    }

    /// Restores the prompts and clears the key.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn missing_keys_fall_back_per_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api_key": "abc", "unknown": 1}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.api_key, "abc");
        assert_eq!(settings.text_prompt, DEFAULT_TEXT_PROMPT);
        assert_eq!(settings.mesh_prompt, DEFAULT_MESH_PROMPT);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            api_key: "k".to_string(),
            code_prompt: "rust only".to_string(),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn malformed_file_is_an_error_but_load_or_default_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(Settings::load_from(&path).is_err());
        assert_eq!(Settings::load_or_default(Some(&path)), Settings::default());
    }

    #[test]
    fn path_keeps_application_casing() {
        let path = Settings::path_under_home(Path::new("/home/user"));
        assert_eq!(path, Path::new("/home/user/.config/SimpleCASCADE/settings.json"));

        if let Some(path) = Settings::default_path() {
            let segments: Vec<_> = path.iter().rev().take(3).collect();
            assert_eq!(segments, [SETTINGS_FILE, CONFIG_DIR, ".config"].map(std::ffi::OsStr::new));
        }
    }

    #[test]
    fn reset_clears_key() {
        let mut settings = Settings {
            api_key: "secret".to_string(),
            text_prompt: "x".to_string(),
            ..Settings::default()
        };
        settings.reset();
        assert_eq!(settings, Settings::default());
    }
}
