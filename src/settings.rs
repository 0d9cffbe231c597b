//! Tool settings
//!
//! Read from `~/.config/evtools/settings.toml` when present.

use crate::error::SettingsError;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Most devices `evdump` will monitor at once
    #[serde(default = "default_max_devices")]
    pub max_devices: usize,

    /// Path substrings that mark a legacy three-octet mouse node
    #[serde(default = "default_legacy_patterns")]
    pub legacy_patterns: Vec<String>,

    /// Where event device nodes live
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
}

fn default_max_devices() -> usize {
    16
}

fn default_legacy_patterns() -> Vec<String> {
    vec!["mouse".to_string(), "mice".to_string()]
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("/dev/input")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_devices: default_max_devices(),
            legacy_patterns: default_legacy_patterns(),
            input_dir: default_input_dir(),
        }
    }
}

impl Settings {
    /// Default settings file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("evtools").join("settings.toml"))
    }

    /// Load from `path`, or from [`Settings::default_path`] when `None`.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) => match Self::load_from(&path) {
                    Err(SettingsError::Read { source, .. })
                        if source.kind() == io::ErrorKind::NotFound =>
                    {
                        debug!("No settings file at {:?}, using defaults", path);
                        Ok(Self::default())
                    }
                    other => other,
                },
                None => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::parse(
            r#"
max_devices = 4
legacy_patterns = ["psaux"]
"#,
        )
        .unwrap();
        assert_eq!(settings.max_devices, 4);
        assert_eq!(settings.legacy_patterns, vec!["psaux".to_string()]);
        assert_eq!(settings.input_dir, PathBuf::from("/dev/input"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Settings::parse("max_device = 3").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/evtools.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("evtools-settings-{}.toml", std::process::id()));
        fs::write(&path, "input_dir = \"/tmp/input\"\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.input_dir, PathBuf::from("/tmp/input"));
        fs::remove_file(&path).unwrap();
    }
}
