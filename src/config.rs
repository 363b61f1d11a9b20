//! User settings.
//!
//! Settings come from an optional JSON file passed with `--config`; missing keys
//! take their defaults and command-line flags override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::DEFAULT_TARGET_VELOCITY;
use crate::error::{Error, Result};
use crate::fields::StatusMatch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Velocity target shown next to each sprint, in percent.
    pub target_velocity: u32,
    pub status_match: StatusMatch,
    /// Task row file used when `--data` is not given.
    pub data: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            target_velocity: DEFAULT_TARGET_VELOCITY,
            status_match: StatusMatch::Literal,
            data: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let buf = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&buf).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    /// Settings from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Settings::load(p),
            None => Ok(Settings::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.target_velocity > 100 {
            return Err(Error::Config(format!(
                "target_velocity must be a percentage (0-100), got {}",
                self.target_velocity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_for_missing_keys() {
        let file = write_settings(r#"{ "status_match": "normalized" }"#);
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.status_match, StatusMatch::Normalized);
        assert_eq!(settings.target_velocity, DEFAULT_TARGET_VELOCITY);
        assert_eq!(settings.data, None);
    }

    #[test]
    fn test_rejects_out_of_range_target() {
        let file = write_settings(r#"{ "target_velocity": 180 }"#);
        assert!(matches!(Settings::load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let file = write_settings(r#"{ "target": 80 }"#);
        assert!(matches!(Settings::load(file.path()), Err(Error::Json { .. })));
    }

    #[test]
    fn test_no_path_gives_defaults() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
