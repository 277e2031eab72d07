use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::warn;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path))?;
        Ok(config)
    }

    /// Missing file means defaults; a file that exists but fails to parse is an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!("Config {} not found, using defaults", path);
            return Ok(Config::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_or_default("/nonexistent/roadside.yaml").unwrap();
        assert_eq!(config.signal.green_secs, 15);
        assert_eq!(config.streetlight.fade_step, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "streetlight:\n  fade_step: 10\n  serial_port: /dev/null").unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.streetlight.fade_step, 10);
        assert_eq!(config.streetlight.serial_port.as_deref(), Some("/dev/null"));
        assert_eq!(config.streetlight.dim_brightness, 50);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "signal: [not, a, map]").unwrap();
        assert!(Config::load_or_default(file.path().to_str().unwrap()).is_err());
    }
}
