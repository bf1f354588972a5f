//! Tool configuration.
//!
//! Settings come from an optional TOML file, then from `BOXVIEW_*`
//! environment variables; binaries apply their command-line flags last.

use std::{collections::BTreeSet, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tracing::*;

use crate::{
    consts::*,
    error::{BoxviewError, ConfigParseSnafu, IoReadSnafu},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ocr: OcrConfig,
    pub render: RenderConfig,
}

/// Where and how OCR requests are sent, and which annotation labels the
/// dataset generator drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub skip_labels: BTreeSet<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            skip_labels: DEFAULT_SKIP_LABELS.iter().map(|label| label.to_string()).collect(),
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_skipped(&self, label: &str) -> bool {
        self.skip_labels.contains(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// TrueType font for text overlays; without one only boxes are drawn.
    pub font_path: Option<PathBuf>,
    pub text_size: f32,
    pub text_offset: (i32, i32),
    pub box_color: [u8; 3],
    pub text_color: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            text_size: TEXT_SIZE,
            text_offset: TEXT_OFFSET,
            box_color: BOX_COLOR,
            text_color: TEXT_COLOR,
        }
    }
}

impl AppConfig {
    /// Reads a TOML file, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, BoxviewError> {
        let content = std::fs::read_to_string(path).context(IoReadSnafu {
            path: path.to_string_lossy(),
        })?;
        let mut config: AppConfig = toml::from_str(&content).context(ConfigParseSnafu {
            path: path.to_string_lossy(),
        })?;
        info!("loaded config from {}", path.display());

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, BoxviewError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.apply_env(|name| std::env::var(name).ok());
                Ok(config)
            }
        }
    }

    /// Applies `BOXVIEW_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(OCR_ENDPOINT_ENV_NAME) {
            self.ocr.endpoint = endpoint;
        }

        if let Some(timeout) = lookup(OCR_TIMEOUT_ENV_NAME) {
            match timeout.trim().parse() {
                Ok(timeout_ms) => self.ocr.timeout_ms = timeout_ms,
                Err(err) => warn!("ignore {OCR_TIMEOUT_ENV_NAME}={timeout}: {err}"),
            }
        }

        if let Some(font_path) = lookup(FONT_PATH_ENV_NAME) {
            self.render.font_path = Some(PathBuf::from(font_path));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ocr.endpoint, DEFAULT_OCR_ENDPOINT);
        assert_eq!(config.ocr.timeout(), Duration::from_secs(3000));
        assert_eq!(config.ocr.skip_labels.len(), 15);
        assert!(config.ocr.is_skipped("有线表"));
        assert!(config.ocr.is_skipped("table"));
        assert!(!config.ocr.is_skipped("Table"));
        assert!(!config.ocr.is_skipped("text"));
        assert_eq!(config.render.font_path, None);
        assert_eq!(config.render.text_offset, (-10, -5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let config: AppConfig = toml::from_str(
            r#"
            [ocr]
            endpoint = "http://ocr.local/parse"
            skip_labels = ["table"]

            [render]
            text_size = 20.0
            "#,
        )?;

        assert_eq!(config.ocr.endpoint, "http://ocr.local/parse");
        assert_eq!(config.ocr.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.ocr.skip_labels, BTreeSet::from(["table".to_string()]));
        assert_eq!(config.render.text_size, 20.0);
        assert_eq!(config.render.box_color, BOX_COLOR);
        Ok(())
    }

    #[test]
    fn test_config_round_trip_through_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut config = AppConfig::default();
        config.ocr.timeout_ms = 1500;
        config.render.font_path = Some(PathBuf::from("/usr/share/fonts/simsun.ttc"));

        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "{}", toml::to_string_pretty(&config)?)?;

        let loaded = AppConfig::load(temp_file.path())?;
        assert_eq!(loaded.ocr.timeout_ms, 1500);
        assert_eq!(loaded.render.font_path, config.render.font_path);
        assert_eq!(loaded.ocr.skip_labels, config.ocr.skip_labels);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load(Path::new("/nonexistent/path/boxview.toml"));
        assert!(matches!(result, Err(BoxviewError::IoRead { .. })));
    }

    #[test]
    fn test_load_invalid_toml() -> Result<(), Box<dyn std::error::Error>> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "this is not valid toml {{{{")?;

        let result = AppConfig::load(temp_file.path());
        assert!(matches!(result, Err(BoxviewError::ConfigParse { .. })));
        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            (OCR_ENDPOINT_ENV_NAME, "http://10.0.0.2:9230/ocr"),
            (OCR_TIMEOUT_ENV_NAME, "250"),
            (FONT_PATH_ENV_NAME, "fonts/simsun.ttc"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env(|name| env.get(name).map(|value| value.to_string()));

        assert_eq!(config.ocr.endpoint, "http://10.0.0.2:9230/ocr");
        assert_eq!(config.ocr.timeout_ms, 250);
        assert_eq!(
            config.render.font_path,
            Some(PathBuf::from("fonts/simsun.ttc"))
        );
    }

    #[test]
    fn test_bad_timeout_env_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|name| (name == OCR_TIMEOUT_ENV_NAME).then(|| "soon".to_string()));
        assert_eq!(config.ocr.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
