//! Layered configuration for the projline pipeline.
//!
//! Configuration is loaded with precedence: CLI args > Env vars > Config file > Defaults
//!
//! # Example config file (projline.toml)
//! ```toml
//! [input]
//! api_export = "static/projects.json"
//! sheet_export = "static/allprojects.csv"
//!
//! [timeline]
//! sort = "video"
//! sample_step_days = 7
//!
//! [swarm]
//! radius = 2.5
//! ```

mod defaults;

pub use defaults::*;

use crate::query::SortKey;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub input: InputConfig,
    pub timeline: SeriesConfig,
    pub swarm: SwarmConfig,
    pub output: OutputConfig,
}

impl TimelineConfig {
    /// Load configuration with precedence: CLI args > Env > File > Defaults
    pub fn load(
        config_path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(TimelineConfig::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Nested keys use a double underscore: PROJLINE_INPUT__API_EXPORT
        figment = figment.merge(Env::prefixed("PROJLINE_").split("__"));

        figment = figment.merge(Serialized::defaults(overrides));

        let config: Self = figment.extract().map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment and optional config file only (no CLI overrides)
    pub fn from_env(config_path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load(config_path, ConfigOverrides::default())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.swarm.radius.is_finite() || self.swarm.radius <= 0.0 {
            return Err(ConfigError::new(format!(
                "swarm.radius must be positive, got {}",
                self.swarm.radius
            )));
        }
        if self.swarm.unit_seconds == 0 {
            return Err(ConfigError::new("swarm.unit_seconds must be positive"));
        }
        if self.timeline.sample_step_days == 0 {
            return Err(ConfigError::new("timeline.sample_step_days must be positive"));
        }
        Ok(())
    }
}

/// Input document locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub api_export: PathBuf,
    pub sheet_export: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            api_export: PathBuf::from(DEFAULT_API_EXPORT),
            sheet_export: PathBuf::from(DEFAULT_SHEET_EXPORT),
        }
    }
}

/// Ordering and sampling of the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    pub sort: SortKey,
    pub sample_step_days: u32,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            sort: SortKey::default(),
            sample_step_days: DEFAULT_SAMPLE_STEP_DAYS,
        }
    }
}

/// Release-marker layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub radius: f64,
    pub unit_seconds: u32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SWARM_RADIUS,
            unit_seconds: DEFAULT_SWARM_UNIT_SECONDS,
        }
    }
}

/// Where results go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file; stdout when unset
    pub path: Option<PathBuf>,
    /// Print a text summary instead of the JSON document
    pub summary: bool,
}

/// CLI overrides that take precedence over file and env config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<InputOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<SeriesOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_export: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_export: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_step_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<bool>,
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TimelineConfig::default();
        assert_eq!(config.timeline.sort, SortKey::Deadline);
        assert_eq!(config.timeline.sample_step_days, DEFAULT_SAMPLE_STEP_DAYS);
        assert_eq!(config.swarm.radius, DEFAULT_SWARM_RADIUS);
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_sort_key_serde() {
        let json = serde_json::to_string(&SortKey::Organizer).unwrap();
        assert_eq!(json, "\"organizer\"");

        let key: SortKey = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(key, SortKey::Video);
    }

    #[test]
    fn test_file_and_overrides_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "projline.toml",
                r#"
                [timeline]
                sort = "video"
                sample_step_days = 7

                [swarm]
                radius = 2.5
                "#,
            )?;
            jail.set_env("PROJLINE_OUTPUT__SUMMARY", "true");

            let overrides = ConfigOverrides {
                timeline: Some(SeriesOverrides {
                    sort: Some(SortKey::Organizer),
                    sample_step_days: None,
                }),
                ..ConfigOverrides::default()
            };
            let config = TimelineConfig::load(Some("projline.toml"), overrides)
                .map_err(|e| e.to_string())?;
            assert_eq!(config.timeline.sort, SortKey::Organizer);
            assert_eq!(config.timeline.sample_step_days, 7);
            assert_eq!(config.swarm.radius, 2.5);
            assert!(config.output.summary);
            Ok(())
        });
    }

    #[test]
    fn test_rejects_bad_radius() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[swarm]\nradius = -1.0\n")?;
            let err = TimelineConfig::from_env(Some("bad.toml")).unwrap_err();
            assert!(err.to_string().contains("swarm.radius"));
            Ok(())
        });
    }
}
