use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use ztrend_engine::TrendingConfig;

pub const DEFAULT_KIND: &str = "event";

/// Contents of a `ztrend` TOML config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Window layout and scoring policies
    pub engine: TrendingConfig,

    /// Record kinds to accept; an empty list accepts only `event`
    pub kinds: Vec<KindConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            engine: TrendingConfig::default(),
            kinds: vec![KindConfig::default()],
        }
    }
}

/// One accepted record kind and its weight multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindConfig {
    pub tag: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Default for KindConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_KIND.to_string(),
            weight: default_weight(),
        }
    }
}

const fn default_weight() -> f64 {
    1.0
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw).map_err(|err| anyhow!("TOML parse error: {err}"))?;
        if config.kinds.is_empty() {
            config.kinds.push(KindConfig::default());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        for kind in &self.kinds {
            if kind.tag.trim().is_empty() {
                return Err(anyhow!("kind tag must not be empty"));
            }
            if !kind.weight.is_finite() {
                return Err(anyhow!("kind {} has a non-finite weight", kind.tag));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_uses_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.kinds[0].tag, DEFAULT_KIND);
    }

    #[test]
    fn parses_engine_and_kinds() {
        let config = FileConfig::parse(
            r#"
            [engine]
            window_size_seconds = 60
            granularity_seconds = 15
            ignore_empty_windows = true

            [[kinds]]
            tag = "post"
            weight = 2.0

            [[kinds]]
            tag = "comment"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.window_size_seconds, 60);
        assert!(config.engine.ignore_empty_windows);
        assert_eq!(config.kinds.len(), 2);
        assert_eq!(config.kinds[1].weight, 1.0);
    }

    #[test]
    fn rejects_invalid_engine_config() {
        let err = FileConfig::parse(
            r#"
            [engine]
            window_size_seconds = 60
            granularity_seconds = 120
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("granularity_seconds"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(FileConfig::parse("window = 5").is_err());
    }
}
