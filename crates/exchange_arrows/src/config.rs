use crate::{
    assets::AssetStyle,
    constants::DEFAULT_HEADER_HEIGHT_PX,
    error::{ArrowError, Result},
    placement::PlacementOptions,
    tiers::TierTable,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};

pub const ENV_OUTPUT_DIR: &str = "EXCHANGE_ARROWS_OUTPUT_DIR";
const DEFAULT_OUTPUT_DIR: &str = "figs";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub placement: PlacementConfig,
    pub assets: AssetStyle,
    pub tiers: TiersConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Height of the fixed header chrome [px]
    pub header_height: f64,
    pub colorblind_mode: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            header_height: DEFAULT_HEADER_HEIGHT_PX,
            colorblind_mode: false,
        }
    }
}

/// Quantization tables. Inline thresholds win over CSV files; when neither
/// is given the built-in tables are used.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TiersConfig {
    pub intensity: Option<TierTable>,
    pub speed: Option<TierTable>,
    pub intensity_csv: Option<PathBuf>,
    pub speed_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Config {
    /// Read from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArrowError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&content).map_err(|e| {
            ArrowError::ConfigError(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides. An empty or whitespace-only value is ignored.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(output_dir) = env::var(ENV_OUTPUT_DIR)
            && !output_dir.trim().is_empty()
        {
            let path = PathBuf::from(output_dir);

            // If the path already exists but is not a directory, reject early.
            if path.exists() && !path.is_dir() {
                return Err(ArrowError::ConfigError(format!(
                    "Output path is not a directory: {}",
                    path.display()
                )));
            }
            self.output.dir = path;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let h = self.placement.header_height;
        if !h.is_finite() || h < 0.0 {
            return Err(ArrowError::ConfigError(format!(
                "header_height must be a finite non-negative number, got {}",
                h
            )));
        }

        if self.assets.arrow_base.trim().is_empty() {
            return Err(ArrowError::ConfigError(
                "assets.arrow_base cannot be empty".to_string(),
            ));
        }

        if self.tiers.intensity.is_some() && self.tiers.intensity_csv.is_some() {
            return Err(ArrowError::ConfigError(
                "set either tiers.intensity or tiers.intensity_csv, not both".to_string(),
            ));
        }
        if self.tiers.speed.is_some() && self.tiers.speed_csv.is_some() {
            return Err(ArrowError::ConfigError(
                "set either tiers.speed or tiers.speed_csv, not both".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolves the tables and builds the options handed to the engine
    pub fn placement_options(&self) -> Result<PlacementOptions> {
        let intensity_tiers = resolve_table(
            self.tiers.intensity.as_ref(),
            self.tiers.intensity_csv.as_deref(),
            TierTable::default_intensity,
        )?;
        let speed_tiers = resolve_table(
            self.tiers.speed.as_ref(),
            self.tiers.speed_csv.as_deref(),
            TierTable::default_speed,
        )?;

        Ok(PlacementOptions {
            intensity_tiers,
            speed_tiers,
            asset_style: self.assets.clone(),
            header_height: self.placement.header_height,
        })
    }
}

fn resolve_table(
    inline: Option<&TierTable>,
    csv_path: Option<&Path>,
    fallback: fn() -> TierTable,
) -> Result<TierTable> {
    match (inline, csv_path) {
        (Some(table), _) => Ok(table.clone()),
        (None, Some(path)) => {
            debug!("Loading tier table from {}", path.display());
            TierTable::load_csv(path)
        }
        (None, None) => Ok(fallback()),
    }
}
