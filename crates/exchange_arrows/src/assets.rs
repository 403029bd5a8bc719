use crate::constants::{
    DEFAULT_ARROW_BASE, DEFAULT_ASSET_EXTENSION, DEFAULT_ASSET_ROOT, DEFAULT_COLORBLIND_PREFIX,
};
use crate::tiers::{Tier, TierTable};

use serde::{Deserialize, Serialize};

/// Naming scheme of the arrow image variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetStyle {
    pub arrow_base: String,
    pub colorblind_prefix: String,
    pub asset_root: String,
    pub extension: String,
}

impl Default for AssetStyle {
    fn default() -> Self {
        Self {
            arrow_base: DEFAULT_ARROW_BASE.to_string(),
            colorblind_prefix: DEFAULT_COLORBLIND_PREFIX.to_string(),
            asset_root: DEFAULT_ASSET_ROOT.to_string(),
            extension: DEFAULT_ASSET_EXTENSION.to_string(),
        }
    }
}

impl AssetStyle {
    /// `{prefix}{base}-{intensity tier}-{speed tier}`
    pub fn asset_key(&self, intensity: Tier, speed: Tier, colorblind_mode: bool) -> String {
        let prefix = if colorblind_mode {
            self.colorblind_prefix.as_str()
        } else {
            ""
        };
        format!("{}{}-{}-{}", prefix, self.arrow_base, intensity, speed)
    }

    pub fn image_source(&self, asset_key: &str) -> String {
        let file = if self.extension.is_empty() {
            asset_key.to_string()
        } else {
            format!("{}.{}", asset_key, self.extension)
        };
        if self.asset_root.is_empty() {
            file
        } else {
            format!("{}/{}", self.asset_root.trim_end_matches('/'), file)
        }
    }
}

/// Selects the asset variant for a flow. Depends only on its arguments.
pub fn select_asset(
    style: &AssetStyle,
    intensity_tiers: &TierTable,
    speed_tiers: &TierTable,
    carbon_intensity: f64,
    abs_flow: f64,
    colorblind_mode: bool,
) -> String {
    style.asset_key(
        intensity_tiers.tier_of(carbon_intensity),
        speed_tiers.tier_of(abs_flow),
        colorblind_mode,
    )
}
