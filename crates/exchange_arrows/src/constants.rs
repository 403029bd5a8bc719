/// Flows below this magnitude [MW] are not drawn
pub const MIN_ABS_FLOW: f64 = 1.0;

/// Zoom -> scale calibration: scale = SCALE_BASE + (zoom - SCALE_ZOOM_OFFSET) * SCALE_PER_ZOOM
pub const SCALE_BASE: f64 = 0.04;
pub const SCALE_ZOOM_OFFSET: f64 = 1.5;
pub const SCALE_PER_ZOOM: f64 = 0.1;

/// Arrows rendered smaller than this scale are suppressed
pub const MIN_SCALE: f64 = 0.1;

/// Half extent of the arrow asset [px] before scaling
pub const ARROW_HALF_EXTENT_PX: f64 = 100.0;

/// Vertical clearance [px] the tooltip needs above the arrow anchor
pub const TOOLTIP_CLEARANCE_PX: f64 = 76.0;

/// Height [px] of the fixed header chrome
pub const DEFAULT_HEADER_HEIGHT_PX: f64 = 58.0;

/// Positive flows point against the corridor heading
pub const REVERSE_ROTATION_DEG: f64 = 180.0;

/// Web map defaults
pub const TILE_SIZE_PX: f64 = 256.0;
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Asset naming
pub const DEFAULT_ARROW_BASE: &str = "arrow";
pub const DEFAULT_COLORBLIND_PREFIX: &str = "colorblind-";
pub const DEFAULT_ASSET_ROOT: &str = "images";
pub const DEFAULT_ASSET_EXTENSION: &str = "gif";

/// Default quantization domains
pub const INTENSITY_DOMAIN_MAX: f64 = 800.0; // gCO2eq/kWh
pub const INTENSITY_TIER_COUNT: usize = 11;
pub const SPEED_DOMAIN: (f64, f64) = (500.0, 5000.0); // MW
pub const SPEED_TIER_MAX: usize = 2;

/// Expected headers in CSV files
pub const FLOW_CSV_HEADERS: [&str; 6] = [
    "Key",
    "Longitude",
    "Latitude",
    "NetFlow",
    "CarbonIntensity",
    "Rotation",
];
pub const TIER_CSV_HEADERS: [&str; 2] = ["Tier", "Threshold"];
