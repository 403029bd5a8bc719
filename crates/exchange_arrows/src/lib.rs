pub mod assets;
pub mod config;
pub mod constants;
pub mod error;
pub mod flows;
pub mod layer;
pub mod placement;
pub mod projection;
pub mod surface;
pub mod svg;
pub mod tiers;

pub use assets::{AssetStyle, select_asset};
pub use config::Config;
pub use error::{ArrowError, Result};
pub use flows::{FlowRecord, GeoPoint, read_flows_csv};
pub use layer::{ArrowLayer, Frame, RenderInstruction, TooltipContent};
pub use placement::{
    Placement, PlacementOptions, ScreenTransform, SkipReason, TooltipSide, Viewport, place,
};
pub use projection::{FixedProjection, MapView, ScreenPoint, WebMercator};
pub use surface::{ListenerId, RecordingSurface, Surface, WheelGuard};
pub use svg::{OutputFormat, save_frame_to_dir};
pub use tiers::{Tier, TierTable};
