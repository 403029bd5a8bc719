//! Per-frame placement of exchange arrows.
//!
//! [`place`] turns one [`FlowRecord`] plus the current [`Viewport`] into
//! either a screen transform with its asset, or a skip. Gates are checked in
//! a fixed order and the first one that fails decides the outcome.

use crate::assets::{AssetStyle, select_asset};
use crate::constants::{
    ARROW_HALF_EXTENT_PX, DEFAULT_HEADER_HEIGHT_PX, MIN_ABS_FLOW, MIN_SCALE,
    REVERSE_ROTATION_DEG, SCALE_BASE, SCALE_PER_ZOOM, SCALE_ZOOM_OFFSET, TOOLTIP_CLEARANCE_PX,
};
use crate::flows::FlowRecord;
use crate::projection::MapView;
use crate::tiers::TierTable;

use log::trace;
use serde::Serialize;
use std::fmt;

/// Map state for one render pass
#[derive(Clone, Copy)]
pub struct Viewport<'a> {
    pub zoom_level: f64,
    pub width: f64,
    pub height: f64,
    pub map: &'a dyn MapView,
}

impl<'a> Viewport<'a> {
    /// Reads the zoom from the map
    pub fn new(map: &'a dyn MapView, width: f64, height: f64) -> Self {
        Self {
            zoom_level: map.zoom(),
            width,
            height,
            map,
        }
    }
}

impl fmt::Debug for Viewport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("zoom_level", &self.zoom_level)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenTransform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotation_degrees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipSide {
    Top,
    Bottom,
}

impl fmt::Display for TooltipSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TooltipSide::Top => write!(f, "top"),
            TooltipSide::Bottom => write!(f, "bottom"),
        }
    }
}

/// Which gate suppressed the arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SkipReason {
    NoPosition,
    BelowFlowThreshold,
    ScaleTooSmall,
    OutsideViewport,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SkipReason::*;
        match self {
            NoPosition => write!(f, "no position"),
            BelowFlowThreshold => write!(f, "flow below threshold"),
            ScaleTooSmall => write!(f, "scale too small"),
            OutsideViewport => write!(f, "outside viewport"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Skip(SkipReason),
    Render {
        transform: ScreenTransform,
        asset_key: String,
        tooltip_side: TooltipSide,
    },
}

impl Placement {
    pub fn is_render(&self) -> bool {
        matches!(self, Placement::Render { .. })
    }
}

/// Everything besides the record and the viewport that placement depends on
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementOptions {
    pub intensity_tiers: TierTable,
    pub speed_tiers: TierTable,
    pub asset_style: AssetStyle,
    pub header_height: f64,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            intensity_tiers: TierTable::default_intensity(),
            speed_tiers: TierTable::default_speed(),
            asset_style: AssetStyle::default(),
            header_height: DEFAULT_HEADER_HEIGHT_PX,
        }
    }
}

/// Zoom -> asset scale. Not clamped at the top.
#[inline]
pub fn scale_for_zoom(zoom_level: f64) -> f64 {
    SCALE_BASE + (zoom_level - SCALE_ZOOM_OFFSET) * SCALE_PER_ZOOM
}

/// Positive net flow flips the corridor heading
#[inline]
pub fn rotation_for(base_rotation: f64, net_flow: f64) -> f64 {
    base_rotation + if net_flow > 0.0 { REVERSE_ROTATION_DEG } else { 0.0 }
}

/// True when the scaled asset box around `(x, y)` misses the viewport
#[inline]
pub fn is_culled(x: f64, y: f64, scale: f64, width: f64, height: f64) -> bool {
    let half = ARROW_HALF_EXTENT_PX * scale;
    x + half < 0.0 || y + half < 0.0 || x - half > width || y - half > height
}

#[inline]
pub fn tooltip_side(y: f64, header_height: f64) -> TooltipSide {
    if y - TOOLTIP_CLEARANCE_PX < header_height {
        TooltipSide::Bottom
    } else {
        TooltipSide::Top
    }
}

/// Decides whether `record` is drawn this frame and where.
pub fn place(
    record: &FlowRecord,
    viewport: &Viewport<'_>,
    colorblind_mode: bool,
    opts: &PlacementOptions,
) -> Placement {
    let skip = |reason: SkipReason| {
        trace!("skip {}: {}", record.identity, reason);
        Placement::Skip(reason)
    };

    let Some(geo) = record.geo_position else {
        return skip(SkipReason::NoPosition);
    };

    // `!(a >= b)` so that a NaN flow is suppressed as well
    let abs_flow = record.abs_flow();
    if !(abs_flow >= MIN_ABS_FLOW) {
        return skip(SkipReason::BelowFlowThreshold);
    }

    let point = viewport.map.project(geo);

    let scale = scale_for_zoom(viewport.zoom_level);
    if !(scale >= MIN_SCALE) {
        return skip(SkipReason::ScaleTooSmall);
    }

    let rotation_degrees = rotation_for(record.base_rotation, record.net_flow);

    if is_culled(point.x, point.y, scale, viewport.width, viewport.height) {
        return skip(SkipReason::OutsideViewport);
    }

    let asset_key = select_asset(
        &opts.asset_style,
        &opts.intensity_tiers,
        &opts.speed_tiers,
        record.carbon_intensity,
        abs_flow,
        colorblind_mode,
    );

    Placement::Render {
        transform: ScreenTransform {
            x: point.x,
            y: point.y,
            scale,
            rotation_degrees,
        },
        asset_key,
        tooltip_side: tooltip_side(point.y, opts.header_height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::GeoPoint;
    use crate::projection::{FixedProjection, ScreenPoint, WebMercator};
    use std::cell::Cell;

    const EPS: f64 = 1e-12;

    fn fixed(x: f64, y: f64, zoom: f64) -> FixedProjection {
        FixedProjection {
            point: ScreenPoint::new(x, y),
            zoom,
        }
    }

    fn sample_record() -> FlowRecord {
        FlowRecord::new("DE->FR", Some(GeoPoint::new(10.0, 50.0)), 500.0)
            .with_carbon_intensity(120.0)
            .with_base_rotation(0.0)
    }

    /// Counts projection calls so gate ordering can be observed
    struct CountingMap {
        inner: FixedProjection,
        calls: Cell<usize>,
    }

    impl MapView for CountingMap {
        fn project(&self, point: GeoPoint) -> ScreenPoint {
            self.calls.set(self.calls.get() + 1);
            self.inner.project(point)
        }
        fn zoom(&self) -> f64 {
            self.inner.zoom()
        }
    }

    #[test]
    fn test_reference_scenario_renders() {
        let map = fixed(500.0, 400.0, 5.0);
        let viewport = Viewport::new(&map, 1000.0, 800.0);
        let result = place(&sample_record(), &viewport, false, &PlacementOptions::default());

        match result {
            Placement::Render {
                transform,
                asset_key,
                tooltip_side,
            } => {
                assert!((transform.scale - 0.39).abs() < EPS);
                assert_eq!(transform.rotation_degrees, 180.0);
                assert_eq!(transform.x, 500.0);
                assert_eq!(transform.y, 400.0);
                assert_eq!(asset_key, "arrow-1-0");
                assert_eq!(tooltip_side, TooltipSide::Top);
            }
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_position_skips_first() {
        let map = CountingMap {
            inner: fixed(500.0, 400.0, 0.0),
            calls: Cell::new(0),
        };
        let viewport = Viewport::new(&map, 1000.0, 800.0);
        let mut record = sample_record();
        record.geo_position = None;
        record.net_flow = 0.0;

        let result = place(&record, &viewport, true, &PlacementOptions::default());
        assert_eq!(result, Placement::Skip(SkipReason::NoPosition));
        assert_eq!(map.calls.get(), 0);
    }

    #[test]
    fn test_small_flow_skips_before_projection() {
        let map = CountingMap {
            inner: fixed(500.0, 400.0, 5.0),
            calls: Cell::new(0),
        };
        let viewport = Viewport::new(&map, 1000.0, 800.0);
        let mut record = sample_record();
        record.net_flow = 0.5;

        let result = place(&record, &viewport, false, &PlacementOptions::default());
        assert_eq!(result, Placement::Skip(SkipReason::BelowFlowThreshold));
        assert_eq!(map.calls.get(), 0);

        record.net_flow = -0.999;
        let result = place(&record, &viewport, false, &PlacementOptions::default());
        assert_eq!(result, Placement::Skip(SkipReason::BelowFlowThreshold));

        record.net_flow = f64::NAN;
        let result = place(&record, &viewport, false, &PlacementOptions::default());
        assert_eq!(result, Placement::Skip(SkipReason::BelowFlowThreshold));
    }

    #[test]
    fn test_flow_of_exactly_one_renders() {
        let map = fixed(500.0, 400.0, 5.0);
        let viewport = Viewport::new(&map, 1000.0, 800.0);
        let mut record = sample_record();
        record.net_flow = -1.0;
        assert!(place(&record, &viewport, false, &PlacementOptions::default()).is_render());
    }

    #[test]
    fn test_scale_formula() {
        assert!((scale_for_zoom(5.0) - 0.39).abs() < EPS);
        assert!((scale_for_zoom(1.0) - -0.01).abs() < EPS);
        assert!((scale_for_zoom(1.5) - 0.04).abs() < EPS);
        assert!((scale_for_zoom(22.0) - 2.09).abs() < 1e-9);
        for zoom in [-3.0, 0.0, 0.25, 0.5] {
            assert!(scale_for_zoom(zoom) < MIN_SCALE);
        }
    }

    #[test]
    fn test_low_zoom_skips() {
        let mut record = sample_record();
        for zoom in [0.0, 0.5, 1.0, 2.0] {
            let map = fixed(500.0, 400.0, zoom);
            let viewport = Viewport::new(&map, 1000.0, 800.0);
            let result = place(&record, &viewport, false, &PlacementOptions::default());
            assert_eq!(result, Placement::Skip(SkipReason::ScaleTooSmall), "zoom {zoom}");
        }
        // zoom 2.2 -> scale 0.11
        record.net_flow = 10.0;
        let map = fixed(500.0, 400.0, 2.2);
        let viewport = Viewport::new(&map, 1000.0, 800.0);
        assert!(place(&record, &viewport, false, &PlacementOptions::default()).is_render());
    }

    #[test]
    fn test_rotation_flips_with_sign() {
        let map = fixed(500.0, 400.0, 5.0);
        let viewport = Viewport::new(&map, 1000.0, 800.0);
        let opts = PlacementOptions::default();

        let forward = sample_record().with_base_rotation(37.5);
        let mut backward = forward.clone();
        backward.net_flow = -forward.net_flow;

        let rot = |p: Placement| match p {
            Placement::Render { transform, .. } => transform.rotation_degrees,
            other => panic!("expected render, got {other:?}"),
        };
        let a = rot(place(&forward, &viewport, false, &opts));
        let b = rot(place(&backward, &viewport, false, &opts));
        assert_eq!(a - b, 180.0);
        assert_eq!(b, 37.5);
    }

    #[test]
    fn test_cull_left_of_viewport() {
        let map = fixed(-500.0, 400.0, 3.1); // scale 0.2
        let viewport = Viewport::new(&map, 1000.0, 800.0);
        let result = place(&sample_record(), &viewport, false, &PlacementOptions::default());
        assert_eq!(result, Placement::Skip(SkipReason::OutsideViewport));
    }

    #[test]
    fn test_cull_each_edge_independently() {
        let (w, h) = (1000.0, 800.0);
        let s = 0.2; // half extent 20px
        assert!(is_culled(-20.1, 400.0, s, w, h));
        assert!(is_culled(500.0, -20.1, s, w, h));
        assert!(is_culled(1020.1, 400.0, s, w, h));
        assert!(is_culled(500.0, 820.1, s, w, h));

        // touching the edge is still visible
        assert!(!is_culled(-20.0, 400.0, s, w, h));
        assert!(!is_culled(500.0, -20.0, s, w, h));
        assert!(!is_culled(1020.0, 400.0, s, w, h));
        assert!(!is_culled(500.0, 820.0, s, w, h));
    }

    #[test]
    fn test_center_never_culled() {
        for scale in [0.1, 0.39, 1.0, 5.0, 100.0] {
            for (w, h) in [(1.0, 1.0), (1000.0, 800.0), (320.0, 4000.0)] {
                assert!(!is_culled(w / 2.0, h / 2.0, scale, w, h));
            }
        }
    }

    #[test]
    fn test_tooltip_side_threshold() {
        assert_eq!(tooltip_side(400.0, 58.0), TooltipSide::Top);
        assert_eq!(tooltip_side(134.0, 58.0), TooltipSide::Top);
        assert_eq!(tooltip_side(133.9, 58.0), TooltipSide::Bottom);
        assert_eq!(tooltip_side(10.0, 0.0), TooltipSide::Bottom);
    }

    #[test]
    fn test_colorblind_prefix() {
        let map = fixed(500.0, 400.0, 5.0);
        let viewport = Viewport::new(&map, 1000.0, 800.0);
        let record = sample_record().with_carbon_intensity(650.0);
        match place(&record, &viewport, true, &PlacementOptions::default()) {
            Placement::Render { asset_key, .. } => assert_eq!(asset_key, "colorblind-arrow-8-0"),
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn test_idempotent() {
        let center = GeoPoint::new(10.0, 50.0);
        let map = WebMercator::new(5.3, center, 1280.0, 720.0);
        let viewport = Viewport::new(&map, 1280.0, 720.0);
        let opts = PlacementOptions::default();
        let record = FlowRecord::new("NO-NO2->DK-DK1", Some(GeoPoint::new(8.7, 57.1)), 1432.0)
            .with_carbon_intensity(33.3)
            .with_base_rotation(160.0);

        let first = place(&record, &viewport, false, &opts);
        let second = place(&record, &viewport, false, &opts);
        assert!(first.is_render());
        match (first, second) {
            (
                Placement::Render { transform: a, .. },
                Placement::Render { transform: b, .. },
            ) => {
                assert_eq!(a.x.to_bits(), b.x.to_bits());
                assert_eq!(a.y.to_bits(), b.y.to_bits());
                assert_eq!(a.scale.to_bits(), b.scale.to_bits());
                assert_eq!(a.rotation_degrees.to_bits(), b.rotation_degrees.to_bits());
            }
            other => panic!("expected two renders, got {other:?}"),
        }
    }

    #[test]
    fn test_viewport_zoom_overrides_map() {
        let map = fixed(500.0, 400.0, 0.0);
        let viewport = Viewport {
            zoom_level: 5.0,
            ..Viewport::new(&map, 1000.0, 800.0)
        };
        assert!(place(&sample_record(), &viewport, false, &PlacementOptions::default()).is_render());
    }
}
