use crate::constants::{MAX_MERCATOR_LAT, TILE_SIZE_PX};
use crate::flows::GeoPoint;

use std::f64::consts::PI;

/// Screen-space point in pixels, origin at the top-left of the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The map collaborator: converts geographic coordinates to pixels and
/// reports its zoom.
pub trait MapView {
    fn project(&self, point: GeoPoint) -> ScreenPoint;
    fn zoom(&self) -> f64;
}

impl<M: MapView + ?Sized> MapView for &M {
    fn project(&self, point: GeoPoint) -> ScreenPoint {
        (**self).project(point)
    }
    fn zoom(&self) -> f64 {
        (**self).zoom()
    }
}

/// Spherical Web Mercator view centered on `center`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub zoom: f64,
    pub center: GeoPoint,
    pub width: f64,
    pub height: f64,
    pub tile_size: f64,
}

impl WebMercator {
    pub fn new(zoom: f64, center: GeoPoint, width: f64, height: f64) -> Self {
        Self {
            zoom,
            center,
            width,
            height,
            tile_size: TILE_SIZE_PX,
        }
    }

    /// World size in pixels at the current zoom
    #[inline]
    pub fn world_size(&self) -> f64 {
        self.tile_size * self.zoom.exp2()
    }

    /// Normalized mercator coordinates in [0, 1]^2
    fn to_unit(point: GeoPoint) -> (f64, f64) {
        let lat = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        let u = (point.lon + 180.0) / 360.0;
        let phi = lat.to_radians();
        let v = 0.5 - ((PI / 4.0 + phi / 2.0).tan()).ln() / (2.0 * PI);
        (u, v)
    }
}

impl MapView for WebMercator {
    fn project(&self, point: GeoPoint) -> ScreenPoint {
        let world = self.world_size();
        let (u, v) = Self::to_unit(point);
        let (cu, cv) = Self::to_unit(self.center);
        ScreenPoint::new(
            (u - cu) * world + self.width / 2.0,
            (v - cv) * world + self.height / 2.0,
        )
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}

/// View that places every coordinate at a fixed pixel, for hosts that
/// already resolved positions and for tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedProjection {
    pub point: ScreenPoint,
    pub zoom: f64,
}

impl MapView for FixedProjection {
    fn project(&self, _point: GeoPoint) -> ScreenPoint {
        self.point
    }
    fn zoom(&self) -> f64 {
        self.zoom
    }
}
