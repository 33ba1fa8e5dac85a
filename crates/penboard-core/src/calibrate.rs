//! Screen-to-world coordinate calibration.
//!
//! Pointer samples enter the editor as [`ScreenPoint`]s and are converted exactly
//! once into [`WorldPoint`]s. Hit-testing and mutation only accept world points,
//! so a sample can never be calibrated twice.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// A pointer position as reported by the host, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint(pub Point);

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point::new(x, y))
    }
}

/// A position in document world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint(pub Point);

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point::new(x, y))
    }

    /// The underlying point.
    pub fn point(self) -> Point {
        self.0
    }
}

/// Converts screen samples into world space.
///
/// The element-local position is the page position minus the canvas element's
/// origin and the page scroll; the world position then subtracts the pan
/// offset. Zoom is baked into world geometry, not applied here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibrator {
    /// Origin of the canvas element's bounding box on the page.
    pub element_origin: Point,
    /// Current page scroll.
    pub scroll: Vec2,
    /// Pan offset (`data.x`, `data.y`).
    pub pan: Vec2,
    /// Device pixel ratio of the backing surface.
    pub dpr: f64,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self {
            element_origin: Point::ZERO,
            scroll: Vec2::ZERO,
            pan: Vec2::ZERO,
            dpr: 1.0,
        }
    }
}

impl Calibrator {
    /// Create a calibrator with no offsets and a device pixel ratio of 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Element-local position of a screen sample (before panning).
    pub fn local(&self, screen: ScreenPoint) -> Point {
        Point::new(
            screen.0.x - self.element_origin.x - self.scroll.x,
            screen.0.y - self.element_origin.y - self.scroll.y,
        )
    }

    /// Convert a screen sample into world space.
    pub fn calibrate(&self, screen: ScreenPoint) -> WorldPoint {
        WorldPoint(self.local(screen) - self.pan)
    }

    /// Convert a world point back to element-local coordinates.
    pub fn to_local(&self, world: WorldPoint) -> Point {
        world.0 + self.pan
    }

    /// Pan the view by a delta in element-local pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Size of the backing store for a CSS-pixel viewport.
    pub fn device_size(&self, css: Size) -> Size {
        Size::new((css.width * self.dpr).round(), (css.height * self.dpr).round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_calibration() {
        let cal = Calibrator::new();
        let world = cal.calibrate(ScreenPoint::new(100.0, 200.0));
        assert_eq!(world, WorldPoint::new(100.0, 200.0));
    }

    #[test]
    fn test_calibration_subtracts_origin_scroll_and_pan() {
        let cal = Calibrator {
            element_origin: Point::new(10.0, 20.0),
            scroll: Vec2::new(0.0, 5.0),
            pan: Vec2::new(30.0, -15.0),
            dpr: 2.0,
        };
        let world = cal.calibrate(ScreenPoint::new(100.0, 100.0));
        assert_eq!(world, WorldPoint::new(60.0, 90.0));
        assert_eq!(cal.to_local(world), Point::new(90.0, 75.0));
    }

    #[test]
    fn test_pan_by_accumulates() {
        let mut cal = Calibrator::new();
        cal.pan_by(Vec2::new(5.0, 5.0));
        cal.pan_by(Vec2::new(-2.0, 1.0));
        assert_eq!(cal.pan, Vec2::new(3.0, 6.0));
    }

    #[test]
    fn test_device_size() {
        let cal = Calibrator { dpr: 1.5, ..Calibrator::default() };
        assert_eq!(cal.device_size(Size::new(200.0, 101.0)), Size::new(300.0, 152.0));
    }
}
