//! Document-level editor options.

use peniko::Color;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::selection::Cursor;

/// Serializable RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Options shared by the whole document.
///
/// Tolerances are in world units: calibration does not apply zoom, so a
/// handle's hit radius stays constant in world space as the view zooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Hit tolerance for handles, anchors and line bodies.
    pub point_size: f64,
    /// Drawn radius of anchor dots.
    pub anchor_radius: f64,
    /// Distance of the rotate handle above the selection's top edge.
    pub rotate_handle_offset: f64,
    /// Minimum time between two synchronous renders, in milliseconds.
    pub interval: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change per wheel notch.
    pub scale_step: f64,
    /// Cursor shown over a pen body.
    pub hover_cursor: Cursor,
    pub color: SerializableColor,
    pub active_color: SerializableColor,
    pub hover_color: SerializableColor,
    pub anchor_color: SerializableColor,
    pub drag_color: SerializableColor,
    pub disable_rotate: bool,
    /// Snap a line end dropped on a node body to its nearest anchor.
    pub auto_anchor: bool,
    /// Line style used when a line is dragged out of a node anchor.
    pub drawing_line_name: String,
    /// Debounce window for viewport resizes, in milliseconds.
    pub resize_debounce_ms: f64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            point_size: 8.0,
            anchor_radius: 4.0,
            rotate_handle_offset: 30.0,
            interval: 30.0,
            min_scale: 0.1,
            max_scale: 10.0,
            scale_step: 0.1,
            hover_cursor: Cursor::Move,
            color: SerializableColor::new(34, 34, 34, 255),
            active_color: SerializableColor::new(39, 139, 255, 255),
            hover_color: SerializableColor::new(255, 120, 0, 255),
            anchor_color: SerializableColor::new(39, 139, 255, 255),
            drag_color: SerializableColor::new(26, 115, 232, 255),
            disable_rotate: false,
            auto_anchor: true,
            drawing_line_name: "curve".to_string(),
            resize_debounce_ms: 100.0,
        }
    }
}

impl EditorOptions {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check the zoom bounds: both positive and `min_scale <= max_scale`.
    pub fn validate(&self) -> EditorResult<()> {
        let (min, max) = (self.min_scale, self.max_scale);
        if !(min > 0.0 && max.is_finite() && min <= max) {
            return Err(EditorError::ScaleBounds { min, max });
        }
        Ok(())
    }

    /// Clamp a scale into the configured zoom bounds.
    ///
    /// Never panics; with inverted bounds `max_scale` wins.
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.max(self.min_scale).min(self.max_scale)
    }
}
