//! Pointer, touch and keyboard input types.

use serde::{Deserialize, Serialize};

use crate::calibrate::ScreenPoint;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Control on most platforms, Command on macOS.
    pub fn toggle(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Modal gate that narrows which hit targets and mutations are eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HotkeyType {
    #[default]
    None,
    /// Primary drags pan the view.
    Translate,
    /// Clicks toggle selection membership.
    Select,
    /// Edge handles become eligible.
    Resize,
    /// Clicks add or remove anchors.
    AddAnchor,
}

impl HotkeyType {
    /// Gate held while `key` is down, if any.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " | "Space" => Some(HotkeyType::Translate),
            "Shift" => Some(HotkeyType::Resize),
            "a" | "A" => Some(HotkeyType::AddAnchor),
            "Control" | "Meta" => Some(HotkeyType::Select),
            _ => None,
        }
    }
}

/// An input sample as delivered by the host, in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown {
        position: ScreenPoint,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        position: ScreenPoint,
    },
    PointerUp {
        position: ScreenPoint,
        #[serde(default)]
        button: MouseButton,
    },
    Wheel {
        position: ScreenPoint,
        delta_y: f64,
    },
    TouchStart {
        touches: Vec<ScreenPoint>,
    },
    TouchMove {
        touches: Vec<ScreenPoint>,
    },
    TouchEnd {
        touches: Vec<ScreenPoint>,
    },
    KeyDown {
        key: String,
    },
    KeyUp {
        key: String,
    },
    Blur,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_keys() {
        assert_eq!(HotkeyType::from_key(" "), Some(HotkeyType::Translate));
        assert_eq!(HotkeyType::from_key("Shift"), Some(HotkeyType::Resize));
        assert_eq!(HotkeyType::from_key("a"), Some(HotkeyType::AddAnchor));
        assert_eq!(HotkeyType::from_key("Meta"), Some(HotkeyType::Select));
        assert_eq!(HotkeyType::from_key("Escape"), None);
    }

    #[test]
    fn test_input_event_json() {
        let event: InputEvent =
            serde_json::from_str(r#"{ "type": "pointer_down", "position": { "x": 10.0, "y": 20.0 } }"#).unwrap();
        assert_eq!(
            event,
            InputEvent::PointerDown {
                position: ScreenPoint::new(10.0, 20.0),
                button: MouseButton::Left,
                modifiers: Modifiers::default(),
            }
        );
    }
}
