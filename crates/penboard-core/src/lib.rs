//! Penboard Core Library
//!
//! Platform-agnostic pens, geometry and pointer interaction for the penboard
//! diagram editor.

pub mod calibrate;
pub mod drawing;
pub mod editor;
pub mod error;
pub mod events;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod mutate;
pub mod options;
pub mod pen;
pub mod scheduler;
pub mod selection;
pub mod store;

pub use calibrate::{Calibrator, ScreenPoint, WorldPoint};
pub use drawing::{DrawingLine, LineInsert, LineStyle, LineStyleRegistry};
pub use editor::{Editor, Gesture};
pub use error::{EditorError, EditorResult};
pub use events::{EditorEvent, EventSink, HistoryKind, HistoryRecord, HistorySink};
pub use hit::{HitTestResult, HoverType, hit_test};
pub use input::{HotkeyType, InputEvent, Modifiers, MouseButton};
pub use options::{EditorOptions, SerializableColor};
pub use pen::{Anchor, AnchorId, AnchorRef, LockState, Pen, PenId, PenKind, PrevNextType};
pub use scheduler::{Clock, ManualClock, Painter, RenderOutcome, RenderRequest, RenderScheduler, Scene, SystemClock};
pub use selection::{ActiveRect, Cursor, ResizeDirection, SizeControlPoints};
pub use store::PenStore;
