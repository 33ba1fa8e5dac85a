//! Headless penboard shell.
//!
//! Replays a recorded input session through an [`Editor`] and reports the
//! resulting document, standing in for the browser glue.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use penboard_core::{
    Clock, Editor, EditorError, EditorEvent, EditorOptions, HistoryRecord, InputEvent, ManualClock, Pen, RenderRequest,
};
use penboard_render::{BufferedPainter, RecordingSurface};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid session: {0}")]
    Session(#[from] serde_json::Error),
    #[error(transparent)]
    Editor(#[from] EditorError),
}

pub type AppResult<T> = Result<T, AppError>;

fn default_step_ms() -> f64 {
    16.0
}

/// A recorded editing session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub options: EditorOptions,
    /// Pens present before the first input.
    #[serde(default)]
    pub pens: Vec<Pen>,
    /// Line tool selected for the whole session.
    #[serde(default)]
    pub drawing_line: Option<String>,
    #[serde(default)]
    pub events: Vec<InputEvent>,
    /// Clock advance between two inputs, in milliseconds.
    #[serde(default = "default_step_ms")]
    pub step_ms: f64,
}

impl Session {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let session: Self = serde_json::from_str(json)?;
        session.options.validate()?;
        Ok(session)
    }
}

/// Outcome of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub pens: Vec<Pen>,
    pub events: Vec<EditorEvent>,
    pub history: Vec<HistoryRecord>,
    /// Frames the painter drew.
    pub frames: usize,
}

pub fn read_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Replay `session` through a fresh editor.
pub fn replay(session: Session) -> AppResult<Report> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let history = Rc::new(RefCell::new(Vec::new()));
    let painter = Rc::new(RefCell::new(BufferedPainter::new(RecordingSurface::new())));
    let clock = ManualClock::default();

    let mut editor = Editor::new(session.options)
        .with_events(events.clone())
        .with_history(history.clone())
        .with_painter(painter.clone())
        .with_clock(clock.clone());
    for pen in session.pens {
        editor.add_pen(pen);
    }
    editor.set_drawing_line(session.drawing_line.as_deref())?;
    editor.render(RenderRequest::Force);

    log::info!("Replaying {} input events", session.events.len());
    for event in &session.events {
        clock.advance(session.step_ms);
        editor.handle(event);
        editor.frame_tick();
        editor.poll(clock.now_ms());
    }

    let pens = editor.store().ordered().cloned().collect();
    let events = events.borrow().clone();
    let history = history.borrow().clone();
    let frames = painter.borrow().frames();
    Ok(Report {
        pens,
        events,
        history,
        frames,
    })
}
