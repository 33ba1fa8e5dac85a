//! Replays a recorded session and prints the resulting document.
//!
//! Usage: `penboard <session.json> [options.json]`

use std::path::PathBuf;
use std::process::ExitCode;

use penboard_app::{AppResult, Session, read_file, replay};
use penboard_core::EditorOptions;

fn run(session_path: PathBuf, options_path: Option<PathBuf>) -> AppResult<String> {
    let mut session = Session::from_json(&read_file(&session_path)?)?;
    if let Some(path) = options_path {
        session.options = EditorOptions::from_json(&read_file(&path)?)?;
    }
    let report = replay(session)?;
    log::info!(
        "{} pens, {} events, {} history records, {} frames",
        report.pens.len(),
        report.events.len(),
        report.history.len(),
        report.frames
    );
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let Some(session_path) = args.next() else {
        eprintln!("usage: penboard <session.json> [options.json]");
        return ExitCode::FAILURE;
    };
    match run(session_path, args.next()) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
