use serde::Serialize;

use super::json::to_json;

/// Output mode determines how results are formatted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Tty,
    Json,
}

/// Detect the appropriate output mode.
pub fn detect_output_mode(json_flag: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    OutputMode::Tty
}

/// Render `value` for the given mode. The TTY renderer is only invoked in TTY mode.
pub fn render<T, F>(mode: OutputMode, value: &T, tty: F) -> String
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match mode {
        OutputMode::Json => to_json(value),
        OutputMode::Tty => tty(value),
    }
}
