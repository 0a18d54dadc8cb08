//! Output handling for CLI
//!
//! - JSON results: single object on stdout, `{"status": "ok", "data": ...}`
//! - Text results: written as-is
//! - UTF-8 only

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a UTF-8 manifest or config file
pub fn read_text(path: &Path) -> CliResult<String> {
    fs::read_to_string(path)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", path.display(), e)))
}

/// Write a success response to stdout
pub fn write_response(data: Value, pretty: bool) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, &response)?;
    } else {
        serde_json::to_writer(&mut stdout, &response)?;
    }
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write raw text to stdout
pub fn write_text(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
