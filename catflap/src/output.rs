//! Output formatting for CLI commands.
//!
//! Provides abstraction layer for outputting results in text or JSON format.

use anyhow::Result;
use catflap_core::{SyncEntry, SyncFlags};
use serde::Serialize;
use std::io::{self, Write};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Write output using the configured format.
    ///
    /// The `data` parameter must be a serializable struct that includes
    /// `success: bool` and `result_code: u8` fields.
    ///
    /// The `text_fn` closure is called only in text mode to generate the
    /// human-readable output.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(&self.stdout, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(&self.stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }

    /// Write an error message to stderr.
    ///
    /// In JSON mode, writes a JSON error object with success=false.
    /// In text mode, writes the error message with its causes.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        match self.format {
            OutputFormat::Json => {
                let error_output = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                if let Ok(json) = serde_json::to_string_pretty(&error_output) {
                    let _ = writeln!(io::stderr(), "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(io::stderr(), "Error: {:#}", error);
            }
        }
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Object reconciled during `update`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedObject {
    pub name: String,
    pub revision: u64,
    pub changed: bool,
    pub size: u64,
    pub count: Option<u64>,
    pub mtime: String,
    /// Transfer flags recorded on the entry, in token form.
    pub flags: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashed_files: Option<usize>,
}

impl UpdatedObject {
    pub fn new(entry: &SyncEntry, changed: bool) -> Self {
        Self {
            name: entry.name.clone(),
            revision: entry.revision,
            changed,
            size: entry.size,
            count: entry.count,
            mtime: entry.mtime.clone(),
            flags: SyncFlags::from_entry(entry).to_string(),
            hashed_files: entry.hashes.as_ref().map(|h| h.len()),
        }
    }
}

/// Output for `update` command.
#[derive(Debug, Serialize)]
pub struct UpdateOutput {
    pub success: bool,
    pub result_code: u8,
    pub manifest: String,
    pub objects: Vec<UpdatedObject>,
    pub skipped: Vec<String>,
}

/// Output for `check` command.
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub success: bool,
    pub result_code: u8,
    pub checked: usize,
    pub warnings: Vec<String>,
}

/// State of an object compared to its manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectState {
    Current,
    Modified,
    Missing,
}

impl ObjectState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectState::Current => "current",
            ObjectState::Modified => "modified",
            ObjectState::Missing => "missing",
        }
    }
}

/// Status of one object for `status`.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectStatus {
    pub name: String,
    pub revision: u64,
    pub state: ObjectState,
}

/// Output for `status` command.
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub success: bool,
    pub result_code: u8,
    pub objects: Vec<ObjectStatus>,
}

/// Output for `show` command.
#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub success: bool,
    pub result_code: u8,
    pub entry: SyncEntry,
}
