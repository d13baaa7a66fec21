//! Room export/import encoding.
//!
//! # Responsibility
//! - Encode one room as the pretty-printed interchange document.
//! - Decode and validate an interchange document into a room.
//! - Derive the suggested export file name.
//!
//! # Invariants
//! - `decode_room(encode_room(room)) == room`.
//! - Decoding never touches storage.

use crate::model::room::{Room, RoomValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static UNSAFE_FILE_CHARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[/\\:*?"<>|\p{Cc}]+"#).expect("valid file name regex")
});

/// Rejected import payload.
#[derive(Debug)]
pub enum ImportError {
    /// Not a JSON room document.
    Malformed(serde_json::Error),
    /// Well-formed but breaks room invariants.
    Invalid(RoomValidationError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed room payload: {err}"),
            Self::Invalid(err) => write!(f, "invalid room payload: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

/// Export document plus its suggested file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomExport {
    pub file_name: String,
    pub contents: String,
}

/// Suggested download name: lowercased title, whitespace runs as `-`,
/// suffixed `-room.json`.
///
/// Path separators and characters invalid in file names also become `-`,
/// so the result is always a single path component.
pub fn export_file_name(title: &str) -> String {
    let slug = WHITESPACE_RE.replace_all(title, "-");
    let slug = UNSAFE_FILE_CHARS_RE.replace_all(&slug, "-").to_lowercase();
    format!("{slug}-room.json")
}

/// Serializes a room with two-space indentation.
pub fn encode_room(room: &Room) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(room)
}

/// Parses one room document.
pub fn decode_room(payload: &str) -> Result<Room, ImportError> {
    let room: Room = serde_json::from_str(payload).map_err(ImportError::Malformed)?;
    room.validate().map_err(ImportError::Invalid)?;
    Ok(room)
}
