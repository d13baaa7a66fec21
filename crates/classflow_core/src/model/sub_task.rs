//! Sub-task domain model.
//!
//! # Responsibility
//! - Model the checkbox/text variants as one tagged type.
//! - Own the text completion rule.
//! - Convert between the optional-field wire shape and the enum.
//!
//! # Invariants
//! - `completed` of a text sub-task always equals
//!   `text_completion(required_characters, text)`.
//! - Checkbox sub-tasks never serialize `requiredCharacters` or `text`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Threshold offered to teachers when adding a text sub-task.
pub const DEFAULT_REQUIRED_CHARACTERS: u32 = 100;

/// Opaque sub-task identifier.
///
/// Imported payloads may carry ids produced elsewhere, so any string is
/// accepted; locally created ids are random UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubTaskId(String);

impl SubTaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubTaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SubTaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for SubTaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Variant-specific state of a sub-task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubTaskKind {
    /// Completed by an explicit toggle.
    Checkbox,
    /// Completed once `text` reaches `required_characters`.
    Text {
        required_characters: u32,
        text: String,
    },
}

/// One unit of work inside a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SubTaskWire", into = "SubTaskWire")]
pub struct SubTask {
    id: SubTaskId,
    title: String,
    completed: bool,
    kind: SubTaskKind,
}

impl SubTask {
    /// Creates an incomplete checkbox sub-task with a generated id.
    pub fn checkbox(title: impl Into<String>) -> Self {
        Self {
            id: SubTaskId::generate(),
            title: title.into(),
            completed: false,
            kind: SubTaskKind::Checkbox,
        }
    }

    /// Creates a text sub-task with empty text and a generated id.
    ///
    /// No threshold validation happens here; see `NewSubTask::validate`.
    pub fn text(title: impl Into<String>, required_characters: u32) -> Self {
        let mut sub_task = Self {
            id: SubTaskId::generate(),
            title: title.into(),
            completed: false,
            kind: SubTaskKind::Text {
                required_characters,
                text: String::new(),
            },
        };
        sub_task.refresh_completion();
        sub_task
    }

    pub fn id(&self) -> &SubTaskId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> &SubTaskKind {
        &self.kind
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Current text of a text sub-task, `None` for checkboxes.
    pub fn text_value(&self) -> Option<&str> {
        match &self.kind {
            SubTaskKind::Checkbox => None,
            SubTaskKind::Text { text, .. } => Some(text.as_str()),
        }
    }

    /// Sets completion of a checkbox sub-task.
    pub fn set_checked(&mut self, completed: bool) -> Result<(), SubTaskMutationError> {
        match self.kind {
            SubTaskKind::Checkbox => {
                self.completed = completed;
                Ok(())
            }
            SubTaskKind::Text { .. } => Err(SubTaskMutationError::KindMismatch {
                id: self.id.clone(),
                expected: "checkbox",
            }),
        }
    }

    /// Replaces the text of a text sub-task and re-derives completion.
    pub fn set_text(&mut self, value: impl Into<String>) -> Result<(), SubTaskMutationError> {
        match &mut self.kind {
            SubTaskKind::Text { text, .. } => {
                *text = value.into();
                self.refresh_completion();
                Ok(())
            }
            SubTaskKind::Checkbox => Err(SubTaskMutationError::KindMismatch {
                id: self.id.clone(),
                expected: "text",
            }),
        }
    }

    /// Written characters of a text sub-task, counted like the completion rule.
    pub fn text_length(&self) -> Option<usize> {
        self.text_value().map(|text| text.chars().count())
    }

    /// Share of the character threshold reached, capped at 100.
    ///
    /// `None` for checkboxes. A zero threshold counts as full.
    pub fn text_fill_percent(&self) -> Option<u8> {
        let SubTaskKind::Text {
            required_characters,
            text,
        } = &self.kind
        else {
            return None;
        };
        if *required_characters == 0 {
            return Some(100);
        }
        let written = text.chars().count() as u64;
        let percent = (written * 100 / u64::from(*required_characters)).min(100);
        Some(percent as u8)
    }

    fn refresh_completion(&mut self) {
        if let SubTaskKind::Text {
            required_characters,
            text,
        } = &self.kind
        {
            self.completed = text_completion(*required_characters, text);
        }
    }
}

/// Completion rule for text sub-tasks.
///
/// Length is counted in Unicode scalar values. A zero threshold makes any
/// text, including the empty one, complete.
pub fn text_completion(required_characters: u32, text: &str) -> bool {
    text.chars().count() as u64 >= u64::from(required_characters)
}

/// Error for sub-task level mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubTaskMutationError {
    NotFound(SubTaskId),
    /// The mutation only applies to the `expected` variant.
    KindMismatch {
        id: SubTaskId,
        expected: &'static str,
    },
}

impl Display for SubTaskMutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "sub-task not found: {id}"),
            Self::KindMismatch { id, expected } => {
                write!(f, "sub-task {id} is not a {expected} sub-task")
            }
        }
    }
}

impl Error for SubTaskMutationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SubTaskTypeWire {
    Checkbox,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubTaskWire {
    id: SubTaskId,
    title: String,
    completed: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<SubTaskTypeWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required_characters: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// Decode failure for a single wire sub-task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTaskWireError(String);

impl Display for SubTaskWireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for SubTaskWireError {}

impl TryFrom<SubTaskWire> for SubTask {
    type Error = SubTaskWireError;

    fn try_from(wire: SubTaskWire) -> Result<Self, Self::Error> {
        // Payloads written before the type field existed are checkboxes.
        let kind = match wire.kind.unwrap_or(SubTaskTypeWire::Checkbox) {
            SubTaskTypeWire::Checkbox => SubTaskKind::Checkbox,
            SubTaskTypeWire::Text => {
                let required_characters = wire.required_characters.ok_or_else(|| {
                    SubTaskWireError(format!(
                        "text sub-task `{}` is missing requiredCharacters",
                        wire.id
                    ))
                })?;
                SubTaskKind::Text {
                    required_characters,
                    text: wire.text.unwrap_or_default(),
                }
            }
        };

        let mut sub_task = SubTask {
            id: wire.id,
            title: wire.title,
            completed: wire.completed,
            kind,
        };
        sub_task.refresh_completion();
        Ok(sub_task)
    }
}

impl From<SubTask> for SubTaskWire {
    fn from(sub_task: SubTask) -> Self {
        let (kind, required_characters, text) = match sub_task.kind {
            SubTaskKind::Checkbox => (SubTaskTypeWire::Checkbox, None, None),
            SubTaskKind::Text {
                required_characters,
                text,
            } => (SubTaskTypeWire::Text, Some(required_characters), Some(text)),
        };
        Self {
            id: sub_task.id,
            title: sub_task.title,
            completed: sub_task.completed,
            kind: Some(kind),
            required_characters,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{text_completion, SubTask};

    #[test]
    fn text_completion_counts_scalar_values() {
        assert!(text_completion(3, "äöü"));
        assert!(!text_completion(4, "äöü"));
    }

    #[test]
    fn zero_threshold_completes_empty_text() {
        assert!(text_completion(0, ""));
    }

    #[test]
    fn text_fill_percent_is_capped_and_floored() {
        let mut sub_task = SubTask::text("essay", 3);
        assert_eq!(sub_task.text_fill_percent(), Some(0));
        sub_task.set_text("ab").unwrap();
        assert_eq!(sub_task.text_length(), Some(2));
        assert_eq!(sub_task.text_fill_percent(), Some(66));
        sub_task.set_text("abcdef").unwrap();
        assert_eq!(sub_task.text_fill_percent(), Some(100));

        assert_eq!(SubTask::text("free", 0).text_fill_percent(), Some(100));
        assert_eq!(SubTask::checkbox("tick").text_fill_percent(), None);
    }

    #[test]
    fn new_text_sub_task_starts_incomplete() {
        let sub_task = SubTask::text("essay", 1);
        assert!(!sub_task.is_completed());
        assert_eq!(sub_task.text_value(), Some(""));
    }
}
