//! Room domain model and progress aggregation.
//!
//! # Responsibility
//! - Define the persisted room record.
//! - Keep `progress` in step with every sub-task mutation.
//!
//! # Invariants
//! - `progress` is within `0..=100`.
//! - After any sub-task mutation `progress == compute_progress(sub_tasks)`.
//! - A manual override may diverge from the aggregate until the next
//!   sub-task mutation.
//! - Sub-task ids are unique within a room and order is insertion order.

use crate::model::sub_task::{SubTask, SubTaskId, SubTaskMutationError};
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const MAX_PROGRESS: u8 = 100;
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Opaque room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for RoomId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invariant violations for room records and creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomValidationError {
    MissingTitle,
    MissingDeadline,
    BlankSubTaskTitle,
    ZeroRequiredCharacters,
    ProgressOutOfRange(u8),
    DuplicateSubTaskId(SubTaskId),
}

impl Display for RoomValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "room title is required"),
            Self::MissingDeadline => write!(f, "room deadline is required"),
            Self::BlankSubTaskTitle => write!(f, "sub-task title cannot be blank"),
            Self::ZeroRequiredCharacters => {
                write!(f, "text sub-tasks require at least one character")
            }
            Self::ProgressOutOfRange(value) => {
                write!(f, "progress {value} is outside 0..={MAX_PROGRESS}")
            }
            Self::DuplicateSubTaskId(id) => write!(f, "duplicate sub-task id: {id}"),
        }
    }
}

impl Error for RoomValidationError {}

/// A teacher-created assignment with ordered sub-tasks.
///
/// Field order matches the persisted JSON layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    id: RoomId,
    title: String,
    #[serde(default)]
    description: String,
    sub_tasks: Vec<SubTask>,
    #[serde(with = "timestamp")]
    deadline: DateTime<Utc>,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    progress: u8,
}

impl Room {
    /// Assembles a room with a generated id and aggregated progress.
    ///
    /// Creation-time input checks (title, deadline, thresholds) belong to
    /// callers; this only enforces record invariants.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        deadline: DateTime<Utc>,
        created_at: DateTime<Utc>,
        sub_tasks: Vec<SubTask>,
    ) -> Result<Self, RoomValidationError> {
        let mut room = Self {
            id: RoomId::generate(),
            title: title.into(),
            description: description.into(),
            sub_tasks,
            deadline,
            created_at,
            progress: 0,
        };
        room.recompute_progress();
        room.validate()?;
        Ok(room)
    }

    /// Checks record invariants; used on every decode and write path.
    pub fn validate(&self) -> Result<(), RoomValidationError> {
        if self.progress > MAX_PROGRESS {
            return Err(RoomValidationError::ProgressOutOfRange(self.progress));
        }
        let mut seen = HashSet::with_capacity(self.sub_tasks.len());
        for sub_task in &self.sub_tasks {
            if !seen.insert(sub_task.id()) {
                return Err(RoomValidationError::DuplicateSubTaskId(
                    sub_task.id().clone(),
                ));
            }
        }
        Ok(())
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sub_tasks(&self) -> &[SubTask] {
        &self.sub_tasks
    }

    pub fn sub_task(&self, id: &SubTaskId) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|sub_task| sub_task.id() == id)
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn completed_count(&self) -> usize {
        self.sub_tasks
            .iter()
            .filter(|sub_task| sub_task.is_completed())
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.sub_tasks.len()
    }

    /// Whether `progress` currently matches the aggregate, i.e. no manual
    /// override is in effect.
    pub fn progress_is_aggregated(&self) -> bool {
        self.progress == compute_progress(&self.sub_tasks)
    }

    /// Sets completion of a checkbox sub-task and re-aggregates.
    pub fn set_sub_task_checked(
        &mut self,
        id: &SubTaskId,
        completed: bool,
    ) -> Result<(), SubTaskMutationError> {
        self.sub_task_mut(id)?.set_checked(completed)?;
        self.recompute_progress();
        Ok(())
    }

    /// Replaces text of a text sub-task and re-aggregates.
    pub fn set_sub_task_text(
        &mut self,
        id: &SubTaskId,
        text: impl Into<String>,
    ) -> Result<(), SubTaskMutationError> {
        self.sub_task_mut(id)?.set_text(text)?;
        self.recompute_progress();
        Ok(())
    }

    /// Appends a sub-task and re-aggregates.
    pub fn add_sub_task(&mut self, sub_task: SubTask) -> Result<(), RoomValidationError> {
        if self.sub_task(sub_task.id()).is_some() {
            return Err(RoomValidationError::DuplicateSubTaskId(
                sub_task.id().clone(),
            ));
        }
        self.sub_tasks.push(sub_task);
        self.recompute_progress();
        Ok(())
    }

    /// Removes a sub-task, keeping the order of the rest, and re-aggregates.
    pub fn remove_sub_task(&mut self, id: &SubTaskId) -> Result<SubTask, SubTaskMutationError> {
        let index = self
            .sub_tasks
            .iter()
            .position(|sub_task| sub_task.id() == id)
            .ok_or_else(|| SubTaskMutationError::NotFound(id.clone()))?;
        let removed = self.sub_tasks.remove(index);
        self.recompute_progress();
        Ok(removed)
    }

    /// Sets progress directly, bypassing aggregation.
    pub fn override_progress(&mut self, progress: u8) -> Result<(), RoomValidationError> {
        if progress > MAX_PROGRESS {
            return Err(RoomValidationError::ProgressOutOfRange(progress));
        }
        self.progress = progress;
        Ok(())
    }

    /// Whole days until the deadline, rounded up; negative once overdue.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.deadline - now).num_milliseconds();
        let days = millis.div_euclid(MILLIS_PER_DAY);
        if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
            days
        } else {
            days + 1
        }
    }

    /// Path of the teacher page for this room.
    pub fn teacher_path(&self) -> String {
        format!("/rooms/{}", self.id)
    }

    /// Path of the student view; no access control applies.
    pub fn student_view_path(&self) -> String {
        format!("/rooms/{}/view", self.id)
    }

    fn sub_task_mut(&mut self, id: &SubTaskId) -> Result<&mut SubTask, SubTaskMutationError> {
        self.sub_tasks
            .iter_mut()
            .find(|sub_task| sub_task.id() == id)
            .ok_or_else(|| SubTaskMutationError::NotFound(id.clone()))
    }

    fn recompute_progress(&mut self) {
        self.progress = compute_progress(&self.sub_tasks);
    }
}

/// Completion percentage of `sub_tasks`, rounded half up.
///
/// Returns `0` for an empty slice.
pub fn compute_progress(sub_tasks: &[SubTask]) -> u8 {
    let total = sub_tasks.len() as u64;
    if total == 0 {
        return 0;
    }
    let completed = sub_tasks
        .iter()
        .filter(|sub_task| sub_task.is_completed())
        .count() as u64;
    // floor(100 * c / t + 1/2) in integer arithmetic.
    let rounded = (200 * completed + total) / (2 * total);
    rounded.min(u64::from(MAX_PROGRESS)) as u8
}
