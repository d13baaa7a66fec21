//! Room use-case service.
//!
//! # Responsibility
//! - Validate room creation input.
//! - Run every mutation through one load/mutate/write-back discipline.
//! - Expose export/import of single rooms.
//!
//! # Invariants
//! - Sub-task mutations persist the re-aggregated progress in the same write.
//! - Failed validation or decoding never reaches storage.
//! - Service layer remains storage-agnostic.

use crate::model::room::{Room, RoomId, RoomValidationError};
use crate::model::sub_task::{SubTask, SubTaskId, SubTaskMutationError};
use crate::repo::room_repo::{RepoError, RoomRepository, UpsertOutcome};
use crate::service::room_transfer::{
    decode_room, encode_room, export_file_name, ImportError, RoomExport,
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for room use-cases.
#[derive(Debug)]
pub enum RoomServiceError {
    /// Input rejected before any storage access.
    Validation(RoomValidationError),
    /// Target room does not exist.
    RoomNotFound(RoomId),
    /// Target sub-task is missing or of the wrong kind.
    SubTask(SubTaskMutationError),
    /// Import payload rejected; storage untouched.
    Import(ImportError),
    /// Export encoding failed.
    Encode(serde_json::Error),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for RoomServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::RoomNotFound(id) => write!(f, "room not found: {id}"),
            Self::SubTask(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode room: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RoomServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::SubTask(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::RoomNotFound(_) => None,
        }
    }
}

impl From<RepoError> for RoomServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::RoomNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<RoomValidationError> for RoomServiceError {
    fn from(value: RoomValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SubTaskMutationError> for RoomServiceError {
    fn from(value: SubTaskMutationError) -> Self {
        Self::SubTask(value)
    }
}

impl From<ImportError> for RoomServiceError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

/// Sub-task requested by a teacher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewSubTask {
    Checkbox {
        title: String,
    },
    Text {
        title: String,
        required_characters: u32,
    },
}

impl NewSubTask {
    pub fn checkbox(title: impl Into<String>) -> Self {
        Self::Checkbox {
            title: title.into(),
        }
    }

    pub fn text(title: impl Into<String>, required_characters: u32) -> Self {
        Self::Text {
            title: title.into(),
            required_characters,
        }
    }

    /// Rejects blank titles and zero thresholds.
    pub fn validate(&self) -> Result<(), RoomValidationError> {
        let title = match self {
            Self::Checkbox { title } => title,
            Self::Text {
                title,
                required_characters,
            } => {
                if *required_characters == 0 {
                    return Err(RoomValidationError::ZeroRequiredCharacters);
                }
                title
            }
        };
        if title.trim().is_empty() {
            return Err(RoomValidationError::BlankSubTaskTitle);
        }
        Ok(())
    }

    fn into_sub_task(self) -> SubTask {
        match self {
            Self::Checkbox { title } => SubTask::checkbox(title),
            Self::Text {
                title,
                required_characters,
            } => SubTask::text(title, required_characters),
        }
    }
}

/// Request model for creating a room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRoomRequest {
    pub title: String,
    pub description: String,
    /// Required; `None` is reported as a validation error.
    pub deadline: Option<DateTime<Utc>>,
    pub sub_tasks: Vec<NewSubTask>,
}

/// Result of importing one room document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub room: Room,
    pub outcome: UpsertOutcome,
}

/// Room service facade over repository implementations.
pub struct RoomService<R: RoomRepository> {
    repo: R,
}

impl<R: RoomRepository> RoomService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates and persists a room stamped with the current time.
    pub fn create_room(&self, request: CreateRoomRequest) -> Result<Room, RoomServiceError> {
        self.create_room_at(request, Utc::now())
    }

    /// Creates and persists a room with an explicit creation time.
    ///
    /// # Contract
    /// - Empty title or missing deadline aborts with no state change.
    /// - New sub-tasks start incomplete, so progress starts at 0.
    pub fn create_room_at(
        &self,
        request: CreateRoomRequest,
        created_at: DateTime<Utc>,
    ) -> Result<Room, RoomServiceError> {
        let room = build_room(request, created_at).map_err(|err| {
            warn!("event=room_create module=service status=rejected reason={err}");
            err
        })?;
        self.repo.insert_room(&room)?;

        info!(
            "event=room_create module=service status=ok room_id={} sub_task_count={}",
            room.id(),
            room.total_count()
        );
        Ok(room)
    }

    /// Gets one room by id; `None` when absent.
    pub fn get_room(&self, id: &RoomId) -> Result<Option<Room>, RoomServiceError> {
        Ok(self.repo.get_room(id)?)
    }

    /// Lists rooms in stored order.
    pub fn list_rooms(&self) -> Result<Vec<Room>, RoomServiceError> {
        Ok(self.repo.list_rooms()?)
    }

    /// Appends a sub-task to an existing room.
    pub fn add_sub_task(
        &self,
        room_id: &RoomId,
        sub_task: NewSubTask,
    ) -> Result<Room, RoomServiceError> {
        sub_task.validate()?;
        self.mutate_room(room_id, "add_sub_task", |room| {
            room.add_sub_task(sub_task.into_sub_task())?;
            Ok(())
        })
    }

    /// Removes a sub-task, keeping the order of the others.
    pub fn remove_sub_task(
        &self,
        room_id: &RoomId,
        sub_task_id: &SubTaskId,
    ) -> Result<Room, RoomServiceError> {
        self.mutate_room(room_id, "remove_sub_task", |room| {
            room.remove_sub_task(sub_task_id)?;
            Ok(())
        })
    }

    /// Toggles a checkbox sub-task to `completed`.
    pub fn set_sub_task_checked(
        &self,
        room_id: &RoomId,
        sub_task_id: &SubTaskId,
        completed: bool,
    ) -> Result<Room, RoomServiceError> {
        self.mutate_room(room_id, "set_checked", |room| {
            room.set_sub_task_checked(sub_task_id, completed)?;
            Ok(())
        })
    }

    /// Replaces the text of a text sub-task; completion follows the
    /// character threshold.
    pub fn update_sub_task_text(
        &self,
        room_id: &RoomId,
        sub_task_id: &SubTaskId,
        text: impl Into<String>,
    ) -> Result<Room, RoomServiceError> {
        self.mutate_room(room_id, "set_text", |room| {
            room.set_sub_task_text(sub_task_id, text)?;
            Ok(())
        })
    }

    /// Sets progress manually. The value holds until the next sub-task
    /// mutation re-aggregates it.
    pub fn override_progress(
        &self,
        room_id: &RoomId,
        progress: u8,
    ) -> Result<Room, RoomServiceError> {
        self.mutate_room(room_id, "override_progress", |room| {
            room.override_progress(progress)?;
            Ok(())
        })
    }

    /// Encodes a stored room for download.
    pub fn export_room(&self, room_id: &RoomId) -> Result<RoomExport, RoomServiceError> {
        let room = self
            .repo
            .get_room(room_id)?
            .ok_or_else(|| RoomServiceError::RoomNotFound(room_id.clone()))?;
        let contents = encode_room(&room).map_err(RoomServiceError::Encode)?;

        info!(
            "event=room_export module=service status=ok room_id={} bytes={}",
            room.id(),
            contents.len()
        );
        Ok(RoomExport {
            file_name: export_file_name(room.title()),
            contents,
        })
    }

    /// Imports one room document, replacing a room with the same id in
    /// place or appending it.
    pub fn import_room(&self, payload: &str) -> Result<ImportOutcome, RoomServiceError> {
        let room = decode_room(payload).map_err(|err| {
            warn!(
                "event=room_import module=service status=rejected bytes={} reason={err}",
                payload.len()
            );
            err
        })?;
        let outcome = self.repo.upsert_room(&room)?;

        info!(
            "event=room_import module=service status=ok room_id={} outcome={}",
            room.id(),
            outcome.as_str()
        );
        Ok(ImportOutcome { room, outcome })
    }

    fn mutate_room(
        &self,
        room_id: &RoomId,
        operation: &'static str,
        mutation: impl FnOnce(&mut Room) -> Result<(), RoomServiceError>,
    ) -> Result<Room, RoomServiceError> {
        let mut room = self
            .repo
            .get_room(room_id)?
            .ok_or_else(|| RoomServiceError::RoomNotFound(room_id.clone()))?;

        if let Err(err) = mutation(&mut room) {
            warn!(
                "event=room_mutate module=service status=rejected op={operation} room_id={room_id} reason={err}"
            );
            return Err(err);
        }
        self.repo.update_room(&room)?;

        info!(
            "event=room_mutate module=service status=ok op={operation} room_id={room_id} progress={}",
            room.progress()
        );
        Ok(room)
    }
}

fn build_room(
    request: CreateRoomRequest,
    created_at: DateTime<Utc>,
) -> Result<Room, RoomServiceError> {
    if request.title.is_empty() {
        return Err(RoomValidationError::MissingTitle.into());
    }
    let deadline = request.deadline.ok_or(RoomValidationError::MissingDeadline)?;
    for sub_task in &request.sub_tasks {
        sub_task.validate()?;
    }

    let sub_tasks = request
        .sub_tasks
        .into_iter()
        .map(NewSubTask::into_sub_task)
        .collect();
    Ok(Room::new(
        request.title,
        request.description,
        deadline,
        created_at,
        sub_tasks,
    )?)
}
