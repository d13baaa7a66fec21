//! Room repository contract and key/value-backed implementation.
//!
//! # Responsibility
//! - Provide get/list/insert/update/upsert over the room collection.
//! - Persist the whole collection as one JSON array per write.
//!
//! # Invariants
//! - Collection order is insertion order; replacement keeps the position.
//! - Room ids are unique within the collection.
//! - Last write wins; there is no locking or merge.

use crate::model::room::{Room, RoomId, RoomValidationError};
use crate::storage::{KeyValueStore, StorageError};
use log::{debug, error, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key holding the serialized room collection.
pub const ROOMS_STORAGE_KEY: &str = "classroomFlowRooms";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for room persistence and lookup.
#[derive(Debug)]
pub enum RepoError {
    Validation(RoomValidationError),
    Storage(StorageError),
    NotFound(RoomId),
    AlreadyExists(RoomId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "room not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "room already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted room data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::AlreadyExists(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<RoomValidationError> for RepoError {
    fn from(value: RoomValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Appended to the end of the collection.
    Inserted,
    /// Replaced an existing room at its position.
    Replaced,
}

impl UpsertOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Replaced => "replaced",
        }
    }
}

/// Repository interface for the room collection.
pub trait RoomRepository {
    fn list_rooms(&self) -> RepoResult<Vec<Room>>;
    fn get_room(&self, id: &RoomId) -> RepoResult<Option<Room>>;
    /// Appends a new room; fails when the id is taken.
    fn insert_room(&self, room: &Room) -> RepoResult<()>;
    /// Replaces an existing room by identity; fails when absent.
    fn update_room(&self, room: &Room) -> RepoResult<()>;
    /// Replaces in place when the id exists, appends otherwise.
    fn upsert_room(&self, room: &Room) -> RepoResult<UpsertOutcome>;
}

/// Room repository persisting through a [`KeyValueStore`].
pub struct StoredRoomRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StoredRoomRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self) -> RepoResult<Vec<Room>> {
        let Some(raw) = self.store.get_item(ROOMS_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };

        let rooms: Vec<Room> = serde_json::from_str(&raw).map_err(|err| {
            error!(
                "event=rooms_load module=repo status=error error_code=decode_failed error={}",
                err
            );
            RepoError::InvalidData(format!("cannot decode `{ROOMS_STORAGE_KEY}`: {err}"))
        })?;
        let mut seen = HashSet::with_capacity(rooms.len());
        for room in &rooms {
            room.validate().map_err(|err| {
                RepoError::InvalidData(format!("room {} violates invariants: {err}", room.id()))
            })?;
            if !seen.insert(room.id()) {
                error!(
                    "event=rooms_load module=repo status=error error_code=duplicate_room_id room_id={}",
                    room.id()
                );
                return Err(RepoError::InvalidData(format!(
                    "room id {} appears more than once",
                    room.id()
                )));
            }
        }

        debug!(
            "event=rooms_load module=repo status=ok room_count={}",
            rooms.len()
        );
        Ok(rooms)
    }

    fn store_all(&self, rooms: &[Room]) -> RepoResult<()> {
        let encoded = serde_json::to_string(rooms)
            .map_err(|err| RepoError::InvalidData(format!("cannot encode rooms: {err}")))?;
        if let Err(err) = self.store.set_item(ROOMS_STORAGE_KEY, &encoded) {
            error!(
                "event=rooms_store module=repo status=error room_count={} error_code=write_failed error={}",
                rooms.len(),
                err
            );
            return Err(err.into());
        }
        Ok(())
    }
}

impl<S: KeyValueStore> RoomRepository for StoredRoomRepository<S> {
    fn list_rooms(&self) -> RepoResult<Vec<Room>> {
        self.load()
    }

    fn get_room(&self, id: &RoomId) -> RepoResult<Option<Room>> {
        Ok(self.load()?.into_iter().find(|room| room.id() == id))
    }

    fn insert_room(&self, room: &Room) -> RepoResult<()> {
        room.validate()?;

        let mut rooms = self.load()?;
        if rooms.iter().any(|existing| existing.id() == room.id()) {
            return Err(RepoError::AlreadyExists(room.id().clone()));
        }
        rooms.push(room.clone());
        self.store_all(&rooms)?;

        info!(
            "event=room_insert module=repo status=ok room_id={} room_count={}",
            room.id(),
            rooms.len()
        );
        Ok(())
    }

    fn update_room(&self, room: &Room) -> RepoResult<()> {
        room.validate()?;

        let mut rooms = self.load()?;
        let slot = rooms
            .iter_mut()
            .find(|existing| existing.id() == room.id())
            .ok_or_else(|| RepoError::NotFound(room.id().clone()))?;
        *slot = room.clone();
        self.store_all(&rooms)?;

        info!(
            "event=room_update module=repo status=ok room_id={} progress={}",
            room.id(),
            room.progress()
        );
        Ok(())
    }

    fn upsert_room(&self, room: &Room) -> RepoResult<UpsertOutcome> {
        room.validate()?;

        let mut rooms = self.load()?;
        let outcome = match rooms.iter_mut().find(|existing| existing.id() == room.id()) {
            Some(slot) => {
                *slot = room.clone();
                UpsertOutcome::Replaced
            }
            None => {
                rooms.push(room.clone());
                UpsertOutcome::Inserted
            }
        };
        self.store_all(&rooms)?;

        info!(
            "event=room_upsert module=repo status=ok room_id={} outcome={} room_count={}",
            room.id(),
            outcome.as_str(),
            rooms.len()
        );
        Ok(outcome)
    }
}
