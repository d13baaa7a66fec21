//! Core domain logic for ClassFlow rooms.
//! This crate is the single source of truth for room and progress invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::room::{compute_progress, Room, RoomId, RoomValidationError, MAX_PROGRESS};
pub use model::sub_task::{
    text_completion, SubTask, SubTaskId, SubTaskKind, SubTaskMutationError,
    DEFAULT_REQUIRED_CHARACTERS,
};
pub use repo::room_repo::{
    RepoError, RepoResult, RoomRepository, StoredRoomRepository, UpsertOutcome, ROOMS_STORAGE_KEY,
};
pub use service::room_service::{
    CreateRoomRequest, ImportOutcome, NewSubTask, RoomService, RoomServiceError,
};
pub use service::room_transfer::{
    decode_room, encode_room, export_file_name, ImportError, RoomExport,
};
pub use storage::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError, StorageResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
