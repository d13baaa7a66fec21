//! Domain model for rooms and their sub-tasks.
//!
//! # Responsibility
//! - Define the records persisted in the room collection.
//! - Own completion and progress derivation rules.
//!
//! # Invariants
//! - Every room and sub-task is identified by a stable opaque id.
//! - Rooms are never soft-deleted or versioned.

pub mod room;
pub mod sub_task;
pub mod timestamp;
