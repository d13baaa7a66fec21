//! Repository layer over the stored room collection.
//!
//! # Responsibility
//! - Hide the load/replace/write-back cycle behind one contract.
//! - Isolate the JSON document layout from service orchestration.
//!
//! # Invariants
//! - Writes call `Room::validate()` before touching storage.
//! - Reads reject invalid persisted state instead of masking it.

pub mod room_repo;
