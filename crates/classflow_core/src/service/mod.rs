//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into room use-cases.
//! - Keep callers (CLI, embedders) decoupled from storage details.

pub mod room_service;
pub mod room_transfer;
