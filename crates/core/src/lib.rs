//! Core event types for fsevents
//!
//! This crate provides:
//! - The closed flag vocabulary (`FlagKind`) and its bitmask (`EventFlags`)
//! - The normalized `ChangeEvent` record delivered to consumers
//! - `EventInfo`, a human-oriented decoding of a path + flag set

pub mod event;
pub mod flags;
pub mod info;

// Re-exports
pub use event::ChangeEvent;
pub use flags::{EventFlags, FlagKind};
pub use info::{EventInfo, EventType, FileChanges, ItemType};
