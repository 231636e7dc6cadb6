//! Normalized change event

use crate::flags::{EventFlags, FlagKind};
use crate::info::EventInfo;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One filesystem change, as delivered to a consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Event id, strictly increasing in delivery order for a given watch
    pub id: u64,
    /// Path that changed
    pub path: PathBuf,
    /// What happened to it
    pub flags: EventFlags,
}

impl ChangeEvent {
    pub fn new(id: u64, path: impl Into<PathBuf>, flags: EventFlags) -> Self {
        Self {
            id,
            path: path.into(),
            flags,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check for a single flag kind
    pub fn has(&self, kind: FlagKind) -> bool {
        self.flags.has(kind)
    }

    /// Whether this event reports that the watch root itself went away
    pub fn is_root_changed(&self) -> bool {
        self.flags.contains(EventFlags::ROOT_CHANGED)
    }

    /// Whether the consumer must rescan because events were lost
    pub fn needs_rescan(&self) -> bool {
        self.flags.contains(EventFlags::MUST_SCAN_SUB_DIRS)
    }

    /// Decode into a human-oriented description
    pub fn info(&self) -> EventInfo {
        EventInfo::from_event(self)
    }
}
