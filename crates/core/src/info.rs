//! Human-oriented decoding of a path and its flag set
//!
//! Collapses a flag set into a single event type, an item type and the
//! metadata changes it carries, e.g. for printing or JSON logging.

use crate::event::ChangeEvent;
use crate::flags::EventFlags;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Dominant change reported by a flag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Created,
    Modified,
    Deleted,
    Moved,
    RootChanged,
    Cloned,
    Unknown,
}

impl EventType {
    /// Pick the dominant change
    ///
    /// Precedence: deleted, moved, created, modified, root-changed, cloned.
    /// Any other non-empty set counts as modified.
    pub fn from_flags(flags: EventFlags) -> Self {
        if flags.contains(EventFlags::ITEM_REMOVED) {
            EventType::Deleted
        } else if flags.contains(EventFlags::ITEM_RENAMED) {
            EventType::Moved
        } else if flags.contains(EventFlags::ITEM_CREATED) {
            EventType::Created
        } else if flags.contains(EventFlags::ITEM_MODIFIED) {
            EventType::Modified
        } else if flags.contains(EventFlags::ROOT_CHANGED) {
            EventType::RootChanged
        } else if flags.contains(EventFlags::ITEM_CLONED) {
            EventType::Cloned
        } else if !flags.is_empty() {
            EventType::Modified
        } else {
            EventType::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Created => "created",
            EventType::Modified => "modified",
            EventType::Deleted => "deleted",
            EventType::Moved => "moved",
            EventType::RootChanged => "root-changed",
            EventType::Cloned => "cloned",
            EventType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of item the event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    File,
    Directory,
    Symlink,
    Unknown,
}

impl ItemType {
    pub fn from_flags(flags: EventFlags) -> Self {
        if flags.contains(EventFlags::ITEM_IS_FILE) {
            ItemType::File
        } else if flags.contains(EventFlags::ITEM_IS_DIR)
            || flags.contains(EventFlags::MUST_SCAN_SUB_DIRS)
        {
            // A rescan request always names a directory
            ItemType::Directory
        } else if flags.contains(EventFlags::ITEM_IS_SYMLINK) {
            ItemType::Symlink
        } else {
            ItemType::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::File => "file",
            ItemType::Directory => "directory",
            ItemType::Symlink => "symlink",
            ItemType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata-only changes carried alongside the main event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileChanges {
    pub inode: bool,
    pub finder: bool,
    pub access: bool,
    pub xattrs: bool,
}

impl FileChanges {
    pub fn from_flags(flags: EventFlags) -> Self {
        Self {
            inode: flags.contains(EventFlags::ITEM_INODE_META_MOD),
            finder: flags.contains(EventFlags::ITEM_FINDER_INFO_MOD),
            access: flags.contains(EventFlags::ITEM_CHANGE_OWNER),
            xattrs: flags.contains(EventFlags::ITEM_XATTR_MOD),
        }
    }

    pub fn any(&self) -> bool {
        self.inode || self.finder || self.access || self.xattrs
    }
}

/// Decoded view of one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventInfo {
    pub path: PathBuf,
    pub flags: EventFlags,
    pub event: EventType,
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub changes: FileChanges,
}

impl EventInfo {
    pub fn new(path: impl AsRef<Path>, flags: EventFlags) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            flags,
            event: EventType::from_flags(flags),
            kind: ItemType::from_flags(flags),
            changes: FileChanges::from_flags(flags),
        }
    }

    pub fn from_event(event: &ChangeEvent) -> Self {
        Self::new(&event.path, event.flags)
    }
}

impl fmt::Display for EventInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.event,
            self.kind,
            self.path.display(),
            self.flags.describe()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_precedence() {
        // Removal wins over everything else in the same batch
        let flags =
            EventFlags::ITEM_CREATED | EventFlags::ITEM_REMOVED | EventFlags::ITEM_MODIFIED;
        assert_eq!(EventType::from_flags(flags), EventType::Deleted);

        let flags = EventFlags::ITEM_CREATED | EventFlags::ITEM_RENAMED;
        assert_eq!(EventType::from_flags(flags), EventType::Moved);

        let flags = EventFlags::ITEM_CREATED | EventFlags::ITEM_MODIFIED;
        assert_eq!(EventType::from_flags(flags), EventType::Created);

        assert_eq!(
            EventType::from_flags(EventFlags::ROOT_CHANGED),
            EventType::RootChanged
        );
        assert_eq!(
            EventType::from_flags(EventFlags::ITEM_CLONED),
            EventType::Cloned
        );
        assert_eq!(
            EventType::from_flags(EventFlags::ITEM_XATTR_MOD),
            EventType::Modified
        );
        assert_eq!(EventType::from_flags(EventFlags::empty()), EventType::Unknown);
    }

    #[test]
    fn test_item_type() {
        assert_eq!(ItemType::from_flags(EventFlags::ITEM_IS_FILE), ItemType::File);
        assert_eq!(ItemType::from_flags(EventFlags::ITEM_IS_DIR), ItemType::Directory);
        assert_eq!(
            ItemType::from_flags(EventFlags::MUST_SCAN_SUB_DIRS),
            ItemType::Directory
        );
        assert_eq!(
            ItemType::from_flags(EventFlags::ITEM_IS_SYMLINK),
            ItemType::Symlink
        );
        assert_eq!(ItemType::from_flags(EventFlags::ITEM_MODIFIED), ItemType::Unknown);
    }

    #[test]
    fn test_metadata_changes() {
        let changes = FileChanges::from_flags(
            EventFlags::ITEM_INODE_META_MOD | EventFlags::ITEM_CHANGE_OWNER,
        );
        assert!(changes.inode);
        assert!(changes.access);
        assert!(!changes.finder);
        assert!(!changes.xattrs);
        assert!(changes.any());
        assert!(!FileChanges::from_flags(EventFlags::ITEM_CREATED).any());
    }

    #[test]
    fn test_info_json_shape() {
        let info = EventInfo::new(
            "tmp/a.txt",
            EventFlags::ITEM_CREATED | EventFlags::ITEM_IS_FILE,
        );
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["path"], "tmp/a.txt");
        assert_eq!(json["flags"], 0x10100);
        assert_eq!(json["event"], "created");
        assert_eq!(json["type"], "file");
        assert_eq!(json["changes"]["inode"], false);
    }

    #[test]
    fn test_info_display() {
        let info = EventInfo::new("a", EventFlags::ITEM_REMOVED | EventFlags::ITEM_IS_DIR);
        assert_eq!(info.to_string(), "deleted directory a (ItemRemoved | ItemIsDir)");
    }
}
