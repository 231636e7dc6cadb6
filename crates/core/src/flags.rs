//! Change flag vocabulary
//!
//! The bit values are the FSEvents `kFSEventStreamEventFlag*` constants, so a
//! flag set produced on macOS can be compared against the raw OS bits and the
//! same numbers mean the same thing on every platform.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Set of change flags attached to a single event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u32 {
        const MUST_SCAN_SUB_DIRS    = 0x0000_0001;
        const USER_DROPPED          = 0x0000_0002;
        const KERNEL_DROPPED        = 0x0000_0004;
        const EVENT_IDS_WRAPPED     = 0x0000_0008;
        const HISTORY_DONE          = 0x0000_0010;
        const ROOT_CHANGED          = 0x0000_0020;
        const MOUNT                 = 0x0000_0040;
        const UNMOUNT               = 0x0000_0080;
        const ITEM_CREATED          = 0x0000_0100;
        const ITEM_REMOVED          = 0x0000_0200;
        const ITEM_INODE_META_MOD   = 0x0000_0400;
        const ITEM_RENAMED          = 0x0000_0800;
        const ITEM_MODIFIED         = 0x0000_1000;
        const ITEM_FINDER_INFO_MOD  = 0x0000_2000;
        const ITEM_CHANGE_OWNER     = 0x0000_4000;
        const ITEM_XATTR_MOD        = 0x0000_8000;
        const ITEM_IS_FILE          = 0x0001_0000;
        const ITEM_IS_DIR           = 0x0002_0000;
        const ITEM_IS_SYMLINK       = 0x0004_0000;
        const OWN_EVENT             = 0x0008_0000;
        const ITEM_IS_HARDLINK      = 0x0010_0000;
        const ITEM_IS_LAST_HARDLINK = 0x0020_0000;
        const ITEM_CLONED           = 0x0040_0000;
    }
}

/// Named category of filesystem change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlagKind {
    /// Events were coalesced; the subtree must be rescanned
    MustScanSubDirs,
    /// Events were dropped in user space
    UserDropped,
    /// Events were dropped by the kernel
    KernelDropped,
    /// The event id counter wrapped around
    EventIdsWrapped,
    /// Marks the end of replayed history
    HistoryDone,
    /// The watched root itself changed (removed, renamed)
    RootChanged,
    /// A volume was mounted below the root
    Mount,
    /// A volume was unmounted below the root
    Unmount,
    ItemCreated,
    ItemRemoved,
    /// Inode metadata (permissions, timestamps) changed
    ItemInodeMetaMod,
    ItemRenamed,
    ItemModified,
    ItemFinderInfoMod,
    ItemChangeOwner,
    ItemXattrMod,
    ItemIsFile,
    ItemIsDir,
    ItemIsSymlink,
    /// The change was made by the watching process itself
    OwnEvent,
    ItemIsHardlink,
    ItemIsLastHardlink,
    ItemCloned,
}

impl FlagKind {
    /// Every kind, in raw bit order
    pub const ALL: [FlagKind; 23] = [
        FlagKind::MustScanSubDirs,
        FlagKind::UserDropped,
        FlagKind::KernelDropped,
        FlagKind::EventIdsWrapped,
        FlagKind::HistoryDone,
        FlagKind::RootChanged,
        FlagKind::Mount,
        FlagKind::Unmount,
        FlagKind::ItemCreated,
        FlagKind::ItemRemoved,
        FlagKind::ItemInodeMetaMod,
        FlagKind::ItemRenamed,
        FlagKind::ItemModified,
        FlagKind::ItemFinderInfoMod,
        FlagKind::ItemChangeOwner,
        FlagKind::ItemXattrMod,
        FlagKind::ItemIsFile,
        FlagKind::ItemIsDir,
        FlagKind::ItemIsSymlink,
        FlagKind::OwnEvent,
        FlagKind::ItemIsHardlink,
        FlagKind::ItemIsLastHardlink,
        FlagKind::ItemCloned,
    ];

    /// The single bit this kind occupies
    pub const fn flag(self) -> EventFlags {
        match self {
            FlagKind::MustScanSubDirs => EventFlags::MUST_SCAN_SUB_DIRS,
            FlagKind::UserDropped => EventFlags::USER_DROPPED,
            FlagKind::KernelDropped => EventFlags::KERNEL_DROPPED,
            FlagKind::EventIdsWrapped => EventFlags::EVENT_IDS_WRAPPED,
            FlagKind::HistoryDone => EventFlags::HISTORY_DONE,
            FlagKind::RootChanged => EventFlags::ROOT_CHANGED,
            FlagKind::Mount => EventFlags::MOUNT,
            FlagKind::Unmount => EventFlags::UNMOUNT,
            FlagKind::ItemCreated => EventFlags::ITEM_CREATED,
            FlagKind::ItemRemoved => EventFlags::ITEM_REMOVED,
            FlagKind::ItemInodeMetaMod => EventFlags::ITEM_INODE_META_MOD,
            FlagKind::ItemRenamed => EventFlags::ITEM_RENAMED,
            FlagKind::ItemModified => EventFlags::ITEM_MODIFIED,
            FlagKind::ItemFinderInfoMod => EventFlags::ITEM_FINDER_INFO_MOD,
            FlagKind::ItemChangeOwner => EventFlags::ITEM_CHANGE_OWNER,
            FlagKind::ItemXattrMod => EventFlags::ITEM_XATTR_MOD,
            FlagKind::ItemIsFile => EventFlags::ITEM_IS_FILE,
            FlagKind::ItemIsDir => EventFlags::ITEM_IS_DIR,
            FlagKind::ItemIsSymlink => EventFlags::ITEM_IS_SYMLINK,
            FlagKind::OwnEvent => EventFlags::OWN_EVENT,
            FlagKind::ItemIsHardlink => EventFlags::ITEM_IS_HARDLINK,
            FlagKind::ItemIsLastHardlink => EventFlags::ITEM_IS_LAST_HARDLINK,
            FlagKind::ItemCloned => EventFlags::ITEM_CLONED,
        }
    }

    /// Raw bit value
    pub const fn bits(self) -> u32 {
        self.flag().bits()
    }

    /// Stable constant name (matches the FSEvents suffix)
    pub const fn name(self) -> &'static str {
        match self {
            FlagKind::MustScanSubDirs => "MustScanSubDirs",
            FlagKind::UserDropped => "UserDropped",
            FlagKind::KernelDropped => "KernelDropped",
            FlagKind::EventIdsWrapped => "EventIdsWrapped",
            FlagKind::HistoryDone => "HistoryDone",
            FlagKind::RootChanged => "RootChanged",
            FlagKind::Mount => "Mount",
            FlagKind::Unmount => "Unmount",
            FlagKind::ItemCreated => "ItemCreated",
            FlagKind::ItemRemoved => "ItemRemoved",
            FlagKind::ItemInodeMetaMod => "ItemInodeMetaMod",
            FlagKind::ItemRenamed => "ItemRenamed",
            FlagKind::ItemModified => "ItemModified",
            FlagKind::ItemFinderInfoMod => "ItemFinderInfoMod",
            FlagKind::ItemChangeOwner => "ItemChangeOwner",
            FlagKind::ItemXattrMod => "ItemXattrMod",
            FlagKind::ItemIsFile => "ItemIsFile",
            FlagKind::ItemIsDir => "ItemIsDir",
            FlagKind::ItemIsSymlink => "ItemIsSymlink",
            FlagKind::OwnEvent => "OwnEvent",
            FlagKind::ItemIsHardlink => "ItemIsHardlink",
            FlagKind::ItemIsLastHardlink => "ItemIsLastHardlink",
            FlagKind::ItemCloned => "ItemCloned",
        }
    }

    /// Look up a kind by its constant name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The full `(name, bits)` table, for exporting constants to consumers
    pub fn constants() -> impl Iterator<Item = (&'static str, u32)> {
        Self::ALL.into_iter().map(|kind| (kind.name(), kind.bits()))
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<FlagKind> for EventFlags {
    fn from(kind: FlagKind) -> Self {
        kind.flag()
    }
}

impl FromIterator<FlagKind> for EventFlags {
    fn from_iter<I: IntoIterator<Item = FlagKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(EventFlags::empty(), |acc, kind| acc | kind.flag())
    }
}

impl EventFlags {
    /// Item type bits
    pub const TYPE_MASK: EventFlags = EventFlags::ITEM_IS_FILE
        .union(EventFlags::ITEM_IS_DIR)
        .union(EventFlags::ITEM_IS_SYMLINK)
        .union(EventFlags::ITEM_IS_HARDLINK)
        .union(EventFlags::ITEM_IS_LAST_HARDLINK);

    /// Check for a single kind
    pub fn has(self, kind: FlagKind) -> bool {
        self.contains(kind.flag())
    }

    /// Kinds present in this set, in raw bit order
    pub fn kinds(self) -> impl Iterator<Item = FlagKind> {
        FlagKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(kind.flag()))
    }

    /// Names of the kinds present in this set
    pub fn names(self) -> Vec<&'static str> {
        self.kinds().map(FlagKind::name).collect()
    }

    /// `"ItemCreated | ItemIsFile"`, or `"None"` for the empty set
    pub fn describe(self) -> String {
        if self.is_empty() {
            return "None".to_string();
        }
        self.names().join(" | ")
    }
}

impl Serialize for EventFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for EventFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(EventFlags::from_bits_retain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_fsevents_bits() {
        assert_eq!(FlagKind::MustScanSubDirs.bits(), 0x1);
        assert_eq!(FlagKind::RootChanged.bits(), 0x20);
        assert_eq!(FlagKind::ItemCreated.bits(), 0x100);
        assert_eq!(FlagKind::ItemRemoved.bits(), 0x200);
        assert_eq!(FlagKind::ItemModified.bits(), 0x1000);
        assert_eq!(FlagKind::ItemIsFile.bits(), 0x10000);
        assert_eq!(FlagKind::ItemIsDir.bits(), 0x20000);
        assert_eq!(FlagKind::ItemCloned.bits(), 0x400000);
    }

    #[test]
    fn test_every_kind_has_a_distinct_bit() {
        let mut seen = EventFlags::empty();
        for kind in FlagKind::ALL {
            assert_eq!(kind.bits().count_ones(), 1, "{kind} is not a single bit");
            assert!(!seen.intersects(kind.flag()), "{kind} overlaps another kind");
            seen |= kind.flag();
        }
        assert_eq!(seen, EventFlags::all());
    }

    #[test]
    fn test_kinds_in_bit_order() {
        let flags = EventFlags::ITEM_IS_FILE | EventFlags::ITEM_CREATED;
        let kinds: Vec<_> = flags.kinds().collect();
        assert_eq!(kinds, vec![FlagKind::ItemCreated, FlagKind::ItemIsFile]);
        assert_eq!(flags.describe(), "ItemCreated | ItemIsFile");
        assert_eq!(EventFlags::empty().describe(), "None");
    }

    #[test]
    fn test_name_lookup() {
        for kind in FlagKind::ALL {
            assert_eq!(FlagKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(FlagKind::from_name("ItemExploded"), None);
        assert_eq!(FlagKind::constants().count(), FlagKind::ALL.len());
    }

    #[test]
    fn test_collect_from_kinds() {
        let flags: EventFlags = [FlagKind::ItemRemoved, FlagKind::ItemIsDir]
            .into_iter()
            .collect();
        assert!(flags.has(FlagKind::ItemRemoved));
        assert!(flags.has(FlagKind::ItemIsDir));
        assert!(!flags.has(FlagKind::ItemCreated));
    }

    #[test]
    fn test_serializes_as_raw_bits() {
        let flags = EventFlags::ITEM_CREATED | EventFlags::ITEM_IS_FILE;
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, "65792");
        let back: EventFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}
