//! Translation from backend events to flag sets
//!
//! The backend (`notify`) reports a typed `EventKind` plus one or more paths.
//! Each path becomes one `(path, flags)` pair using a fixed table:
//!
//! | backend kind                      | flags                          |
//! |-----------------------------------|--------------------------------|
//! | `Create(_)`                       | `ITEM_CREATED`                 |
//! | `Remove(_)`                       | `ITEM_REMOVED`                 |
//! | `Modify(Name(_))`                 | `ITEM_RENAMED`                 |
//! | `Modify(Metadata(Ownership))`     | `ITEM_CHANGE_OWNER`            |
//! | `Modify(Metadata(Extended))`      | `ITEM_XATTR_MOD`               |
//! | `Modify(Metadata(_))`             | `ITEM_INODE_META_MOD`          |
//! | `Modify(_)`, `Any`                | `ITEM_MODIFIED`                |
//! | `Access(_)`, `Other`              | not reported                   |
//! | any kind with the rescan flag     | `MUST_SCAN_SUB_DIRS \| KERNEL_DROPPED` |
//!
//! Item type bits come from the backend kind when it names one
//! (`File`/`Folder`), otherwise from `symlink_metadata` on the path. The root
//! is always a directory, whatever the backend says about it.
//!
//! An event for the root's `.gitignore` rebuilds the path filter before the
//! event itself is filtered, when gitignore filtering is enabled.

use crate::filter::PathFilter;
use fsevents_core::EventFlags;
use notify::event::{CreateKind, EventKind, MetadataKind, ModifyKind, RemoveKind};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Flags signalling that events were lost and the tree must be rescanned
pub const RESCAN_FLAGS: EventFlags =
    EventFlags::MUST_SCAN_SUB_DIRS.union(EventFlags::KERNEL_DROPPED);

/// Change bits for a backend event kind, `None` if it is not reported
pub fn change_flags(kind: &EventKind) -> Option<EventFlags> {
    let flags = match kind {
        EventKind::Create(_) => EventFlags::ITEM_CREATED,
        EventKind::Remove(_) => EventFlags::ITEM_REMOVED,
        EventKind::Modify(ModifyKind::Name(_)) => EventFlags::ITEM_RENAMED,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Ownership)) => {
            EventFlags::ITEM_CHANGE_OWNER
        }
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Extended)) => {
            EventFlags::ITEM_XATTR_MOD
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => EventFlags::ITEM_INODE_META_MOD,
        EventKind::Modify(_) | EventKind::Any => EventFlags::ITEM_MODIFIED,
        EventKind::Access(_) | EventKind::Other => return None,
    };
    Some(flags)
}

/// Item type bits the backend states outright
fn declared_type(kind: &EventKind) -> Option<EventFlags> {
    match kind {
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => {
            Some(EventFlags::ITEM_IS_FILE)
        }
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            Some(EventFlags::ITEM_IS_DIR)
        }
        _ => None,
    }
}

/// Item type bits from the filesystem; empty if the path is gone
fn probe_type(path: &Path) -> EventFlags {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => EventFlags::ITEM_IS_SYMLINK,
        Ok(meta) if meta.is_dir() => EventFlags::ITEM_IS_DIR,
        Ok(_) => EventFlags::ITEM_IS_FILE,
        Err(_) => EventFlags::empty(),
    }
}

/// Per-watch translator
pub(crate) struct Translator {
    /// Root as the backend reports it
    canonical_root: PathBuf,
    /// Root as the caller spelled it
    display_root: PathBuf,
    filter: PathFilter,
    report_directories: bool,
}

impl Translator {
    pub(crate) fn new(
        canonical_root: PathBuf,
        display_root: PathBuf,
        filter: PathFilter,
        report_directories: bool,
    ) -> Self {
        Self {
            canonical_root,
            display_root,
            filter,
            report_directories,
        }
    }

    pub(crate) fn display_root(&self) -> &Path {
        &self.display_root
    }

    /// Translate one backend event into deliverable `(path, flags)` pairs
    pub(crate) fn translate(&mut self, event: &notify::Event) -> Vec<(PathBuf, EventFlags)> {
        if event.need_rescan() {
            if event.paths.is_empty() {
                return vec![(self.display_root.clone(), RESCAN_FLAGS)];
            }
            return event
                .paths
                .iter()
                .map(|path| (self.rebase(path), RESCAN_FLAGS))
                .collect();
        }

        let Some(change) = change_flags(&event.kind) else {
            return Vec::new();
        };
        let declared = declared_type(&event.kind);

        if event.paths.iter().any(|path| self.filter.is_source(path)) {
            self.reload_filter();
        }

        event
            .paths
            .iter()
            .filter_map(|path| {
                let item = if path == &self.canonical_root {
                    EventFlags::ITEM_IS_DIR
                } else {
                    declared.unwrap_or_else(|| probe_type(path))
                };
                let flags = change | item;
                let is_dir = flags.contains(EventFlags::ITEM_IS_DIR);

                if is_dir && !self.report_directories && path != &self.canonical_root {
                    return None;
                }
                if self.filter.is_ignored(path, is_dir) {
                    return None;
                }
                Some((self.rebase(path), flags))
            })
            .collect()
    }

    fn reload_filter(&mut self) {
        match self.filter.reload() {
            Ok(()) => debug!("Reloaded path filter for {}", self.display_root.display()),
            // Keep filtering with the previous rules
            Err(err) => warn!("Failed to reload path filter: {}", err),
        }
    }

    /// Whether this event took the root away (removed or renamed)
    pub(crate) fn root_gone(&self, event: &notify::Event) -> bool {
        matches!(
            event.kind,
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
        ) && !self.canonical_root.exists()
    }

    /// Re-anchor a backend path onto the caller's spelling of the root
    fn rebase(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.canonical_root) {
            Ok(rel) if rel.as_os_str().is_empty() => self.display_root.clone(),
            Ok(rel) => self.display_root.join(rel),
            Err(_) => path.to_path_buf(),
        }
    }
}
