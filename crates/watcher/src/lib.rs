//! Directory-tree change watching
//!
//! This crate provides a recursive filesystem watcher with:
//! - A start/stop lifecycle owned by a `WatchHandle`
//! - Normalized `(path, flags)` events on a dedicated delivery thread
//! - In-order, never-concurrent handler calls per watch
//! - Channel-based streams as an alternative to callbacks
//! - Optional gitignore-style path filtering
//!
//! ```no_run
//! use fsevents_watcher::{watch, ChangeEvent};
//!
//! let handle = watch("tmp", |event: ChangeEvent| {
//!     println!("{}", event.info());
//! })?;
//! // ...
//! handle.stop();
//! # Ok::<(), fsevents_watcher::WatchError>(())
//! ```

pub mod config;
pub mod context;
mod delivery;
pub mod error;
pub mod filter;
pub mod handle;
pub mod handler;
pub mod stream;
pub mod translate;

use std::path::Path;

// Re-exports
pub use config::{Backend, WatchConfig};
pub use context::active_watches;
pub use error::{Result, WatchError};
pub use filter::{FilterConfig, PathFilter};
pub use fsevents_core::{ChangeEvent, EventFlags, EventInfo, EventType, FlagKind, ItemType};
pub use handle::{Stopper, WatchHandle, WatchState};
pub use handler::EventHandler;
pub use stream::{AsyncEventStream, EventStream, StreamItem};

/// Watch `root` recursively, calling `on_event` for every change
///
/// Fails with `PathNotFound` if `root` does not exist, `NotADirectory` if it
/// is not a directory and `SubscriptionFailed` if the OS refuses the watch.
pub fn watch<F>(root: impl AsRef<Path>, on_event: F) -> Result<WatchHandle>
where
    F: FnMut(ChangeEvent) + Send + 'static,
{
    WatchHandle::start(root.as_ref(), &WatchConfig::default(), on_event)
}

/// Watch `root` with an explicit config and any `EventHandler`
pub fn watch_with_config<H: EventHandler>(
    root: impl AsRef<Path>,
    config: &WatchConfig,
    handler: H,
) -> Result<WatchHandle> {
    WatchHandle::start(root.as_ref(), config, handler)
}

/// Watch `root` and receive events through a blocking stream
pub fn watch_stream(root: impl AsRef<Path>, config: &WatchConfig) -> Result<EventStream> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = WatchHandle::start(root.as_ref(), config, tx)?;
    Ok(EventStream::new(handle, rx))
}

/// Watch `root` and receive events through an async stream
pub fn watch_async(root: impl AsRef<Path>, config: &WatchConfig) -> Result<AsyncEventStream> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = WatchHandle::start(root.as_ref(), config, tx)?;
    Ok(AsyncEventStream::new(handle, rx))
}
