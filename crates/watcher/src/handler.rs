//! Consumer side of the delivery contract

use crate::error::WatchError;
use fsevents_core::ChangeEvent;
use tracing::warn;

/// Receives the events of one watch
///
/// Calls for a single watch are never concurrent: they all come from that
/// watch's delivery thread, in backend order. Any `FnMut(ChangeEvent)` closure
/// that is `Send + 'static` is a handler.
pub trait EventHandler: Send + 'static {
    /// Handle one change
    fn handle_event(&mut self, event: ChangeEvent);

    /// The watch failed and is now stopped
    ///
    /// Called at most once and never followed by another call. `terminal` is
    /// an event for the root describing the failure in flag form
    /// (`ROOT_CHANGED` when the root went away, the rescan flags otherwise).
    /// The default logs `error` as a warning and forwards `terminal` to
    /// `handle_event`.
    fn handle_failure(&mut self, error: WatchError, terminal: ChangeEvent) {
        warn!("Watch on {} failed: {}", terminal.path.display(), error);
        self.handle_event(terminal);
    }
}

impl<F> EventHandler for F
where
    F: FnMut(ChangeEvent) + Send + 'static,
{
    fn handle_event(&mut self, event: ChangeEvent) {
        (self)(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsevents_core::EventFlags;
    use std::path::PathBuf;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_closure_receives_terminal_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut handler = move |event: ChangeEvent| sink.lock().push(event);

        handler.handle_event(ChangeEvent::new(
            1,
            "root/a.txt",
            EventFlags::ITEM_CREATED | EventFlags::ITEM_IS_FILE,
        ));
        handler.handle_failure(
            WatchError::RootRemoved(PathBuf::from("root")),
            ChangeEvent::new(2, "root", EventFlags::ROOT_CHANGED),
        );

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].is_root_changed());
        assert_eq!(seen[1].path, PathBuf::from("root"));
    }
}
