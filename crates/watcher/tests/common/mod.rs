//! Common utilities for integration tests

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use fsevents_watcher::{ChangeEvent, EventFlags, StreamItem};
use std::path::Path;
use std::time::{Duration, Instant};

/// Upper bound for waiting on a single backend event
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Quiet period used to assert that nothing arrives
pub const QUIET: Duration = Duration::from_millis(500);

/// Handler that forwards every event into a channel
pub fn collector() -> (impl FnMut(ChangeEvent) + Send + 'static, Receiver<ChangeEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let handler = move |event: ChangeEvent| {
        let _ = tx.send(event);
    };
    (handler, rx)
}

/// Wait for the first event on `path` carrying `flag`
pub fn wait_for(rx: &Receiver<ChangeEvent>, path: &Path, flag: EventFlags) -> Option<ChangeEvent> {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    loop {
        let remaining = deadline.checked_duration_since(Instant::now())?;
        let event = rx.recv_timeout(remaining).ok()?;
        if event.path == path && event.flags.contains(flag) {
            return Some(event);
        }
    }
}

/// Every event received within `window`
pub fn drain_for(rx: &Receiver<ChangeEvent>, window: Duration) -> Vec<ChangeEvent> {
    let deadline = Instant::now() + window;
    let mut events = Vec::new();
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(remaining) {
            Ok(event) => events.push(event),
            Err(_) => break,
        }
    }
    events
}

/// Whether a stream item is a change on `path` carrying `flag`
pub fn is_change(item: &StreamItem, path: &Path, flag: EventFlags) -> bool {
    matches!(item, Ok(event) if event.path == path && event.flags.contains(flag))
}
