//! Channel-based delivery
//!
//! Alternatives to a callback for consumers that prefer pulling events:
//! `EventStream` for blocking/iterator use and `AsyncEventStream` for tokio.
//! Both yield `Ok(event)` for changes and a final `Err(error)` if the watch
//! fails; the stream ends (returns `None`) once the watch is stopped.

use crate::error::WatchError;
use crate::handle::{WatchHandle, WatchState};
use crate::handler::EventHandler;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use fsevents_core::ChangeEvent;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// One stream item
pub type StreamItem = Result<ChangeEvent, WatchError>;

impl EventHandler for Sender<StreamItem> {
    fn handle_event(&mut self, event: ChangeEvent) {
        // The receiver is gone only after the stream was dropped
        let _ = self.send(Ok(event));
    }

    fn handle_failure(&mut self, error: WatchError, _terminal: ChangeEvent) {
        let _ = self.send(Err(error));
    }
}

impl EventHandler for UnboundedSender<StreamItem> {
    fn handle_event(&mut self, event: ChangeEvent) {
        let _ = self.send(Ok(event));
    }

    fn handle_failure(&mut self, error: WatchError, _terminal: ChangeEvent) {
        let _ = self.send(Err(error));
    }
}

/// Blocking event stream for one watch
///
/// The channel is unbounded so a slow reader never stalls the delivery
/// thread (and with it `stop()`).
#[derive(Debug)]
pub struct EventStream {
    handle: WatchHandle,
    rx: Receiver<StreamItem>,
}

impl EventStream {
    pub(crate) fn new(handle: WatchHandle, rx: Receiver<StreamItem>) -> Self {
        Self { handle, rx }
    }

    /// Block until the next item; `None` once the watch has stopped and
    /// everything delivered before that was read
    pub fn recv(&self) -> Option<StreamItem> {
        self.rx.recv().ok()
    }

    /// Like `recv`, but give up after `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<StreamItem> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Next item if one is ready
    pub fn try_recv(&self) -> Option<StreamItem> {
        self.rx.try_recv().ok()
    }

    /// Blocking iterator over items, ends when the watch stops
    pub fn iter(&self) -> impl Iterator<Item = StreamItem> + '_ {
        self.rx.iter()
    }

    /// Stop the watch and discard anything still buffered
    pub fn stop(&self) {
        self.handle.stop();
        while self.rx.try_recv().is_ok() {}
    }

    pub fn root(&self) -> &Path {
        self.handle.root()
    }

    pub fn state(&self) -> WatchState {
        self.handle.state()
    }

    pub fn handle(&self) -> &WatchHandle {
        &self.handle
    }
}

/// Async event stream for one watch
#[derive(Debug)]
pub struct AsyncEventStream {
    handle: WatchHandle,
    rx: UnboundedReceiver<StreamItem>,
}

impl AsyncEventStream {
    pub(crate) fn new(handle: WatchHandle, rx: UnboundedReceiver<StreamItem>) -> Self {
        Self { handle, rx }
    }

    /// Wait for the next item; `None` once the watch has stopped
    pub async fn recv(&mut self) -> Option<StreamItem> {
        self.rx.recv().await
    }

    /// Next item if one is ready
    pub fn try_recv(&mut self) -> Option<StreamItem> {
        self.rx.try_recv().ok()
    }

    /// Stop the watch and discard anything still buffered
    ///
    /// Blocks for at most the handler call in progress, which for a stream is
    /// a single channel send.
    pub fn stop(&mut self) {
        self.handle.stop();
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }

    pub fn root(&self) -> &Path {
        self.handle.root()
    }

    pub fn state(&self) -> WatchState {
        self.handle.state()
    }

    pub fn handle(&self) -> &WatchHandle {
        &self.handle
    }
}
