//! Delivery thread
//!
//! One thread per watch. It drains the raw backend channel, translates each
//! backend event and hands the results to the consumer in order. The stop
//! flag is checked before every single handler call, so nothing new is
//! dispatched once a stop has been requested.

use crate::context::WatchContext;
use crate::error::WatchError;
use crate::handle::Shared;
use crate::handler::EventHandler;
use crate::translate::{Translator, RESCAN_FLAGS};
use crossbeam_channel::{select, Receiver};
use fsevents_core::{ChangeEvent, EventFlags};
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, trace};

/// Raw backend message
pub(crate) type RawEvent = notify::Result<notify::Event>;

thread_local! {
    static IN_DELIVERY: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is some watch's delivery thread
pub(crate) fn in_delivery_context() -> bool {
    IN_DELIVERY.with(Cell::get)
}

/// Everything the delivery thread owns
pub(crate) struct Delivery<H> {
    pub(crate) shared: Arc<Shared>,
    pub(crate) context: Arc<WatchContext>,
    pub(crate) translator: Translator,
    pub(crate) raw_rx: Receiver<RawEvent>,
    pub(crate) stop_rx: Receiver<()>,
    pub(crate) handler: H,
}

impl<H: EventHandler> Delivery<H> {
    /// Thread body; returns once the watch is stopped or failed
    pub(crate) fn run(mut self) {
        IN_DELIVERY.with(|flag| flag.set(true));
        debug!(
            "Delivery started for watch {} on {}",
            self.shared.id,
            self.translator.display_root().display()
        );

        while let Some(message) = self.next_message() {
            if self.shared.is_stopped() {
                break;
            }

            let outcome = match message {
                Ok(event) => self.dispatch(&event),
                Err(err) => Err(WatchError::Backend(err.to_string())),
            };

            if let Err(error) = outcome {
                self.fail(error);
                break;
            }
        }

        // Covers stops requested from inside a handler and failures; a no-op
        // when an outside stop already released everything.
        self.shared.release();
        debug!("Delivery finished for watch {}", self.shared.id);
    }

    /// Block until the next backend message; `None` means stop
    fn next_message(&self) -> Option<RawEvent> {
        select! {
            recv(self.stop_rx) -> _ => None,
            recv(self.raw_rx) -> message => message.ok(),
        }
    }

    /// Deliver one backend event; `Err` if it ended the watch
    fn dispatch(&mut self, event: &notify::Event) -> Result<(), WatchError> {
        trace!("Backend event: {:?}", event);

        for (path, flags) in self.translator.translate(event) {
            if self.shared.is_stopped() {
                return Ok(());
            }
            let id = self.context.next_event_id();
            self.handler.handle_event(ChangeEvent::new(id, path, flags));
        }

        if self.translator.root_gone(event) {
            return Err(WatchError::RootRemoved(
                self.translator.display_root().to_path_buf(),
            ));
        }
        Ok(())
    }

    /// Report a fatal error, unless a stop got there first
    fn fail(&mut self, error: WatchError) {
        if !self.shared.mark_stopped() {
            return;
        }
        debug!("Watch {} failed: {}", self.shared.id, error);

        let flags = match &error {
            WatchError::RootRemoved(_) => EventFlags::ROOT_CHANGED,
            _ => RESCAN_FLAGS,
        };
        let terminal = ChangeEvent::new(
            self.context.next_event_id(),
            self.translator.display_root(),
            flags,
        );
        self.handler.handle_failure(error, terminal);
    }
}
