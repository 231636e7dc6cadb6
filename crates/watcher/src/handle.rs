//! Watch handle and lifecycle
//!
//! `Created → Active → Stopped`, with `Stopped` terminal.
//!
//! Stop policy: a handler call already running when `stop()` is called from
//! an outside thread finishes before `stop()` returns, and everything not yet
//! handed to the handler is discarded. Called from a delivery thread (from
//! inside any handler), `stop()` does not wait: the running call finishes and
//! no further call starts. The outside-thread worst case is therefore the
//! duration of the handler call in progress plus one channel wakeup.

use crate::config::{Backend, WatchConfig};
use crate::context::WatchContext;
use crate::delivery::{in_delivery_context, Delivery, RawEvent};
use crate::error::{Result, WatchError};
use crate::filter::PathFilter;
use crate::handler::EventHandler;
use crate::translate::Translator;
use crossbeam_channel::Sender;
use notify::Watcher as _;
use parking_lot::Mutex;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

const CREATED: u8 = 0;
const ACTIVE: u8 = 1;
const STOPPED: u8 = 2;

/// OS subscription, boxed so native and polling backends share one slot
pub(crate) type BoxedWatcher = Box<dyn notify::Watcher + Send>;

/// Lifecycle state of a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Subscription exists, delivery not yet running
    Created,
    /// Events are being delivered
    Active,
    /// Terminal; no further handler calls
    Stopped,
}

/// State shared between a handle, its stoppers and its delivery thread
pub(crate) struct Shared {
    pub(crate) id: u64,
    root: PathBuf,
    state: AtomicU8,
    /// Dropping the watcher deregisters the OS subscription
    backend: Mutex<Option<BoxedWatcher>>,
    context: Mutex<Option<Arc<WatchContext>>>,
    stop_tx: Mutex<Option<Sender<()>>>,
    delivery: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    pub(crate) fn new(
        id: u64,
        root: &Path,
        backend: Option<BoxedWatcher>,
        context: Arc<WatchContext>,
        stop_tx: Sender<()>,
    ) -> Self {
        Self {
            id,
            root: root.to_path_buf(),
            state: AtomicU8::new(CREATED),
            backend: Mutex::new(backend),
            context: Mutex::new(Some(context)),
            stop_tx: Mutex::new(Some(stop_tx)),
            delivery: Mutex::new(None),
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STOPPED
    }

    /// Move to `Stopped`; true only for the caller that made the transition
    pub(crate) fn mark_stopped(&self) -> bool {
        self.state.swap(STOPPED, Ordering::SeqCst) != STOPPED
    }

    pub(crate) fn state(&self) -> WatchState {
        match self.state.load(Ordering::SeqCst) {
            CREATED => WatchState::Created,
            ACTIVE => WatchState::Active,
            _ => WatchState::Stopped,
        }
    }

    /// Release the subscription and the context reference
    ///
    /// Each resource sits in an `Option` and is taken under its lock, so it
    /// is released exactly once no matter how many threads get here.
    pub(crate) fn release(&self) {
        // Dropping the sender wakes an idle delivery thread
        drop(self.stop_tx.lock().take());

        let backend = self.backend.lock().take();
        if let Some(backend) = backend {
            drop(backend);
            debug!("Released subscription for watch {}", self.id);
        }

        let context = self.context.lock().take();
        if let Some(context) = context {
            context.unregister(self.id);
        }
    }

    fn stop(&self) {
        if self.mark_stopped() {
            info!("Stopping watch {} on {}", self.id, self.root.display());
        }
        self.release();

        if in_delivery_context() {
            return;
        }

        // Held across the join so a concurrent stop() also waits for the
        // delivery thread to finish.
        let mut delivery = self.delivery.lock();
        if let Some(thread) = delivery.take() {
            if thread.join().is_err() {
                warn!("Delivery thread for watch {} panicked", self.id);
            }
        }
    }
}

/// Caller-held token for one active watch
///
/// Dropping the handle stops the watch.
pub struct WatchHandle {
    shared: Arc<Shared>,
}

impl WatchHandle {
    /// Subscribe to `root` and start the delivery thread
    pub(crate) fn start<H: EventHandler>(
        root: &Path,
        config: &WatchConfig,
        handler: H,
    ) -> Result<Self> {
        config.validate()?;
        let canonical_root = resolve_root(root)?;

        let filter = PathFilter::load(&canonical_root, config.filter.clone())?;
        let translator = Translator::new(
            canonical_root.clone(),
            root.to_path_buf(),
            filter,
            config.report_directories,
        );

        let (raw_tx, raw_rx) = crossbeam_channel::unbounded();
        let mut backend =
            open_backend(config, raw_tx).map_err(|e| WatchError::subscription(root, e))?;
        backend
            .watch(&canonical_root, config.recursive_mode())
            .map_err(|e| WatchError::subscription(root, e))?;

        let context = WatchContext::acquire();
        let id = context.register(root);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);

        let shared = Arc::new(Shared::new(
            id,
            root,
            Some(backend),
            Arc::clone(&context),
            stop_tx,
        ));

        let delivery = Delivery {
            shared: Arc::clone(&shared),
            context,
            translator,
            raw_rx,
            stop_rx,
            handler,
        };

        let thread = thread::Builder::new()
            .name(format!("fsevents-delivery-{id}"))
            .spawn(move || delivery.run());

        let thread = match thread {
            Ok(thread) => thread,
            Err(err) => {
                shared.mark_stopped();
                shared.release();
                return Err(WatchError::SubscriptionFailed {
                    path: root.to_path_buf(),
                    reason: format!("failed to spawn delivery thread: {err}"),
                });
            }
        };
        *shared.delivery.lock() = Some(thread);

        // A failure may already have stopped the watch; never resurrect it
        let _ = shared
            .state
            .compare_exchange(CREATED, ACTIVE, Ordering::SeqCst, Ordering::SeqCst);

        info!("Watching {} (watch {})", root.display(), id);
        Ok(Self { shared })
    }

    /// Id of this watch, unique among the active watches
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Root as passed to `watch()`
    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    pub fn state(&self) -> WatchState {
        self.shared.state()
    }

    pub fn is_active(&self) -> bool {
        self.state() == WatchState::Active
    }

    /// Stop the watch
    ///
    /// Idempotent and safe from any thread, including from inside the
    /// handler. See the module docs for the in-flight policy.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// A cloneable stop trigger, e.g. to move into the handler
    pub fn stopper(&self) -> Stopper {
        Stopper {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("id", &self.shared.id)
            .field("root", &self.shared.root)
            .field("state", &self.shared.state())
            .finish()
    }
}

/// Stops a watch without owning it
///
/// Unlike `WatchHandle`, dropping a stopper does nothing.
#[derive(Clone)]
pub struct Stopper {
    shared: Arc<Shared>,
}

impl Stopper {
    /// Same semantics as `WatchHandle::stop`
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }
}

impl fmt::Debug for Stopper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopper")
            .field("id", &self.shared.id)
            .finish()
    }
}

/// Check the root and resolve it to the path the backend will report
fn resolve_root(root: &Path) -> Result<PathBuf> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(WatchError::PathNotFound(root.to_path_buf()));
        }
        Err(err) => {
            return Err(WatchError::SubscriptionFailed {
                path: root.to_path_buf(),
                reason: err.to_string(),
            });
        }
    };

    if !metadata.is_dir() {
        return Err(WatchError::NotADirectory(root.to_path_buf()));
    }

    root.canonicalize()
        .map_err(|err| WatchError::SubscriptionFailed {
            path: root.to_path_buf(),
            reason: err.to_string(),
        })
}

/// Create the backend watcher, forwarding raw events into `raw_tx`
fn open_backend(config: &WatchConfig, raw_tx: Sender<RawEvent>) -> notify::Result<BoxedWatcher> {
    let forward = move |result: RawEvent| {
        // Fails only once the delivery thread is gone
        let _ = raw_tx.send(result);
    };

    match config.backend {
        Backend::Native => {
            let watcher = notify::RecommendedWatcher::new(forward, notify::Config::default())?;
            Ok(Box::new(watcher))
        }
        Backend::Poll { .. } => {
            let mut notify_config = notify::Config::default();
            if let Some(interval) = config.backend.poll_interval() {
                notify_config = notify_config.with_poll_interval(interval);
            }
            let watcher = notify::PollWatcher::new(forward, notify_config)?;
            Ok(Box::new(watcher))
        }
    }
}
