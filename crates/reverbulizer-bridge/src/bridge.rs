//! The bridge handle and its message thread.
//!
//! One named thread owns the command queue and the broadcast ticker:
//!
//! ```text
//! caller threads                      message thread
//! ──────────────                      ──────────────
//! invoke() ──► bounded queue ──────►  Command::execute(&ParameterStore)
//!                 ▲                         │
//!                 │ oneshot reply ◄─────────┘
//! handle_event() / handle_key() ───►  undo / redo, no reply
//!                                     tick ─► PushEvent ─► every EventSink
//! query() / resource()                (run on the caller, never queued)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use reverbulizer_core::SharedState;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::command::Command;
use crate::config::BridgeConfig;
use crate::endpoint::{Endpoint, Record, Resource};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{EventSink, PushEvent, SinkId};
use crate::ui::{KeyPress, UiEvent};

/// Resolves once the message thread has executed an invoked command.
pub type CommandCompletion = oneshot::Receiver<BridgeResult<Value>>;

/// Shortest broadcast interval the ticker accepts.
const MIN_BROADCAST_INTERVAL: Duration = Duration::from_millis(1);

type Sinks = Arc<Mutex<Vec<(SinkId, Arc<dyn EventSink>)>>>;

enum Job {
    /// A remote call waiting for its completion value.
    Invoke {
        command: Command,
        reply: oneshot::Sender<BridgeResult<Value>>,
    },
    /// A UI event or shortcut. Nobody waits for the result.
    History(Command),
}

impl Job {
    fn reject(self, err: BridgeError) {
        if let Job::Invoke { reply, .. } = self {
            let _ = reply.send(Err(err));
        }
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Telemetry and control bridge between a running processor and a remote UI.
///
/// Dropping the bridge stops its thread.
pub struct Bridge {
    shared: Arc<SharedState>,
    sinks: Sinks,
    next_sink: AtomicU64,
    command_tx: Sender<Job>,
    shutdown_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Bridge {
    /// Spawn the message thread.
    pub fn start(shared: Arc<SharedState>, config: BridgeConfig) -> BridgeResult<Self> {
        let (command_tx, command_rx) = channel::bounded(config.command_capacity);
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);
        let sinks: Sinks = Arc::new(Mutex::new(Vec::new()));
        let interval = config.broadcast_interval.max(MIN_BROADCAST_INTERVAL);

        let service = BridgeService {
            shared: Arc::clone(&shared),
            sinks: Arc::clone(&sinks),
            command_rx,
            shutdown_rx,
            interval,
            targets: Vec::new(),
            dead: Vec::new(),
            broadcasts: 0,
            commands: 0,
        };

        let thread = thread::Builder::new()
            .name(config.thread_name.to_string())
            .spawn(move || service.run())
            .map_err(|err| BridgeError::Spawn(err.to_string()))?;

        log::info!(
            "bridge started ({:?} broadcast interval, {} command slots)",
            interval,
            config.command_capacity
        );

        Ok(Self {
            shared,
            sinks,
            next_sink: AtomicU64::new(0),
            command_tx,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    // =========================================================================
    // Pull
    // =========================================================================

    /// Answer a pull query with the latest published values.
    pub fn query(&self, endpoint: Endpoint) -> BridgeResult<Record> {
        Record::query(&self.shared, endpoint)
    }

    /// Serve a resource path such as `/levels.json`.
    ///
    /// Returns `None` for unknown paths and while the spectrum is
    /// unavailable; the UI polls again on its next frame.
    pub fn resource(&self, path: &str) -> Option<Resource> {
        let endpoint = Endpoint::from_path(path)?;
        match self.query(endpoint) {
            Ok(record) => Resource::json(&record),
            Err(err) => {
                log::trace!("resource {} unavailable: {}", path, err);
                None
            }
        }
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Register a sink for push events.
    pub fn connect<S: EventSink>(&self, sink: S) -> SinkId {
        let id = SinkId(self.next_sink.fetch_add(1, Ordering::Relaxed));
        self.sinks.lock().push((id, Arc::new(sink)));
        log::debug!("sink {:?} connected", id);
        id
    }

    /// Remove a sink. Returns false if it was not connected.
    pub fn disconnect(&self, id: SinkId) -> bool {
        let mut sinks = self.sinks.lock();
        let before = sinks.len();
        sinks.retain(|(sink_id, _)| *sink_id != id);
        before != sinks.len()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Queue a named remote call.
    ///
    /// Parse errors, a full queue and a stopped bridge complete immediately
    /// with the corresponding error.
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> CommandCompletion {
        let (reply, completion) = oneshot::channel();
        match Command::parse(name, &args) {
            Ok(command) => self.enqueue(Job::Invoke { command, reply }),
            Err(err) => {
                log::debug!("rejected command {:?}: {}", name, err);
                let _ = reply.send(Err(err));
            }
        }
        completion
    }

    /// Handle a named UI event. Returns false for unknown names.
    pub fn handle_event(&self, name: &str) -> bool {
        match UiEvent::from_name(name) {
            Some(event) => {
                self.enqueue(Job::History(event.command()));
                true
            }
            None => false,
        }
    }

    /// Handle a key press from the editor. Returns true if it was consumed.
    pub fn handle_key(&self, key: KeyPress) -> bool {
        match key.history_command() {
            Some(command) => {
                self.enqueue(Job::History(command));
                true
            }
            None => false,
        }
    }

    fn enqueue(&self, job: Job) {
        match self.command_tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                log::warn!("bridge command queue is full");
                job.reject(BridgeError::QueueFull);
            }
            Err(TrySendError::Disconnected(job)) => job.reject(BridgeError::Closed),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Stop the message thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("bridge thread panicked");
            }
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("sinks", &self.sinks.lock().len())
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Message thread
// =============================================================================

struct BridgeService {
    shared: Arc<SharedState>,
    sinks: Sinks,
    command_rx: Receiver<Job>,
    shutdown_rx: Receiver<()>,
    interval: Duration,
    /// Sinks of the current broadcast, copied out of `sinks`.
    targets: Vec<(SinkId, Arc<dyn EventSink>)>,
    dead: Vec<SinkId>,
    broadcasts: u64,
    commands: u64,
}

impl BridgeService {
    fn run(mut self) {
        let ticker = channel::tick(self.interval);
        let command_rx = self.command_rx.clone();
        let shutdown_rx = self.shutdown_rx.clone();

        loop {
            crossbeam::select! {
                recv(ticker) -> _ => self.broadcast(),
                recv(command_rx) -> job => match job {
                    Ok(job) => self.execute(job),
                    Err(_) => break,
                },
                recv(shutdown_rx) -> _ => break,
            }
        }

        for job in self.command_rx.try_iter() {
            job.reject(BridgeError::Closed);
        }

        log::info!(
            "bridge stopped after {} broadcasts and {} commands ({} spectrum frames dropped)",
            self.broadcasts,
            self.commands,
            self.shared.telemetry.dropped_spectrum_frames()
        );
    }

    fn broadcast(&mut self) {
        let events = PushEvent::from_telemetry(&self.shared.telemetry.snapshot());

        self.targets.clear();
        self.targets.extend(
            self.sinks
                .lock()
                .iter()
                .map(|(id, sink)| (*id, Arc::clone(sink))),
        );

        for (id, sink) in self.targets.drain(..) {
            if !events.iter().all(|event| sink.emit(event)) {
                log::debug!("sink {:?} disconnected", id);
                self.dead.push(id);
            }
        }

        if !self.dead.is_empty() {
            let dead = &self.dead;
            self.sinks.lock().retain(|(id, _)| !dead.contains(id));
            self.dead.clear();
        }
        self.broadcasts += 1;
    }

    fn execute(&mut self, job: Job) {
        self.commands += 1;
        match job {
            Job::Invoke { command, reply } => {
                let result = command.execute(&self.shared.parameters);
                log::debug!("{:?} -> {:?}", command, result);
                let _ = reply.send(result);
            }
            Job::History(command) => {
                if let Err(err) = command.execute(&self.shared.parameters) {
                    log::warn!("{:?} failed: {}", command, err);
                }
            }
        }
    }
}
