//! Sync client facade.
//!
//! [`SyncClient::spawn`] starts an actor task that owns a [`SyncState`], at
//! most one socket and the retry timer. The facade only sends commands and
//! reads published [`Snapshot`]s, so every mutation happens on the actor in
//! the order events arrive.

use std::sync::Arc;

use plank_engine::{
    Collection, ConnectionState, Effect, EventLog, Input, LogEntry, LogKind, NewRecord, RecordId,
    SyncState, Timestamp,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::api::{HttpItemsApi, ItemsApi};
use crate::config::ClientConfig;
use crate::transport::{Transport, WebSocketTransport};

/// Immutable view of the client state, published after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: ConnectionState,
    /// `state == Open`
    pub connected: bool,
    pub items: Collection,
    pub log: Vec<LogEntry>,
}

impl Snapshot {
    fn of(state: &SyncState) -> Self {
        Self {
            state: state.connection_state(),
            connected: state.is_connected(),
            items: state.collection().clone(),
            log: state.log_entries(),
        }
    }
}

enum Command {
    Input(Input),
    Refresh,
    Create(NewRecord),
    Delete(RecordId),
    Shutdown,
}

/// Reported back to the actor by the tasks it spawns.
enum Event {
    /// From the socket task of the given generation
    Socket { generation: u64, input: Input },
    /// From an API call
    Api(Input),
}

/// Handle to a running sync client.
pub struct SyncClient {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl SyncClient {
    /// Start a client with the given collaborators on the current runtime.
    ///
    /// The client starts `Idle`: call [`connect`](Self::connect) and
    /// [`refresh`](Self::refresh) to go live.
    pub fn spawn(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        api: Arc<dyn ItemsApi>,
    ) -> Self {
        let log = match config.log_capacity {
            Some(capacity) => EventLog::bounded(capacity),
            None => EventLog::new(),
        };
        let state = SyncState::with_log(config.table.clone(), config.reconnect, log);

        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::of(&state));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let actor = Actor {
            state,
            ws_url: config.backend.ws_url.clone(),
            transport,
            api,
            events: event_tx,
            socket: None,
            generation: 0,
            retry_at: None,
            publisher: snapshot_tx,
        };

        tracing::info!(
            ws_url = %config.backend.ws_url,
            table = %config.table,
            "Sync client started"
        );

        let task = tokio::spawn(run(actor, command_rx, event_rx));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    /// Start a client with the WebSocket transport and the HTTP items API.
    pub fn spawn_default(config: ClientConfig) -> Self {
        let api = HttpItemsApi::new(config.backend.api_base_url.clone());
        Self::spawn(config, Arc::new(WebSocketTransport::new()), Arc::new(api))
    }

    pub fn connect(&self) {
        self.send(Command::Input(Input::Connect));
    }

    pub fn disconnect(&self) {
        self.send(Command::Input(Input::Disconnect));
    }

    pub fn toggle_connection(&self) {
        self.send(Command::Input(Input::Toggle));
    }

    /// Fetch the full listing and replace the collection with it.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Create an item through the API. The result is reported in the log;
    /// the item itself arrives as a notification.
    pub fn create_item(&self, item: NewRecord) {
        self.send(Command::Create(item));
    }

    /// Delete an item through the API. Same reporting as `create_item`.
    pub fn delete_item(&self, id: RecordId) {
        self.send(Command::Delete(id));
    }

    pub fn clear_log(&self) {
        self.send(Command::Input(Input::ClearLog));
    }

    /// Current state.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.snapshots.borrow().state
    }

    pub fn is_connected(&self) -> bool {
        self.snapshots.borrow().connected
    }

    /// Receiver that is notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Close the socket, stop the actor and wait for it to finish.
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            tracing::warn!("Sync client task ended abnormally: {}", e);
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Sync client already stopped, command dropped");
        }
    }
}

/// The live socket task of the current generation.
struct ActiveSocket {
    generation: u64,
    /// Sending or dropping tells the task to close its socket
    close: oneshot::Sender<()>,
}

struct Actor {
    state: SyncState,
    ws_url: String,
    transport: Arc<dyn Transport>,
    api: Arc<dyn ItemsApi>,
    events: mpsc::UnboundedSender<Event>,
    socket: Option<ActiveSocket>,
    generation: u64,
    retry_at: Option<Instant>,
    publisher: watch::Sender<Snapshot>,
}

async fn run(
    mut actor: Actor,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut events: mpsc::UnboundedReceiver<Event>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => actor.on_command(command),
            },
            Some(event) = events.recv() => actor.on_event(event),
            _ = sleep_until(actor.retry_at) => {
                actor.retry_at = None;
                actor.step(Input::RetryElapsed);
            }
        }
    }

    actor.step(Input::Disconnect);
    tracing::info!("Sync client stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}

impl Actor {
    fn on_command(&mut self, command: Command) {
        match command {
            Command::Input(input) => self.step(input),
            Command::Refresh => self.refresh(),
            Command::Create(item) => self.create(item),
            Command::Delete(id) => self.delete(id),
            Command::Shutdown => {}
        }
    }

    fn on_event(&mut self, event: Event) {
        match event {
            Event::Socket { generation, input } => {
                let current = self.socket.as_ref().map(|s| s.generation);
                if current != Some(generation) {
                    tracing::trace!(generation, "Dropping event from abandoned socket");
                    return;
                }
                if input == Input::Closed {
                    self.socket = None;
                }
                self.step(input);
            }
            Event::Api(input) => self.step(input),
        }
    }

    /// Feed one input to the state, carry out its effects, publish.
    fn step(&mut self, input: Input) {
        let effects = self.state.handle(input, now_millis());
        for effect in effects {
            self.perform(effect);
        }
        self.publisher.send_replace(Snapshot::of(&self.state));
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::OpenSocket => self.open_socket(),
            Effect::CloseSocket => self.close_socket(),
            Effect::ScheduleRetry { attempt, delay } => {
                tracing::info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect"
                );
                self.retry_at = Some(Instant::now() + delay);
            }
            Effect::CancelRetry => {
                if self.retry_at.take().is_some() {
                    tracing::debug!("Pending reconnect cancelled");
                }
            }
            // Consumed by SyncState
            Effect::Log { .. } => {}
        }
    }

    fn open_socket(&mut self) {
        // Single flight: a new socket always replaces the old one
        self.close_socket();

        self.generation += 1;
        let generation = self.generation;
        let (close_tx, close_rx) = oneshot::channel();
        self.socket = Some(ActiveSocket {
            generation,
            close: close_tx,
        });

        tracing::info!(generation, url = %self.ws_url, "Opening WebSocket");
        tokio::spawn(run_socket(
            Arc::clone(&self.transport),
            self.ws_url.clone(),
            generation,
            self.events.clone(),
            close_rx,
        ));
    }

    fn close_socket(&mut self) {
        if let Some(active) = self.socket.take() {
            tracing::info!(generation = active.generation, "Closing WebSocket");
            let _ = active.close.send(());
        }
    }

    fn refresh(&self) {
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let input = match api.list().await {
                Ok(records) => Input::Loaded(records),
                Err(e) => {
                    tracing::warn!("Failed to fetch items: {}", e);
                    Input::LoadFailed(e.to_string())
                }
            };
            let _ = events.send(Event::Api(input));
        });
    }

    fn create(&mut self, item: NewRecord) {
        let item = NewRecord::new(item.name.trim(), item.value);
        if item.name.is_empty() {
            self.step(note(LogKind::Error, "Please enter both name and value"));
            return;
        }

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let input = match api.create(item).await {
                Ok(()) => note(
                    LogKind::Info,
                    "Item created via API (notification will arrive via WebSocket)",
                ),
                Err(e) => note(LogKind::Error, format!("Error creating item: {}", e)),
            };
            let _ = events.send(Event::Api(input));
        });
    }

    fn delete(&self, id: RecordId) {
        let name = self
            .state
            .collection()
            .get(id)
            .map(|r| format!("\"{}\"", r.name))
            .unwrap_or_else(|| format!("#{}", id));

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let input = match api.delete(id).await {
                Ok(()) => note(
                    LogKind::Info,
                    format!(
                        "Item {} deleted (notification will arrive via WebSocket)",
                        name
                    ),
                ),
                Err(e) => note(LogKind::Error, format!("Error deleting item: {}", e)),
            };
            let _ = events.send(Event::Api(input));
        });
    }
}

fn note(kind: LogKind, message: impl Into<String>) -> Input {
    Input::Note {
        kind,
        message: message.into(),
    }
}

/// Connect, forward frames as inputs tagged with `generation`, and close when
/// told to. A close requested by the actor is not reported back.
async fn run_socket(
    transport: Arc<dyn Transport>,
    url: String,
    generation: u64,
    events: mpsc::UnboundedSender<Event>,
    mut close: oneshot::Receiver<()>,
) {
    let report = |input: Input| {
        let _ = events.send(Event::Socket { generation, input });
    };

    let connected = tokio::select! {
        result = transport.connect(&url) => result,
        _ = &mut close => return,
    };

    let mut socket = match connected {
        Ok(socket) => socket,
        Err(e) => {
            tracing::warn!(generation, "WebSocket connect failed: {}", e);
            report(Input::TransportError(e.to_string()));
            report(Input::Closed);
            return;
        }
    };

    report(Input::Opened);

    let closed_by_peer = loop {
        tokio::select! {
            frame = socket.recv() => match frame {
                Some(Ok(text)) => report(Input::Message(text)),
                Some(Err(e)) => {
                    tracing::warn!(generation, "WebSocket error: {}", e);
                    report(Input::TransportError(e.to_string()));
                    break true;
                }
                None => break true,
            },
            _ = &mut close => break false,
        }
    };

    if closed_by_peer {
        tracing::info!(generation, "WebSocket closed by peer");
        report(Input::Closed);
    } else {
        socket.close().await;
    }
}
