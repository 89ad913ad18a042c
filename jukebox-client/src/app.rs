//! Client event loop
//!
//! One task owns the synchronizer, the coordinator and the operator prompt.
//! Connection events and [`AppEvent`]s are handled one at a time, in arrival
//! order. Every network call is spawned; its completion comes back as an
//! [`AppEvent`] and is applied to whatever state is current at that moment.

use crate::api::QueueApi;
use crate::connection::{ConnectionEvent, ConnectionManager, ConnectionState};
use crate::coordinator::{CoordinatorAction, PlaybackCoordinator, RemovalOrigin};
use crate::error::ClientError;
use crate::sync::{QueueSynchronizer, SyncOutcome};
use jukebox_common::events::{ClientMessage, ServerMessage};
use jukebox_common::{QueueItem, SearchResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Search(String),
    /// 1-based index into the last search results
    Add(usize),
    Queue,
    Skip,
    /// Answer to the pending yes/no prompt
    Answer(bool),
    Reconnect,
    Status,
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    Command(OperatorCommand),
    /// The player finished the current item (or the operator simulated it)
    PlayerEnded,
    SnapshotFetched(Result<Vec<QueueItem>, ClientError>),
    RemovalFinished {
        video_id: String,
        origin: RemovalOrigin,
        result: Result<(), ClientError>,
    },
    SearchFinished(Result<Vec<SearchResult>, ClientError>),
    AddFinished {
        song: SearchResult,
        result: Result<(), ClientError>,
    },
}

/// Output for the operator console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Connection(ConnectionState),
    Queue { items: Vec<QueueItem>, cursor: usize },
    Results(Vec<SearchResult>),
    Prompt(String),
    Info(String),
    Error(String),
}

#[derive(Debug)]
enum Prompt {
    Skip,
    Add(SearchResult),
}

pub struct App {
    api: Arc<dyn QueueApi>,
    connection: ConnectionManager,
    synchronizer: QueueSynchronizer,
    coordinator: PlaybackCoordinator,
    results: Vec<SearchResult>,
    prompt: Option<Prompt>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl App {
    pub fn new(
        api: Arc<dyn QueueApi>,
        connection: ConnectionManager,
        coordinator: PlaybackCoordinator,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices, notices_rx) = mpsc::unbounded_channel();

        let app = Self {
            api,
            connection,
            synchronizer: QueueSynchronizer::new(),
            coordinator,
            results: Vec::new(),
            prompt: None,
            events_tx,
            events_rx,
            notices,
        };
        (app, notices_rx)
    }

    /// Sender for operator commands and player callbacks
    pub fn events(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.events_tx.clone()
    }

    pub fn queue(&self) -> &[QueueItem] {
        self.synchronizer.queue()
    }

    pub fn coordinator(&self) -> &PlaybackCoordinator {
        &self.coordinator
    }

    /// Connect and process events until the operator quits
    pub async fn run(mut self, mut connection_events: mpsc::UnboundedReceiver<ConnectionEvent>) {
        self.notify(Notice::Connection(ConnectionState::Connecting));
        self.connection.connect();

        loop {
            tokio::select! {
                Some(event) = connection_events.recv() => self.handle_connection(event),
                Some(event) = self.events_rx.recv() => {
                    if matches!(event, AppEvent::Command(OperatorCommand::Quit)) {
                        info!("Operator quit");
                        break;
                    }
                    self.handle(event);
                }
                else => break,
            }
        }
    }

    /// Handle the next queued [`AppEvent`]; false once the channel is closed
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    pub fn handle_connection(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Established => {
                self.notify(Notice::Connection(ConnectionState::Connected));
                self.sync();
            }
            ConnectionEvent::Message(ServerMessage::QueueUpdated) => {
                debug!("Queue update signal");
                self.sync();
            }
            ConnectionEvent::Lost => {
                self.notify(Notice::Connection(ConnectionState::Disconnected));
            }
        }
    }

    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Command(command) => self.handle_command(command),
            AppEvent::PlayerEnded => self.on_ended(),
            AppEvent::SnapshotFetched(result) => self.apply_snapshot(result),
            AppEvent::RemovalFinished {
                video_id,
                origin,
                result,
            } => self.removal_finished(video_id, origin, result),
            AppEvent::SearchFinished(result) => match result {
                Ok(results) => {
                    self.results = results.clone();
                    self.notify(Notice::Results(results));
                }
                Err(e) => {
                    warn!("Search failed: {}", e);
                    self.notify(Notice::Error(format!("Search failed: {}", e)));
                }
            },
            AppEvent::AddFinished { song, result } => match result {
                Ok(()) => {
                    info!(video_id = %song.video_id, "Song added");
                    self.notify(Notice::Info(format!("Added \"{}\"", song.title)));
                    self.connection.send(&ClientMessage::AddSong { song });
                }
                Err(e) => {
                    error!(video_id = %song.video_id, "Add failed: {}", e);
                    self.notify(Notice::Error(format!("Failed to add \"{}\": {}", song.title, e)));
                }
            },
        }
    }

    fn handle_command(&mut self, command: OperatorCommand) {
        match command {
            OperatorCommand::Search(query) => self.search(query),
            OperatorCommand::Add(n) => self.request_add(n),
            OperatorCommand::Queue => self.show_queue(),
            OperatorCommand::Skip => self.request_skip(),
            OperatorCommand::Answer(yes) => self.answer(yes),
            OperatorCommand::Reconnect => {
                if !self.connection.reconnect() {
                    self.notify(Notice::Info(format!("Push channel is {}", self.connection.state())));
                }
            }
            OperatorCommand::Status => {
                self.notify(Notice::Connection(self.connection.state()));
                self.show_queue();
            }
            OperatorCommand::Quit => {}
        }
    }

    /// Fetch the pending queue; the snapshot is applied when it arrives
    pub fn sync(&self) {
        let api = self.api.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.list_pending().await;
            let _ = events.send(AppEvent::SnapshotFetched(result));
        });
    }

    fn apply_snapshot(&mut self, result: Result<Vec<QueueItem>, ClientError>) {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Queue fetch failed: {}", e);
                self.notify(Notice::Error(format!("Could not load the queue: {}", e)));
                return;
            }
        };

        if self.synchronizer.apply_snapshot(snapshot) == SyncOutcome::Changed {
            self.coordinator.on_queue_changed(self.synchronizer.queue());
            self.show_queue();
        }
    }

    fn on_ended(&mut self) {
        let actions = self.coordinator.on_ended(self.synchronizer.queue());
        self.execute(actions);
    }

    fn request_skip(&mut self) {
        if self.prompt.is_some() {
            self.notify(Notice::Info("Answer the pending question first (y/n)".to_string()));
            return;
        }

        match self.coordinator.request_skip(self.synchronizer.queue()) {
            Ok(item) => {
                let what = item.map_or_else(|| "the current song".to_string(), |i| format!("\"{}\"", i.title));
                self.prompt = Some(Prompt::Skip);
                self.notify(Notice::Prompt(format!("Skip {}? [y/n]", what)));
            }
            Err(reason) => self.notify(Notice::Info(format!("Cannot skip: {}", reason))),
        }
    }

    fn request_add(&mut self, n: usize) {
        if self.prompt.is_some() {
            self.notify(Notice::Info("Answer the pending question first (y/n)".to_string()));
            return;
        }

        let Some(song) = n.checked_sub(1).and_then(|i| self.results.get(i)).cloned() else {
            self.notify(Notice::Error(format!("No search result #{}", n)));
            return;
        };

        self.notify(Notice::Prompt(format!("Add \"{}\" to the queue? [y/n]", song.title)));
        self.prompt = Some(Prompt::Add(song));
    }

    fn answer(&mut self, yes: bool) {
        match self.prompt.take() {
            Some(Prompt::Skip) => {
                let actions = self.coordinator.confirm_skip(yes, self.synchronizer.queue());
                self.execute(actions);
            }
            Some(Prompt::Add(song)) if yes => self.append(song),
            Some(Prompt::Add(_)) => {}
            None => self.notify(Notice::Info("Nothing to confirm".to_string())),
        }
    }

    fn search(&self, query: String) {
        let api = self.api.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.search(&query).await;
            let _ = events.send(AppEvent::SearchFinished(result));
        });
    }

    fn append(&self, song: SearchResult) {
        let api = self.api.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.append(&song).await;
            let _ = events.send(AppEvent::AddFinished { song, result });
        });
    }

    fn execute(&mut self, actions: Vec<CoordinatorAction>) {
        for action in actions {
            match action {
                CoordinatorAction::Remove { video_id, origin } => {
                    let api = self.api.clone();
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let result = api.remove(&video_id).await;
                        let _ = events.send(AppEvent::RemovalFinished {
                            video_id,
                            origin,
                            result,
                        });
                    });
                }
                CoordinatorAction::Notify(message) => self.connection.send(&message),
            }
        }
    }

    fn removal_finished(&mut self, video_id: String, origin: RemovalOrigin, result: Result<(), ClientError>) {
        self.coordinator.removal_finished(&video_id, origin, &result);

        match (&result, origin) {
            (Ok(()), RemovalOrigin::Skip) => self.notify(Notice::Info("Skipped".to_string())),
            (Err(e), _) if !e.is_not_found() => {
                self.notify(Notice::Error(format!("Failed to remove song: {}", e)));
            }
            _ => {}
        }
    }

    fn show_queue(&self) {
        self.notify(Notice::Queue {
            items: self.synchronizer.queue().to_vec(),
            cursor: self.coordinator.cursor(),
        });
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }
}
