//! Playback coordinator
//!
//! Owns the cursor into the synchronized queue, the skip guard and the player
//! handle. It never owns the queue itself: every entry point takes the current
//! replica from the synchronizer, and side effects that need the network come
//! back as [`CoordinatorAction`]s for the driver to execute.
//!
//! **Advance rules:**
//! - Natural end: remove the finished item, step forward if a next item exists,
//!   otherwise hold the cursor where it is.
//! - Operator skip: confirmed first, then step forward wrapping to 0, then remove
//!   the item that was current before the step.
//!
//! A removal failure never rolls the cursor back; the next sync re-derives what
//! is actually left in the store.

use crate::error::ClientError;
use jukebox_common::config::PlaybackCapability;
use jukebox_common::events::ClientMessage;
use jukebox_common::QueueItem;
use tracing::{debug, info, warn};

/// Handle to a live media player
pub trait MediaPlayer: Send {
    /// Replace the loaded item and start it
    fn load(&mut self, video_id: &str);

    fn loaded_id(&self) -> Option<&str>;
}

/// Creates the player the first time there is something to play
pub trait PlayerFactory: Send {
    fn create(&mut self, video_id: &str) -> Box<dyn MediaPlayer>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOrigin {
    AutoAdvance,
    Skip,
}

/// Side effect requested by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorAction {
    /// Remove this id from the shared store
    Remove { video_id: String, origin: RemovalOrigin },
    /// Send an advisory message to peers
    Notify(ClientMessage),
}

/// Skip guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipState {
    Ready,
    /// Waiting for the operator's yes/no
    Confirming,
    /// Cursor already moved; removal of `video_id` in flight
    Removing { video_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipRejection {
    /// Another skip holds the guard
    InProgress,
    EmptyQueue,
}

impl std::fmt::Display for SkipRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipRejection::InProgress => write!(f, "a skip is already in progress"),
            SkipRejection::EmptyQueue => write!(f, "the queue is empty"),
        }
    }
}

/// Externally visible coordinator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No player, capability absent, or cursor out of range
    Idle,
    Loaded { cursor: usize, video_id: String },
    /// Skip guard held
    Skipping,
}

pub struct PlaybackCoordinator {
    cursor: usize,
    skip: SkipState,
    /// `None` when the playback capability is absent
    factory: Option<Box<dyn PlayerFactory>>,
    player: Option<Box<dyn MediaPlayer>>,
}

impl PlaybackCoordinator {
    pub fn new(capability: PlaybackCapability, factory: Box<dyn PlayerFactory>) -> Self {
        let factory = if capability.is_present() {
            Some(factory)
        } else {
            info!("Playback capability absent, no player will be created");
            None
        };

        Self {
            cursor: 0,
            skip: SkipState::Ready,
            factory,
            player: None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn skip_state(&self) -> &SkipState {
        &self.skip
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn current<'q>(&self, queue: &'q [QueueItem]) -> Option<&'q QueueItem> {
        queue.get(self.cursor)
    }

    pub fn phase(&self, queue: &[QueueItem]) -> PlaybackPhase {
        if self.skip != SkipState::Ready {
            return PlaybackPhase::Skipping;
        }

        let loaded = self.player.as_ref().and_then(|p| p.loaded_id());
        match (self.current(queue), loaded) {
            (Some(item), Some(id)) if item.id == id => PlaybackPhase::Loaded {
                cursor: self.cursor,
                video_id: item.id.clone(),
            },
            _ => PlaybackPhase::Idle,
        }
    }

    /// The synchronizer adopted a structurally different queue
    pub fn on_queue_changed(&mut self, queue: &[QueueItem]) {
        self.refresh_player(queue);
    }

    /// The player reported a natural end of the current item
    pub fn on_ended(&mut self, queue: &[QueueItem]) -> Vec<CoordinatorAction> {
        // With the cursor out of range the player may still hold the last item
        let finished = self
            .current(queue)
            .map(|item| item.id.clone())
            .or_else(|| self.player.as_ref().and_then(|p| p.loaded_id()).map(str::to_string));

        let Some(finished) = finished else {
            debug!(cursor = self.cursor, "Ended with nothing current");
            return Vec::new();
        };

        if self.cursor + 1 < queue.len() {
            self.cursor += 1;
            info!(video_id = %finished, cursor = self.cursor, "Finished, advancing");
        } else {
            info!(video_id = %finished, cursor = self.cursor, "Finished last item, holding position");
        }
        self.refresh_player(queue);

        vec![
            CoordinatorAction::Remove {
                video_id: finished.clone(),
                origin: RemovalOrigin::AutoAdvance,
            },
            CoordinatorAction::Notify(ClientMessage::SongRemoved { video_id: finished }),
        ]
    }

    /// Take the skip guard and return the item the operator must confirm
    ///
    /// `Ok(None)` means the queue is non-empty but the cursor points past it.
    pub fn request_skip(&mut self, queue: &[QueueItem]) -> Result<Option<QueueItem>, SkipRejection> {
        if self.skip != SkipState::Ready {
            debug!(state = ?self.skip, "Skip rejected, guard held");
            return Err(SkipRejection::InProgress);
        }
        if queue.is_empty() {
            return Err(SkipRejection::EmptyQueue);
        }

        self.skip = SkipState::Confirming;
        Ok(self.current(queue).cloned())
    }

    /// Operator answered the skip confirmation
    pub fn confirm_skip(&mut self, confirmed: bool, queue: &[QueueItem]) -> Vec<CoordinatorAction> {
        if self.skip != SkipState::Confirming {
            warn!(state = ?self.skip, "Skip confirmation without a pending request");
            return Vec::new();
        }

        if !confirmed {
            info!("Skip declined");
            self.skip = SkipState::Ready;
            return Vec::new();
        }

        if queue.is_empty() {
            debug!("Queue emptied while confirming skip");
            self.skip = SkipState::Ready;
            return Vec::new();
        }

        let original = self.current(queue).map(|item| item.id.clone());
        let next = self.cursor + 1;
        self.cursor = if next < queue.len() { next } else { 0 };
        info!(cursor = self.cursor, "Skip confirmed");
        self.refresh_player(queue);

        match original {
            Some(video_id) => {
                self.skip = SkipState::Removing { video_id: video_id.clone() };
                vec![CoordinatorAction::Remove {
                    video_id,
                    origin: RemovalOrigin::Skip,
                }]
            }
            None => {
                self.skip = SkipState::Ready;
                Vec::new()
            }
        }
    }

    /// A removal requested by [`Self::on_ended`] or [`Self::confirm_skip`] resolved
    pub fn removal_finished(
        &mut self,
        video_id: &str,
        origin: RemovalOrigin,
        result: &Result<(), ClientError>,
    ) {
        match result {
            Ok(()) => debug!(video_id = %video_id, ?origin, "Removal confirmed"),
            Err(e) if e.is_not_found() => {
                debug!(video_id = %video_id, ?origin, "Already removed by a peer")
            }
            Err(e) => warn!(video_id = %video_id, ?origin, "Removal failed, keeping cursor: {}", e),
        }

        if origin == RemovalOrigin::Skip {
            match &self.skip {
                SkipState::Removing { video_id: pending } if pending == video_id => {
                    self.skip = SkipState::Ready;
                }
                other => warn!(state = ?other, video_id = %video_id, "Unexpected skip removal result"),
            }
        }
    }

    /// Make the player match `queue[cursor]`, creating it on first use
    fn refresh_player(&mut self, queue: &[QueueItem]) {
        let Some(factory) = self.factory.as_mut() else {
            return;
        };

        let Some(item) = queue.get(self.cursor) else {
            debug!(cursor = self.cursor, len = queue.len(), "Cursor out of range, nothing to load");
            return;
        };

        match self.player.as_mut() {
            None => {
                info!(video_id = %item.id, title = %item.title, cursor = self.cursor, "Creating player");
                self.player = Some(factory.create(&item.id));
            }
            Some(player) if player.loaded_id() != Some(item.id.as_str()) => {
                info!(video_id = %item.id, title = %item.title, cursor = self.cursor, "Loading item");
                player.load(&item.id);
            }
            Some(_) => {}
        }
    }
}
