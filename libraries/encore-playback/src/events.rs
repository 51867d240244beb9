//! Playback events
//!
//! Event-based communication for observers of the playback engine (UI,
//! history, media key integration). Events are published synchronously by
//! the delegate and the playback chains; subscribers receive them over
//! `std::sync::mpsc` channels and drain at their own pace.

use crate::error::PlaybackError;
use crate::types::{PlaybackLoop, PlaybackState, Track};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::time::Instant;

/// Events emitted by the playback engine
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// Published just before the playing track changes, so observers can
    /// capture final state of the outgoing track (e.g. bookmark its position)
    PreTrackChange {
        /// Outgoing track, if any
        old_track: Option<Track>,
        /// Player state at the time of the change
        old_state: PlaybackState,
        /// Incoming track (None when playback is stopping)
        new_track: Option<Track>,
    },

    /// A track and/or state transition occurred
    ///
    /// Covers track changes, playback stopping, and entry into the
    /// Waiting/Transcoding states. A transition into `Waiting` carries the
    /// wall-clock time at which the gap ends.
    TrackTransition {
        /// Track before the transition
        begin_track: Option<Track>,
        /// State before the transition
        begin_state: PlaybackState,
        /// Track after the transition
        end_track: Option<Track>,
        /// State after the transition
        end_state: PlaybackState,
        /// When the gap ends (only for transitions into Waiting)
        gap_end_time: Option<Instant>,
    },

    /// A requested track could not be played
    TrackNotPlayed {
        /// Track that was playing when the request was made
        old_track: Option<Track>,
        /// Track that failed to play
        track: Track,
        /// Why it failed
        error: PlaybackError,
    },

    /// The segment loop of the playing track changed
    LoopChanged {
        /// The loop after the change (None when the loop was removed)
        playback_loop: Option<PlaybackLoop>,
    },

    /// A gap definition on a track was added, changed, or removed
    GapUpdated {
        /// The affected track
        track: Track,
    },
}

impl PlaybackEvent {
    /// Whether this is a transition into the Waiting state (a gap started)
    pub fn is_gap_start(&self) -> bool {
        matches!(
            self,
            PlaybackEvent::TrackTransition {
                end_state: PlaybackState::Waiting,
                ..
            }
        )
    }
}

/// Fan-out bus for playback events
///
/// Subscribers that drop their receiver are pruned on the next publish.
#[derive(Default)]
pub struct EventBus {
    senders: Mutex<Vec<Sender<PlaybackEvent>>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = channel();
        self.senders_guard().push(tx);
        rx
    }

    /// Publish an event to all live subscribers
    pub fn publish(&self, event: PlaybackEvent) {
        let mut senders = self.senders_guard();
        senders.retain(|sender| sender.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last publish)
    pub fn subscriber_count(&self) -> usize {
        self.senders_guard().len()
    }

    fn senders_guard(&self) -> std::sync::MutexGuard<'_, Vec<Sender<PlaybackEvent>>> {
        match self.senders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
