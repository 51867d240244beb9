//! Stop playback chain
//!
//! Saves the outgoing track's playback profile, cancels any in-flight
//! transcode, halts the player, and ends the playback sequence. The first
//! few actions here are shared with the start chain, which performs the
//! same teardown of the outgoing track before bringing in the new one.

use crate::chain::{
    ActionOutcome, ChainProgress, PlaybackAction, PlaybackChain, PlaybackRequestContext,
};
use crate::error::Result;
use crate::events::{EventBus, PlaybackEvent};
use crate::player::Player;
use crate::profiles::PlaybackProfiles;
use crate::sequencer::Sequencer;
use crate::session::SessionTracker;
use crate::types::{PlaybackPreferences, PlaybackState, RememberPositionOption};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

// ===== Shared actions =====

/// Saves the outgoing track's playback position, per preferences
///
/// A track that played to (or past) its end gets its remembered position
/// reset to 0, so the next playback starts from the beginning.
pub(super) struct SavePlaybackProfileAction {
    pub profiles: Arc<PlaybackProfiles>,
    pub preferences: Arc<RwLock<PlaybackPreferences>>,
}

impl PlaybackAction for SavePlaybackProfileAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        if let Some(track) = &ctx.track_before_change {
            let prefs = crate::read(&self.preferences);

            let save = prefs.remember_last_position
                && (prefs.remember_last_position_for == RememberPositionOption::AllTracks
                    || self.profiles.has_for(track));

            if save {
                let position = if ctx.seek_position_before_change >= track.duration {
                    0.0
                } else {
                    ctx.seek_position_before_change
                };
                self.profiles.add(track, position);
                debug!(file = ?track.file, position, "saved playback profile");
            }
        }

        Ok(ActionOutcome::Proceed)
    }
}

/// Cancels the outgoing track's transcode when it is no longer needed
pub(super) struct CancelTranscodingAction {
    pub transcoder: Arc<dyn crate::transcoder::Transcoder>,
}

impl PlaybackAction for CancelTranscodingAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        if ctx.state_before_change == PlaybackState::Transcoding {
            if let Some(track) = &ctx.track_before_change {
                let still_wanted = ctx
                    .requested_track
                    .as_ref()
                    .is_some_and(|requested| requested.is_same_file(track));

                if !still_wanted {
                    self.transcoder.cancel(track);
                }
            }
        }

        Ok(ActionOutcome::Proceed)
    }
}

/// Publishes the pre-track-change notification when the track is switching,
/// giving observers a last look at the outgoing track
pub(super) struct PreTrackChangeAction {
    pub events: Arc<EventBus>,
}

impl PlaybackAction for PreTrackChangeAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        if ctx.track_changed() {
            self.events.publish(PlaybackEvent::PreTrackChange {
                old_track: ctx.track_before_change.clone(),
                old_state: ctx.state_before_change,
                new_track: ctx.requested_track.clone(),
            });
        }

        Ok(ActionOutcome::Proceed)
    }
}

/// Halts the player in preparation for a track change or stop
pub(super) struct HaltPlaybackAction {
    pub player: Arc<dyn Player>,
}

impl PlaybackAction for HaltPlaybackAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        if ctx.state_before_change != PlaybackState::NoTrack {
            self.player.stop();
        }

        Ok(ActionOutcome::Proceed)
    }
}

// ===== Stop-only actions =====

/// Ends the playback session and sequence, and announces the stop
struct EndPlaybackSequenceAction {
    sessions: Arc<SessionTracker>,
    sequencer: Arc<Mutex<Sequencer>>,
    events: Arc<EventBus>,
}

impl PlaybackAction for EndPlaybackSequenceAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        self.sessions.end();
        crate::lock(&self.sequencer).end();

        info!(track = ?ctx.track_before_change.as_ref().map(|t| &t.file), "playback stopped");

        self.events.publish(PlaybackEvent::TrackTransition {
            begin_track: ctx.track_before_change.clone(),
            begin_state: ctx.state_before_change,
            end_track: None,
            end_state: PlaybackState::NoTrack,
            gap_end_time: None,
        });

        Ok(ActionOutcome::Complete)
    }
}

// ===== Chain =====

/// The chain that stops playback
pub struct StopPlaybackChain {
    chain: PlaybackChain,
}

impl StopPlaybackChain {
    /// Wire up the stop chain
    pub fn new(
        player: Arc<dyn Player>,
        sequencer: Arc<Mutex<Sequencer>>,
        sessions: Arc<SessionTracker>,
        profiles: Arc<PlaybackProfiles>,
        transcoder: Arc<dyn crate::transcoder::Transcoder>,
        preferences: Arc<RwLock<PlaybackPreferences>>,
        events: Arc<EventBus>,
    ) -> Self {
        let chain = PlaybackChain::new()
            .with_action(Box::new(SavePlaybackProfileAction {
                profiles,
                preferences,
            }))
            .with_action(Box::new(CancelTranscodingAction { transcoder }))
            .with_action(Box::new(PreTrackChangeAction {
                events: Arc::clone(&events),
            }))
            .with_action(Box::new(HaltPlaybackAction {
                player,
            }))
            .with_action(Box::new(EndPlaybackSequenceAction {
                sessions,
                sequencer,
                events,
            }));

        Self { chain }
    }

    /// Run the stop chain
    pub fn execute(&mut self, ctx: PlaybackRequestContext) -> Result<ChainProgress> {
        self.chain.execute(ctx)
    }
}
