//! Start playback chain
//!
//! Tears down the outgoing track (profile save, transcode cancellation,
//! halt), validates the incoming one, applies its remembered position, and
//! starts playback. Two gates may suspend the chain: a gap of silence
//! (resumed by the delay timer) and transcoding (resumed by the
//! transcoding-finished callback).

use crate::chain::stop::{
    CancelTranscodingAction, HaltPlaybackAction, PreTrackChangeAction, SavePlaybackProfileAction,
};
use crate::chain::{
    ActionOutcome, ChainProgress, PlaybackAction, PlaybackChain, PlaybackRequestContext,
    WaitReason,
};
use crate::error::{PlaybackError, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::player::Player;
use crate::profiles::PlaybackProfiles;
use crate::sequencer::Sequencer;
use crate::session::SessionTracker;
use crate::transcoder::Transcoder;
use crate::types::{PlaybackPreferences, PlaybackState};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

// ===== Actions =====

/// Rejects requests with no track or an unplayable track
///
/// An unplayable track terminates the chain: the sequence ends, a
/// track-not-played event goes out, and the player (already halted) is
/// left with no track.
struct ValidateTrackAction {
    sequencer: Arc<Mutex<Sequencer>>,
    events: Arc<EventBus>,
}

impl PlaybackAction for ValidateTrackAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        let Some(track) = ctx.requested_track.clone() else {
            warn!("playback requested with no track; ignoring");
            return Ok(ActionOutcome::Terminate);
        };

        if let Some(fault) = track.fault {
            crate::lock(&self.sequencer).end();

            self.events.publish(PlaybackEvent::TrackNotPlayed {
                old_track: ctx.track_before_change.clone(),
                track: track.clone(),
                error: PlaybackError::InvalidTrack {
                    file: track.file.clone(),
                    fault,
                },
            });

            return Ok(ActionOutcome::Terminate);
        }

        Ok(ActionOutcome::Proceed)
    }
}

/// Seeds the start position from the track's playback profile, when
/// preferences call for it and the request didn't specify one
struct ApplyPlaybackProfileAction {
    profiles: Arc<PlaybackProfiles>,
    preferences: Arc<RwLock<PlaybackPreferences>>,
}

impl PlaybackAction for ApplyPlaybackProfileAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        if ctx.params.start_position.is_none()
            && crate::read(&self.preferences).remember_last_position
        {
            if let Some(profile) = ctx
                .requested_track
                .as_ref()
                .and_then(|track| self.profiles.get(track))
            {
                ctx.params.start_position = Some(profile.last_position);
            }
        }

        Ok(ActionOutcome::Proceed)
    }
}

/// Suspends the chain for the duration of a gap of silence
///
/// The player enters the Waiting state, observers learn when the gap ends,
/// and the delay timer resumes the chain.
struct DelayedPlaybackAction {
    player: Arc<dyn Player>,
    events: Arc<EventBus>,
}

impl PlaybackAction for DelayedPlaybackAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        if !ctx.params.allow_delay {
            return Ok(ActionOutcome::Proceed);
        }

        let Some(delay) = ctx.delay.or(ctx.params.delay) else {
            return Ok(ActionOutcome::Proceed);
        };

        self.player.begin_waiting();

        let gap_end_time = Instant::now() + Duration::from_secs_f64(delay.max(0.0));
        self.events.publish(PlaybackEvent::TrackTransition {
            begin_track: ctx.track_before_change.clone(),
            begin_state: ctx.state_before_change,
            end_track: ctx.requested_track.clone(),
            end_state: PlaybackState::Waiting,
            gap_end_time: Some(gap_end_time),
        });

        Ok(ActionOutcome::Defer(WaitReason::Gap { delay }))
    }
}

/// Suspends the chain while the track is transcoded into a playable format
struct AudioFilePreparationAction {
    player: Arc<dyn Player>,
    transcoder: Arc<dyn Transcoder>,
    events: Arc<EventBus>,
}

impl PlaybackAction for AudioFilePreparationAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        let Some(track) = &ctx.requested_track else {
            return Ok(ActionOutcome::Proceed);
        };

        if !track.needs_transcoding {
            return Ok(ActionOutcome::Proceed);
        }

        self.transcoder.transcode_immediately(track);
        self.player.begin_transcoding();

        self.events.publish(PlaybackEvent::TrackTransition {
            begin_track: ctx.track_before_change.clone(),
            begin_state: ctx.state_before_change,
            end_track: ctx.requested_track.clone(),
            end_state: PlaybackState::Transcoding,
            gap_end_time: None,
        });

        Ok(ActionOutcome::Defer(WaitReason::Transcoding))
    }
}

/// Starts a new playback session and hands the track to the player
struct StartPlaybackAction {
    player: Arc<dyn Player>,
    sessions: Arc<SessionTracker>,
    events: Arc<EventBus>,
}

impl PlaybackAction for StartPlaybackAction {
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome> {
        let Some(track) = ctx.requested_track.clone() else {
            return Ok(ActionOutcome::Terminate);
        };

        self.sessions.begin(track.clone());

        let start_position = ctx.params.start_position.unwrap_or(0.0);
        self.player
            .play(&track, start_position, ctx.params.end_position);

        info!(file = ?track.file, start_position, "playback started");

        self.events.publish(PlaybackEvent::TrackTransition {
            begin_track: ctx.track_before_change.clone(),
            begin_state: ctx.state_before_change,
            end_track: Some(track),
            end_state: PlaybackState::Playing,
            gap_end_time: None,
        });

        Ok(ActionOutcome::Complete)
    }
}

// ===== Chain =====

/// The chain that starts playback of a requested track
pub struct StartPlaybackChain {
    chain: PlaybackChain,
}

impl StartPlaybackChain {
    /// Wire up the start chain
    pub fn new(
        player: Arc<dyn Player>,
        sequencer: Arc<Mutex<Sequencer>>,
        sessions: Arc<SessionTracker>,
        profiles: Arc<PlaybackProfiles>,
        transcoder: Arc<dyn Transcoder>,
        preferences: Arc<RwLock<PlaybackPreferences>>,
        events: Arc<EventBus>,
    ) -> Self {
        let chain = PlaybackChain::new()
            .with_action(Box::new(SavePlaybackProfileAction {
                profiles: Arc::clone(&profiles),
                preferences: Arc::clone(&preferences),
            }))
            .with_action(Box::new(CancelTranscodingAction {
                transcoder: Arc::clone(&transcoder),
            }))
            .with_action(Box::new(HaltPlaybackAction {
                player: Arc::clone(&player),
            }))
            .with_action(Box::new(ValidateTrackAction {
                sequencer,
                events: Arc::clone(&events),
            }))
            .with_action(Box::new(PreTrackChangeAction {
                events: Arc::clone(&events),
            }))
            .with_action(Box::new(ApplyPlaybackProfileAction {
                profiles,
                preferences,
            }))
            .with_action(Box::new(DelayedPlaybackAction {
                player: Arc::clone(&player),
                events: Arc::clone(&events),
            }))
            .with_action(Box::new(AudioFilePreparationAction {
                player: Arc::clone(&player),
                transcoder,
                events: Arc::clone(&events),
            }))
            .with_action(Box::new(StartPlaybackAction {
                player,
                sessions,
                events,
            }));

        Self { chain }
    }

    /// Run the start chain from the beginning
    pub fn execute(&mut self, ctx: PlaybackRequestContext) -> Result<ChainProgress> {
        self.chain.execute(ctx)
    }

    /// Resume a suspended start request at the given action index
    pub fn execute_from(
        &mut self,
        start_index: usize,
        ctx: PlaybackRequestContext,
    ) -> Result<ChainProgress> {
        self.chain.execute_from(start_index, ctx)
    }
}
