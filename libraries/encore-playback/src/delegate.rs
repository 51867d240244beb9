//! Playback delegate
//!
//! The facade through which all playback control flows. Serializes control
//! operations behind a mutex: UI commands, track-completion callbacks, and
//! gap-timer expirations all re-enter through the same lock, so chain
//! executions never interleave.

use crate::chain::{
    ChainProgress, PlaybackRequestContext, StartPlaybackChain, StopPlaybackChain,
    SuspendedRequest, TrackPlaybackCompletedChain, WaitReason,
};
use crate::error::{PlaybackError, Result};
use crate::events::{EventBus, PlaybackEvent};
use crate::player::Player;
use crate::profiles::PlaybackProfiles;
use crate::sequencer::Sequencer;
use crate::session::{PlaybackSession, SessionTracker};
use crate::timer::DelayTimer;
use crate::transcoder::Transcoder;
use crate::types::{
    GapPosition, PlaybackGap, PlaybackLoop, PlaybackParams, PlaybackPreferences, PlaybackState,
    RememberPositionOption, RepeatMode, SeekMode, ShuffleMode, Track,
};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;
use tracing::{debug, warn};

/// A suspended start request plus the timer generation that may resume it
struct PendingRequest {
    suspended: SuspendedRequest,
    /// Set for gap waits; None for transcoding waits
    timer_generation: Option<u64>,
}

/// Playback control facade
///
/// Constructed behind `Arc<Mutex<_>>` (see [`PlaybackDelegate::new`]) so
/// that gap-timer threads can re-enter it safely.
pub struct PlaybackDelegate {
    player: Arc<dyn Player>,
    sequencer: Arc<Mutex<Sequencer>>,
    sessions: Arc<SessionTracker>,
    profiles: Arc<PlaybackProfiles>,
    preferences: Arc<RwLock<PlaybackPreferences>>,
    events: Arc<EventBus>,

    start_chain: StartPlaybackChain,
    stop_chain: StopPlaybackChain,
    completed_chain: TrackPlaybackCompletedChain,

    timer: DelayTimer,
    pending: Option<PendingRequest>,

    self_ref: Weak<Mutex<PlaybackDelegate>>,
}

impl PlaybackDelegate {
    /// Build the delegate and its chains around the given platform pieces
    pub fn new(
        player: Arc<dyn Player>,
        sequencer: Arc<Mutex<Sequencer>>,
        transcoder: Arc<dyn Transcoder>,
        preferences: PlaybackPreferences,
    ) -> Arc<Mutex<Self>> {
        let preferences = Arc::new(RwLock::new(preferences));
        let sessions = Arc::new(SessionTracker::new());
        let profiles = Arc::new(PlaybackProfiles::new());
        let events = Arc::new(EventBus::new());

        let start_chain = StartPlaybackChain::new(
            Arc::clone(&player),
            Arc::clone(&sequencer),
            Arc::clone(&sessions),
            Arc::clone(&profiles),
            Arc::clone(&transcoder),
            Arc::clone(&preferences),
            Arc::clone(&events),
        );

        let stop_chain = StopPlaybackChain::new(
            Arc::clone(&player),
            Arc::clone(&sequencer),
            Arc::clone(&sessions),
            Arc::clone(&profiles),
            Arc::clone(&transcoder),
            Arc::clone(&preferences),
            Arc::clone(&events),
        );

        let completed_chain =
            TrackPlaybackCompletedChain::new(Arc::clone(&sequencer), Arc::clone(&preferences));

        Arc::new_cyclic(|self_ref| {
            Mutex::new(Self {
                player,
                sequencer,
                sessions,
                profiles,
                preferences,
                events,
                start_chain,
                stop_chain,
                completed_chain,
                timer: DelayTimer::new(),
                pending: None,
                self_ref: self_ref.clone(),
            })
        })
    }

    // ===== Accessors =====

    /// The event bus (subscribe here for playback events)
    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    /// The playback profile store
    pub fn profiles(&self) -> Arc<PlaybackProfiles> {
        Arc::clone(&self.profiles)
    }

    /// The live preferences
    pub fn preferences(&self) -> Arc<RwLock<PlaybackPreferences>> {
        Arc::clone(&self.preferences)
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.player.state()
    }

    /// The track currently playing or paused, if any
    pub fn playing_track(&self) -> Option<Track> {
        if self.player.state().is_playing_or_paused() {
            self.sessions.current().map(|session| session.track)
        } else {
            None
        }
    }

    /// The track a gap is counting down toward, if any
    pub fn waiting_track(&self) -> Option<Track> {
        self.pending_track_for(|reason| matches!(reason, WaitReason::Gap { .. }))
    }

    /// The track currently being transcoded before playback, if any
    pub fn transcoding_track(&self) -> Option<Track> {
        self.pending_track_for(|reason| matches!(reason, WaitReason::Transcoding))
    }

    /// The active playback session, if any
    ///
    /// Platform completion callbacks capture this when playback starts and
    /// hand it back to [`Self::track_playback_completed`].
    pub fn current_session(&self) -> Option<PlaybackSession> {
        self.sessions.current()
    }

    /// Current seek position, in seconds
    pub fn seek_position(&self) -> f64 {
        self.player.seek_position()
    }

    /// The active segment loop, if any
    pub fn playback_loop(&self) -> Option<PlaybackLoop> {
        self.player.playback_loop()
    }

    fn pending_track_for(&self, matches_reason: impl Fn(&WaitReason) -> bool) -> Option<Track> {
        self.pending
            .as_ref()
            .filter(|pending| matches_reason(&pending.suspended.reason))
            .and_then(|pending| pending.suspended.ctx.requested_track.clone())
    }

    /// The track the delegate considers current, regardless of state
    fn current_track(&self) -> Option<Track> {
        match self.player.state() {
            PlaybackState::Playing | PlaybackState::Paused => {
                self.sessions.current().map(|session| session.track)
            }
            PlaybackState::Waiting | PlaybackState::Transcoding => self
                .pending
                .as_ref()
                .and_then(|pending| pending.suspended.ctx.requested_track.clone()),
            PlaybackState::NoTrack => None,
        }
    }

    // ===== Playback control =====

    /// Play/pause toggle: begins playback, pauses, resumes, or skips a gap,
    /// depending on the current state
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.player.state() {
            PlaybackState::NoTrack => self.begin_playback(),
            PlaybackState::Playing => {
                self.player.pause();
                Ok(())
            }
            PlaybackState::Paused => {
                self.player.resume();
                Ok(())
            }
            // Toggling during a gap skips the rest of the wait.
            PlaybackState::Waiting => self.play_immediately(),
            PlaybackState::Transcoding => Ok(()),
        }
    }

    /// Skip to the next track; a no-op when nothing is loaded or the
    /// sequence has no next track
    pub fn next_track(&mut self) -> Result<()> {
        if self.player.state() != PlaybackState::NoTrack {
            self.do_play(Sequencer::next, PlaybackParams::default())?;
        }
        Ok(())
    }

    /// Skip to the previous track; a no-op at the start of the sequence
    pub fn previous_track(&mut self) -> Result<()> {
        if self.player.state() != PlaybackState::NoTrack {
            self.do_play(Sequencer::previous, PlaybackParams::default())?;
        }
        Ok(())
    }

    /// Play the track at the given playlist index
    pub fn play_index(&mut self, index: usize, params: PlaybackParams) -> Result<()> {
        if index >= crate::lock(&self.sequencer).len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }
        self.do_play(move |sequencer| sequencer.select_index(index), params)
    }

    /// Play the given track (looked up by file path)
    pub fn play_track(&mut self, track: &Track, params: PlaybackParams) -> Result<()> {
        let track = track.clone();
        self.do_play(move |sequencer| sequencer.select_track(&track), params)
    }

    /// Stop playback
    pub fn stop(&mut self) -> Result<()> {
        if self.player.state() == PlaybackState::NoTrack && self.pending.is_none() {
            return Ok(());
        }
        self.do_stop()
    }

    fn begin_playback(&mut self) -> Result<()> {
        self.do_play(Sequencer::begin, PlaybackParams::default())
    }

    /// The shared playback path: capture before-state, pick the track,
    /// and run the start chain
    fn do_play<F>(&mut self, select: F, params: PlaybackParams) -> Result<()>
    where
        F: FnOnce(&mut Sequencer) -> Option<Track>,
    {
        let state_before = self.player.state();
        let track_before = self.current_track();
        let seek_before = self.player.seek_position();

        let ok_to_play = params.interrupt_playback || track_before.is_none();
        if !ok_to_play {
            return Ok(());
        }

        let requested = select(&mut *crate::lock(&self.sequencer));
        let Some(track) = requested else {
            return Ok(());
        };

        // A new request supersedes any wait in progress.
        self.cancel_pending_wait();

        let mut ctx = PlaybackRequestContext::new(state_before, track_before, seek_before, params);
        ctx.requested_track = Some(track);

        let progress = self.start_chain.execute(ctx)?;
        self.handle_progress(progress);
        Ok(())
    }

    fn do_stop(&mut self) -> Result<()> {
        let state_before = self.player.state();
        let track_before = self.current_track();
        let seek_before = self.player.seek_position();

        self.cancel_pending_wait();

        let ctx = PlaybackRequestContext::new(
            state_before,
            track_before,
            seek_before,
            PlaybackParams::default(),
        );

        let progress = self.stop_chain.execute(ctx)?;
        self.handle_progress(progress);
        Ok(())
    }

    // ===== Async continuations =====

    /// Called by the player when a track finishes playing naturally
    ///
    /// A session that is no longer current (the user already moved on) is
    /// discarded, except that the completed track's profile is still reset
    /// to position 0 per preferences.
    pub fn track_playback_completed(&mut self, session: &PlaybackSession) -> Result<()> {
        if !self.sessions.is_current(session) {
            warn!(id = session.id, "ignoring completion of a stale playback session");
            self.save_profile_if_needed(&session.track, Some(0.0));
            return Ok(());
        }

        let ctx = PlaybackRequestContext::new(
            self.player.state(),
            Some(session.track.clone()),
            self.player.seek_position(),
            PlaybackParams::default(),
        );

        let progress =
            self.completed_chain
                .execute(ctx, &mut self.start_chain, &mut self.stop_chain)?;
        self.handle_progress(progress);
        Ok(())
    }

    /// Called by the transcoder when a transcode finishes
    ///
    /// Resumes the suspended start request when the finished track is the
    /// one being waited on; otherwise ignored.
    pub fn transcoding_finished(&mut self, track: &Track, success: bool) -> Result<()> {
        let applies = self.pending.as_ref().is_some_and(|pending| {
            pending.timer_generation.is_none()
                && pending
                    .suspended
                    .ctx
                    .requested_track
                    .as_ref()
                    .is_some_and(|requested| requested.is_same_file(track))
        });

        if !applies {
            debug!(file = ?track.file, "ignoring transcoding result with no waiting request");
            return Ok(());
        }

        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        if success {
            let progress = self
                .start_chain
                .execute_from(pending.suspended.resume_at, pending.suspended.ctx)?;
            self.handle_progress(progress);
        } else {
            let mut ctx = pending.suspended.ctx;

            self.player.stop();
            crate::lock(&self.sequencer).end();
            self.sessions.end();

            self.events.publish(PlaybackEvent::TrackNotPlayed {
                old_track: ctx.track_before_change.clone(),
                track: track.clone(),
                error: PlaybackError::TranscodingFailed(track.file.clone()),
            });

            ctx.terminate();
        }

        Ok(())
    }

    /// Timer callback: the gap before the next track has elapsed
    fn gap_expired(&mut self, generation: u64) {
        let applies = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.timer_generation == Some(generation));

        if !applies {
            debug!(generation, "ignoring expired gap timer with no waiting request");
            return;
        }

        let Some(pending) = self.pending.take() else {
            return;
        };

        match self
            .start_chain
            .execute_from(pending.suspended.resume_at, pending.suspended.ctx)
        {
            Ok(progress) => self.handle_progress(progress),
            Err(error) => warn!(%error, "resuming playback after a gap failed"),
        }
    }

    /// Skip the remainder of a gap and play the waiting track now
    fn play_immediately(&mut self) -> Result<()> {
        self.timer.cancel();

        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        let progress = self
            .start_chain
            .execute_from(pending.suspended.resume_at, pending.suspended.ctx)?;
        self.handle_progress(progress);
        Ok(())
    }

    fn handle_progress(&mut self, progress: ChainProgress) {
        match progress {
            ChainProgress::Done(_) => {}
            ChainProgress::Suspended(suspended) => match suspended.reason {
                WaitReason::Gap { delay } => {
                    let weak = self.self_ref.clone();
                    let generation = self.timer.schedule(
                        Duration::from_secs_f64(delay.max(0.0)),
                        move |generation| {
                            if let Some(delegate) = weak.upgrade() {
                                crate::lock(&delegate).gap_expired(generation);
                            }
                        },
                    );

                    self.pending = Some(PendingRequest {
                        suspended,
                        timer_generation: Some(generation),
                    });
                }
                WaitReason::Transcoding => {
                    self.pending = Some(PendingRequest {
                        suspended,
                        timer_generation: None,
                    });
                }
            },
        }
    }

    fn cancel_pending_wait(&mut self) {
        self.timer.cancel();
        self.pending = None;
    }

    // ===== Seeking =====

    /// Seek backward by the primary seek length
    pub fn seek_backward(&mut self, mode: SeekMode) -> Result<()> {
        let length = self.primary_seek_length(mode);
        self.do_attempt_seek(-length)
    }

    /// Seek forward by the primary seek length
    pub fn seek_forward(&mut self, mode: SeekMode) -> Result<()> {
        let length = self.primary_seek_length(mode);
        self.do_attempt_seek(length)
    }

    /// Seek backward by the secondary (coarse) seek length
    pub fn seek_backward_secondary(&mut self) -> Result<()> {
        let length = self.secondary_seek_length();
        self.do_attempt_seek(-length)
    }

    /// Seek forward by the secondary (coarse) seek length
    pub fn seek_forward_secondary(&mut self) -> Result<()> {
        let length = self.secondary_seek_length();
        self.do_attempt_seek(length)
    }

    /// Jump to an exact position in the playing track
    pub fn seek_to_time(&mut self, position: f64) -> Result<()> {
        let Some(track) = self.playing_track() else {
            return Err(PlaybackError::NoPlayingTrack);
        };

        if !(0.0..=track.duration).contains(&position) {
            return Err(PlaybackError::InvalidSeekPosition(position));
        }

        let result = self.player.force_seek(&track, position);
        self.after_seek(result)
    }

    /// Jump to a percentage of the playing track's duration
    pub fn seek_to_percentage(&mut self, percentage: f64) -> Result<()> {
        let Some(track) = self.playing_track() else {
            return Err(PlaybackError::NoPlayingTrack);
        };

        let position = track.duration * percentage.clamp(0.0, 100.0) / 100.0;
        let result = self.player.force_seek(&track, position);
        self.after_seek(result)
    }

    /// Restart the playing track from the beginning, resuming if paused
    pub fn replay(&mut self) -> Result<()> {
        if !self.player.state().is_playing_or_paused() {
            return Ok(());
        }

        self.seek_to_time(0.0)?;
        self.resume_if_paused();
        Ok(())
    }

    /// Resume when paused; otherwise a no-op
    pub fn resume_if_paused(&self) {
        if self.player.state() == PlaybackState::Paused {
            self.player.resume();
        }
    }

    fn do_attempt_seek(&mut self, delta: f64) -> Result<()> {
        if !self.player.state().is_playing_or_paused() {
            return Ok(());
        }
        let Some(track) = self.playing_track() else {
            return Ok(());
        };

        let target = self.player.seek_position() + delta;
        let result = self.player.attempt_seek(&track, target);
        self.after_seek(result)
    }

    fn after_seek(&mut self, result: crate::player::SeekResult) -> Result<()> {
        if result.loop_removed {
            self.events.publish(PlaybackEvent::LoopChanged {
                playback_loop: None,
            });
        }

        // Seeking past the end completes the track.
        if result.track_completed {
            if let Some(session) = self.sessions.current() {
                self.track_playback_completed(&session)?;
            }
        }

        Ok(())
    }

    fn primary_seek_length(&self, mode: SeekMode) -> f64 {
        let prefs = crate::read(&self.preferences);
        match mode {
            SeekMode::Continuous => prefs.continuous_seek_interval,
            SeekMode::Discrete => {
                let duration = self.playing_track().map_or(0.0, |t| t.duration);
                prefs.primary_seek_length.seconds(duration)
            }
        }
    }

    fn secondary_seek_length(&self) -> f64 {
        let duration = self.playing_track().map_or(0.0, |t| t.duration);
        crate::read(&self.preferences)
            .secondary_seek_length
            .seconds(duration)
    }

    // ===== Looping =====

    /// Advance the loop definition state (start -> complete -> remove)
    pub fn toggle_loop(&mut self) -> Option<PlaybackLoop> {
        if !self.player.state().is_playing_or_paused() {
            return None;
        }

        let playback_loop = self.player.toggle_loop();
        self.events.publish(PlaybackEvent::LoopChanged { playback_loop });
        playback_loop
    }

    /// Define a complete A->B loop in one call
    pub fn define_loop(&mut self, start_time: f64, end_time: f64) {
        if !self.player.state().is_playing_or_paused() {
            return;
        }

        self.player.define_loop(start_time, end_time);
        self.events.publish(PlaybackEvent::LoopChanged {
            playback_loop: self.player.playback_loop(),
        });
    }

    // ===== Modes =====

    /// Set the repeat mode, returning the effective mode pair
    pub fn set_repeat_mode(&mut self, repeat_mode: RepeatMode) -> (RepeatMode, ShuffleMode) {
        crate::lock(&self.sequencer).set_repeat_mode(repeat_mode)
    }

    /// Set the shuffle mode, returning the effective mode pair
    pub fn set_shuffle_mode(&mut self, shuffle_mode: ShuffleMode) -> (RepeatMode, ShuffleMode) {
        crate::lock(&self.sequencer).set_shuffle_mode(shuffle_mode)
    }

    /// Cycle the repeat mode
    pub fn toggle_repeat_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        crate::lock(&self.sequencer).toggle_repeat_mode()
    }

    /// Flip the shuffle mode
    pub fn toggle_shuffle_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        crate::lock(&self.sequencer).toggle_shuffle_mode()
    }

    // ===== Playlist changes =====

    /// Tracks were appended to the playlist
    pub fn tracks_added(&mut self, tracks: Vec<Track>) {
        crate::lock(&self.sequencer).tracks_added(tracks);
    }

    /// Tracks were removed from the playlist; stops playback if the
    /// playing track was among them
    pub fn tracks_removed(&mut self, indices: &[usize]) -> Result<()> {
        let playing_track_removed = crate::lock(&self.sequencer).tracks_removed(indices);
        if playing_track_removed {
            self.do_stop()?;
        }
        Ok(())
    }

    /// The playlist was reordered
    pub fn playlist_reordered(&mut self, tracks: Vec<Track>) {
        crate::lock(&self.sequencer).playlist_reordered(tracks);
    }

    /// The playlist was cleared; stops playback if a track was playing
    pub fn playlist_cleared(&mut self) -> Result<()> {
        let was_playing = crate::lock(&self.sequencer).playlist_cleared();
        if was_playing || self.pending.is_some() {
            self.do_stop()?;
        }
        Ok(())
    }

    // ===== Gaps =====

    /// Define a gap of silence around a track
    pub fn set_gap(&mut self, track: &Track, gap: PlaybackGap) {
        crate::lock(&self.sequencer).set_gap(track, gap);
        self.events.publish(PlaybackEvent::GapUpdated {
            track: track.clone(),
        });
    }

    /// Remove the gap at the given position of a track
    pub fn remove_gap(&mut self, track: &Track, position: GapPosition) {
        crate::lock(&self.sequencer).remove_gap(track, position);
        self.events.publish(PlaybackEvent::GapUpdated {
            track: track.clone(),
        });
    }

    // ===== Profiles =====

    /// Explicitly save the playing track's position as its profile
    pub fn save_profile(&self) -> Result<()> {
        let track = self.playing_track().ok_or(PlaybackError::NoPlayingTrack)?;
        self.profiles.add(&track, self.player.seek_position());
        Ok(())
    }

    /// Delete the playing track's profile
    pub fn delete_profile(&self) -> Result<()> {
        let track = self.playing_track().ok_or(PlaybackError::NoPlayingTrack)?;
        self.profiles.remove(&track);
        Ok(())
    }

    /// Application is exiting: remember the playing track's position per
    /// preferences
    pub fn on_exit(&self) {
        if let Some(track) = self.playing_track() {
            self.save_profile_if_needed(&track, None);
        }
    }

    fn save_profile_if_needed(&self, track: &Track, position: Option<f64>) {
        let prefs = crate::read(&self.preferences);

        let save = prefs.remember_last_position
            && (prefs.remember_last_position_for == RememberPositionOption::AllTracks
                || self.profiles.has_for(track));

        if save {
            let position = position.unwrap_or_else(|| self.player.seek_position());
            let position = if position >= track.duration { 0.0 } else { position };
            self.profiles.add(track, position);
        }
    }
}
