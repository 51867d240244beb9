//! Track-completed chain
//!
//! Runs when a track finishes playing naturally. Determines the subsequent
//! track from the sequencer, computes any gap of silence that applies
//! between the two tracks, and dispatches into the start chain (or the
//! stop chain when the sequence has ended). Implemented as a coordinator
//! over the other two chains rather than a chain of its own; the dispatch
//! decision does not decompose naturally into independent actions.

use crate::chain::{ChainProgress, PlaybackRequestContext, StartPlaybackChain, StopPlaybackChain};
use crate::error::Result;
use crate::sequencer::Sequencer;
use crate::types::{GapPosition, PlaybackPreferences, Track};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Coordinates the response to a naturally completed track
pub struct TrackPlaybackCompletedChain {
    sequencer: Arc<Mutex<Sequencer>>,
    preferences: Arc<RwLock<PlaybackPreferences>>,
}

impl TrackPlaybackCompletedChain {
    /// Create the coordinator
    pub fn new(
        sequencer: Arc<Mutex<Sequencer>>,
        preferences: Arc<RwLock<PlaybackPreferences>>,
    ) -> Self {
        Self {
            sequencer,
            preferences,
        }
    }

    /// Handle a completed track: advance the sequence and start the next
    /// track (with any applicable gap), or stop when nothing follows
    ///
    /// `ctx.track_before_change` holds the track that just completed.
    pub fn execute(
        &mut self,
        mut ctx: PlaybackRequestContext,
        start_chain: &mut StartPlaybackChain,
        stop_chain: &mut StopPlaybackChain,
    ) -> Result<ChainProgress> {
        let subsequent = crate::lock(&self.sequencer).subsequent();
        ctx.requested_track = subsequent.clone();

        match subsequent {
            None => {
                debug!("sequence ended; stopping playback");
                stop_chain.execute(ctx)
            }
            Some(next) => {
                if ctx.params.allow_delay {
                    ctx.delay = self.gap_before_playing(ctx.track_before_change.as_ref(), &next);
                }
                start_chain.execute(ctx)
            }
        }
    }

    /// The gap of silence (in seconds) that applies between the completed
    /// track and the next one, if any
    ///
    /// Precedence: the completed track's after-gap, the next track's
    /// before-gap, the global inter-track gap preference. One-time gaps are
    /// consumed here.
    fn gap_before_playing(&self, completed: Option<&Track>, next: &Track) -> Option<f64> {
        let mut sequencer = crate::lock(&self.sequencer);

        if let Some(completed) = completed {
            if let Some(gap) = sequencer.gap_after_track(completed).copied() {
                if !gap.persistent {
                    sequencer.remove_gap(completed, GapPosition::AfterTrack);
                }
                return Some(gap.duration);
            }
        }

        if let Some(gap) = sequencer.gap_before_track(next).copied() {
            if !gap.persistent {
                sequencer.remove_gap(next, GapPosition::BeforeTrack);
            }
            return Some(gap.duration);
        }

        let prefs = crate::read(&self.preferences);
        prefs
            .gap_between_tracks
            .then(|| f64::from(prefs.gap_between_tracks_duration))
    }
}
