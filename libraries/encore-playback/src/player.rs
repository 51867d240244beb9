//! Player contract
//!
//! The engine drives an audio player through this trait; the actual sample
//! scheduling lives in platform code (or in tests, a mock). Implementations
//! use interior mutability: the player is shared between the delegate, the
//! playback chains, and timer threads.

use crate::types::{PlaybackLoop, PlaybackState, Track};

/// Outcome of a seek operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekResult {
    /// Where playback actually ended up after clamping
    pub actual_position: f64,

    /// Whether the seek invalidated (and removed) a segment loop
    pub loop_removed: bool,

    /// Whether the seek ran past the end of the track, completing it
    pub track_completed: bool,
}

/// Platform audio player driven by the playback engine
pub trait Player: Send + Sync {
    /// Start playing a track at `start_position` seconds, optionally
    /// stopping at `end_position` (segment playback)
    fn play(&self, track: &Track, start_position: f64, end_position: Option<f64>);

    /// Pause the playing track
    fn pause(&self);

    /// Resume the paused track
    fn resume(&self);

    /// Stop playback entirely (state becomes NoTrack)
    fn stop(&self);

    /// Enter the Waiting state (a gap before the next track is in effect)
    fn begin_waiting(&self);

    /// Enter the Transcoding state (the next track is being transcoded)
    fn begin_transcoding(&self);

    /// Current playback state
    fn state(&self) -> PlaybackState;

    /// Current seek position in seconds
    ///
    /// Must remain meaningful when the underlying node has just stopped at
    /// a segment boundary (see `SeekPositionTracker`).
    fn seek_position(&self) -> f64;

    /// Seek within the track, clamping to track bounds and to any defined
    /// loop. A seek at or past the track's duration completes the track
    /// (`track_completed` set) rather than playing silence.
    fn attempt_seek(&self, track: &Track, position: f64) -> SeekResult;

    /// Seek within the track, clamping only to track bounds. A target
    /// outside the active loop removes the loop (`loop_removed` set).
    fn force_seek(&self, track: &Track, position: f64) -> SeekResult;

    /// Define a complete A->B loop in one call
    fn define_loop(&self, start_time: f64, end_time: f64);

    /// Advance the loop definition state: no loop -> loop started at the
    /// current position -> loop completed at the current position -> loop
    /// removed. Returns the loop after the change.
    fn toggle_loop(&self) -> Option<PlaybackLoop>;

    /// The active loop, if any
    fn playback_loop(&self) -> Option<PlaybackLoop>;
}
