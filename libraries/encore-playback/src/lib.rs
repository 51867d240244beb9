//! Encore Player - Playback Orchestration
//!
//! Platform-agnostic playback orchestration for Encore Player.
//!
//! This crate provides:
//! - Shuffle and repeat sequencing (precomputed shuffle permutations)
//! - Chain-of-responsibility playback pipelines (start / stop / completed)
//! - Gaps of silence between tracks, and delayed playback
//! - Transcoding waits for non-natively-playable tracks
//! - Playback sessions (stale async callback detection)
//! - Playback profiles (remembered per-track positions)
//! - Frame-accurate segment computation for gapless/loop scheduling
//!
//! # Architecture
//!
//! `encore-playback` is completely platform-agnostic: audio output and
//! transcoding are consumed through the [`Player`] and [`Transcoder`]
//! traits, so the engine runs identically on any platform (and against
//! mocks in tests). All control flows through [`PlaybackDelegate`], which
//! serializes operations behind a mutex; asynchronous continuations (gap
//! timers, transcode completions) re-enter through the same lock.
//!
//! # Example: Sequencing
//!
//! ```rust
//! use encore_playback::{RepeatMode, Sequencer, ShuffleMode, Track};
//!
//! let tracks = vec![
//!     Track::new("/music/one.mp3", "One", 180.0),
//!     Track::new("/music/two.mp3", "Two", 240.0),
//! ];
//!
//! let mut sequencer = Sequencer::new(tracks, RepeatMode::All, ShuffleMode::Off);
//!
//! let first = sequencer.begin().unwrap();
//! assert_eq!(first.title, "One");
//!
//! // Repeat All wraps around.
//! assert_eq!(sequencer.subsequent().unwrap().title, "Two");
//! assert_eq!(sequencer.subsequent().unwrap().title, "One");
//! ```

mod chain;
mod delegate;
mod error;
mod events;
mod player;
mod profiles;
mod scheduling;
mod sequence;
mod sequencer;
mod session;
mod shuffle;
mod timer;
mod transcoder;
pub mod types;

// Public exports
pub use chain::{
    ActionOutcome, ChainProgress, PlaybackAction, PlaybackChain, PlaybackRequestContext,
    StartPlaybackChain, StopPlaybackChain, SuspendedRequest, TrackPlaybackCompletedChain,
    WaitReason,
};
pub use delegate::PlaybackDelegate;
pub use error::{PlaybackError, Result, TrackFault};
pub use events::{EventBus, PlaybackEvent};
pub use player::{Player, SeekResult};
pub use profiles::{PlaybackProfile, PlaybackProfiles};
pub use scheduling::{compute_segment, AudioFileInfo, PlaybackSegment, SeekPositionTracker};
pub use sequence::PlaybackSequence;
pub use sequencer::Sequencer;
pub use session::{PlaybackSession, SessionTracker};
pub use shuffle::ShuffleSequence;
pub use timer::DelayTimer;
pub use transcoder::Transcoder;
pub use types::{
    GapPosition, PlaybackGap, PlaybackLoop, PlaybackParams, PlaybackPreferences, PlaybackState,
    RememberPositionOption, RepeatMode, SeekLength, SeekMode, ShuffleMode, Track,
};

// Lock acquisition that shrugs off poisoning: playback state stays usable
// even if some holder panicked.
pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn read<T>(rwlock: &std::sync::RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match rwlock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
