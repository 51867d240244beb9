//! Transcoder contract
//!
//! Tracks in formats the platform player cannot play natively are handed to
//! a transcoder before playback. Transcoding is asynchronous: the platform
//! reports the outcome back through
//! [`crate::PlaybackDelegate::transcoding_finished`].

use crate::types::Track;

/// Platform transcoding service
pub trait Transcoder: Send + Sync {
    /// Start (or prioritize) transcoding of a track that is about to play
    fn transcode_immediately(&self, track: &Track);

    /// Cancel an in-flight transcode that is no longer needed
    fn cancel(&self, track: &Track);
}
