//! Error types for playback orchestration

use std::path::PathBuf;
use thiserror::Error;

/// Reason a track cannot be played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum TrackFault {
    /// The underlying file no longer exists
    #[error("file is missing")]
    FileMissing,

    /// The file format is not supported for playback
    #[error("unsupported format")]
    UnsupportedFormat,

    /// The file contains no playable audio
    #[error("no playable audio")]
    NoAudio,
}

/// Playback errors
///
/// Recoverable playback failures (an unplayable track, a failed transcode)
/// are also published on the event bus so observers hear about them; they
/// never panic the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// The requested track failed pre-playback validation
    #[error("track cannot be played ({fault}): {file}")]
    InvalidTrack {
        /// File that failed validation
        file: PathBuf,
        /// Why it failed
        fault: TrackFault,
    },

    /// Transcoding of a non-natively-playable track failed
    #[error("transcoding failed: {0}")]
    TranscodingFailed(PathBuf),

    /// Invalid seek position
    #[error("invalid seek position: {0}")]
    InvalidSeekPosition(f64),

    /// Track index out of bounds
    #[error("track index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// An operation that requires a playing track was invoked without one
    #[error("no track is currently playing")]
    NoPlayingTrack,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
