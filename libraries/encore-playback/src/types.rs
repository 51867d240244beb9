//! Core types for playback orchestration

use crate::error::TrackFault;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A playable track
///
/// Identity is the file path: two tracks referring to the same file are the
/// same track as far as sequencing, gaps, and profiles are concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// File path (track identity)
    pub file: PathBuf,

    /// Display title
    pub title: String,

    /// Duration in seconds
    pub duration: f64,

    /// Set when the file cannot be played (validation failed)
    pub fault: Option<TrackFault>,

    /// Whether the file must be transcoded before it can be played natively
    pub needs_transcoding: bool,
}

impl Track {
    /// Create a playable track
    pub fn new(file: impl Into<PathBuf>, title: impl Into<String>, duration: f64) -> Self {
        Self {
            file: file.into(),
            title: title.into(),
            duration,
            fault: None,
            needs_transcoding: false,
        }
    }

    /// Whether the track passed validation
    pub fn is_playable(&self) -> bool {
        self.fault.is_none()
    }

    /// Whether two tracks refer to the same file
    pub fn is_same_file(&self, other: &Track) -> bool {
        self.file == other.file
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track loaded
    NoTrack,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Waiting out a gap before the next track starts
    Waiting,

    /// Transcoding the next track before playback can start
    Transcoding,
}

impl PlaybackState {
    /// Whether a track is loaded and either audible or paused
    pub fn is_playing_or_paused(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop when the sequence ends
    Off,

    /// Loop the current track only
    One,

    /// Loop the entire sequence
    All,
}

impl RepeatMode {
    /// Next mode in the toggle cycle: Off -> One -> All -> Off
    pub fn toggled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }
}

/// Shuffle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShuffleMode {
    /// Tracks play in sequence order
    Off,

    /// Tracks play in a precomputed random permutation
    On,
}

impl ShuffleMode {
    /// The opposite mode
    pub fn toggled(self) -> Self {
        match self {
            ShuffleMode::Off => ShuffleMode::On,
            ShuffleMode::On => ShuffleMode::Off,
        }
    }
}

/// Where a gap of silence is anchored relative to its track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapPosition {
    /// Before the track starts
    BeforeTrack,

    /// After the track completes
    AfterTrack,
}

/// A gap of silence around a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackGap {
    /// Gap length in seconds
    pub duration: f64,

    /// Anchor relative to the track
    pub position: GapPosition,

    /// One-time gaps are consumed the first time they take effect
    pub persistent: bool,
}

impl PlaybackGap {
    /// A persistent gap
    pub fn new(duration: f64, position: GapPosition) -> Self {
        Self {
            duration,
            position,
            persistent: true,
        }
    }

    /// A gap that is removed after it takes effect once
    pub fn one_time(duration: f64, position: GapPosition) -> Self {
        Self {
            duration,
            position,
            persistent: false,
        }
    }
}

/// An A->B segment loop within a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackLoop {
    /// Loop start time in seconds
    pub start_time: f64,

    /// Loop end time in seconds (None while the loop is still being defined)
    pub end_time: Option<f64>,
}

impl PlaybackLoop {
    /// Start defining a loop at the given time
    pub fn starting_at(start_time: f64) -> Self {
        Self {
            start_time,
            end_time: None,
        }
    }

    /// Whether both endpoints have been defined
    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    /// Whether the given time falls inside the loop
    pub fn contains(&self, time: f64) -> bool {
        match self.end_time {
            Some(end) => time >= self.start_time && time <= end,
            None => time >= self.start_time,
        }
    }
}

/// Parameters for a single playback request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParams {
    /// Start playback at this position (seconds)
    pub start_position: Option<f64>,

    /// Stop playback at this position (seconds)
    pub end_position: Option<f64>,

    /// Whether a gap/delay may precede this playback
    pub allow_delay: bool,

    /// An explicitly requested delay (seconds) before playback starts
    pub delay: Option<f64>,

    /// Whether this request may interrupt a currently playing track
    pub interrupt_playback: bool,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            start_position: None,
            end_position: None,
            allow_delay: true,
            delay: None,
            interrupt_playback: true,
        }
    }
}

impl PlaybackParams {
    /// Start at the given position
    pub fn with_start_position(mut self, start_position: f64) -> Self {
        self.start_position = Some(start_position);
        self
    }

    /// Play only the given segment
    pub fn with_start_and_end_position(mut self, start_position: f64, end_position: f64) -> Self {
        self.start_position = Some(start_position);
        self.end_position = Some(end_position);
        self
    }

    /// Allow or forbid a gap/delay before playback
    pub fn with_allow_delay(mut self, allow_delay: bool) -> Self {
        self.allow_delay = allow_delay;
        self
    }

    /// Request an explicit delay before playback
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Allow or forbid interrupting the currently playing track
    pub fn with_interrupt_playback(mut self, interrupt_playback: bool) -> Self {
        self.interrupt_playback = interrupt_playback;
        self
    }
}

/// Which tracks get their last playback position remembered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RememberPositionOption {
    /// Every track
    AllTracks,

    /// Only tracks that already have a playback profile
    IndividualTracks,
}

/// A seek length preference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SeekLength {
    /// A fixed number of seconds
    Constant(u32),

    /// A percentage of the playing track's duration
    Percentage(u32),
}

impl SeekLength {
    /// Resolve to seconds for a track of the given duration
    pub fn seconds(self, track_duration: f64) -> f64 {
        match self {
            SeekLength::Constant(secs) => f64::from(secs),
            SeekLength::Percentage(pct) => track_duration * f64::from(pct) / 100.0,
        }
    }
}

/// How a seek command was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// A one-off key press or button click
    Discrete,

    /// A held key / dragged slider producing a stream of seeks
    Continuous,
}

/// User preferences governing playback behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackPreferences {
    /// Whether to remember the last playback position of tracks
    pub remember_last_position: bool,

    /// Which tracks get their position remembered
    pub remember_last_position_for: RememberPositionOption,

    /// Seek length for the primary seek commands
    pub primary_seek_length: SeekLength,

    /// Seek length for the secondary (coarse) seek commands
    pub secondary_seek_length: SeekLength,

    /// Seek length in seconds for continuous seeking
    pub continuous_seek_interval: f64,

    /// Whether an implicit gap applies between all tracks
    pub gap_between_tracks: bool,

    /// Length of the implicit inter-track gap, in seconds
    pub gap_between_tracks_duration: u32,
}

impl Default for PlaybackPreferences {
    fn default() -> Self {
        Self {
            remember_last_position: false,
            remember_last_position_for: RememberPositionOption::IndividualTracks,
            primary_seek_length: SeekLength::Constant(5),
            secondary_seek_length: SeekLength::Constant(30),
            continuous_seek_interval: 0.5,
            gap_between_tracks: false,
            gap_between_tracks_duration: 5,
        }
    }
}
