//! Frame-accurate segment scheduling
//!
//! Converts second-based playback requests (play from A to B, loop A->B)
//! into exact sample frame ranges, and tracks the seek position in a way
//! that survives the underlying node stopping at a segment boundary.

use serde::{Deserialize, Serialize};

/// Sample-level description of an audio file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFileInfo {
    /// Sample rate in Hz
    pub sample_rate: f64,

    /// Total number of sample frames in the file
    pub total_frames: i64,
}

impl AudioFileInfo {
    /// Duration of the file in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.total_frames as f64 / self.sample_rate
        } else {
            0.0
        }
    }
}

/// An exact frame range scheduled for playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSegment {
    /// First frame to play (inclusive)
    pub first_frame: i64,

    /// Last frame to play (inclusive)
    pub last_frame: i64,

    /// Number of frames in the segment (always >= 1)
    pub frame_count: i64,

    /// Segment start in seconds
    pub start_time: f64,

    /// Segment end in seconds
    pub end_time: f64,
}

/// Compute the frame range for playing `start_time..end_time` of a file
///
/// The end time is exclusive at the frame level: the last scheduled frame
/// is the one just before `end_time`, clamped to the file's final frame.
/// When `start_frame` is given (loop-boundary scheduling, where the frame
/// is already known exactly), it overrides the conversion of `start_time`.
///
/// Returns `None` for degenerate input: negative times, `end <= start`, or
/// a file with no frames.
pub fn compute_segment(
    info: AudioFileInfo,
    start_time: f64,
    end_time: Option<f64>,
    start_frame: Option<i64>,
) -> Option<PlaybackSegment> {
    if info.sample_rate <= 0.0 || info.total_frames <= 0 {
        return None;
    }

    if start_time < 0.0 {
        return None;
    }

    let end_time = end_time.unwrap_or_else(|| info.duration());
    if end_time < 0.0 || end_time <= start_time {
        return None;
    }

    let mut first_frame =
        start_frame.unwrap_or_else(|| (start_time * info.sample_rate).round() as i64);

    let last_frame = ((end_time * info.sample_rate).round() as i64 - 1)
        .min(info.total_frames - 1)
        .max(0);

    // Schedule at least one frame, pulling the first frame back if the
    // requested window is narrower than a single frame.
    if first_frame > last_frame {
        first_frame = last_frame;
    }
    if first_frame < 0 {
        first_frame = 0;
    }

    Some(PlaybackSegment {
        first_frame,
        last_frame,
        frame_count: last_frame - first_frame + 1,
        start_time,
        end_time,
    })
}

/// Caches the seek position across node stops
///
/// When a scheduled segment ends (e.g. at a loop boundary), the underlying
/// node stops and its own sample time resets to 0. Reading the position
/// through this tracker keeps reporting the last real position instead.
#[derive(Debug, Default)]
pub struct SeekPositionTracker {
    sample_rate: f64,
    start_frame: i64,
    cached_position: f64,
}

impl SeekPositionTracker {
    /// A tracker with no segment scheduled (position 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin tracking a newly scheduled segment
    pub fn begin_segment(&mut self, segment: &PlaybackSegment, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.start_frame = segment.first_frame;
        self.cached_position = segment.start_time;
    }

    /// Update from the number of frames the node has rendered since the
    /// segment started; returns the new position in seconds
    pub fn update(&mut self, rendered_frames: i64) -> f64 {
        if self.sample_rate > 0.0 {
            self.cached_position = (self.start_frame + rendered_frames) as f64 / self.sample_rate;
        }
        self.cached_position
    }

    /// The last known position, in seconds
    ///
    /// Safe to call when the node is stopped; returns the cached value.
    pub fn position(&self) -> f64 {
        self.cached_position
    }

    /// Forget the current segment (playback stopped)
    pub fn reset(&mut self) {
        self.sample_rate = 0.0;
        self.start_frame = 0;
        self.cached_position = 0.0;
    }
}
