//! Playback chains
//!
//! Playback requests (start, stop, track-completed) run through ordered
//! chains of small actions sharing one request context. The framework
//! enforces a single-exit discipline: each request context is marked
//! completed or terminated exactly once, by exactly one action's outcome.
//! Actions that must wait on something asynchronous (a gap timer, a
//! transcode) suspend the chain with an explicit resumption index instead
//! of blocking.

mod completed;
mod start;
mod stop;

pub use completed::TrackPlaybackCompletedChain;
pub use start::StartPlaybackChain;
pub use stop::StopPlaybackChain;

use crate::error::Result;
use crate::types::{PlaybackParams, PlaybackState, Track};
use tracing::warn;

// ===== Request context =====

/// Where a settled playback request ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestStatus {
    Pending,
    Completed,
    Terminated,
}

/// Shared state of one playback request as it moves through a chain
#[derive(Debug, Clone)]
pub struct PlaybackRequestContext {
    /// Player state when the request was made
    pub state_before_change: PlaybackState,

    /// Track that was playing when the request was made
    pub track_before_change: Option<Track>,

    /// Seek position when the request was made, in seconds
    pub seek_position_before_change: f64,

    /// Track this request wants to play (None for stop requests)
    pub requested_track: Option<Track>,

    /// Request parameters
    pub params: PlaybackParams,

    /// Gap/delay in seconds computed for this request, if any
    pub delay: Option<f64>,

    status: RequestStatus,
}

impl PlaybackRequestContext {
    /// Capture the state of the world at request time
    pub fn new(
        state_before_change: PlaybackState,
        track_before_change: Option<Track>,
        seek_position_before_change: f64,
        params: PlaybackParams,
    ) -> Self {
        Self {
            state_before_change,
            track_before_change,
            seek_position_before_change,
            requested_track: None,
            params,
            delay: None,
            status: RequestStatus::Pending,
        }
    }

    /// Whether the requested track differs from the one playing before
    pub fn track_changed(&self) -> bool {
        match (&self.track_before_change, &self.requested_track) {
            (Some(before), Some(requested)) => !before.is_same_file(requested),
            (None, None) => false,
            _ => true,
        }
    }

    /// Mark the request successfully completed (exactly once)
    pub fn complete(&mut self) {
        if self.status == RequestStatus::Pending {
            self.status = RequestStatus::Completed;
        } else {
            warn!(status = ?self.status, "playback request settled more than once");
        }
    }

    /// Mark the request terminated without playback (exactly once)
    pub fn terminate(&mut self) {
        if self.status == RequestStatus::Pending {
            self.status = RequestStatus::Terminated;
        } else {
            warn!(status = ?self.status, "playback request settled more than once");
        }
    }

    /// Whether the request completed successfully
    pub fn is_completed(&self) -> bool {
        self.status == RequestStatus::Completed
    }

    /// Whether the request was terminated without playback
    pub fn is_terminated(&self) -> bool {
        self.status == RequestStatus::Terminated
    }

    /// Whether the request is still in flight (suspended or mid-chain)
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

// ===== Actions =====

/// What an action decided about the request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionOutcome {
    /// Hand the request to the next action in the chain
    Proceed,

    /// The request is done; mark it completed and exit the chain
    Complete,

    /// The request cannot continue; mark it terminated and exit the chain
    Terminate,

    /// Suspend the chain awaiting an asynchronous continuation
    Defer(WaitReason),
}

/// Why a chain suspended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitReason {
    /// A gap of silence is in effect; a timer resumes the chain
    Gap {
        /// Gap length in seconds
        delay: f64,
    },

    /// The requested track is being transcoded; the transcoding-finished
    /// callback resumes the chain
    Transcoding,
}

/// One step of a playback chain
pub trait PlaybackAction: Send {
    /// Examine and update the request, deciding how the chain continues
    fn execute(&mut self, ctx: &mut PlaybackRequestContext) -> Result<ActionOutcome>;
}

// ===== Chain =====

/// How far a chain execution got
#[derive(Debug)]
pub enum ChainProgress {
    /// The chain exited; the context is settled (completed or terminated)
    Done(PlaybackRequestContext),

    /// The chain suspended awaiting an asynchronous continuation
    Suspended(SuspendedRequest),
}

/// A chain execution parked mid-flight
#[derive(Debug)]
pub struct SuspendedRequest {
    /// The in-flight request context
    pub ctx: PlaybackRequestContext,

    /// Index of the action to resume at
    pub resume_at: usize,

    /// Why the chain suspended
    pub reason: WaitReason,
}

/// An ordered sequence of playback actions
#[derive(Default)]
pub struct PlaybackChain {
    actions: Vec<Box<dyn PlaybackAction>>,
}

impl PlaybackChain {
    /// An empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action
    pub fn with_action(mut self, action: Box<dyn PlaybackAction>) -> Self {
        self.actions.push(action);
        self
    }

    /// Run the chain from the beginning
    pub fn execute(&mut self, ctx: PlaybackRequestContext) -> Result<ChainProgress> {
        self.execute_from(0, ctx)
    }

    /// Run the chain starting at `start_index` (resuming a suspended
    /// request)
    pub fn execute_from(
        &mut self,
        start_index: usize,
        mut ctx: PlaybackRequestContext,
    ) -> Result<ChainProgress> {
        for index in start_index..self.actions.len() {
            match self.actions[index].execute(&mut ctx)? {
                ActionOutcome::Proceed => {}
                ActionOutcome::Complete => {
                    ctx.complete();
                    return Ok(ChainProgress::Done(ctx));
                }
                ActionOutcome::Terminate => {
                    ctx.terminate();
                    return Ok(ChainProgress::Done(ctx));
                }
                ActionOutcome::Defer(reason) => {
                    return Ok(ChainProgress::Suspended(SuspendedRequest {
                        ctx,
                        resume_at: index + 1,
                        reason,
                    }));
                }
            }
        }

        // A well-formed chain ends with an action that completes or
        // terminates; running off the end is a wiring bug.
        warn!("playback chain ran past its final action without settling the request");
        ctx.terminate();
        Ok(ChainProgress::Done(ctx))
    }

    /// Number of actions in the chain
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the chain has no actions
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
