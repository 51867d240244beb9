//! Playback sessions
//!
//! Every time a track starts playing, a new session is created. Async
//! completion callbacks carry the session they were created under, so a
//! callback that arrives after the user has already moved on (a stale
//! session) can be recognized and discarded instead of corrupting the
//! sequence.

use crate::types::Track;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One playback of one track
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    /// Monotonically increasing session id
    pub id: u64,

    /// The track this session plays
    pub track: Track,
}

/// Tracks the currently active playback session
///
/// Thread-safe: completion callbacks compare their session against the
/// current one from timer/render threads.
#[derive(Debug, Default)]
pub struct SessionTracker {
    next_id: AtomicU64,
    current: Mutex<Option<PlaybackSession>>,
}

impl SessionTracker {
    /// Create a tracker with no active session
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session for the given track, ending any previous one
    pub fn begin(&self, track: Track) -> PlaybackSession {
        let session = PlaybackSession {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            track,
        };
        *self.current_guard() = Some(session.clone());
        session
    }

    /// End the active session, if any
    pub fn end(&self) {
        *self.current_guard() = None;
    }

    /// The active session, if any
    pub fn current(&self) -> Option<PlaybackSession> {
        self.current_guard().clone()
    }

    /// Whether the given session is still the active one
    pub fn is_current(&self, session: &PlaybackSession) -> bool {
        self.current_guard()
            .as_ref()
            .is_some_and(|current| current.id == session.id)
    }

    /// Whether any session is active
    pub fn has_session(&self) -> bool {
        self.current_guard().is_some()
    }

    fn current_guard(&self) -> std::sync::MutexGuard<'_, Option<PlaybackSession>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_get_distinct_increasing_ids() {
        let tracker = SessionTracker::new();
        let a = tracker.begin(Track::new("/music/a.mp3", "A", 10.0));
        let b = tracker.begin(Track::new("/music/b.mp3", "B", 10.0));
        assert!(b.id > a.id);
    }

    #[test]
    fn a_new_session_invalidates_the_old_one() {
        let tracker = SessionTracker::new();
        let a = tracker.begin(Track::new("/music/a.mp3", "A", 10.0));
        assert!(tracker.is_current(&a));

        let b = tracker.begin(Track::new("/music/b.mp3", "B", 10.0));
        assert!(!tracker.is_current(&a));
        assert!(tracker.is_current(&b));
    }

    #[test]
    fn ending_leaves_no_current_session() {
        let tracker = SessionTracker::new();
        let a = tracker.begin(Track::new("/music/a.mp3", "A", 10.0));
        tracker.end();

        assert!(!tracker.has_session());
        assert!(!tracker.is_current(&a));
        assert!(tracker.current().is_none());
    }
}
