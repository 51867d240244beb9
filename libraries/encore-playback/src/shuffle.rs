//! Shuffle sequence
//!
//! A precomputed random permutation of track indices with a traversal
//! cursor. The permutation is regenerated up front (not lazily) so that
//! peeking at the next shuffled track is cheap and stable.

use crate::types::RepeatMode;
use rand::seq::SliceRandom;
use rand::thread_rng;

/// A shuffled ordering of the indices `0..size`, with a cursor
///
/// The cursor is `None` until traversal starts. Mutating traversal moves it
/// exactly one step (or one reshuffle-then-step at a repeat-all boundary);
/// peeks never move it.
#[derive(Debug, Default)]
pub struct ShuffleSequence {
    sequence: Vec<usize>,
    cursor: Option<usize>,
}

impl ShuffleSequence {
    /// An empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Regenerate as a permutation of `0..size`
    ///
    /// When `start_with` is given, that value is moved to the front and the
    /// cursor points at it (the corresponding track is already playing).
    /// Otherwise the cursor resets to the start.
    pub fn resize_and_reshuffle(&mut self, size: usize, start_with: Option<usize>) {
        self.sequence = (0..size).collect();
        self.cursor = None;

        if size > 1 {
            self.sequence.shuffle(&mut thread_rng());
        }

        if let Some(position) =
            start_with.and_then(|value| self.sequence.iter().position(|&v| v == value))
        {
            self.sequence.swap(0, position);
            self.cursor = Some(0);
        }
    }

    /// Regenerate a new permutation of the same size, guaranteeing (when the
    /// sequence holds more than one element) that it does not begin with
    /// `dont_start_with`. Used at a repeat-all boundary so the same track
    /// does not play twice in a row.
    pub fn reshuffle(&mut self, dont_start_with: usize) {
        self.cursor = None;

        if self.sequence.len() <= 1 {
            return;
        }

        self.sequence.shuffle(&mut thread_rng());

        if self.sequence[0] == dont_start_with {
            let last = self.sequence.len() - 1;
            self.sequence.swap(0, last);
        }
    }

    /// Advance and return the next element
    ///
    /// At the end of the sequence with repeat == All, a fresh permutation is
    /// generated first (not starting with the just-finished element) and
    /// traversal continues into it. Otherwise the end yields `None` without
    /// moving the cursor.
    pub fn next(&mut self, repeat_mode: RepeatMode) -> Option<usize> {
        if repeat_mode == RepeatMode::All && self.has_ended() {
            if let Some(&last) = self.sequence.last() {
                self.reshuffle(last);
            }
        }

        if self.has_next() {
            let next = self.cursor.map_or(0, |c| c + 1);
            self.cursor = Some(next);
            self.sequence.get(next).copied()
        } else {
            None
        }
    }

    /// Retreat and return the previous element, or `None` at the start
    pub fn previous(&mut self) -> Option<usize> {
        if self.has_previous() {
            let prev = self.cursor.map(|c| c - 1);
            self.cursor = prev;
            prev.and_then(|p| self.sequence.get(p).copied())
        } else {
            None
        }
    }

    /// The element `next()` would return, without moving the cursor
    ///
    /// At a repeat-all reshuffle boundary the upcoming element does not
    /// exist yet, so this returns `None` even though `next(All)` would
    /// produce a value.
    pub fn peek_next(&self) -> Option<usize> {
        if self.has_next() {
            self.sequence.get(self.cursor.map_or(0, |c| c + 1)).copied()
        } else {
            None
        }
    }

    /// The element `previous()` would return, without moving the cursor
    pub fn peek_previous(&self) -> Option<usize> {
        if self.has_previous() {
            self.cursor.and_then(|c| self.sequence.get(c - 1)).copied()
        } else {
            None
        }
    }

    /// Whether an element follows the cursor
    pub fn has_next(&self) -> bool {
        !self.sequence.is_empty() && self.cursor != Some(self.sequence.len() - 1)
    }

    /// Whether an element precedes the cursor
    pub fn has_previous(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    /// Whether the cursor sits on the final element
    pub fn has_ended(&self) -> bool {
        !self.sequence.is_empty() && self.cursor == Some(self.sequence.len() - 1)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Discard all elements and reset the cursor
    pub fn clear(&mut self) {
        self.sequence.clear();
        self.cursor = None;
    }

    #[cfg(test)]
    pub(crate) fn elements(&self) -> &[usize] {
        &self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_is_permutation(seq: &ShuffleSequence, size: usize) {
        let values: HashSet<usize> = seq.elements().iter().copied().collect();
        assert_eq!(values.len(), size);
        assert!(values.iter().all(|&v| v < size));
    }

    #[test]
    fn resize_produces_permutation() {
        let mut seq = ShuffleSequence::new();
        for size in [0, 1, 2, 10, 100] {
            seq.resize_and_reshuffle(size, None);
            assert_is_permutation(&seq, size);
            assert_eq!(seq.peek_next().is_some(), size > 0);
        }
    }

    #[test]
    fn resize_with_start_puts_value_first() {
        let mut seq = ShuffleSequence::new();
        for _ in 0..50 {
            seq.resize_and_reshuffle(10, Some(7));
            assert_eq!(seq.elements()[0], 7);
            assert_is_permutation(&seq, 10);
            // Cursor sits on the starting value; the first advance yields
            // the second element.
            assert_ne!(seq.peek_next(), Some(7));
        }
    }

    #[test]
    fn reshuffle_avoids_forbidden_first_element() {
        let mut seq = ShuffleSequence::new();
        seq.resize_and_reshuffle(10, None);
        for forbidden in 0..10 {
            for _ in 0..20 {
                seq.reshuffle(forbidden);
                assert_ne!(seq.elements()[0], forbidden);
                assert_is_permutation(&seq, 10);
            }
        }
    }

    #[test]
    fn reshuffle_single_element_keeps_it() {
        let mut seq = ShuffleSequence::new();
        seq.resize_and_reshuffle(1, None);
        seq.reshuffle(0);
        assert_eq!(seq.elements(), &[0]);
    }

    #[test]
    fn traversal_visits_every_element_once() {
        let mut seq = ShuffleSequence::new();
        seq.resize_and_reshuffle(25, None);

        let mut visited = Vec::new();
        while let Some(v) = seq.next(RepeatMode::Off) {
            visited.push(v);
        }

        assert_eq!(visited.len(), 25);
        assert_eq!(
            visited.iter().copied().collect::<HashSet<_>>().len(),
            25
        );
        assert!(seq.has_ended());
        assert_eq!(seq.next(RepeatMode::Off), None);
    }

    #[test]
    fn repeat_all_reshuffles_at_end() {
        let mut seq = ShuffleSequence::new();
        seq.resize_and_reshuffle(10, None);

        let mut first_pass = Vec::new();
        while let Some(v) = seq.next(RepeatMode::Off) {
            first_pass.push(v);
        }
        let last = *first_pass.last().unwrap();

        let restarted = seq.next(RepeatMode::All);
        assert!(restarted.is_some());
        assert_ne!(restarted, Some(last));
        assert_eq!(seq.len(), 10);
    }

    #[test]
    fn peeks_do_not_mutate() {
        let mut seq = ShuffleSequence::new();
        seq.resize_and_reshuffle(10, None);

        let peeked = seq.peek_next();
        assert_eq!(seq.peek_next(), peeked);
        assert_eq!(seq.next(RepeatMode::Off), peeked);

        let peeked_prev = seq.peek_previous();
        assert_eq!(seq.peek_previous(), peeked_prev);
    }

    #[test]
    fn previous_stops_at_start() {
        let mut seq = ShuffleSequence::new();
        seq.resize_and_reshuffle(5, None);

        assert_eq!(seq.previous(), None);

        let first = seq.next(RepeatMode::Off);
        let second = seq.next(RepeatMode::Off);
        assert_ne!(first, second);

        assert_eq!(seq.previous(), first);
        assert_eq!(seq.previous(), None);
        assert_eq!(seq.peek_previous(), None);
    }

    #[test]
    fn clear_resets_everything() {
        let mut seq = ShuffleSequence::new();
        seq.resize_and_reshuffle(5, Some(2));
        seq.clear();

        assert!(seq.is_empty());
        assert_eq!(seq.next(RepeatMode::All), None);
        assert_eq!(seq.peek_next(), None);
        assert!(!seq.has_ended());
    }
}
