//! Playback sequence
//!
//! Pure sequencing state machine: given a sequence size, a cursor, and the
//! repeat/shuffle modes, decides which track index plays next/previously.
//! Holds no track data; the [`crate::sequencer::Sequencer`] maps indices to
//! tracks.

use crate::shuffle::ShuffleSequence;
use crate::types::{RepeatMode, ShuffleMode};

/// Sequencing state machine over track indices
///
/// The cursor (`None` = nothing playing yet) always refers to an index in
/// playlist order, regardless of shuffle mode.
#[derive(Debug)]
pub struct PlaybackSequence {
    size: usize,
    cursor: Option<usize>,
    repeat_mode: RepeatMode,
    shuffle_mode: ShuffleMode,
    shuffle_sequence: ShuffleSequence,
}

impl PlaybackSequence {
    /// Create an empty sequence with the given modes
    ///
    /// The invalid (One, On) combination is normalized by turning repeat off.
    pub fn new(repeat_mode: RepeatMode, shuffle_mode: ShuffleMode) -> Self {
        let repeat_mode = if repeat_mode == RepeatMode::One && shuffle_mode == ShuffleMode::On {
            RepeatMode::Off
        } else {
            repeat_mode
        };

        Self {
            size: 0,
            cursor: None,
            repeat_mode,
            shuffle_mode,
            shuffle_sequence: ShuffleSequence::new(),
        }
    }

    // ===== Traversal =====

    /// Advance to the track that plays after the current one completes
    /// naturally, per the active modes, and return its index
    ///
    /// Sequential iteration with repeat off yields `None` once at the end of
    /// the sequence, then restarts from index 0 on the following call.
    pub fn subsequent(&mut self) -> Option<usize> {
        if self.size == 0 {
            return None;
        }

        let value = match (self.repeat_mode, self.shuffle_mode) {
            (RepeatMode::One, _) => Some(self.cursor.unwrap_or(0)),

            (_, ShuffleMode::On) => self.shuffle_sequence.next(self.repeat_mode),

            (RepeatMode::Off, ShuffleMode::Off) => match self.cursor {
                Some(index) if index + 1 < self.size => Some(index + 1),
                Some(_) => None,
                None => Some(0),
            },

            (RepeatMode::All, ShuffleMode::Off) => {
                Some(self.cursor.map_or(0, |index| (index + 1) % self.size))
            }
        };

        // A None result ends the sequence; the next call starts over.
        self.cursor = value;
        value
    }

    /// Retreat to the previous track and return its index
    ///
    /// Retreating never wraps and never ends the sequence: at the first
    /// track this returns `None` and the cursor stays put.
    pub fn previous(&mut self) -> Option<usize> {
        if self.size == 0 {
            return None;
        }

        let value = match self.shuffle_mode {
            ShuffleMode::On => self.shuffle_sequence.previous(),
            ShuffleMode::Off => match self.cursor {
                Some(index) if index > 0 => Some(index - 1),
                _ => None,
            },
        };

        if value.is_some() {
            self.cursor = value;
        }

        value
    }

    /// The index `subsequent()` would return, without mutating any state
    pub fn peek_subsequent(&self) -> Option<usize> {
        if self.size == 0 {
            return None;
        }

        match (self.repeat_mode, self.shuffle_mode) {
            (RepeatMode::One, _) => Some(self.cursor.unwrap_or(0)),

            (_, ShuffleMode::On) => self.shuffle_sequence.peek_next(),

            (RepeatMode::Off, ShuffleMode::Off) => match self.cursor {
                Some(index) if index + 1 < self.size => Some(index + 1),
                Some(_) => None,
                None => Some(0),
            },

            (RepeatMode::All, ShuffleMode::Off) => {
                Some(self.cursor.map_or(0, |index| (index + 1) % self.size))
            }
        }
    }

    /// The index `previous()` would return, without mutating any state
    pub fn peek_previous(&self) -> Option<usize> {
        if self.size == 0 {
            return None;
        }

        match self.shuffle_mode {
            ShuffleMode::On => self.shuffle_sequence.peek_previous(),
            ShuffleMode::Off => match self.cursor {
                Some(index) if index > 0 => Some(index - 1),
                _ => None,
            },
        }
    }

    // ===== Cursor control =====

    /// Resize to `size` tracks; if `with_track_index` is given, the cursor
    /// points there (that track is playing)
    pub fn resize_and_start(&mut self, size: usize, with_track_index: Option<usize>) {
        self.size = size;
        self.cursor = with_track_index.filter(|&index| index < size);

        if self.shuffle_mode == ShuffleMode::On {
            self.shuffle_sequence.resize_and_reshuffle(size, self.cursor);
        }
    }

    /// Jump the cursor to an explicitly selected track
    ///
    /// With shuffle on, a fresh shuffle sequence is generated starting at
    /// the selected track.
    pub fn select(&mut self, index: usize) {
        if index >= self.size {
            return;
        }

        self.cursor = Some(index);

        if self.shuffle_mode == ShuffleMode::On {
            self.shuffle_sequence
                .resize_and_reshuffle(self.size, Some(index));
        }
    }

    /// Reset the cursor to the beginning (nothing playing)
    pub fn start(&mut self) {
        self.cursor = None;

        if self.shuffle_mode == ShuffleMode::On {
            self.shuffle_sequence.resize_and_reshuffle(self.size, None);
        }
    }

    /// End the playback sequence (nothing playing)
    pub fn end(&mut self) {
        self.start();
    }

    /// Remove all tracks
    pub fn clear(&mut self) {
        self.size = 0;
        self.cursor = None;
        self.shuffle_sequence.clear();
    }

    // ===== Modes =====

    /// Set the repeat mode, returning the effective mode pair
    ///
    /// Repeat One is incompatible with shuffle: setting it forces shuffle
    /// off.
    pub fn set_repeat_mode(&mut self, repeat_mode: RepeatMode) -> (RepeatMode, ShuffleMode) {
        self.repeat_mode = repeat_mode;

        if repeat_mode == RepeatMode::One && self.shuffle_mode == ShuffleMode::On {
            self.shuffle_mode = ShuffleMode::Off;
            self.shuffle_sequence.clear();
        }

        self.modes()
    }

    /// Set the shuffle mode, returning the effective mode pair
    ///
    /// Turning shuffle on while repeat is One forces repeat off. Turning it
    /// on generates a fresh shuffle sequence seeded at the playing track.
    pub fn set_shuffle_mode(&mut self, shuffle_mode: ShuffleMode) -> (RepeatMode, ShuffleMode) {
        match (self.shuffle_mode, shuffle_mode) {
            (ShuffleMode::Off, ShuffleMode::On) => {
                if self.repeat_mode == RepeatMode::One {
                    self.repeat_mode = RepeatMode::Off;
                }
                self.shuffle_mode = ShuffleMode::On;
                self.shuffle_sequence.resize_and_reshuffle(self.size, self.cursor);
            }
            (ShuffleMode::On, ShuffleMode::Off) => {
                self.shuffle_mode = ShuffleMode::Off;
                self.shuffle_sequence.clear();
            }
            _ => {}
        }

        self.modes()
    }

    /// Cycle the repeat mode (Off -> One -> All -> Off)
    pub fn toggle_repeat_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        self.set_repeat_mode(self.repeat_mode.toggled())
    }

    /// Flip the shuffle mode
    pub fn toggle_shuffle_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        self.set_shuffle_mode(self.shuffle_mode.toggled())
    }

    /// The active (repeat, shuffle) mode pair
    pub fn modes(&self) -> (RepeatMode, ShuffleMode) {
        (self.repeat_mode, self.shuffle_mode)
    }

    // ===== Accessors =====

    /// Index of the currently playing track, if any
    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of tracks in the sequence
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the sequence holds no tracks
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(size: usize, repeat: RepeatMode, shuffle: ShuffleMode) -> PlaybackSequence {
        let mut seq = PlaybackSequence::new(repeat, shuffle);
        seq.resize_and_start(size, None);
        seq
    }

    // ===== Sequential, repeat off =====

    #[test]
    fn sequential_repeat_off_runs_to_end_then_restarts() {
        let mut seq = sequence(5, RepeatMode::Off, ShuffleMode::Off);
        seq.select(3);

        assert_eq!(seq.subsequent(), Some(4));
        assert_eq!(seq.subsequent(), None);
        assert_eq!(seq.subsequent(), Some(0));
        assert_eq!(seq.subsequent(), Some(1));
        assert_eq!(seq.subsequent(), Some(2));
    }

    #[test]
    fn sequential_repeat_off_from_fresh_start() {
        let mut seq = sequence(3, RepeatMode::Off, ShuffleMode::Off);

        assert_eq!(seq.subsequent(), Some(0));
        assert_eq!(seq.subsequent(), Some(1));
        assert_eq!(seq.subsequent(), Some(2));
        assert_eq!(seq.subsequent(), None);
        assert_eq!(seq.current_index(), None);
    }

    // ===== Sequential, repeat all =====

    #[test]
    fn sequential_repeat_all_wraps_without_nil() {
        let mut seq = sequence(3, RepeatMode::All, ShuffleMode::Off);

        let visited: Vec<_> = (0..9).map(|_| seq.subsequent()).collect();
        let expected: Vec<_> = [0, 1, 2, 0, 1, 2, 0, 1, 2]
            .iter()
            .map(|&i| Some(i))
            .collect();
        assert_eq!(visited, expected);
    }

    // ===== Repeat one =====

    #[test]
    fn repeat_one_sticks_to_current_track() {
        let mut seq = sequence(5, RepeatMode::One, ShuffleMode::Off);
        seq.select(2);

        for _ in 0..10 {
            assert_eq!(seq.peek_subsequent(), Some(2));
            assert_eq!(seq.subsequent(), Some(2));
        }
    }

    #[test]
    fn repeat_one_with_no_playing_track_starts_at_zero() {
        let mut seq = sequence(5, RepeatMode::One, ShuffleMode::Off);
        assert_eq!(seq.peek_subsequent(), Some(0));
        assert_eq!(seq.subsequent(), Some(0));
        assert_eq!(seq.subsequent(), Some(0));
    }

    // ===== Shuffle =====

    #[test]
    fn shuffle_repeat_off_visits_each_track_once_then_ends() {
        let mut seq = sequence(10, RepeatMode::Off, ShuffleMode::On);

        let mut visited = Vec::new();
        while let Some(index) = seq.subsequent() {
            visited.push(index);
        }

        visited.sort_unstable();
        assert_eq!(visited, (0..10).collect::<Vec<_>>());

        // An ended shuffle sequence stays ended with repeat off.
        assert_eq!(seq.subsequent(), None);
        assert_eq!(seq.subsequent(), None);
    }

    #[test]
    fn shuffle_repeat_all_restarts_with_fresh_permutation() {
        let mut seq = sequence(10, RepeatMode::All, ShuffleMode::On);

        let mut first_pass = Vec::new();
        for _ in 0..10 {
            first_pass.push(seq.subsequent());
        }
        assert!(first_pass.iter().all(Option::is_some));
        let last = first_pass[9];

        // The restart happens inside subsequent(); the first element of the
        // new pass never repeats the last element of the old one.
        let restarted = seq.subsequent();
        assert!(restarted.is_some());
        assert_ne!(restarted, last);
    }

    #[test]
    fn shuffle_previous_retraces_traversal() {
        let mut seq = sequence(8, RepeatMode::Off, ShuffleMode::On);

        let a = seq.subsequent();
        let b = seq.subsequent();
        let c = seq.subsequent();
        assert!(a.is_some() && b.is_some() && c.is_some());

        assert_eq!(seq.previous(), b);
        assert_eq!(seq.previous(), a);
        assert_eq!(seq.previous(), None);
    }

    // ===== Peeks =====

    #[test]
    fn peek_matches_subsequent_across_mode_matrix() {
        for repeat in [RepeatMode::Off, RepeatMode::One, RepeatMode::All] {
            for shuffle in [ShuffleMode::Off, ShuffleMode::On] {
                let mut seq = PlaybackSequence::new(RepeatMode::Off, ShuffleMode::Off);
                seq.resize_and_start(6, None);
                seq.set_shuffle_mode(shuffle);
                seq.set_repeat_mode(repeat);

                for _ in 0..6 {
                    let peeked = seq.peek_subsequent();
                    assert_eq!(seq.peek_subsequent(), peeked, "peek must be idempotent");
                    if peeked.is_none() {
                        break;
                    }
                    assert_eq!(seq.subsequent(), peeked);
                }
            }
        }
    }

    #[test]
    fn peek_previous_matches_previous() {
        let mut seq = sequence(5, RepeatMode::Off, ShuffleMode::Off);
        seq.select(3);

        let peeked = seq.peek_previous();
        assert_eq!(peeked, Some(2));
        assert_eq!(seq.previous(), peeked);

        seq.select(0);
        assert_eq!(seq.peek_previous(), None);
        assert_eq!(seq.previous(), None);
        assert_eq!(seq.current_index(), Some(0));
    }

    #[test]
    fn peeks_never_move_the_cursor() {
        let mut seq = sequence(5, RepeatMode::All, ShuffleMode::Off);
        seq.select(2);

        for _ in 0..5 {
            let _ = seq.peek_subsequent();
            let _ = seq.peek_previous();
        }
        assert_eq!(seq.current_index(), Some(2));
    }

    // ===== Modes =====

    #[test]
    fn repeat_one_forces_shuffle_off() {
        let mut seq = sequence(5, RepeatMode::Off, ShuffleMode::On);
        assert_eq!(seq.set_repeat_mode(RepeatMode::One), (RepeatMode::One, ShuffleMode::Off));
    }

    #[test]
    fn shuffle_on_forces_repeat_one_off() {
        let mut seq = sequence(5, RepeatMode::One, ShuffleMode::Off);
        assert_eq!(seq.set_shuffle_mode(ShuffleMode::On), (RepeatMode::Off, ShuffleMode::On));
    }

    #[test]
    fn valid_mode_pairs_are_preserved() {
        for repeat in [RepeatMode::Off, RepeatMode::One, RepeatMode::All] {
            for shuffle in [ShuffleMode::Off, ShuffleMode::On] {
                if repeat == RepeatMode::One && shuffle == ShuffleMode::On {
                    continue;
                }
                let mut seq = sequence(5, RepeatMode::Off, ShuffleMode::Off);
                seq.set_repeat_mode(repeat);
                assert_eq!(seq.set_shuffle_mode(shuffle), (repeat, shuffle));
            }
        }
    }

    #[test]
    fn toggle_cycles() {
        let mut seq = sequence(5, RepeatMode::Off, ShuffleMode::Off);

        assert_eq!(seq.toggle_repeat_mode(), (RepeatMode::One, ShuffleMode::Off));
        assert_eq!(seq.toggle_repeat_mode(), (RepeatMode::All, ShuffleMode::Off));
        assert_eq!(seq.toggle_repeat_mode(), (RepeatMode::Off, ShuffleMode::Off));

        assert_eq!(seq.toggle_shuffle_mode(), (RepeatMode::Off, ShuffleMode::On));
        assert_eq!(seq.toggle_shuffle_mode(), (RepeatMode::Off, ShuffleMode::Off));
    }

    #[test]
    fn constructor_normalizes_invalid_pair() {
        let seq = PlaybackSequence::new(RepeatMode::One, ShuffleMode::On);
        assert_eq!(seq.modes(), (RepeatMode::Off, ShuffleMode::On));
    }

    // ===== Edge cases =====

    #[test]
    fn empty_sequence_yields_nothing() {
        for repeat in [RepeatMode::Off, RepeatMode::One, RepeatMode::All] {
            for shuffle in [ShuffleMode::Off, ShuffleMode::On] {
                let mut seq = PlaybackSequence::new(repeat, shuffle);
                seq.resize_and_start(0, None);

                assert_eq!(seq.subsequent(), None);
                assert_eq!(seq.previous(), None);
                assert_eq!(seq.peek_subsequent(), None);
                assert_eq!(seq.peek_previous(), None);
                assert_eq!(seq.current_index(), None);
            }
        }
    }

    #[test]
    fn single_track_sequence() {
        let mut seq = sequence(1, RepeatMode::All, ShuffleMode::Off);
        assert_eq!(seq.subsequent(), Some(0));
        assert_eq!(seq.subsequent(), Some(0));

        let mut seq = sequence(1, RepeatMode::Off, ShuffleMode::Off);
        assert_eq!(seq.subsequent(), Some(0));
        assert_eq!(seq.subsequent(), None);
    }

    #[test]
    fn resize_and_start_positions_cursor() {
        let mut seq = sequence(5, RepeatMode::Off, ShuffleMode::Off);
        seq.resize_and_start(8, Some(6));
        assert_eq!(seq.current_index(), Some(6));
        assert_eq!(seq.subsequent(), Some(7));

        // Out-of-range start index is ignored.
        seq.resize_and_start(3, Some(9));
        assert_eq!(seq.current_index(), None);
    }

    #[test]
    fn select_out_of_range_is_a_noop() {
        let mut seq = sequence(3, RepeatMode::Off, ShuffleMode::Off);
        seq.select(1);
        seq.select(7);
        assert_eq!(seq.current_index(), Some(1));
    }

    #[test]
    fn end_resets_cursor_but_keeps_size() {
        let mut seq = sequence(4, RepeatMode::Off, ShuffleMode::Off);
        seq.select(2);
        seq.end();

        assert_eq!(seq.current_index(), None);
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.subsequent(), Some(0));
    }
}
