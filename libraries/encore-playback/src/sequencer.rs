//! Sequencer
//!
//! Owns the playlist view (the ordered track list), the
//! [`PlaybackSequence`] that traverses it, and per-track gap definitions.
//! Playlist mutations are reported here so the sequence cursor stays in
//! sync with the playing track.

use crate::sequence::PlaybackSequence;
use crate::types::{GapPosition, PlaybackGap, RepeatMode, ShuffleMode, Track};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Track list + playback sequence + gap definitions
#[derive(Debug)]
pub struct Sequencer {
    tracks: Vec<Track>,
    sequence: PlaybackSequence,
    gaps_before: HashMap<PathBuf, PlaybackGap>,
    gaps_after: HashMap<PathBuf, PlaybackGap>,
}

impl Sequencer {
    /// Create a sequencer over the given tracks
    pub fn new(tracks: Vec<Track>, repeat_mode: RepeatMode, shuffle_mode: ShuffleMode) -> Self {
        let mut sequence = PlaybackSequence::new(repeat_mode, shuffle_mode);
        sequence.resize_and_start(tracks.len(), None);

        Self {
            tracks,
            sequence,
            gaps_before: HashMap::new(),
            gaps_after: HashMap::new(),
        }
    }

    // ===== Traversal =====

    /// Start a new playback sequence from the beginning and return the
    /// first track to play
    pub fn begin(&mut self) -> Option<Track> {
        self.sequence.start();
        self.subsequent()
    }

    /// The track that plays after the current one completes naturally
    pub fn subsequent(&mut self) -> Option<Track> {
        let index = self.sequence.subsequent();
        self.track_at(index)
    }

    /// Skip forward (user action)
    ///
    /// Unlike natural completion, a user skip at the end of the sequence is
    /// a no-op: the current track keeps playing.
    pub fn next(&mut self) -> Option<Track> {
        if self.sequence.peek_subsequent().is_some() {
            self.subsequent()
        } else {
            None
        }
    }

    /// Skip backward (user action); a no-op at the first track
    pub fn previous(&mut self) -> Option<Track> {
        let index = self.sequence.previous();
        self.track_at(index)
    }

    /// The track `subsequent()` would produce, without advancing
    pub fn peek_subsequent(&self) -> Option<&Track> {
        self.sequence
            .peek_subsequent()
            .and_then(|index| self.tracks.get(index))
    }

    /// The track `previous()` would produce, without retreating
    pub fn peek_previous(&self) -> Option<&Track> {
        self.sequence
            .peek_previous()
            .and_then(|index| self.tracks.get(index))
    }

    /// Select a track by playlist index
    pub fn select_index(&mut self, index: usize) -> Option<Track> {
        let track = self.tracks.get(index).cloned()?;
        self.sequence.select(index);
        Some(track)
    }

    /// Select a track by identity (file path)
    pub fn select_track(&mut self, track: &Track) -> Option<Track> {
        let index = self.tracks.iter().position(|t| t.is_same_file(track))?;
        self.select_index(index)
    }

    /// The currently playing track, if any
    pub fn current_track(&self) -> Option<&Track> {
        self.sequence
            .current_index()
            .and_then(|index| self.tracks.get(index))
    }

    /// End the playback sequence (nothing playing)
    pub fn end(&mut self) {
        self.sequence.end();
    }

    fn track_at(&self, index: Option<usize>) -> Option<Track> {
        index.and_then(|i| self.tracks.get(i)).cloned()
    }

    // ===== Modes =====

    /// Set the repeat mode, returning the effective mode pair
    pub fn set_repeat_mode(&mut self, repeat_mode: RepeatMode) -> (RepeatMode, ShuffleMode) {
        self.sequence.set_repeat_mode(repeat_mode)
    }

    /// Set the shuffle mode, returning the effective mode pair
    pub fn set_shuffle_mode(&mut self, shuffle_mode: ShuffleMode) -> (RepeatMode, ShuffleMode) {
        self.sequence.set_shuffle_mode(shuffle_mode)
    }

    /// Cycle the repeat mode
    pub fn toggle_repeat_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        self.sequence.toggle_repeat_mode()
    }

    /// Flip the shuffle mode
    pub fn toggle_shuffle_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        self.sequence.toggle_shuffle_mode()
    }

    /// The active (repeat, shuffle) mode pair
    pub fn modes(&self) -> (RepeatMode, ShuffleMode) {
        self.sequence.modes()
    }

    // ===== Playlist mutations =====

    /// Append tracks to the playlist
    pub fn tracks_added(&mut self, new_tracks: Vec<Track>) {
        if new_tracks.is_empty() {
            return;
        }

        let playing_index = self.sequence.current_index();
        self.tracks.extend(new_tracks);
        self.sequence.resize_and_start(self.tracks.len(), playing_index);

        debug!(size = self.tracks.len(), "tracks added to sequence");
    }

    /// Remove the tracks at the given playlist indices
    ///
    /// Returns true if the playing track was among them (the caller is
    /// expected to stop playback).
    pub fn tracks_removed(&mut self, indices: &[usize]) -> bool {
        if indices.is_empty() {
            return false;
        }

        let playing_file = self.current_track().map(|t| t.file.clone());

        let mut sorted: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.tracks.len())
            .collect();
        sorted.sort_unstable();
        sorted.dedup();

        for index in sorted.into_iter().rev() {
            let removed = self.tracks.remove(index);
            self.gaps_before.remove(&removed.file);
            self.gaps_after.remove(&removed.file);
        }

        let new_playing_index = playing_file
            .as_ref()
            .and_then(|file| self.tracks.iter().position(|t| &t.file == file));

        self.sequence.resize_and_start(self.tracks.len(), new_playing_index);

        playing_file.is_some() && new_playing_index.is_none()
    }

    /// Replace the playlist ordering, re-syncing the cursor to the playing
    /// track's new position
    ///
    /// The new list must hold the same tracks; any track that disappears
    /// simply loses its cursor.
    pub fn playlist_reordered(&mut self, tracks: Vec<Track>) {
        let playing_file = self.current_track().map(|t| t.file.clone());
        self.tracks = tracks;

        let playing_index = playing_file
            .and_then(|file| self.tracks.iter().position(|t| t.file == file));

        self.sequence.resize_and_start(self.tracks.len(), playing_index);
    }

    /// Remove all tracks and gap definitions
    ///
    /// Returns true if a track was playing (the caller is expected to stop
    /// playback).
    pub fn playlist_cleared(&mut self) -> bool {
        let was_playing = self.current_track().is_some();

        self.tracks.clear();
        self.gaps_before.clear();
        self.gaps_after.clear();
        self.sequence.clear();

        was_playing
    }

    /// Number of tracks in the playlist
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the playlist is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    // ===== Gaps =====

    /// Define a gap of silence around a track (replacing any existing gap
    /// at the same position)
    pub fn set_gap(&mut self, track: &Track, gap: PlaybackGap) {
        match gap.position {
            GapPosition::BeforeTrack => self.gaps_before.insert(track.file.clone(), gap),
            GapPosition::AfterTrack => self.gaps_after.insert(track.file.clone(), gap),
        };
    }

    /// Remove the gap at the given position of a track
    pub fn remove_gap(&mut self, track: &Track, position: GapPosition) {
        match position {
            GapPosition::BeforeTrack => self.gaps_before.remove(&track.file),
            GapPosition::AfterTrack => self.gaps_after.remove(&track.file),
        };
    }

    /// The gap that plays before the given track, if any
    pub fn gap_before_track(&self, track: &Track) -> Option<&PlaybackGap> {
        self.gaps_before.get(&track.file)
    }

    /// The gap that plays after the given track, if any
    pub fn gap_after_track(&self, track: &Track) -> Option<&PlaybackGap> {
        self.gaps_after.get(&track.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(format!("/music/{i}.mp3"), format!("Track {i}"), 100.0))
            .collect()
    }

    fn sequencer(n: usize) -> Sequencer {
        Sequencer::new(tracks(n), RepeatMode::Off, ShuffleMode::Off)
    }

    #[test]
    fn begin_starts_from_the_first_track() {
        let mut seq = sequencer(3);
        seq.select_index(2);

        let first = seq.begin().unwrap();
        assert_eq!(first.file, PathBuf::from("/music/0.mp3"));
    }

    #[test]
    fn subsequent_walks_the_playlist() {
        let mut seq = sequencer(3);
        let visited: Vec<_> = (0..3).map(|_| seq.subsequent().unwrap().title).collect();
        assert_eq!(visited, vec!["Track 0", "Track 1", "Track 2"]);
        assert_eq!(seq.subsequent(), None);
    }

    #[test]
    fn user_skip_at_end_is_a_noop() {
        let mut seq = sequencer(2);
        seq.select_index(1);

        assert_eq!(seq.next(), None);
        assert_eq!(seq.current_track().unwrap().title, "Track 1");

        seq.select_index(0);
        assert_eq!(seq.previous(), None);
        assert_eq!(seq.current_track().unwrap().title, "Track 0");
    }

    #[test]
    fn select_track_by_file() {
        let mut seq = sequencer(4);
        let wanted = Track::new("/music/2.mp3", "whatever", 1.0);

        let selected = seq.select_track(&wanted).unwrap();
        assert_eq!(selected.title, "Track 2");
        assert_eq!(seq.subsequent().unwrap().title, "Track 3");

        let missing = Track::new("/music/99.mp3", "missing", 1.0);
        assert_eq!(seq.select_track(&missing), None);
    }

    #[test]
    fn tracks_added_keeps_playing_track() {
        let mut seq = sequencer(2);
        seq.select_index(1);

        seq.tracks_added(tracks(4)[2..].to_vec());

        assert_eq!(seq.len(), 4);
        assert_eq!(seq.current_track().unwrap().title, "Track 1");
        assert_eq!(seq.subsequent().unwrap().title, "Track 2");
    }

    #[test]
    fn removing_other_tracks_keeps_cursor_on_playing_track() {
        let mut seq = sequencer(4);
        seq.select_index(2);

        let playing_removed = seq.tracks_removed(&[0]);

        assert!(!playing_removed);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.current_track().unwrap().title, "Track 2");
        assert_eq!(seq.subsequent().unwrap().title, "Track 3");
    }

    #[test]
    fn removing_the_playing_track_reports_it() {
        let mut seq = sequencer(3);
        seq.select_index(1);

        let playing_removed = seq.tracks_removed(&[1]);

        assert!(playing_removed);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.current_track(), None);
    }

    #[test]
    fn reorder_re_syncs_cursor() {
        let mut seq = sequencer(3);
        seq.select_index(0);

        let mut reordered = tracks(3);
        reordered.reverse();
        seq.playlist_reordered(reordered);

        assert_eq!(seq.current_track().unwrap().title, "Track 0");
        // Track 0 now sits at the end of the playlist.
        assert_eq!(seq.subsequent(), None);
    }

    #[test]
    fn clearing_the_playlist_reports_whether_something_was_playing() {
        let mut seq = sequencer(3);
        assert!(!seq.playlist_cleared());

        let mut seq = sequencer(3);
        seq.select_index(1);
        assert!(seq.playlist_cleared());
        assert!(seq.is_empty());
        assert_eq!(seq.subsequent(), None);
    }

    #[test]
    fn gaps_round_trip_and_follow_removal() {
        let mut seq = sequencer(2);
        let track = seq.select_index(0).unwrap();

        seq.set_gap(&track, PlaybackGap::new(3.0, GapPosition::AfterTrack));
        seq.set_gap(&track, PlaybackGap::one_time(2.0, GapPosition::BeforeTrack));

        assert_eq!(seq.gap_after_track(&track).unwrap().duration, 3.0);
        assert!(!seq.gap_before_track(&track).unwrap().persistent);

        seq.remove_gap(&track, GapPosition::AfterTrack);
        assert!(seq.gap_after_track(&track).is_none());

        seq.set_gap(&track, PlaybackGap::new(3.0, GapPosition::AfterTrack));
        seq.tracks_removed(&[0]);
        assert!(seq.gap_after_track(&track).is_none());
        assert!(seq.gap_before_track(&track).is_none());
    }
}
