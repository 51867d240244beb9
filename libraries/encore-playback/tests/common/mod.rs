//! Shared test doubles for integration tests

use encore_playback::{
    PlaybackDelegate, PlaybackEvent, PlaybackLoop, PlaybackPreferences, PlaybackState, Player,
    RepeatMode, SeekResult, Sequencer, ShuffleMode, Track, Transcoder,
};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

// ===== Mock player =====

#[derive(Debug)]
struct PlayerInner {
    state: PlaybackState,
    playing: Option<Track>,
    seek_position: f64,
    playback_loop: Option<PlaybackLoop>,
    play_calls: Vec<(Track, f64, Option<f64>)>,
}

/// In-memory stand-in for a platform audio player
pub struct MockPlayer {
    inner: Mutex<PlayerInner>,
}

impl MockPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(PlayerInner {
                state: PlaybackState::NoTrack,
                playing: None,
                seek_position: 0.0,
                playback_loop: None,
                play_calls: Vec::new(),
            }),
        })
    }

    pub fn play_count(&self) -> usize {
        self.inner.lock().unwrap().play_calls.len()
    }

    pub fn last_play(&self) -> Option<(Track, f64, Option<f64>)> {
        self.inner.lock().unwrap().play_calls.last().cloned()
    }

    pub fn set_seek_position(&self, position: f64) {
        self.inner.lock().unwrap().seek_position = position;
    }
}

impl Player for MockPlayer {
    fn play(&self, track: &Track, start_position: f64, end_position: Option<f64>) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = PlaybackState::Playing;
        inner.playing = Some(track.clone());
        inner.seek_position = start_position;
        inner.playback_loop = None;
        inner
            .play_calls
            .push((track.clone(), start_position, end_position));
    }

    fn pause(&self) {
        self.inner.lock().unwrap().state = PlaybackState::Paused;
    }

    fn resume(&self) {
        self.inner.lock().unwrap().state = PlaybackState::Playing;
    }

    fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = PlaybackState::NoTrack;
        inner.playing = None;
        inner.seek_position = 0.0;
        inner.playback_loop = None;
    }

    fn begin_waiting(&self) {
        self.inner.lock().unwrap().state = PlaybackState::Waiting;
    }

    fn begin_transcoding(&self) {
        self.inner.lock().unwrap().state = PlaybackState::Transcoding;
    }

    fn state(&self) -> PlaybackState {
        self.inner.lock().unwrap().state
    }

    fn seek_position(&self) -> f64 {
        self.inner.lock().unwrap().seek_position
    }

    fn attempt_seek(&self, track: &Track, position: f64) -> SeekResult {
        let mut inner = self.inner.lock().unwrap();

        let track_completed = position >= track.duration && inner.playback_loop.is_none();

        let mut target = position.clamp(0.0, track.duration);
        if let Some(lp) = inner.playback_loop {
            if let Some(end) = lp.end_time {
                target = target.clamp(lp.start_time, end);
            }
        }

        inner.seek_position = target;
        SeekResult {
            actual_position: target,
            loop_removed: false,
            track_completed,
        }
    }

    fn force_seek(&self, track: &Track, position: f64) -> SeekResult {
        let mut inner = self.inner.lock().unwrap();

        let target = position.clamp(0.0, track.duration);
        let loop_removed = inner
            .playback_loop
            .is_some_and(|lp| !lp.contains(target));
        if loop_removed {
            inner.playback_loop = None;
        }

        inner.seek_position = target;
        SeekResult {
            actual_position: target,
            loop_removed,
            track_completed: position >= track.duration,
        }
    }

    fn define_loop(&self, start_time: f64, end_time: f64) {
        self.inner.lock().unwrap().playback_loop = Some(PlaybackLoop {
            start_time,
            end_time: Some(end_time),
        });
    }

    fn toggle_loop(&self) -> Option<PlaybackLoop> {
        let mut inner = self.inner.lock().unwrap();
        let position = inner.seek_position;

        inner.playback_loop = match inner.playback_loop {
            None => Some(PlaybackLoop::starting_at(position)),
            Some(lp) if lp.end_time.is_none() => Some(PlaybackLoop {
                start_time: lp.start_time,
                end_time: Some(position),
            }),
            Some(_) => None,
        };

        inner.playback_loop
    }

    fn playback_loop(&self) -> Option<PlaybackLoop> {
        self.inner.lock().unwrap().playback_loop
    }
}

// ===== Mock transcoder =====

#[derive(Default)]
struct TranscoderInner {
    transcode_calls: Vec<PathBuf>,
    cancel_calls: Vec<PathBuf>,
}

/// Records transcode requests without doing any work
#[derive(Default)]
pub struct MockTranscoder {
    inner: Mutex<TranscoderInner>,
}

impl MockTranscoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn transcode_calls(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().transcode_calls.clone()
    }

    pub fn cancel_calls(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().cancel_calls.clone()
    }
}

impl Transcoder for MockTranscoder {
    fn transcode_immediately(&self, track: &Track) {
        self.inner
            .lock()
            .unwrap()
            .transcode_calls
            .push(track.file.clone());
    }

    fn cancel(&self, track: &Track) {
        self.inner
            .lock()
            .unwrap()
            .cancel_calls
            .push(track.file.clone());
    }
}

// ===== Fixture =====

pub struct Fixture {
    pub delegate: Arc<Mutex<PlaybackDelegate>>,
    pub player: Arc<MockPlayer>,
    pub transcoder: Arc<MockTranscoder>,
    pub events: Receiver<PlaybackEvent>,
}

pub fn track(name: &str, duration: f64) -> Track {
    Track::new(format!("/music/{name}.mp3"), name, duration)
}

pub fn tracks(n: usize) -> Vec<Track> {
    (0..n).map(|i| track(&format!("track{i}"), 300.0)).collect()
}

pub fn fixture(tracks: Vec<Track>) -> Fixture {
    fixture_with_preferences(tracks, PlaybackPreferences::default())
}

pub fn fixture_with_preferences(tracks: Vec<Track>, preferences: PlaybackPreferences) -> Fixture {
    let player = MockPlayer::new();
    let transcoder = MockTranscoder::new();
    let sequencer = Arc::new(Mutex::new(Sequencer::new(
        tracks,
        RepeatMode::Off,
        ShuffleMode::Off,
    )));

    let delegate = PlaybackDelegate::new(
        Arc::clone(&player) as Arc<dyn Player>,
        sequencer,
        Arc::clone(&transcoder) as Arc<dyn Transcoder>,
        preferences,
    );

    let events = delegate.lock().unwrap().events().subscribe();

    Fixture {
        delegate,
        player,
        transcoder,
        events,
    }
}

impl Fixture {
    /// Drain all events published so far
    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        self.events.try_iter().collect()
    }

    /// Simulate the platform reporting natural completion of the current
    /// track (seek position at the track's end)
    pub fn complete_current_track(&self) {
        let session = self
            .delegate
            .lock()
            .unwrap()
            .current_session()
            .expect("a track should be playing");

        self.player.set_seek_position(session.track.duration);
        self.delegate
            .lock()
            .unwrap()
            .track_playback_completed(&session)
            .unwrap();
    }
}
