//! Playback profiles
//!
//! Remembers the last playback position of tracks so playback can resume
//! where it left off. One profile per track (keyed by file path). Saves at
//! end-of-track reset the position to 0 at the save sites, so a remembered
//! position is always within the track.

use crate::types::Track;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// The remembered playback state of one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackProfile {
    /// Track identity
    pub file: PathBuf,

    /// Last playback position, in seconds
    pub last_position: f64,
}

/// Thread-safe map of track -> playback profile
#[derive(Debug, Default)]
pub struct PlaybackProfiles {
    profiles: RwLock<HashMap<PathBuf, PlaybackProfile>>,
}

impl PlaybackProfiles {
    /// An empty profile map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from previously persisted profiles
    pub fn from_profiles(profiles: Vec<PlaybackProfile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.file.clone(), p)).collect();
        Self {
            profiles: RwLock::new(map),
        }
    }

    /// Save (or overwrite) the profile for a track
    pub fn add(&self, track: &Track, last_position: f64) {
        self.write_guard().insert(
            track.file.clone(),
            PlaybackProfile {
                file: track.file.clone(),
                last_position,
            },
        );
    }

    /// The profile for a track, if one exists
    pub fn get(&self, track: &Track) -> Option<PlaybackProfile> {
        self.read_guard().get(&track.file).cloned()
    }

    /// Whether a profile exists for the track
    pub fn has_for(&self, track: &Track) -> bool {
        self.read_guard().contains_key(&track.file)
    }

    /// Delete the profile for a track, returning it if present
    pub fn remove(&self, track: &Track) -> Option<PlaybackProfile> {
        self.write_guard().remove(&track.file)
    }

    /// Delete all profiles
    pub fn remove_all(&self) {
        self.write_guard().clear();
    }

    /// Snapshot of all profiles, for persistence
    pub fn all(&self) -> Vec<PlaybackProfile> {
        self.read_guard().values().cloned().collect()
    }

    /// Number of stored profiles
    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    /// Whether no profiles are stored
    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, HashMap<PathBuf, PlaybackProfile>> {
        match self.profiles.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<PathBuf, PlaybackProfile>> {
        match self.profiles.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn track(name: &str) -> Track {
        Track::new(format!("/music/{name}.mp3"), name, 300.0)
    }

    #[test]
    fn one_profile_per_track() {
        let profiles = PlaybackProfiles::new();
        let t = track("a");

        profiles.add(&t, 10.0);
        profiles.add(&t, 25.0);

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles.get(&t).unwrap().last_position, 25.0);
    }

    #[test]
    fn remove_and_remove_all() {
        let profiles = PlaybackProfiles::new();
        let a = track("a");
        let b = track("b");

        profiles.add(&a, 10.0);
        profiles.add(&b, 20.0);

        let removed = profiles.remove(&a).unwrap();
        assert_eq!(removed.last_position, 10.0);
        assert!(!profiles.has_for(&a));
        assert!(profiles.has_for(&b));

        profiles.remove_all();
        assert!(profiles.is_empty());
    }

    #[test]
    fn snapshot_for_persistence_round_trips() {
        let profiles = PlaybackProfiles::new();
        profiles.add(&track("a"), 10.0);
        profiles.add(&track("b"), 20.0);

        let restored = PlaybackProfiles::from_profiles(profiles.all());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(&track("b")).unwrap().last_position, 20.0);
    }

    #[test]
    fn concurrent_reads_do_not_block_each_other() {
        let profiles = Arc::new(PlaybackProfiles::new());
        profiles.add(&track("a"), 10.0);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let profiles = Arc::clone(&profiles);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert!(profiles.has_for(&track("a")));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
