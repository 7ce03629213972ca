// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The pool of clips that are currently sounding.
//!
//! Every tap adds a handle; handles leave the pool when a sweep finds them
//! finished or when everything is stopped at once. The pool is owned by a
//! single thread and is never shared.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, Level};

use crate::audio::{Engine, EngineError, Voice, VoiceId, VoiceState};
use crate::catalog::SoundAsset;
use crate::util::duration_minutes_seconds;

mod error;

pub use error::PlayError;

/// Which finished handles a sweep reclaims.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SweepPolicy {
    /// Only the first finished handle, in insertion order.
    #[default]
    FirstFinished,
    /// Every finished handle.
    AllFinished,
}

impl fmt::Display for SweepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepPolicy::FirstFinished => f.write_str("first finished"),
            SweepPolicy::AllFinished => f.write_str("all finished"),
        }
    }
}

/// An active playback of a sound asset.
#[derive(Debug)]
pub struct PlaybackHandle {
    asset_id: String,
    voice: Voice,
    started: Instant,
}

impl PlaybackHandle {
    fn new(asset_id: &str, voice: Voice) -> PlaybackHandle {
        PlaybackHandle {
            asset_id: asset_id.to_string(),
            voice,
            started: Instant::now(),
        }
    }

    pub fn id(&self) -> VoiceId {
        self.voice.id()
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn state(&self) -> VoiceState {
        self.voice.state()
    }

    pub fn is_playing(&self) -> bool {
        self.voice.is_playing()
    }

    /// How long ago playback started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Tracks the handles of every clip started from the board.
pub struct PlaybackPool {
    engine: Arc<dyn Engine>,
    policy: SweepPolicy,
    volume: f32,
    /// Live handles in insertion order.
    handles: Vec<PlaybackHandle>,
}

impl PlaybackPool {
    /// Creates an empty pool that plays through the given engine.
    pub fn new(engine: Arc<dyn Engine>, policy: SweepPolicy) -> PlaybackPool {
        PlaybackPool {
            engine,
            policy,
            volume: 1.0,
            handles: Vec::new(),
        }
    }

    /// Sets the volume new clips start at.
    pub fn with_volume(mut self, volume: f32) -> PlaybackPool {
        self.volume = if volume.is_nan() {
            1.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self
    }

    /// Starts playing the asset right away, overlapping anything already
    /// playing, then sweeps the pool. Returns the id of the new voice.
    pub fn play(&mut self, asset: &SoundAsset) -> Result<VoiceId, PlayError> {
        let span = span!(Level::INFO, "play", id = asset.id());
        let _enter = span.enter();

        if !asset.path().is_file() {
            return Err(PlayError::AssetNotFound(asset.id().to_string()));
        }

        let clip = self
            .engine
            .load(asset.path(), asset.id())
            .map_err(|e| match e {
                EngineError::NotFound(_) => PlayError::AssetNotFound(asset.id().to_string()),
                source => PlayError::Load {
                    id: asset.id().to_string(),
                    source,
                },
            })?;
        let voice = self
            .engine
            .start(&clip, self.volume)
            .map_err(|source| PlayError::Load {
                id: asset.id().to_string(),
                source,
            })?;

        let id = voice.id();
        info!(
            voice = id,
            duration = %duration_minutes_seconds(clip.duration()),
            active = self.handles.len() + 1,
            "Playing sound."
        );
        self.handles.push(PlaybackHandle::new(asset.id(), voice));
        self.sweep();
        Ok(id)
    }

    /// Reclaims finished handles according to the sweep policy and returns
    /// how many were removed.
    pub fn sweep(&mut self) -> usize {
        let engine = &self.engine;
        let reclaimed: Vec<PlaybackHandle> = match self.policy {
            SweepPolicy::FirstFinished => {
                match self
                    .handles
                    .iter()
                    .position(|handle| !engine.is_playing(&handle.voice))
                {
                    Some(index) => vec![self.handles.remove(index)],
                    None => Vec::new(),
                }
            }
            SweepPolicy::AllFinished => {
                let (finished, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.handles)
                    .into_iter()
                    .partition(|handle| !engine.is_playing(&handle.voice));
                self.handles = live;
                finished
            }
        };

        for handle in reclaimed.iter() {
            engine.stop(&handle.voice);
            debug!(
                voice = handle.id(),
                id = handle.asset_id(),
                state = %handle.state(),
                "Reclaimed playback handle."
            );
        }
        reclaimed.len()
    }

    /// Stops everything and empties the pool. Returns the number of handles
    /// discarded.
    pub fn stop_all(&mut self) -> usize {
        if self.handles.is_empty() {
            return 0;
        }

        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            self.engine.stop(&handle.voice);
        }
        info!(count, "Stopped all sounds.");
        count
    }

    /// Notes that the engine reported the voice as played out. The handle
    /// stays in the pool until a sweep reclaims it. Returns false if the
    /// voice isn't in this pool.
    pub fn on_completed(&self, id: VoiceId) -> bool {
        match self.handles.iter().find(|handle| handle.id() == id) {
            Some(handle) => {
                debug!(
                    voice = id,
                    id = handle.asset_id(),
                    elapsed_ms = handle.elapsed().as_millis(),
                    "Sound finished."
                );
                true
            }
            None => {
                debug!(voice = id, "Completion for a voice not in the pool.");
                false
            }
        }
    }

    pub fn policy(&self) -> SweepPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Returns the voice ids of the pool's handles in insertion order.
    pub fn ids(&self) -> Vec<VoiceId> {
        self.handles.iter().map(|handle| handle.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaybackHandle> {
        self.handles.iter()
    }
}

impl Drop for PlaybackPool {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl fmt::Debug for PlaybackPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackPool")
            .field("engine", &self.engine.to_string())
            .field("policy", &self.policy)
            .field("volume", &self.volume)
            .field("handles", &self.handles)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use crate::audio::{mock, VoiceState};
    use crate::catalog::SoundAsset;
    use crate::testutil::write_wav;

    use super::{PlayError, PlaybackPool, SweepPolicy};

    fn asset(dir: &Path, id: &str) -> Result<SoundAsset, Box<dyn Error>> {
        let path = dir.join(format!("{}.wav", id));
        write_wav(path.clone(), vec![vec![0.25f32; 4410]], 44100)?;
        Ok(SoundAsset::from_separated(id, '%', path))
    }

    fn pool(policy: SweepPolicy) -> (Arc<mock::Engine>, PlaybackPool) {
        let engine = Arc::new(mock::Engine::manual("mock-pool"));
        let pool = PlaybackPool::new(engine.clone(), policy);
        (engine, pool)
    }

    #[test]
    fn test_sweep_removes_finished_handle() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut pool) = pool(SweepPolicy::FirstFinished);

        let a = pool.play(&asset(dir.path(), "drums%kick")?)?;
        let b = pool.play(&asset(dir.path(), "fx%boom")?)?;
        assert_eq!(pool.ids(), vec![a, b]);
        assert_eq!(engine.started(), vec!["drums%kick", "fx%boom"]);

        assert!(engine.finish(b));
        assert!(pool.on_completed(b));
        assert_eq!(pool.sweep(), 1);
        assert_eq!(pool.ids(), vec![a]);
        assert!(pool.iter().all(|handle| handle.is_playing()));

        // A finished voice is reclaimed, not stopped.
        assert!(engine.stopped().is_empty());
        assert!(!pool.on_completed(b));
        Ok(())
    }

    #[test]
    fn test_play_sweeps_after_starting() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut pool) = pool(SweepPolicy::FirstFinished);

        let a = pool.play(&asset(dir.path(), "kick")?)?;
        assert!(engine.finish(a));
        let b = pool.play(&asset(dir.path(), "snare")?)?;

        assert_eq!(pool.ids(), vec![b]);
        Ok(())
    }

    #[test]
    fn test_first_finished_sweeps_one_at_a_time() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut pool) = pool(SweepPolicy::FirstFinished);

        let a = pool.play(&asset(dir.path(), "a")?)?;
        let b = pool.play(&asset(dir.path(), "b")?)?;
        let c = pool.play(&asset(dir.path(), "c")?)?;
        engine.finish(a);
        engine.finish(b);

        assert_eq!(pool.sweep(), 1);
        assert_eq!(pool.ids(), vec![b, c]);
        assert_eq!(pool.sweep(), 1);
        assert_eq!(pool.ids(), vec![c]);
        assert_eq!(pool.sweep(), 0);
        Ok(())
    }

    #[test]
    fn test_all_finished_sweeps_everything() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut pool) = pool(SweepPolicy::AllFinished);
        assert_eq!(pool.policy(), SweepPolicy::AllFinished);

        let a = pool.play(&asset(dir.path(), "a")?)?;
        let b = pool.play(&asset(dir.path(), "b")?)?;
        let c = pool.play(&asset(dir.path(), "c")?)?;
        engine.finish(a);
        engine.finish(c);

        assert_eq!(pool.sweep(), 2);
        assert_eq!(pool.ids(), vec![b]);
        Ok(())
    }

    #[test]
    fn test_stop_all() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut pool) = pool(SweepPolicy::FirstFinished);

        let a = pool.play(&asset(dir.path(), "a")?)?;
        let b = pool.play(&asset(dir.path(), "b")?)?;
        let c = pool.play(&asset(dir.path(), "c")?)?;
        engine.finish(b);

        assert_eq!(pool.stop_all(), 3);
        assert!(pool.is_empty());
        assert_eq!(engine.stopped(), vec![a, c]);
        assert_eq!(engine.voice(a).map(|v| v.state()), Some(VoiceState::Stopped));
        assert_eq!(engine.playing_count(), 0);

        assert_eq!(pool.stop_all(), 0);
        assert!(pool.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_asset_leaves_pool_unchanged() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut pool) = pool(SweepPolicy::FirstFinished);
        let a = pool.play(&asset(dir.path(), "a")?)?;

        let missing = SoundAsset::from_separated("gone", '%', dir.path().join("gone.wav"));
        match pool.play(&missing) {
            Err(PlayError::AssetNotFound(id)) => assert_eq!(id, "gone"),
            other => panic!("expected AssetNotFound, got {:?}", other),
        }

        assert_eq!(pool.ids(), vec![a]);
        assert_eq!(engine.started(), vec!["a"]);
        Ok(())
    }

    #[test]
    fn test_undecodable_asset_is_load_error() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut pool) = pool(SweepPolicy::FirstFinished);

        let path = dir.path().join("broken.wav");
        fs::write(&path, b"this is not audio")?;
        let broken = SoundAsset::from_separated("broken", '%', path);

        let err = pool.play(&broken).expect_err("broken file played");
        assert!(matches!(err, PlayError::Load { .. }));
        assert_eq!(err.asset_id(), "broken");
        assert!(pool.is_empty());
        assert!(engine.started().is_empty());
        Ok(())
    }

    #[test]
    fn test_drop_stops_voices() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut pool) = pool(SweepPolicy::FirstFinished);
        let a = pool.play(&asset(dir.path(), "a")?)?;

        drop(pool);
        assert_eq!(engine.stopped(), vec![a]);
        Ok(())
    }
}
