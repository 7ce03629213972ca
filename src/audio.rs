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

//! Playback engines.
//!
//! The rest of the crate only needs a narrow capability set from an engine:
//! load a clip, start it, stop it, ask whether it is playing, and be told when
//! it finishes. Completion notifications arrive on a channel so the consumer
//! can pick them up on its own thread.

use std::{fmt, path::Path, sync::Arc};

use crossbeam_channel::Receiver;

use crate::config;

pub mod clip;
pub mod cpal;
pub mod decode;
pub mod error;
pub mod mixer;
pub mod mock;
pub mod voice;

pub use clip::Clip;
pub use error::EngineError;
pub use voice::{Voice, VoiceId, VoiceState};

pub trait Engine: fmt::Display + Send + Sync {
    /// Loads and decodes the audio file at `path` into a clip called `name`.
    fn load(&self, path: &Path, name: &str) -> Result<Clip, EngineError>;

    /// Starts playing the clip immediately. Voices overlap; nothing is queued.
    fn start(&self, clip: &Clip, volume: f32) -> Result<Voice, EngineError>;

    /// Stops the voice. Stopping a voice that already ended does nothing.
    fn stop(&self, voice: &Voice);

    /// Returns true if the voice is still producing sound.
    fn is_playing(&self, voice: &Voice) -> bool {
        voice.is_playing()
    }

    /// Returns a receiver of the IDs of voices that played to the end.
    fn completions(&self) -> Receiver<VoiceId>;
}

/// Lists the output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceInfo>, EngineError> {
    cpal::Engine::list()
}

/// Gets an engine for the configured device.
pub fn get_engine(config: &config::Audio) -> Result<Arc<dyn Engine>, EngineError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Engine::get(device)));
    };

    Ok(Arc::new(cpal::Engine::get(config)?))
}
