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
use serde::{Deserialize, Serialize};

use crate::audio::cpal::DEFAULT_DEVICE;

const DEFAULT_VOLUME: f32 = 1.0;

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Audio {
    /// The audio device. "default" picks the host's default output, and any
    /// name starting with "mock" picks the silent mock engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<String>,

    /// Playback volume between 0.0 and 1.0 (default: 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    volume: Option<f32>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: Some(device.to_string()),
            volume: None,
        }
    }

    /// Returns this configuration with the device replaced.
    pub fn with_device(mut self, device: &str) -> Audio {
        self.device = Some(device.to_string());
        self
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the playback volume, clamped to 0.0..=1.0.
    pub fn volume(&self) -> f32 {
        let volume = self.volume.unwrap_or(DEFAULT_VOLUME);
        if volume.is_nan() {
            return DEFAULT_VOLUME;
        }
        volume.clamp(0.0, 1.0)
    }
}
