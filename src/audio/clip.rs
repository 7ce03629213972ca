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
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A fully decoded clip held in memory.
/// The sample data is stored in an Arc for efficient sharing between voices.
#[derive(Clone)]
pub struct Clip {
    /// The name of the clip, usually the asset id.
    name: String,
    /// The sample data as f32 samples, interleaved if multi-channel.
    data: Arc<Vec<f32>>,
    /// Number of channels in the clip.
    channel_count: u16,
    /// Sample rate of the audio data.
    sample_rate: u32,
}

impl Clip {
    /// Creates a new clip from interleaved samples.
    pub fn new(name: &str, data: Vec<f32>, channel_count: u16, sample_rate: u32) -> Clip {
        Clip {
            name: name.to_string(),
            data: Arc::new(data),
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / self.channel_count as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Returns this clip at the given sample rate, using linear interpolation.
    /// Interpolation is simple but sufficient for short one-shot sounds.
    pub fn resampled(&self, target_rate: u32) -> Clip {
        if target_rate == self.sample_rate || self.sample_rate == 0 || target_rate == 0 {
            return self.clone();
        }

        let ratio = target_rate as f64 / self.sample_rate as f64;
        let channels = self.channel_count as usize;
        let source_frames = self.frames();
        let target_frames = (source_frames as f64 * ratio).ceil() as usize;
        let mut output = Vec::with_capacity(target_frames * channels);

        for target_frame in 0..target_frames {
            let source_pos = target_frame as f64 / ratio;
            let source_frame = source_pos.floor() as usize;
            let frac = source_pos.fract() as f32;

            for channel in 0..channels {
                let s0 = self
                    .data
                    .get(source_frame * channels + channel)
                    .copied()
                    .unwrap_or(0.0);
                let s1 = self
                    .data
                    .get((source_frame + 1) * channels + channel)
                    .copied()
                    .unwrap_or(s0);
                output.push(s0 + (s1 - s0) * frac);
            }
        }

        Clip {
            name: self.name.clone(),
            data: Arc::new(output),
            channel_count: self.channel_count,
            sample_rate: target_rate,
        }
    }
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("name", &self.name)
            .field("frames", &self.frames())
            .field("channel_count", &self.channel_count)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::Clip;

    #[test]
    fn test_clip_frames_and_duration() {
        let clip = Clip::new("stereo", vec![0.0; 44100 * 2], 2, 44100);
        assert_eq!(clip.frames(), 44100);
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_resample_up() {
        let source: Vec<f32> = (0..4410)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let clip = Clip::new("sine", source, 1, 44100);

        let result = clip.resampled(48000);

        let expected_len = (4410.0_f64 * 48000.0 / 44100.0).ceil() as usize;
        assert_eq!(result.frames(), expected_len);
        assert_eq!(result.sample_rate(), 48000);
        assert_eq!(result.name(), "sine");
    }

    #[test]
    fn test_resample_stereo_keeps_channels() {
        let clip = Clip::new("lr", vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0], 2, 44100);

        let result = clip.resampled(48000);

        assert_eq!(result.channel_count(), 2);
        assert!(result.samples().len() >= 8);
        assert!((result.samples()[0] - 1.0).abs() < 0.1);
        assert!((result.samples()[1] + 1.0).abs() < 0.1);
    }

    #[test]
    fn test_resample_same_rate_is_shared() {
        let clip = Clip::new("same", vec![0.5; 10], 1, 48000);
        let result = clip.resampled(48000);
        assert_eq!(result.samples(), clip.samples());
    }
}
