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
// Core voice mixing logic that is independent of any audio backend
use super::clip::Clip;
use super::voice::{Voice, VoiceId, VoiceState};

/// A voice the mixer is currently rendering.
pub struct ActiveVoice {
    /// The voice state shared with the playback pool.
    voice: Voice,
    /// The clip being rendered, already at the output sample rate.
    clip: Clip,
    /// Gain applied to every sample.
    volume: f32,
    /// Current position in frames.
    position: usize,
}

impl ActiveVoice {
    pub fn new(voice: Voice, clip: Clip, volume: f32) -> ActiveVoice {
        ActiveVoice {
            voice,
            clip,
            volume,
            position: 0,
        }
    }
}

/// Mixes any number of overlapping voices into interleaved output frames.
pub struct Mixer {
    voices: Vec<ActiveVoice>,
    num_channels: u16,
}

impl Mixer {
    /// Creates a new mixer for the given number of output channels.
    pub fn new(num_channels: u16) -> Mixer {
        Mixer {
            voices: Vec::new(),
            num_channels: num_channels.max(1),
        }
    }

    /// Adds a voice to the mix.
    pub fn add(&mut self, voice: ActiveVoice) {
        self.voices.push(voice);
    }

    /// Returns the number of voices being mixed.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Mixes all voices into `output`, which is interleaved and overwritten.
    /// Stopped voices are dropped silently. Returns the IDs of the voices that
    /// reached the end of their clip during this block.
    pub fn process_into(&mut self, output: &mut [f32]) -> Vec<VoiceId> {
        output.fill(0.0);

        let out_channels = self.num_channels as usize;
        let frames = output.len() / out_channels;
        let mut finished = Vec::new();

        self.voices.retain_mut(|active| {
            if active.voice.state() == VoiceState::Stopped {
                return false;
            }

            let clip_channels = active.clip.channel_count() as usize;
            let clip_frames = active.clip.frames();
            let samples = active.clip.samples();

            let to_mix = frames.min(clip_frames.saturating_sub(active.position));
            for frame in 0..to_mix {
                let source = (active.position + frame) * clip_channels;
                let dest = frame * out_channels;
                for out_channel in 0..out_channels {
                    // Mono clips feed every output; otherwise map channel for channel.
                    let source_channel = if clip_channels == 1 {
                        0
                    } else if out_channel < clip_channels {
                        out_channel
                    } else {
                        continue;
                    };
                    output[dest + out_channel] += samples[source + source_channel] * active.volume;
                }
            }
            active.position += to_mix;

            if active.position >= clip_frames {
                if active.voice.finish() {
                    finished.push(active.voice.id());
                }
                return false;
            }
            true
        });

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        finished
    }
}
