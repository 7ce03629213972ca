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

//! Voices are the opaque playback resources handed out by an engine.
//!
//! A voice moves through `Created -> Playing -> {Finished | Stopped}`. The state
//! lives behind an atomic so that the audio thread can finish a voice while the
//! event thread stops it, and only the first terminal transition wins.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Identifier of a voice, unique for the lifetime of the process.
pub type VoiceId = u64;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// The lifecycle state of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceState {
    /// Loaded and registered, no sound yet.
    Created,
    /// Producing sound.
    Playing,
    /// Reached the end of its clip.
    Finished,
    /// Halted before reaching the end of its clip.
    Stopped,
}

impl VoiceState {
    fn from_u8(value: u8) -> VoiceState {
        match value {
            0 => VoiceState::Created,
            1 => VoiceState::Playing,
            2 => VoiceState::Finished,
            _ => VoiceState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            VoiceState::Created => 0,
            VoiceState::Playing => 1,
            VoiceState::Finished => 2,
            VoiceState::Stopped => 3,
        }
    }

    /// Returns true for `Finished` and `Stopped`.
    pub fn is_terminal(self) -> bool {
        matches!(self, VoiceState::Finished | VoiceState::Stopped)
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoiceState::Created => "created",
            VoiceState::Playing => "playing",
            VoiceState::Finished => "finished",
            VoiceState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// A playing (or played) clip. Clones share the same state.
#[derive(Clone)]
pub struct Voice {
    id: VoiceId,
    clip_name: Arc<str>,
    state: Arc<AtomicU8>,
}

impl Voice {
    /// Creates a new voice in the `Created` state.
    pub fn new(clip_name: &str) -> Voice {
        Voice {
            id: NEXT_VOICE_ID.fetch_add(1, Ordering::SeqCst),
            clip_name: Arc::from(clip_name),
            state: Arc::new(AtomicU8::new(VoiceState::Created.as_u8())),
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn clip_name(&self) -> &str {
        &self.clip_name
    }

    pub fn state(&self) -> VoiceState {
        VoiceState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_playing(&self) -> bool {
        self.state() == VoiceState::Playing
    }

    /// Moves `Created -> Playing`. Returns false if the voice was not freshly created.
    pub fn begin(&self) -> bool {
        self.transition(VoiceState::Created, VoiceState::Playing)
    }

    /// Moves `Playing -> Finished`. Returns false if the voice was not playing.
    pub fn finish(&self) -> bool {
        self.transition(VoiceState::Playing, VoiceState::Finished)
    }

    /// Moves any non-terminal state to `Stopped`. Returns false if the voice had
    /// already finished or been stopped.
    pub fn halt(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if VoiceState::from_u8(current).is_terminal() {
                return false;
            }
            match self.state.compare_exchange(
                current,
                VoiceState::Stopped.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn transition(&self, from: VoiceState, to: VoiceState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl fmt::Debug for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id)
            .field("clip_name", &self.clip_name)
            .field("state", &self.state())
            .finish()
    }
}
