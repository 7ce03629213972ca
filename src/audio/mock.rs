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
use std::{
    collections::VecDeque,
    fmt,
    path::Path,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{info, span, Level};

use super::clip::Clip;
use super::decode::decode_file;
use super::error::EngineError;
use super::voice::{Voice, VoiceId};

/// How often a timed mock voice checks whether it has been stopped.
const TICK: Duration = Duration::from_millis(10);

/// How many starts and stops the engine remembers for inspection.
const HISTORY: usize = 256;

/// Appends to a history, dropping the oldest entry once it is full.
fn remember<T>(history: &Mutex<VecDeque<T>>, entry: T) {
    let mut history = history.lock();
    if history.len() == HISTORY {
        history.pop_front();
    }
    history.push_back(entry);
}

/// A mock engine. Decodes clips like a real engine but doesn't actually play anything.
pub struct Engine {
    name: String,
    /// When true, voices finish on their own after the clip's duration.
    timed: bool,
    /// Voices that haven't ended yet as of the last start, in start order.
    voices: Mutex<Vec<Voice>>,
    /// Clip names of the most recent starts, in order.
    started: Mutex<VecDeque<String>>,
    /// IDs of the most recent voices halted by a stop request, in order.
    stopped: Mutex<VecDeque<VoiceId>>,
    completion_tx: Sender<VoiceId>,
    completion_rx: Receiver<VoiceId>,
}

impl Engine {
    /// Gets a mock engine whose voices finish after their clip's duration.
    pub fn get(name: &str) -> Engine {
        Engine::new(name, true)
    }

    /// Gets a mock engine whose voices only finish through [`Engine::finish`].
    pub fn manual(name: &str) -> Engine {
        Engine::new(name, false)
    }

    fn new(name: &str, timed: bool) -> Engine {
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();
        Engine {
            name: name.to_string(),
            timed,
            voices: Mutex::new(Vec::new()),
            started: Mutex::new(VecDeque::new()),
            stopped: Mutex::new(VecDeque::new()),
            completion_tx,
            completion_rx,
        }
    }

    /// Finishes the given voice as if its clip had played out, and emits the
    /// completion notification. Returns false if the voice wasn't playing.
    pub fn finish(&self, id: VoiceId) -> bool {
        let voice = match self.voice(id) {
            Some(voice) => voice,
            None => return false,
        };
        if !voice.finish() {
            return false;
        }
        let _ = self.completion_tx.send(id);
        true
    }

    /// Returns the voice with the given ID, if this engine started it and it
    /// hasn't been pruned since ending.
    pub fn voice(&self, id: VoiceId) -> Option<Voice> {
        self.voices.lock().iter().find(|v| v.id() == id).cloned()
    }

    /// Returns the clip names of the most recently started voices, in start order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().iter().cloned().collect()
    }

    /// Returns the IDs of the most recent voices halted by a stop request, in order.
    pub fn stopped(&self) -> Vec<VoiceId> {
        self.stopped.lock().iter().copied().collect()
    }

    /// Returns the number of voices that are still playing.
    pub fn playing_count(&self) -> usize {
        self.voices.lock().iter().filter(|v| v.is_playing()).count()
    }

    /// Finishes the voice once the clip's duration has elapsed, unless it is
    /// stopped first.
    fn expire_after(&self, voice: Voice, duration: Duration) {
        let completion_tx = self.completion_tx.clone();
        thread::spawn(move || {
            let deadline = Instant::now() + duration;
            loop {
                if voice.state().is_terminal() {
                    return;
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                thread::sleep(TICK.min(deadline - now));
            }
            if voice.finish() {
                let _ = completion_tx.send(voice.id());
            }
        });
    }
}

impl super::Engine for Engine {
    fn load(&self, path: &Path, name: &str) -> Result<Clip, EngineError> {
        decode_file(path, name)
    }

    fn start(&self, clip: &Clip, volume: f32) -> Result<Voice, EngineError> {
        let span = span!(Level::INFO, "start clip (mock)");
        let _enter = span.enter();

        let voice = Voice::new(clip.name());
        voice.begin();
        info!(
            engine = self.name,
            clip = clip.name(),
            volume,
            duration_ms = clip.duration().as_millis(),
            "Playing clip."
        );
        {
            let mut voices = self.voices.lock();
            voices.retain(|v| !v.state().is_terminal());
            voices.push(voice.clone());
        }
        remember(&self.started, clip.name().to_string());

        if self.timed {
            self.expire_after(voice.clone(), clip.duration());
        }
        Ok(voice)
    }

    fn stop(&self, voice: &Voice) {
        if voice.halt() {
            remember(&self.stopped, voice.id());
        }
    }

    fn completions(&self) -> Receiver<VoiceId> {
        self.completion_rx.clone()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
