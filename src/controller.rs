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
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{select, Receiver, Sender};
use tracing::{error, info, span, warn, Level};

use crate::audio::VoiceId;
use crate::catalog::Catalog;
use crate::folders::FolderSelection;
use crate::playback::{PlayError, PlaybackPool};

pub mod keyboard;

/// Controller events that will trigger behavior on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The board was opened. Shows the visible sounds.
    Open,

    /// Filters the board to a folder, or shows everything again.
    SelectFolder(FolderSelection),

    /// Plays the visible sound with the given id.
    Tap(String),

    /// Plays the visible sound at the given zero-based position.
    TapIndex(usize),

    /// Stops every sound that is playing. Does nothing if nothing is playing.
    StopAll,

    /// Shows the visible sounds.
    List,

    /// Shows the folder menu.
    Folders,

    /// Rescans the sound directory.
    Reload,

    /// Stops everything and closes the board.
    Quit,
}

/// A source of controller events.
pub trait Driver: Send + Sync + 'static {
    /// Starts sending events. `idle_rx` receives a signal each time the
    /// controller has finished handling an event and rendering its output,
    /// starting with the initial `Open`. It disconnects when the controller
    /// closes.
    fn monitor_events(
        &self,
        events_tx: Sender<Event>,
        idle_rx: Receiver<()>,
    ) -> JoinHandle<Result<(), io::Error>>;
}

/// The soundboard screen. Owns the catalog and the playback pool, and is the
/// only thing that touches either.
pub struct Controller<W: Write> {
    catalog: Catalog,
    pool: PlaybackPool,
    /// Completion notifications from the engine.
    completions: Receiver<VoiceId>,
    /// Where the board is rendered.
    out: W,
}

impl<W: Write> Controller<W> {
    /// Creates a new controller.
    pub fn new(
        catalog: Catalog,
        pool: PlaybackPool,
        completions: Receiver<VoiceId>,
        out: W,
    ) -> Controller<W> {
        Controller {
            catalog,
            pool,
            completions,
            out,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn pool(&self) -> &PlaybackPool {
        &self.pool
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Handles a single event. Returns false once the board should close.
    pub fn handle(&mut self, event: Event) -> io::Result<bool> {
        match event {
            Event::Open | Event::List => self.render_board()?,
            Event::SelectFolder(selection) => {
                self.catalog.select_folder(selection);
                self.render_board()?;
            }
            Event::Tap(id) => match self.catalog.find(&id) {
                Some(asset) => report(self.pool.play(asset)),
                None => report(Err(PlayError::AssetNotFound(id))),
            },
            Event::TapIndex(index) => match self.catalog.visible_at(index) {
                Some(asset) => report(self.pool.play(asset)),
                None => warn!(position = index + 1, "No sound at that position."),
            },
            Event::StopAll => {
                self.pool.stop_all();
            }
            Event::Folders => self.render_folders()?,
            Event::Reload => {
                self.catalog.reload();
                self.render_board()?;
            }
            Event::Quit => {
                self.pool.stop_all();
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Passes every pending completion notification to the pool. Returns the
    /// number of notifications handled.
    pub fn drain_completions(&mut self) -> usize {
        let mut count = 0;
        while let Ok(id) = self.completions.try_recv() {
            self.pool.on_completed(id);
            count += 1;
        }
        count
    }

    /// Runs the board, taking events from the driver until it quits or goes
    /// away. Completion notifications are handled on this thread in between.
    pub fn run(&mut self, driver: Arc<dyn Driver>) -> io::Result<()> {
        let span = span!(Level::INFO, "controller");
        let _enter = span.enter();

        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (idle_tx, idle_rx) = crossbeam_channel::unbounded();
        let join_handle = driver.monitor_events(events_tx, idle_rx);

        info!(
            title = self.catalog.title(),
            sounds = self.catalog.len(),
            policy = %self.pool.policy(),
            "Controller started."
        );
        self.handle(Event::Open)?;
        let _ = idle_tx.send(());

        let mut completions = self.completions.clone();
        loop {
            select! {
                recv(events_rx) -> event => match event {
                    Ok(event) => {
                        info!(event = ?event, "Received event.");
                        if !self.handle(event)? {
                            break;
                        }
                        let _ = idle_tx.send(());
                    }
                    Err(_) => {
                        self.pool.stop_all();
                        break;
                    }
                },
                recv(completions) -> id => match id {
                    Ok(id) => {
                        self.pool.on_completed(id);
                    }
                    Err(_) => {
                        warn!("Engine stopped sending completions.");
                        completions = crossbeam_channel::never();
                    }
                },
            }
        }

        info!("Controller closing.");
        drop(events_rx);
        drop(idle_tx);
        match join_handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(err = %e, "Event monitor failed."),
            Err(_) => error!("Event monitor panicked."),
        }
        Ok(())
    }

    fn render_board(&mut self) -> io::Result<()> {
        writeln!(self.out, "== {} ==", self.catalog.title())?;
        let visible = self.catalog.visible();
        if visible.is_empty() {
            writeln!(self.out, "  (no sounds)")?;
        }
        for (index, asset) in visible.iter().enumerate() {
            writeln!(self.out, "{:>3}. {} [{}]", index + 1, asset, asset.id())?;
        }
        self.out.flush()
    }

    fn render_folders(&mut self) -> io::Result<()> {
        for entry in self.catalog.menu() {
            let marker = if &entry == self.catalog.selection() {
                "*"
            } else {
                " "
            };
            writeln!(self.out, " {} {}", marker, entry)?;
        }
        self.out.flush()
    }
}

/// Logs the outcome of a tap. Failures never reach the screen.
fn report(result: Result<VoiceId, PlayError>) {
    match result {
        Ok(_) => {}
        Err(e @ PlayError::AssetNotFound(_)) => {
            warn!(id = e.asset_id(), err = %e, "Sound not played.")
        }
        Err(e @ PlayError::Load { .. }) => {
            error!(id = e.asset_id(), err = %e, "Sound not played.")
        }
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::io;
    use std::path::Path;
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    use crossbeam_channel::{Receiver, Sender};

    use crate::audio::{mock, Engine as _};
    use crate::catalog::{Catalog, NamingScheme};
    use crate::folders::FolderSelection;
    use crate::playback::{PlaybackPool, SweepPolicy};
    use crate::testutil::write_wav;

    use super::{Controller, Driver, Event};

    /// A driver that sends a fixed list of events, each once the controller
    /// is idle, and then goes away.
    struct ScriptedDriver {
        events: Vec<Event>,
    }

    impl Driver for ScriptedDriver {
        fn monitor_events(
            &self,
            events_tx: Sender<Event>,
            idle_rx: Receiver<()>,
        ) -> JoinHandle<Result<(), io::Error>> {
            let events = self.events.clone();
            thread::spawn(move || {
                for event in events {
                    idle_rx
                        .recv_timeout(Duration::from_secs(3))
                        .map_err(io::Error::other)?;
                    events_tx.send(event).map_err(io::Error::other)?;
                }
                Ok(())
            })
        }
    }

    fn board(dir: &Path) -> Result<(Arc<mock::Engine>, Controller<Vec<u8>>), Box<dyn Error>> {
        for id in ["drums%kick", "drums%snare", "fx%boom", "plain"] {
            write_wav(
                dir.join(format!("{}.wav", id)),
                vec![vec![0.25f32; 4410]],
                44100,
            )?;
        }

        let engine = Arc::new(mock::Engine::manual("mock-controller"));
        let catalog = Catalog::open(dir, NamingScheme::default(), "wav");
        let pool = PlaybackPool::new(engine.clone(), SweepPolicy::FirstFinished);
        let completions = engine.completions();
        Ok((engine, Controller::new(catalog, pool, completions, Vec::new())))
    }

    fn output(controller: &Controller<Vec<u8>>) -> String {
        String::from_utf8_lossy(controller.output()).to_string()
    }

    #[test]
    fn test_open_renders_board() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (_, mut controller) = board(dir.path())?;

        assert!(controller.handle(Event::Open)?);
        let out = output(&controller);
        assert!(out.starts_with("== Soundboard ==\n"));
        assert!(out.contains("  1. kick (drums) [drums%kick]\n"));
        assert!(out.contains("  4. plain [plain]\n"));
        Ok(())
    }

    #[test]
    fn test_select_folder() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (_, mut controller) = board(dir.path())?;

        controller.handle(Event::SelectFolder(FolderSelection::Folder(
            "fx".to_string(),
        )))?;
        let out = output(&controller);
        assert!(out.contains("== fx ==\n"));
        assert!(out.contains("  1. boom (fx) [fx%boom]\n"));
        assert!(!out.contains("kick"));

        controller.handle(Event::Folders)?;
        let out = output(&controller);
        assert!(out.contains("   All\n   drums\n * fx\n"));
        Ok(())
    }

    #[test]
    fn test_taps() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut controller) = board(dir.path())?;

        controller.handle(Event::Tap("fx%boom".to_string()))?;
        controller.handle(Event::TapIndex(0))?;
        assert_eq!(engine.started(), vec!["fx%boom", "drums%kick"]);
        assert_eq!(controller.pool().len(), 2);

        // Unknown ids and positions are ignored.
        controller.handle(Event::Tap("nope".to_string()))?;
        controller.handle(Event::TapIndex(10))?;
        assert_eq!(controller.pool().len(), 2);

        // Hidden by the folder filter.
        controller.handle(Event::SelectFolder(FolderSelection::Folder(
            "drums".to_string(),
        )))?;
        controller.handle(Event::Tap("plain".to_string()))?;
        assert_eq!(engine.started().len(), 2);

        controller.handle(Event::StopAll)?;
        assert!(controller.pool().is_empty());
        assert_eq!(engine.playing_count(), 0);
        Ok(())
    }

    #[test]
    fn test_drain_completions() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut controller) = board(dir.path())?;

        controller.handle(Event::Tap("plain".to_string()))?;
        let id = controller.pool().ids()[0];
        assert!(engine.finish(id));

        assert_eq!(controller.drain_completions(), 1);
        assert_eq!(controller.drain_completions(), 0);
        // Removal waits for the next sweep.
        assert_eq!(controller.pool().len(), 1);
        Ok(())
    }

    #[test]
    fn test_run_until_quit() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut controller) = board(dir.path())?;

        let driver = Arc::new(ScriptedDriver {
            events: vec![
                Event::Tap("drums%kick".to_string()),
                Event::Tap("drums%snare".to_string()),
                Event::Quit,
                Event::Tap("plain".to_string()),
            ],
        });
        controller.run(driver)?;

        assert_eq!(engine.started(), vec!["drums%kick", "drums%snare"]);
        assert!(controller.pool().is_empty());
        assert_eq!(engine.stopped().len(), 2);
        assert!(output(&controller).starts_with("== Soundboard ==\n"));
        Ok(())
    }

    #[test]
    fn test_run_ends_when_driver_closes() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let (engine, mut controller) = board(dir.path())?;

        let driver = Arc::new(ScriptedDriver {
            events: vec![Event::TapIndex(3)],
        });
        controller.run(driver)?;

        assert_eq!(engine.started(), vec!["plain"]);
        assert!(controller.pool().is_empty());
        Ok(())
    }
}
