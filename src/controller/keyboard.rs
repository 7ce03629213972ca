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
use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{info, span, warn, Level};

use super::Event;
use crate::folders::FolderSelection;

const PLAY: &str = "play";
const FOLDER: &str = "folder";
const ALL: &str = "all";
const STOP: &str = "stop";
const LIST: &str = "list";
const FOLDERS: &str = "folders";
const RELOAD: &str = "reload";
const QUIT: &str = "quit";

/// What a line of input amounted to.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    /// An event was sent to the controller.
    Sent,
    /// Nothing was sent.
    Ignored,
    /// There is nothing more to read, or the user quit.
    Done,
}

/// A controller that drives the board from lines typed on the keyboard.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Parses a line of input. Commands are case insensitive; ids and folder
    /// names are not. A bare number plays that position on the board,
    /// counting from 1.
    pub fn parse(input: &str) -> Option<Event> {
        let input = input.trim();
        let (command, argument) = match input.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (input, ""),
        };

        match (command.to_lowercase().as_str(), argument) {
            (PLAY, id) if !id.is_empty() => Some(Event::Tap(id.to_string())),
            (FOLDER, name) if !name.is_empty() => Some(Event::SelectFolder(
                FolderSelection::Folder(name.to_string()),
            )),
            (ALL, "") => Some(Event::SelectFolder(FolderSelection::All)),
            (STOP, "") => Some(Event::StopAll),
            (LIST, "") => Some(Event::List),
            (FOLDERS, "") => Some(Event::Folders),
            (RELOAD, "") => Some(Event::Reload),
            (QUIT, "") => Some(Event::Quit),
            (position, "") => match position.parse::<usize>() {
                Ok(position) if position > 0 => Some(Event::TapIndex(position - 1)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Prompts and handles lines until the input ends or the user quits. The
    /// prompt is only written once the controller has handled the previous
    /// event, so it always follows the board's output.
    fn monitor<R, W>(
        events_tx: &Sender<Event>,
        idle_rx: &Receiver<()>,
        mut reader: R,
        mut writer: W,
    ) -> Result<(), io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        // The controller renders the board once on open.
        let mut awaiting = true;
        loop {
            if awaiting && idle_rx.recv().is_err() {
                return Ok(());
            }
            match Self::monitor_io(events_tx, &mut reader, &mut writer)? {
                Line::Sent => awaiting = true,
                Line::Ignored => awaiting = false,
                Line::Done => return Ok(()),
            }
        }
    }

    /// Prompts, reads one line and sends the event it names.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<Line, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({} <id>, <number>, {} <name>, {}, {}, {}, {}, {}, {}): ",
            PLAY, FOLDER, ALL, STOP, LIST, FOLDERS, RELOAD, QUIT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(Line::Done);
        }
        if input.trim().is_empty() {
            return Ok(Line::Ignored);
        }

        match Self::parse(&input) {
            Some(event) => {
                let quit = event == Event::Quit;
                events_tx.send(event).map_err(io::Error::other)?;
                Ok(if quit { Line::Done } else { Line::Sent })
            }
            None => {
                warn!(input = input.trim(), "Unrecognized input");
                Ok(Line::Ignored)
            }
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Driver for Driver {
    fn monitor_events(
        &self,
        events_tx: Sender<Event>,
        idle_rx: Receiver<()>,
    ) -> JoinHandle<Result<(), io::Error>> {
        thread::spawn(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            Self::monitor(&events_tx, &idle_rx, io::stdin().lock(), io::stdout())?;
            info!("Keyboard driver stopped.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};
    use std::thread;
    use std::time::Duration;

    use crate::controller::{keyboard::*, Event};
    use crate::folders::FolderSelection;

    use super::{Driver, Line};

    fn get_event(input: &str) -> Result<(Line, Option<Event>), io::Error> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Event>();

        let reader = BufReader::new(input.as_bytes());
        let writer = BufWriter::new(Vec::new());
        let line = Driver::monitor_io(&sender, reader, writer)?;

        drop(sender);
        Ok((line, receiver.recv().ok()))
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!(
            (Line::Sent, Some(Event::Tap("drums%kick".to_string()))),
            get_event("play drums%kick\n")?
        );
        assert_eq!((Line::Sent, Some(Event::TapIndex(2))), get_event("3\n")?);
        assert_eq!(
            (
                Line::Sent,
                Some(Event::SelectFolder(FolderSelection::Folder(
                    "Drums".to_string()
                )))
            ),
            get_event("FOLDER Drums\n")?
        );
        assert_eq!(
            (Line::Sent, Some(Event::SelectFolder(FolderSelection::All))),
            get_event(ALL)?
        );
        assert_eq!((Line::Sent, Some(Event::StopAll)), get_event(STOP)?);
        assert_eq!((Line::Sent, Some(Event::List)), get_event(LIST)?);
        assert_eq!((Line::Sent, Some(Event::Folders)), get_event(FOLDERS)?);
        assert_eq!((Line::Sent, Some(Event::Reload)), get_event(RELOAD)?);
        assert_eq!((Line::Done, Some(Event::Quit)), get_event(QUIT)?);
        Ok(())
    }

    #[test]
    fn test_keyboard_ignores_bad_input() -> Result<(), io::Error> {
        assert_eq!((Line::Ignored, None), get_event("unrecognized\n")?);
        assert_eq!((Line::Ignored, None), get_event("play\n")?);
        assert_eq!((Line::Ignored, None), get_event("0\n")?);
        assert_eq!((Line::Ignored, None), get_event("stop now\n")?);
        assert_eq!((Line::Ignored, None), get_event("\n")?);
        assert_eq!((Line::Done, None), get_event("")?);
        Ok(())
    }

    #[test]
    fn test_parse_keeps_id_case() {
        assert_eq!(
            Driver::parse("  Play  Fx%Boom  "),
            Some(Event::Tap("Fx%Boom".to_string()))
        );
    }

    #[test]
    fn test_prompts_only_when_idle() -> Result<(), Box<dyn std::error::Error>> {
        let (events_tx, events_rx) = crossbeam_channel::unbounded::<Event>();
        let (idle_tx, idle_rx) = crossbeam_channel::unbounded::<()>();

        let monitor = thread::spawn(move || {
            let reader = BufReader::new("list\nbogus\nstop\nquit\n".as_bytes());
            Driver::monitor(&events_tx, &idle_rx, reader, io::sink())
        });
        let wait = Duration::from_millis(100);

        // Nothing is read until the board has been shown.
        assert!(events_rx.recv_timeout(wait).is_err());
        idle_tx.send(())?;
        assert_eq!(events_rx.recv_timeout(Duration::from_secs(3))?, Event::List);

        // The next prompt waits for the controller to handle the event.
        assert!(events_rx.recv_timeout(wait).is_err());
        // The unrecognized line sends nothing, so the one after it follows
        // without another wait.
        idle_tx.send(())?;
        assert_eq!(events_rx.recv_timeout(Duration::from_secs(3))?, Event::StopAll);

        idle_tx.send(())?;
        assert_eq!(events_rx.recv_timeout(Duration::from_secs(3))?, Event::Quit);
        assert!(monitor.join().is_ok_and(|result| result.is_ok()));
        Ok(())
    }

    #[test]
    fn test_monitor_ends_when_controller_closes() {
        let (events_tx, events_rx) = crossbeam_channel::unbounded::<Event>();
        let (idle_tx, idle_rx) = crossbeam_channel::unbounded::<()>();
        drop(idle_tx);

        let reader = BufReader::new("list\n".as_bytes());
        assert!(Driver::monitor(&events_tx, &idle_rx, reader, io::sink()).is_ok());
        assert!(events_rx.try_recv().is_err());
    }
}
