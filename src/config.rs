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
use std::error::Error;
use std::io::Write;

use tracing::info;

use crate::catalog::Catalog;
use crate::controller::Controller;
use crate::playback::PlaybackPool;

mod audio;
mod board;
mod error;

pub use audio::Audio;
pub use board::{Board, Naming};
pub use error::ConfigError;

/// Initializes the engine, catalog, pool and controller from the board
/// configuration. The controller renders to `out`.
pub fn init_controller<W: Write>(
    board: &Board,
    out: W,
) -> Result<Controller<W>, Box<dyn Error>> {
    let audio = board.audio();
    let engine = crate::audio::get_engine(&audio)?;
    info!(engine = %engine, volume = audio.volume(), "Opened audio engine.");

    let catalog = Catalog::open(&board.assets(), board.naming_scheme()?, board.extension());
    let completions = engine.completions();
    let pool = PlaybackPool::new(engine, board.sweep()).with_volume(audio.volume());

    Ok(Controller::new(catalog, pool, completions, out))
}
