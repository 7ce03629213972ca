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
use thiserror::Error;

use crate::audio::EngineError;

/// Reasons a sound could not be played. The pool is unchanged in every case.
#[derive(Error, Debug)]
pub enum PlayError {
    #[error("no sound file found for '{0}'")]
    AssetNotFound(String),

    #[error("unable to load '{id}': {source}")]
    Load {
        id: String,
        #[source]
        source: EngineError,
    },
}

impl PlayError {
    /// Returns the id of the asset that failed to play.
    pub fn asset_id(&self) -> &str {
        match self {
            PlayError::AssetNotFound(id) => id,
            PlayError::Load { id, .. } => id,
        }
    }
}
