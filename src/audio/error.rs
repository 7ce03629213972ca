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
use std::path::PathBuf;

/// Error types for playback engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Audio file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unable to decode '{}': {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio device error: {0}")]
    Device(String),
}

impl EngineError {
    /// Builds a decode error for the given path.
    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> EngineError {
        EngineError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a device error from any displayable backend error.
    pub fn device(err: impl ToString) -> EngineError {
        EngineError::Device(err.to_string())
    }
}
