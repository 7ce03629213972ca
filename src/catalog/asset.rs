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
use std::path::{Path, PathBuf};

/// A sound that can be played from the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundAsset {
    /// Unique identifier, derived from the file name without its extension.
    id: String,
    /// The folder this sound belongs to, if any.
    folder: Option<String>,
    /// The name shown on the button. Never empty.
    display_name: String,
    /// The file backing this sound.
    path: PathBuf,
}

impl SoundAsset {
    /// Derives folder and display name by splitting the id on the first
    /// separator. `drums%kick` is `kick` in folder `drums`; `kick` has no folder.
    ///
    /// An empty prefix such as `%kick` gives no folder rather than a folder
    /// named `""`, so the folder menu never shows a blank entry. An empty
    /// remainder such as `drums%` keeps the whole id as the display name.
    pub fn from_separated(id: &str, separator: char, path: PathBuf) -> SoundAsset {
        let (folder, display_name) = match id.split_once(separator) {
            Some((folder, name)) => {
                let folder = (!folder.is_empty()).then(|| folder.to_string());
                let display_name = if name.is_empty() { id } else { name };
                (folder, display_name.to_string())
            }
            None => (None, id.to_string()),
        };

        SoundAsset {
            id: id.to_string(),
            folder,
            display_name,
            path,
        }
    }

    /// Builds an asset whose folder is the directory it was found in. The id
    /// is qualified by the folder so that equal file names in different
    /// folders stay distinct.
    pub fn from_directory(folder: Option<&str>, name: &str, path: PathBuf) -> SoundAsset {
        let folder = folder.filter(|f| !f.is_empty());
        let id = match folder {
            Some(folder) => format!("{}/{}", folder, name),
            None => name.to_string(),
        };
        let display_name = if name.is_empty() {
            id.clone()
        } else {
            name.to_string()
        };

        SoundAsset {
            id,
            folder: folder.map(str::to_string),
            display_name,
            path,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SoundAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.folder {
            Some(folder) => write!(f, "{} ({})", self.display_name, folder),
            None => write!(f, "{}", self.display_name),
        }
    }
}
