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

//! The folder index: the distinct folders present in a catalog, and the
//! selection menu built from them.

use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::SoundAsset;

/// The label of the synthetic menu entry that clears the folder filter.
pub const ALL_LABEL: &str = "All";

/// A folder filter choice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FolderSelection {
    /// No filter: every asset is shown.
    #[default]
    All,
    /// Only assets in the named folder are shown.
    Folder(String),
}

impl FolderSelection {
    /// Converts an optional folder name into a selection.
    pub fn from_option(folder: Option<&str>) -> FolderSelection {
        match folder {
            Some(folder) => FolderSelection::Folder(folder.to_string()),
            None => FolderSelection::All,
        }
    }

    /// Returns the selected folder, or None when nothing is filtered.
    pub fn folder(&self) -> Option<&str> {
        match self {
            FolderSelection::All => None,
            FolderSelection::Folder(folder) => Some(folder.as_str()),
        }
    }

    /// Returns true if the asset passes this filter.
    pub fn matches(&self, asset: &SoundAsset) -> bool {
        match self {
            FolderSelection::All => true,
            FolderSelection::Folder(folder) => asset.folder() == Some(folder.as_str()),
        }
    }
}

impl fmt::Display for FolderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderSelection::All => f.write_str(ALL_LABEL),
            FolderSelection::Folder(folder) => f.write_str(folder),
        }
    }
}

/// Returns the distinct folders of the given assets, sorted ascending.
/// Assets without a folder are ignored.
pub fn list_folders<'a, I>(assets: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a SoundAsset>,
{
    assets
        .into_iter()
        .filter_map(|asset| asset.folder())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Builds the folder selection menu: "All" first, then every folder.
pub fn menu(folders: &[String]) -> Vec<FolderSelection> {
    std::iter::once(FolderSelection::All)
        .chain(folders.iter().cloned().map(FolderSelection::Folder))
        .collect()
}
