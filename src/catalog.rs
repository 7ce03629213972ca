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

//! Discovery of the sound assets on disk.
//!
//! A catalog is built once per asset source and then filtered in memory as
//! folders are selected. Scanning never fails: a directory that can't be read
//! simply contributes no assets.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::folders::{self, FolderSelection};
use crate::util::{filename_display, is_hidden};

mod asset;

pub use asset::SoundAsset;

/// The extension of sound files when none is configured.
pub const DEFAULT_EXTENSION: &str = "mp3";

/// The character that separates folder and name in a file name.
pub const DEFAULT_SEPARATOR: char = '%';

/// The title shown when no folder is selected.
pub const DEFAULT_TITLE: &str = "Soundboard";

/// How folder membership is derived from the asset source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamingScheme {
    /// Flat directory; the file name is `<folder><separator><name>` or just `<name>`.
    Separator(char),
    /// Nested directories; a file's folder is the directory it lives in.
    Subdirectory,
}

impl Default for NamingScheme {
    fn default() -> Self {
        NamingScheme::Separator(DEFAULT_SEPARATOR)
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingScheme::Separator(separator) => write!(f, "separator '{}'", separator),
            NamingScheme::Subdirectory => f.write_str("subdirectory"),
        }
    }
}

/// Scans the source directory for sound files with the given extension,
/// optionally keeping only those in `folder`. The result is sorted by id
/// using an ordinal comparison. Unreadable directories yield no assets.
pub fn scan(
    source: &Path,
    scheme: NamingScheme,
    extension: &str,
    folder: Option<&str>,
) -> Vec<SoundAsset> {
    let mut assets = Vec::new();
    match scheme {
        NamingScheme::Separator(separator) => {
            scan_flat(source, separator, extension, &mut assets)
        }
        NamingScheme::Subdirectory => scan_nested(source, None, extension, &mut assets),
    }

    if let Some(folder) = folder {
        assets.retain(|asset| asset.folder() == Some(folder));
    }

    // Stable, so equal ids keep their enumeration order.
    assets.sort_by(|a, b| a.id().cmp(b.id()));

    debug!(
        source = ?source,
        count = assets.len(),
        folder = ?folder,
        "Scanned sound assets"
    );
    assets
}

/// Lists the visible entries of a directory, logging anything unreadable.
fn read_entries(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = ?dir, err = %e, "Unable to read sound directory");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(dir = ?dir, err = %e, "Unable to read directory entry");
                None
            }
        })
        .filter(|path| !is_hidden(path))
        .collect();

    // Directory order is platform dependent; fix it so rescans are repeatable.
    paths.sort();
    paths
}

/// Returns the file stem if the path is a sound file with the given extension.
fn sound_stem<'a>(path: &'a Path, extension: &str) -> Option<&'a str> {
    if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
        return None;
    }

    match path.file_stem().and_then(|stem| stem.to_str()) {
        Some(stem) if !stem.is_empty() => Some(stem),
        Some(_) => None,
        None => {
            warn!(path = ?path, "Skipping sound file with unreadable name");
            None
        }
    }
}

fn scan_flat(source: &Path, separator: char, extension: &str, assets: &mut Vec<SoundAsset>) {
    for path in read_entries(source) {
        if let Some(stem) = sound_stem(&path, extension) {
            assets.push(SoundAsset::from_separated(stem, separator, path.clone()));
        }
    }
}

/// Returns true if the path itself is a symbolic link. Links to directories
/// can point back up the tree, so the nested scan never follows them.
fn is_symlink(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(metadata) => metadata.file_type().is_symlink(),
        Err(e) => {
            warn!(path = ?path, err = %e, "Unable to read directory entry");
            true
        }
    }
}

fn scan_nested(
    dir: &Path,
    folder: Option<&str>,
    extension: &str,
    assets: &mut Vec<SoundAsset>,
) {
    for path in read_entries(dir) {
        if path.is_dir() {
            if is_symlink(&path) {
                warn!(path = ?path, "Skipping linked sound directory");
                continue;
            }
            let name = filename_display(&path);
            let child = match folder {
                Some(folder) => format!("{}/{}", folder, name),
                None => name.to_string(),
            };
            scan_nested(&path, Some(&child), extension, assets);
            continue;
        }

        if let Some(stem) = sound_stem(&path, extension) {
            assets.push(SoundAsset::from_directory(folder, stem, path.clone()));
        }
    }
}

/// The sounds available on the board, and the current folder filter.
pub struct Catalog {
    /// The directory the assets are read from.
    source: PathBuf,
    /// How folders are derived.
    scheme: NamingScheme,
    /// The extension of sound files.
    extension: String,
    /// Every asset in the source, sorted by id.
    assets: Vec<SoundAsset>,
    /// The active folder filter.
    selection: FolderSelection,
}

impl Catalog {
    /// Scans the source and creates a catalog showing every asset.
    pub fn open(source: &Path, scheme: NamingScheme, extension: &str) -> Catalog {
        let assets = scan(source, scheme, extension, None);
        info!(
            source = ?source,
            naming = %scheme,
            count = assets.len(),
            "Opened sound catalog"
        );
        Catalog {
            source: source.to_path_buf(),
            scheme,
            extension: extension.to_string(),
            assets,
            selection: FolderSelection::All,
        }
    }

    /// Rescans the source. The folder filter is kept.
    pub fn reload(&mut self) {
        self.assets = scan(&self.source, self.scheme, &self.extension, None);
        info!(
            source = ?self.source,
            count = self.assets.len(),
            "Reloaded sound catalog"
        );
    }

    /// Applies a folder filter. Selecting a folder that has no assets is
    /// allowed and shows an empty board.
    pub fn select_folder(&mut self, selection: FolderSelection) {
        info!(folder = %selection, "Selected folder");
        self.selection = selection;
    }

    pub fn selection(&self) -> &FolderSelection {
        &self.selection
    }

    /// Returns the screen title: the selected folder, or the board name.
    pub fn title(&self) -> &str {
        self.selection.folder().unwrap_or(DEFAULT_TITLE)
    }

    /// Returns the assets passing the current filter, in sorted order.
    pub fn visible(&self) -> Vec<&SoundAsset> {
        self.assets
            .iter()
            .filter(|asset| self.selection.matches(asset))
            .collect()
    }

    /// Returns the visible asset at the given position.
    pub fn visible_at(&self, index: usize) -> Option<&SoundAsset> {
        self.assets
            .iter()
            .filter(|asset| self.selection.matches(asset))
            .nth(index)
    }

    /// Finds a visible asset by id.
    pub fn find(&self, id: &str) -> Option<&SoundAsset> {
        self.assets
            .iter()
            .find(|asset| asset.id() == id && self.selection.matches(asset))
    }

    /// Returns the folders present in the source, sorted ascending.
    pub fn folders(&self) -> Vec<String> {
        folders::list_folders(&self.assets)
    }

    /// Returns the folder selection menu, starting with "All".
    pub fn menu(&self) -> Vec<FolderSelection> {
        folders::menu(&self.folders())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("source", &self.source)
            .field("scheme", &self.scheme)
            .field("assets", &self.assets.len())
            .field("selection", &self.selection)
            .finish()
    }
}
