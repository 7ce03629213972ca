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
use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use super::audio::Audio;
use super::error::ConfigError;
use crate::audio::cpal::DEFAULT_DEVICE;
use crate::catalog::{NamingScheme, DEFAULT_EXTENSION, DEFAULT_SEPARATOR};
use crate::playback::SweepPolicy;
use crate::util::single_char;

/// How folder membership is encoded in the asset source.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Naming {
    /// Folder and name are joined in the file name by a separator.
    #[default]
    Separator,
    /// Folders are real subdirectories.
    Subdirectory,
}

/// The configuration for the soundboard.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Board {
    /// The directory containing the sound files.
    #[serde(skip_serializing_if = "Option::is_none")]
    assets: Option<String>,

    /// The extension of the sound files (default: mp3).
    #[serde(skip_serializing_if = "Option::is_none")]
    extension: Option<String>,

    /// How folders are derived (default: separator).
    #[serde(skip_serializing_if = "Option::is_none")]
    naming: Option<Naming>,

    /// The folder separator for the separator naming scheme (default: %).
    #[serde(skip_serializing_if = "Option::is_none")]
    separator: Option<String>,

    /// Which finished handles are reclaimed after each play (default: first_finished).
    #[serde(skip_serializing_if = "Option::is_none")]
    sweep: Option<SweepPolicy>,

    /// The audio configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<Audio>,
}

impl Board {
    /// Creates a board configuration with every default spelled out.
    pub fn new(assets: &str) -> Board {
        Board {
            assets: Some(assets.to_string()),
            extension: Some(DEFAULT_EXTENSION.to_string()),
            naming: Some(Naming::Separator),
            separator: Some(DEFAULT_SEPARATOR.to_string()),
            sweep: Some(SweepPolicy::default()),
            audio: Some(Audio::new(DEFAULT_DEVICE)),
        }
    }

    /// Parse a board configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Board, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Board>()?)
    }

    /// Writes the configuration as YAML. Existing files are never overwritten.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let serialized = serde_yml::to_string(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Returns the directory containing the sound files (default: the current directory).
    pub fn assets(&self) -> PathBuf {
        PathBuf::from(self.assets.as_deref().unwrap_or("."))
    }

    pub fn set_assets(&mut self, assets: &str) {
        self.assets = Some(assets.to_string());
    }

    /// Returns the sound file extension, without a leading dot.
    pub fn extension(&self) -> &str {
        self.extension
            .as_deref()
            .map(|ext| ext.trim_start_matches('.'))
            .unwrap_or(DEFAULT_EXTENSION)
    }

    /// Returns the naming scheme, validating the separator.
    pub fn naming_scheme(&self) -> Result<NamingScheme, ConfigError> {
        match self.naming.unwrap_or_default() {
            Naming::Subdirectory => Ok(NamingScheme::Subdirectory),
            Naming::Separator => match self.separator.as_deref() {
                None => Ok(NamingScheme::Separator(DEFAULT_SEPARATOR)),
                Some(separator) => single_char(separator)
                    .map(NamingScheme::Separator)
                    .ok_or_else(|| ConfigError::InvalidSeparator(separator.to_string())),
            },
        }
    }

    pub fn sweep(&self) -> SweepPolicy {
        self.sweep.unwrap_or_default()
    }

    /// Returns the audio configuration, or the defaults.
    pub fn audio(&self) -> Audio {
        self.audio.clone().unwrap_or_default()
    }

    pub fn set_device(&mut self, device: &str) {
        let audio = self.audio.take().unwrap_or_default();
        self.audio = Some(audio.with_device(device));
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::fs;
    use std::path::PathBuf;

    use config::{Config, File, FileFormat};

    use crate::catalog::NamingScheme;
    use crate::config::ConfigError;
    use crate::playback::SweepPolicy;

    use super::Board;

    fn parse(yaml: &str) -> Board {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_board_defaults() {
        let board = parse("{}");
        assert_eq!(board.assets(), PathBuf::from("."));
        assert_eq!(board.extension(), "mp3");
        assert_eq!(board.naming_scheme().unwrap(), NamingScheme::Separator('%'));
        assert_eq!(board.sweep(), SweepPolicy::FirstFinished);
        assert_eq!(board.audio().device(), "default");
    }

    #[test]
    fn test_board_deserialize() {
        let board = parse(
            r#"
            assets: /srv/sounds
            extension: .wav
            naming: subdirectory
            sweep: all_finished
            audio:
              device: mock-device
              volume: 0.5
        "#,
        );

        assert_eq!(board.assets(), PathBuf::from("/srv/sounds"));
        assert_eq!(board.extension(), "wav");
        assert_eq!(board.naming_scheme().unwrap(), NamingScheme::Subdirectory);
        assert_eq!(board.sweep(), SweepPolicy::AllFinished);
        assert_eq!(board.audio().device(), "mock-device");
        assert_eq!(board.audio().volume(), 0.5);
    }

    #[test]
    fn test_board_custom_separator() {
        let board = parse("separator: \"#\"");
        assert_eq!(board.naming_scheme().unwrap(), NamingScheme::Separator('#'));

        let board = parse("separator: \"--\"");
        assert!(matches!(
            board.naming_scheme(),
            Err(ConfigError::InvalidSeparator(_))
        ));
    }

    #[test]
    fn test_set_device_keeps_volume() {
        let mut board = parse(
            r#"
            audio:
              volume: 0.25
        "#,
        );
        board.set_device("mock-override");
        assert_eq!(board.audio().device(), "mock-override");
        assert_eq!(board.audio().volume(), 0.25);
    }

    #[test]
    fn test_save_and_reload() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("soundboard.yaml");

        Board::new("/srv/sounds").save(&path)?;
        let reloaded = Board::deserialize(&path)?;
        assert_eq!(reloaded.assets(), PathBuf::from("/srv/sounds"));
        assert_eq!(reloaded.naming_scheme()?, NamingScheme::Separator('%'));

        // A second save must not clobber the file.
        fs::write(&path, "assets: keep-me\n")?;
        assert!(matches!(
            Board::new("/other").save(&path),
            Err(ConfigError::AlreadyExists(_))
        ));
        assert_eq!(fs::read_to_string(&path)?, "assets: keep-me\n");
        Ok(())
    }
}
