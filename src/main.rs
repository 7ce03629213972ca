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
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{crate_version, Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use soundboard::audio;
use soundboard::catalog::{Catalog, NamingScheme, DEFAULT_EXTENSION, DEFAULT_SEPARATOR};
use soundboard::config::{self, Audio, Board};
use soundboard::controller::keyboard;
use soundboard::folders::FolderSelection;
use soundboard::playback::{PlayError, PlaybackPool, SweepPolicy};

/// The configuration file used when none is given.
const DEFAULT_CONFIG: &str = "soundboard.yaml";

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A soundboard for short audio clips."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

/// Where sounds are read from and how their folders are named.
#[derive(Args)]
struct SourceArgs {
    /// The directory containing the sound files.
    path: PathBuf,
    /// Derive folders from subdirectories instead of file names.
    #[arg(short, long)]
    subdirectories: bool,
    /// The extension of the sound files.
    #[arg(short, long, default_value = DEFAULT_EXTENSION)]
    extension: String,
    /// The character between folder and name in file names.
    #[arg(long, default_value_t = DEFAULT_SEPARATOR)]
    separator: char,
}

impl SourceArgs {
    fn open(&self) -> Catalog {
        let scheme = if self.subdirectories {
            NamingScheme::Subdirectory
        } else {
            NamingScheme::Separator(self.separator)
        };
        Catalog::open(&self.path, scheme, self.extension.trim_start_matches('.'))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the sounds in the given directory, sorted by id.
    List {
        #[command(flatten)]
        source: SourceArgs,
        /// Only list sounds in this folder.
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Lists the folder menu for the given directory.
    Folders {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Plays sounds through the audio interface and waits for them to finish.
    Play {
        #[command(flatten)]
        source: SourceArgs,
        /// The ids of the sounds to play. They play over each other.
        #[arg(required = true)]
        ids: Vec<String>,
        /// The device name to play through.
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Start will start the interactive soundboard.
    Start {
        /// The path to the board config. Defaults to soundboard.yaml if present.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// The directory containing the sound files. Overrides the config.
        path: Option<String>,
        /// The device name to play through. Overrides the config.
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Writes a board config with the defaults for the given directory.
    Init {
        /// The directory containing the sound files.
        path: String,
        /// Where to write the config.
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { source, folder } => {
            let mut catalog = source.open();
            catalog.select_folder(FolderSelection::from_option(folder.as_deref()));

            let visible = catalog.visible();
            if visible.is_empty() {
                println!("No sounds found in {}.", source.path.display());
                return Ok(());
            }

            println!("{} (count: {}):", catalog.title(), visible.len());
            for asset in visible {
                println!("- {}: {}", asset.id(), asset);
            }
        }
        Commands::Folders { source } => {
            let catalog = source.open();

            println!("Folders (count: {}):", catalog.folders().len());
            for entry in catalog.menu() {
                println!("- {}", entry);
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Play {
            source,
            ids,
            device,
        } => {
            let catalog = source.open();
            let audio = match device {
                Some(device) => Audio::new(&device),
                None => Audio::default(),
            };
            let engine = audio::get_engine(&audio)?;
            let completions = engine.completions();
            let mut pool = PlaybackPool::new(engine, SweepPolicy::AllFinished);

            for id in ids {
                let asset = catalog
                    .find(&id)
                    .ok_or_else(|| PlayError::AssetNotFound(id.clone()))?;
                pool.play(asset)?;
            }

            while pool.iter().any(|handle| handle.is_playing()) {
                if let Ok(id) = completions.recv_timeout(Duration::from_millis(100)) {
                    pool.on_completed(id);
                }
            }
            pool.sweep();
        }
        Commands::Start {
            config: config_path,
            path,
            device,
        } => {
            let mut board = match config_path {
                Some(config_path) => Board::deserialize(&config_path)?,
                None if Path::new(DEFAULT_CONFIG).is_file() => {
                    Board::deserialize(Path::new(DEFAULT_CONFIG))?
                }
                None => Board::default(),
            };
            if let Some(path) = path {
                board.set_assets(&path);
            }
            if let Some(device) = device {
                board.set_device(&device);
            }

            let mut controller = config::init_controller(&board, io::stdout())?;
            if let Err(e) = controller.run(Arc::new(keyboard::Driver::new())) {
                error!(err = %e, "Soundboard stopped.");
                return Err(e.into());
            }
        }
        Commands::Init { path, output } => {
            let board = Board::new(&path);
            board.save(&output)?;

            let catalog = Catalog::open(
                &board.assets(),
                board.naming_scheme()?,
                board.extension(),
            );
            println!("Wrote {}.", output.display());
            println!(
                "Found {} sounds in {} folders under {}.",
                catalog.len(),
                catalog.folders().len(),
                path
            );
        }
    }

    Ok(())
}
