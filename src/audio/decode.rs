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

//! Whole-file decoding of sound assets.
//!
//! Clips are short, so they are decoded entirely into memory up front. This
//! uses symphonia, so MP3, WAV, FLAC, OGG and the other formats it supports
//! all load the same way.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use super::clip::Clip;
use super::error::EngineError;
use crate::util::filename_display;

/// Decodes the file at the given path into an in-memory clip named `name`.
pub fn decode_file(path: &Path, name: &str) -> Result<Clip, EngineError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => EngineError::NotFound(path.to_path_buf()),
        _ => EngineError::Io(e),
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create a hint to help the format registry guess the format
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::decode(path, e))?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::decode(path, "no audio track found"))?;
    let track_id = track.id;
    let mut channel_count = track.codec_params.channels.map(|c| c.count() as u16);
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| EngineError::decode(path, e))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            // A new stream would start here; a clip only ever plays the first one.
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(EngineError::decode(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channel_count = Some(spec.channels.count() as u16);
                sample_rate = Some(spec.rate);

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt packets are skipped rather than failing the whole clip.
                warn!(
                    file = filename_display(path),
                    err = e,
                    "Skipping undecodable packet"
                );
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(EngineError::decode(path, e)),
        }
    }

    let channel_count = match channel_count {
        Some(count) if count > 0 => count,
        _ => return Err(EngineError::decode(path, "unable to determine channel count")),
    };
    let sample_rate =
        sample_rate.ok_or_else(|| EngineError::decode(path, "sample rate not specified"))?;

    let clip = Clip::new(name, samples, channel_count, sample_rate);
    debug!(
        file = filename_display(path),
        channels = channel_count,
        sample_rate,
        duration_ms = clip.duration().as_millis(),
        "Decoded clip"
    );
    Ok(clip)
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::fs;

    use crate::audio::EngineError;
    use crate::testutil::write_wav;

    use super::decode_file;

    #[test]
    fn test_decode_mono_wav() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("kick.wav");
        write_wav(path.clone(), vec![vec![0.25f32; 4410]], 44100)?;

        let clip = decode_file(&path, "kick")?;

        assert_eq!(clip.name(), "kick");
        assert_eq!(clip.channel_count(), 1);
        assert_eq!(clip.sample_rate(), 44100);
        assert_eq!(clip.frames(), 4410);
        assert!((clip.samples()[0] - 0.25).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_decode_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.wav");

        match decode_file(&path, "missing") {
            Err(EngineError::NotFound(missing)) => assert_eq!(missing, path),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.wav");
        fs::write(&path, b"definitely not audio")?;

        match decode_file(&path, "broken") {
            Err(EngineError::Decode { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected decode error, got {:?}", other),
        }
        Ok(())
    }
}
