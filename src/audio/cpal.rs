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
use std::path::Path;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, span, Level};

use super::clip::Clip;
use super::decode::decode_file;
use super::error::EngineError;
use super::mixer::{ActiveVoice, Mixer};
use super::voice::{Voice, VoiceId};
use crate::config;

/// The device name that selects the host's default output device.
pub const DEFAULT_DEVICE: &str = "default";

/// Extracts a device name via `description()`.
fn device_name(device: &cpal::Device) -> Result<String, EngineError> {
    device
        .description()
        .map(|d| d.name().to_string())
        .map_err(EngineError::device)
}

/// Describes an output device for listing.
pub struct DeviceInfo {
    /// The name of the device.
    pub name: String,
    /// The maximum number of channels the device supports.
    pub max_channels: u16,
    /// The host the device belongs to.
    pub host_id: cpal::HostId,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// A playback engine that mixes voices into a cpal output stream.
pub struct Engine {
    /// The name of the device.
    name: String,
    /// The number of output channels of the stream.
    num_channels: u16,
    /// The output sample rate. Clips are resampled to it at load time.
    sample_rate: u32,
    /// New voices for the stream callback.
    voice_tx: Sender<ActiveVoice>,
    /// Completion notifications from the stream callback.
    completion_rx: Receiver<VoiceId>,
    /// Dropping this sender shuts the output thread down.
    shutdown_tx: Option<Sender<()>>,
    /// Handle to the output thread, which owns the stream.
    output_thread: Option<thread::JoinHandle<()>>,
}

/// Builds the stream callback: drains new voices, mixes, and converts to the
/// device's sample type.
fn create_callback<T>(
    mut mixer: Mixer,
    voice_rx: Receiver<ActiveVoice>,
    completion_tx: Sender<VoiceId>,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        while let Ok(voice) = voice_rx.try_recv() {
            mixer.add(voice);
        }

        scratch.resize(data.len(), 0.0);
        for id in mixer.process_into(&mut scratch) {
            // The receiver only goes away when the engine is being dropped.
            let _ = completion_tx.send(id);
        }

        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Mixer,
    voice_rx: Receiver<ActiveVoice>,
    completion_tx: Sender<VoiceId>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    device.build_output_stream(
        config,
        create_callback::<T>(mixer, voice_rx, completion_tx),
        |err| error!("cpal output stream error: {}", err),
        None,
    )
}

impl Engine {
    /// Lists the output devices of every available host.
    pub fn list() -> Result<Vec<DeviceInfo>, EngineError> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<DeviceInfo> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id).map_err(EngineError::device)?;
            let host_devices = match host.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs
                    .map(|config| config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(DeviceInfo {
                        name: device_name(&device)?,
                        max_channels,
                        host_id,
                    });
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Finds the configured output device, or the host default.
    fn find_device(name: &str) -> Result<cpal::Device, EngineError> {
        let host = cpal::default_host();
        if name == DEFAULT_DEVICE {
            return host
                .default_output_device()
                .ok_or_else(|| EngineError::Device("no default output device".to_string()));
        }

        let devices = host.output_devices().map_err(EngineError::device)?;
        for device in devices {
            if device_name(&device).is_ok_and(|device_name| device_name.trim() == name) {
                return Ok(device);
            }
        }
        Err(EngineError::Device(format!(
            "no device found with name {}",
            name
        )))
    }

    /// Opens the configured device and starts its output stream.
    pub fn get(config: &config::Audio) -> Result<Engine, EngineError> {
        let device = Engine::find_device(config.device())?;
        let name = device_name(&device)?;
        let supported = device
            .default_output_config()
            .map_err(EngineError::device)?;
        let sample_format = supported.sample_format();
        let stream_config = supported.config();
        let num_channels = stream_config.channels;
        let sample_rate = stream_config.sample_rate;

        let (voice_tx, voice_rx) = crossbeam_channel::unbounded::<ActiveVoice>();
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded::<VoiceId>();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), EngineError>>(1);

        // The stream is created inside the thread, as it can't be moved between threads.
        let thread_name = name.clone();
        let output_thread = thread::spawn(move || {
            let span = span!(Level::INFO, "output stream (cpal)");
            let _enter = span.enter();

            let mixer = Mixer::new(num_channels);
            let stream = match sample_format {
                cpal::SampleFormat::F32 => build_stream::<f32>(
                    &device,
                    &stream_config,
                    mixer,
                    voice_rx,
                    completion_tx,
                ),
                cpal::SampleFormat::I16 => build_stream::<i16>(
                    &device,
                    &stream_config,
                    mixer,
                    voice_rx,
                    completion_tx,
                ),
                cpal::SampleFormat::I32 => build_stream::<i32>(
                    &device,
                    &stream_config,
                    mixer,
                    voice_rx,
                    completion_tx,
                ),
                cpal::SampleFormat::U16 => build_stream::<u16>(
                    &device,
                    &stream_config,
                    mixer,
                    voice_rx,
                    completion_tx,
                ),
                other => {
                    let _ = ready_tx.send(Err(EngineError::Device(format!(
                        "unsupported sample format {:?}",
                        other
                    ))));
                    return;
                }
            };

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(EngineError::device(e)));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(EngineError::device(e)));
                return;
            }

            info!(
                device = thread_name,
                channels = num_channels,
                sample_rate,
                "Output stream started."
            );
            let _ = ready_tx.send(Ok(()));

            // Keep the stream alive until the engine is dropped.
            let _ = shutdown_rx.recv();
            info!(device = thread_name, "Output stream stopped.");
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = output_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = output_thread.join();
                return Err(EngineError::Device(
                    "output thread exited unexpectedly".to_string(),
                ));
            }
        }

        Ok(Engine {
            name,
            num_channels,
            sample_rate,
            voice_tx,
            completion_rx,
            shutdown_tx: Some(shutdown_tx),
            output_thread: Some(output_thread),
        })
    }
}

impl super::Engine for Engine {
    fn load(&self, path: &Path, name: &str) -> Result<Clip, EngineError> {
        let clip = decode_file(path, name)?;
        if clip.sample_rate() != self.sample_rate {
            info!(
                clip = name,
                source_rate = clip.sample_rate(),
                target_rate = self.sample_rate,
                "Resampling clip"
            );
        }
        Ok(clip.resampled(self.sample_rate))
    }

    fn start(&self, clip: &Clip, volume: f32) -> Result<Voice, EngineError> {
        let voice = Voice::new(clip.name());
        voice.begin();
        self.voice_tx
            .send(ActiveVoice::new(voice.clone(), clip.clone(), volume))
            .map_err(|_| EngineError::Device("output stream is closed".to_string()))?;
        Ok(voice)
    }

    fn stop(&self, voice: &Voice) {
        // The stream callback drops stopped voices on its next block.
        voice.halt();
    }

    fn completions(&self) -> Receiver<VoiceId> {
        self.completion_rx.clone()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        drop(self.shutdown_tx.take());
        if let Some(thread) = self.output_thread.take() {
            if thread.join().is_err() {
                error!(device = self.name, "Output thread panicked.");
            }
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, {}Hz)",
            self.name, self.num_channels, self.sample_rate
        )
    }
}
