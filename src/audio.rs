//! Real-time audio output using cpal
//! Works with JACK, ALSA, OpenSL ES (Android/Termux), etc.
//!
//! The stream callback locks the shared signal graph and renders one mono
//! frame per output frame, copied to every channel.

use crate::error::{PrimefieldError, Result};
use crate::synth::graph::{lock_graph, SignalGraph};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// The default output device and its preferred configuration.
pub struct AudioDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

impl AudioDevice {
    pub fn default_output() -> Result<Self> {
        // Get the default audio host (JACK/ALSA/OpenSL ES/etc)
        let host = cpal::default_host();
        info!("Audio host: {:?}", host.id());

        let device = host
            .default_output_device()
            .ok_or_else(|| PrimefieldError::AudioDevice("No audio output device found".into()))?;
        info!("Audio device: {}", device.name()?);

        let config = device.default_output_config()?;
        info!("Audio config: {:?}", config);

        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    /// Build and start a stream that renders `graph`.
    pub fn start(self, graph: Arc<Mutex<SignalGraph>>) -> Result<AudioOutput> {
        let channels = self.config.channels() as usize;
        let sample_rate = self.sample_rate();
        let stream_config: cpal::StreamConfig = self.config.config();

        let stream = match self.config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&self.device, &stream_config, graph, channels)
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&self.device, &stream_config, graph, channels)
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&self.device, &stream_config, graph, channels)
            }
            other => return Err(PrimefieldError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream.play()?;
        info!("Audio stream started at {} Hz, {} channels", sample_rate, channels);

        Ok(AudioOutput {
            sample_rate,
            _stream: stream,
        })
    }
}

/// A running output stream. Dropping it stops audio.
pub struct AudioOutput {
    sample_rate: u32,
    _stream: cpal::Stream,
}

impl AudioOutput {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    graph: Arc<Mutex<SignalGraph>>,
    channels: usize,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut mono: Vec<f32> = Vec::new();
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels.max(1);
            mono.resize(frames, 0.0);
            lock_graph(&graph).process(&mut mono);

            for (frame, sample) in data.chunks_mut(channels.max(1)).zip(&mono) {
                for channel in frame.iter_mut() {
                    *channel = T::from_sample(*sample);
                }
            }
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )?;

    Ok(stream)
}
