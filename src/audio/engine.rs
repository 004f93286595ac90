// Moteur audio - Contexte de sortie CPAL temps-réel
//
// # Format Support
//
// Le stream est créé dans le format préféré du device (F32, I16 ou U16).
// Le mixage se fait en f32 mono, puis `write_mono_to_interleaved_frame()`
// convertit et duplique chaque échantillon sur tous les canaux.
//
// # Threads
//
// Le callback possède le `Mixer` et la sortie du ringbuffer de commandes.
// Le thread de contrôle ne fait que pousser des commandes horodatées et lire
// l'horloge partagée; il n'attend jamais le callback. Les voix lointaines
// restent dans `VoiceStaging` côté contrôle et ne sont envoyées qu'à
// l'approche de leur départ (`forward_due`).
//
// Note: sur macOS (CoreAudio) le `Stream` n'est pas Send, le contexte reste
// donc sur le thread qui l'a ouvert.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Observer, Producer};
use std::sync::{Arc, Mutex};

use super::clock::AudioClock;
use super::context::{AudioContext, BusId};
use super::format_conversion::write_mono_to_interleaved_frame;
use super::mixer::Mixer;
use super::staging::{FORWARD_WINDOW, VoiceStaging};
use super::{AudioError, AudioResult};
use crate::messaging::channels::{
    COMMAND_RINGBUFFER_CAPACITY, CommandConsumer, CommandProducer, NotificationProducer,
    create_command_channel,
};
use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::synth::ScheduledVoice;

/// Largest block rendered in one mixer call (scratch buffer size)
const MAX_BLOCK_FRAMES: usize = 1024;

pub struct CpalContext {
    _device: Device,
    stream: Stream,
    sample_rate: f32,
    channels: usize,
    clock: AudioClock,
    command_tx: CommandProducer,
    staging: VoiceStaging,
    next_bus: u32,
    running: bool,
}

impl CpalContext {
    /// Open the default output device
    ///
    /// The stream is built but stays paused until `resume()`.
    pub fn open(notification_tx: Arc<Mutex<NotificationProducer>>) -> AudioResult<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            "Opening audio output"
        );

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        tracing::debug!(?supported_config, "Default output config");

        let config: StreamConfig = supported_config.into();
        let clock = AudioClock::new(sample_rate);
        let (command_tx, command_rx) = create_command_channel(COMMAND_RINGBUFFER_CAPACITY);
        let mixer = Mixer::new(sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                mixer,
                command_rx,
                clock.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                mixer,
                command_rx,
                clock.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                mixer,
                command_rx,
                clock.clone(),
                notification_tx.clone(),
            ),
            other => return Err(AudioError::UnsupportedFormat(other)),
        }?;

        if let Ok(mut tx) = notification_tx.try_lock() {
            let notif = Notification::info(
                NotificationCategory::Audio,
                format!("Audio connected: {} Hz, {} channels", sample_rate, channels),
            );
            let _ = tx.try_push(notif);
        }

        Ok(Self {
            _device: device,
            stream,
            sample_rate,
            channels,
            clock,
            command_tx,
            staging: VoiceStaging::new(),
            next_bus: 0,
            running: false,
        })
    }

    fn send(&mut self, command: Command) {
        if let Err(command) = self.command_tx.try_push(command) {
            tracing::warn!(?command, "Command queue full, dropping command");
        }
    }

    /// Build an output stream for sample type `T`
    ///
    /// The mixer renders f32 internally; conversion happens on write.
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut mixer: Mixer,
        mut command_rx: CommandConsumer,
        clock: AudioClock,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> AudioResult<Stream>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let mut scratch = vec![0.0_f32; MAX_BLOCK_FRAMES];

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // ========== SACRED ZONE ==========
                // No allocations, No I/O, No blocking locks

                while let Some(command) = command_rx.try_pop() {
                    mixer.apply(command);
                }

                for chunk in data.chunks_mut(MAX_BLOCK_FRAMES * channels) {
                    let frames = chunk.len() / channels;
                    let block = &mut scratch[..frames];
                    mixer.render(block);

                    for (frame, sample) in chunk.chunks_mut(channels).zip(block.iter()) {
                        write_mono_to_interleaved_frame(*sample, frame);
                    }
                }

                clock.set_position(mixer.position());
                // ========== SACRED ZONE END ==========
            },
            move |err| {
                // Runs outside the audio callback
                tracing::error!(%err, "Audio stream error");

                if let Ok(mut tx) = notification_tx.try_lock() {
                    let notif = Notification::error(
                        NotificationCategory::Audio,
                        format!("Audio stream error: {}", err),
                    );
                    let _ = tx.try_push(notif);
                }
            },
            None,
        )?;

        Ok(stream)
    }
}

impl AudioContext for CpalContext {
    fn resume(&mut self) -> AudioResult<()> {
        if !self.running {
            self.stream.play()?;
            self.running = true;
            tracing::info!(
                sample_rate = self.sample_rate,
                channels = self.channels,
                "Audio stream started"
            );
        }
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    fn create_master(&mut self, gain: f32) -> BusId {
        self.next_bus += 1;
        let bus = BusId(self.next_bus);
        self.send(Command::CreateBus { bus, gain });
        bus
    }

    fn ramp_master(&mut self, bus: BusId, target: f32, start: f64, end: f64) {
        self.staging.discard_from(bus, end);
        self.send(Command::RampBus {
            bus,
            target,
            start,
            end,
        });
    }

    fn schedule(&mut self, bus: BusId, voice: ScheduledVoice) {
        self.staging.push(bus, voice);
    }

    fn forward_due(&mut self) -> usize {
        let until = self.current_time() + FORWARD_WINDOW;
        let mut forwarded = 0;
        // A full queue keeps the rest staged for the next call
        while !self.command_tx.is_full() {
            let Some((bus, voice)) = self.staging.pop_due(until) else {
                break;
            };
            self.send(Command::Schedule { bus, voice });
            forwarded += 1;
        }
        forwarded
    }
}
