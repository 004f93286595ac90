// Audio Export - Offline rendering to WAV files
//
// `OfflineContext` is an audio context whose clock only advances when it is
// asked to render. `WavExporter` drives the regular playback controller
// against it and streams the mix to disk, as fast as the CPU allows.

use crate::audio::context::{AudioContext, BusId};
use crate::audio::format_conversion::{f32_to_i16, f32_to_i24};
use crate::audio::mixer::Mixer;
use crate::audio::staging::{FORWARD_WINDOW, VoiceStaging};
use crate::audio::AudioResult;
use crate::config::{ConfigError, PlaybackConfig};
use crate::messaging::Command;
use crate::sequencer::controller::{ControlState, PlaybackController};
use crate::sequencer::timer::{HostClock, ManualClock};
use crate::synth::ScheduledVoice;
use hound::{WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Frames rendered between two controller pumps
const BUFFER_SIZE: usize = 512;

/// Export error types
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Invalid duration: must be > 0, got {0}")]
    InvalidDuration(f64),

    #[error("Unsupported bit depth: {0} (supported: 16, 24, 32)")]
    UnsupportedBitDepth(u16),

    #[error("Invalid playback configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio export settings
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Output file path
    pub output_path: PathBuf,
    /// Sample rate (Hz)
    pub sample_rate: u32,
    /// Bit depth (16 or 24 integer, 32 float)
    pub bit_depth: u16,
    /// Number of channels (1=mono, 2=stereo)
    pub channels: u16,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("spacejam.wav"),
            sample_rate: 44100,
            bit_depth: 16,
            channels: 2,
        }
    }
}

impl ExportSettings {
    fn wav_spec(&self) -> Result<WavSpec, ExportError> {
        let sample_format = match self.bit_depth {
            16 | 24 => hound::SampleFormat::Int,
            32 => hound::SampleFormat::Float,
            other => return Err(ExportError::UnsupportedBitDepth(other)),
        };
        Ok(WavSpec {
            channels: self.channels.max(1),
            sample_rate: self.sample_rate,
            bits_per_sample: self.bit_depth,
            sample_format,
        })
    }
}

/// Audio context rendered on demand
pub struct OfflineContext {
    mixer: Mixer,
    staging: VoiceStaging,
    next_bus: u32,
    running: bool,
    /// Every voice handed over, in scheduling order
    history: Vec<(BusId, ScheduledVoice)>,
}

impl OfflineContext {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            mixer: Mixer::new(sample_rate),
            staging: VoiceStaging::new(),
            next_bus: 0,
            running: false,
            history: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Render the next `out.len()` mono frames and advance the clock
    ///
    /// Staged voices starting inside the block are forwarded first.
    pub fn render(&mut self, out: &mut [f32]) {
        let block = out.len() as f64 / self.mixer.sample_rate() as f64;
        self.forward_until(self.mixer.current_time() + block + FORWARD_WINDOW);
        self.mixer.render(out);
    }

    fn forward_until(&mut self, until: f64) -> usize {
        let mut forwarded = 0;
        while let Some((bus, voice)) = self.staging.pop_due(until) {
            self.mixer.apply(Command::Schedule { bus, voice });
            forwarded += 1;
        }
        forwarded
    }

    /// Render `seconds` of output into a new buffer
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let frames = (seconds.max(0.0) * self.mixer.sample_rate() as f64) as usize;
        let mut out = vec![0.0; frames];
        self.render(&mut out);
        out
    }

    pub fn history(&self) -> &[(BusId, ScheduledVoice)] {
        &self.history
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    /// Voices scheduled but not yet handed to the mixer
    pub fn staged_voices(&self) -> usize {
        self.staging.len()
    }
}

impl AudioContext for OfflineContext {
    fn resume(&mut self) -> AudioResult<()> {
        self.running = true;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.mixer.current_time()
    }

    fn create_master(&mut self, gain: f32) -> BusId {
        self.next_bus += 1;
        let bus = BusId(self.next_bus);
        self.mixer.apply(Command::CreateBus { bus, gain });
        bus
    }

    fn ramp_master(&mut self, bus: BusId, target: f32, start: f64, end: f64) {
        self.staging.discard_from(bus, end);
        self.mixer.apply(Command::RampBus {
            bus,
            target,
            start,
            end,
        });
    }

    fn schedule(&mut self, bus: BusId, voice: ScheduledVoice) {
        self.history.push((bus, voice));
        self.staging.push(bus, voice);
    }

    fn forward_due(&mut self) -> usize {
        self.forward_until(self.mixer.current_time() + FORWARD_WINDOW)
    }
}

/// Progress callback for export (reports 0.0 to 1.0)
pub type ProgressCallback = Box<dyn FnMut(f32) + Send>;

/// What an export produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportReport {
    pub frames: u64,
    /// Loops scheduled, the first one included
    pub loops: usize,
    /// Largest absolute sample written
    pub peak: f32,
}

/// Renders the loop to a WAV file through the playback controller
pub struct WavExporter {
    settings: ExportSettings,
    config: PlaybackConfig,
}

impl WavExporter {
    pub fn new(settings: ExportSettings, config: PlaybackConfig) -> Self {
        Self { settings, config }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Press play at time 0, optionally press stop at `stop_at`, and record
    /// `duration_seconds` of output
    pub fn export(
        &self,
        duration_seconds: f64,
        stop_at: Option<f64>,
        mut progress_callback: Option<ProgressCallback>,
    ) -> Result<ExportReport, ExportError> {
        if !(duration_seconds > 0.0 && duration_seconds.is_finite()) {
            return Err(ExportError::InvalidDuration(duration_seconds));
        }
        self.config.validate()?;

        let spec = self.settings.wav_spec()?;
        let total_frames = (duration_seconds * self.settings.sample_rate as f64) as u64;

        tracing::info!(
            path = %self.settings.output_path.display(),
            duration_seconds,
            total_frames,
            sample_rate = self.settings.sample_rate,
            "Exporting audio"
        );

        let mut writer = WavWriter::create(&self.settings.output_path, spec)?;
        let report = self.render_into(
            &mut writer,
            total_frames,
            stop_at,
            progress_callback.as_mut(),
        )?;
        writer.finalize()?;

        if let Some(callback) = progress_callback.as_mut() {
            callback(1.0);
        }
        tracing::info!(frames = report.frames, loops = report.loops, "Export complete");
        Ok(report)
    }

    fn render_into(
        &self,
        writer: &mut WavWriter<BufWriter<File>>,
        total_frames: u64,
        stop_at: Option<f64>,
        mut progress_callback: Option<&mut ProgressCallback>,
    ) -> Result<ExportReport, ExportError> {
        let sample_rate = self.settings.sample_rate as f32;
        let clock = ManualClock::new();
        let mut controller = PlaybackController::<OfflineContext, _>::new(
            self.config,
            clock.clone(),
            Box::new(move || Ok(OfflineContext::new(sample_rate))),
        )?;
        let mut control = ControlState::default();
        controller.toggle(&mut control);
        let mut loops = usize::from(controller.session().is_some());

        let mut buffer = vec![0.0_f32; BUFFER_SIZE];
        let mut frames_done: u64 = 0;
        let mut peak: f32 = 0.0;
        let mut stop_pending = stop_at;
        let progress_interval = self.settings.sample_rate as u64;

        while frames_done < total_frames {
            let frames = BUFFER_SIZE.min((total_frames - frames_done) as usize);

            if let Some(at) = stop_pending {
                if clock.now().as_secs_f64() >= at {
                    controller.toggle(&mut control);
                    stop_pending = None;
                }
            }
            loops += controller.pump();

            let Some(context) = controller.context_mut() else {
                break;
            };
            let block = &mut buffer[..frames];
            context.render(block);
            clock.set_seconds(context.current_time());

            for &sample in block.iter() {
                peak = peak.max(sample.abs());
                for _ in 0..self.settings.channels.max(1) {
                    match self.settings.bit_depth {
                        16 => writer.write_sample(f32_to_i16(sample))?,
                        24 => writer.write_sample(f32_to_i24(sample))?,
                        _ => writer.write_sample(sample)?,
                    }
                }
            }

            let previous = frames_done;
            frames_done += frames as u64;
            if previous / progress_interval != frames_done / progress_interval {
                if let Some(callback) = progress_callback.as_mut() {
                    callback(frames_done as f32 / total_frames as f32);
                }
            }
        }

        Ok(ExportReport {
            frames: frames_done,
            loops,
            peak,
        })
    }
}
