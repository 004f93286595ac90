// Module audio - Contexte de sortie, mixage et backend CPAL

pub mod clock;
pub mod context;
pub mod dsp_utils;
pub mod engine;
pub mod export;
pub mod format_conversion;
pub mod mixer;
pub mod staging;

pub use clock::AudioClock;
pub use context::{AudioContext, BusId, OutputBus};
pub use engine::CpalContext;
pub use export::{ExportError, ExportReport, ExportSettings, OfflineContext, WavExporter};
pub use mixer::Mixer;
pub use staging::{FORWARD_WINDOW, VoiceStaging};

use thiserror::Error;

/// Audio backend errors
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Could not read the default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Unsupported sample format: {0:?}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("Error in stream creation: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Error in stream beginning: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Audio output unavailable: {0}")]
    Unavailable(String),
}

pub type AudioResult<T> = Result<T, AudioError>;
