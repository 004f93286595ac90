// Format conversion - f32 mix to device and file sample formats
//
// - Device side: cpal's `FromSample<f32>` writes the mono mix into every
//   channel of an interleaved frame (f32, i16 or u16 streams).
// - File side: integer PCM for 16 and 24-bit WAV export.
//
// All conversions are allocation-free and suitable for real-time audio callbacks.

use cpal::{FromSample, Sample};

/// Convert f32 sample to i16
///
/// Maps [-1.0, 1.0] to [i16::MIN, i16::MAX]
/// Clamps values outside the range to prevent overflow
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);

    // i16::MAX (32767) on the positive side to avoid overflow
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Convert f32 sample to a 24-bit integer stored in an i32
#[inline]
pub fn f32_to_i24(sample: f32) -> i32 {
    const I24_MAX: f32 = 8_388_607.0;
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * I24_MAX) as i32
}

/// Write a mono f32 sample to all channels of one interleaved frame
///
/// # Arguments
/// * `internal_sample` - The mono f32 sample to write
/// * `output_frame` - A slice representing one audio frame (e.g., [L, R] for stereo)
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = Sample::from_sample::<f32>(internal_sample);
    }
}
