//! Offline renderer: Mixes scheduled voices into samples or a WAV buffer.

use super::mixer::Mixer;
use super::voice::TransientVoice;
use crate::engine::VoiceSchedule;

/// Render `voices` into `seconds` of mono audio. Voice start times are
/// taken as absolute positions from time 0.
pub fn render_voices(voices: &[VoiceSchedule], sample_rate: f64, seconds: f64) -> Vec<f64> {
    let total = (seconds.max(0.0) * sample_rate).round() as usize;
    let mut mixer = Mixer::new();
    mixer.clear(total);
    for schedule in voices {
        let offset = (schedule.start.max(0.0) * sample_rate).round() as usize;
        let mut voice = TransientVoice::new(schedule, sample_rate);
        mixer.add_voice(&mut voice, offset);
    }
    mixer.output()
}

/// Render `voices` to a 16-bit mono PCM WAV file, long enough for the last voice to stop.
pub fn render_wav(voices: &[VoiceSchedule], sample_rate: u32) -> Vec<u8> {
    let seconds = voices
        .iter()
        .map(VoiceSchedule::stop_time)
        .fold(0.0_f64, f64::max);
    let samples = render_voices(voices, sample_rate as f64, seconds);
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f64) as i16)
        .collect();
    encode_wav(&pcm, sample_rate, 1)
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }
    buf
}
