//! TransientVoice: One oscillator shaped by a percussive envelope,
//! rendered sample by sample until its stop time.

use super::envelope::PercussiveEnvelope;
use super::oscillator::Oscillator;
use crate::engine::VoiceSchedule;

#[derive(Debug, Clone)]
pub struct TransientVoice {
    oscillator: Oscillator,
    envelope: PercussiveEnvelope,
    sample_rate: f64,
    /// Samples rendered since the voice started.
    elapsed: usize,
}

impl TransientVoice {
    pub fn new(schedule: &VoiceSchedule, sample_rate: f64) -> Self {
        TransientVoice {
            oscillator: Oscillator::new(schedule.waveform, schedule.frequency, sample_rate),
            envelope: schedule.envelope,
            sample_rate,
            elapsed: 0,
        }
    }

    /// Total length in samples, from start to stop.
    pub fn len_samples(&self) -> usize {
        (self.envelope.stop_time() * self.sample_rate).round() as usize
    }

    pub fn next_sample(&mut self) -> f64 {
        if self.is_finished() {
            return 0.0;
        }
        let t = self.elapsed as f64 / self.sample_rate;
        self.elapsed += 1;
        self.oscillator.next_sample() * self.envelope.gain_at(t)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.len_samples()
    }
}
