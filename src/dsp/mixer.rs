//! Mixer: Sums independently scheduled voices with master gain.

use super::voice::TransientVoice;

/// Accumulates overlapping voices into one buffer. There is no voice limit;
/// overlapping voices simply add.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Default for Mixer {
    fn default() -> Self {
        Mixer::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Mixer {
            master_gain: 0.8,
            buffer: Vec::new(),
        }
    }

    /// Reset to `num_samples` of silence.
    pub fn clear(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    /// Render `voice` to completion starting at `offset`, truncating at the buffer end.
    pub fn add_voice(&mut self, voice: &mut TransientVoice, offset: usize) {
        let Some(tail) = self.buffer.get_mut(offset..) else {
            return;
        };
        for slot in tail.iter_mut() {
            if voice.is_finished() {
                break;
            }
            *slot += voice.next_sample();
        }
    }

    /// Mixed output with master gain and soft clipping.
    pub fn output(&self) -> Vec<f64> {
        self.buffer
            .iter()
            .map(|&s| soft_clip(s * self.master_gain))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
