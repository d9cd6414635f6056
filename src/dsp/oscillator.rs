//! Waveform selection and the band-limited oscillator used for offline rendering.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Periodic waveform a tone is generated from.
///
/// Names follow the WebAudio `OscillatorNode.type` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    #[default]
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::Sawtooth,
    ];

    /// Parse a waveform name. Accepts the short alias "saw".
    pub fn parse(s: &str) -> Option<Waveform> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Some(Waveform::Sine),
            "triangle" => Some(Waveform::Triangle),
            "square" => Some(Waveform::Square),
            "sawtooth" | "saw" => Some(Waveform::Sawtooth),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase-accumulating oscillator with PolyBLEP correction on the
/// discontinuous shapes.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f64,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            frequency,
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn next_sample(&mut self) -> f64 {
        let inc = self.frequency / self.sample_rate;
        let t = self.phase;
        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * t).sin(),
            Waveform::Sawtooth => (2.0 * t - 1.0) - poly_blep(t, inc),
            Waveform::Square => {
                let naive = if t < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(t, inc) - poly_blep((t + 0.5) % 1.0, inc)
            }
            // Continuous shape, no correction needed
            Waveform::Triangle => {
                if t < 0.5 {
                    4.0 * t - 1.0
                } else {
                    3.0 - 4.0 * t
                }
            }
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        sample
    }
}

/// Polynomial band-limited step. `t` is the phase in [0, 1), `dt` the
/// per-sample phase increment.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}
