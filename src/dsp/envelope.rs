//! Percussive amplitude envelope: linear attack, exponential decay, hard stop.
//!
//! ```text
//!  peak ┐  ╱╲
//!       │ ╱  ╲
//!       │╱    ╲___
//! floor └─────────╲──→ t
//!       0  A      A+D (stop)
//! ```
//!
//! Gain starts at exactly 0 so the waveform never jumps, and the decay
//! targets a small positive floor because an exponential ramp cannot
//! reach zero. The generator is stopped at `A + D`.

use serde::{Deserialize, Serialize};

/// One gain-automation instruction handed to the realtime renderer.
/// Times are absolute, on the output clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GainRamp {
    /// Jump to `value` at `time`.
    Set { value: f64, time: f64 },
    /// Linear ramp from the previous point, reaching `value` at `time`.
    Linear { value: f64, time: f64 },
    /// Exponential ramp from the previous point, reaching `value` at `time`.
    Exponential { value: f64, time: f64 },
}

impl GainRamp {
    pub fn value(&self) -> f64 {
        match *self {
            GainRamp::Set { value, .. }
            | GainRamp::Linear { value, .. }
            | GainRamp::Exponential { value, .. } => value,
        }
    }

    pub fn time(&self) -> f64 {
        match *self {
            GainRamp::Set { time, .. }
            | GainRamp::Linear { time, .. }
            | GainRamp::Exponential { time, .. } => time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercussiveEnvelope {
    /// Peak gain reached at the end of the attack, in (0, 1].
    pub peak: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds, measured from the end of the attack.
    pub decay: f64,
    /// Level the decay ends on, > 0.
    pub floor: f64,
}

impl PercussiveEnvelope {
    pub fn attack_end(&self) -> f64 {
        self.attack
    }

    pub fn stop_time(&self) -> f64 {
        self.attack + self.decay
    }

    /// Gain at `t` seconds after the voice started.
    pub fn gain_at(&self, t: f64) -> f64 {
        if t <= 0.0 || t >= self.stop_time() {
            return 0.0;
        }
        if t < self.attack {
            return self.peak * t / self.attack;
        }
        let progress = (t - self.attack) / self.decay;
        self.peak * (self.floor / self.peak).powf(progress)
    }

    /// Automation for a voice starting at `start`.
    pub fn ramps(&self, start: f64) -> [GainRamp; 3] {
        [
            GainRamp::Set { value: 0.0, time: start },
            GainRamp::Linear {
                value: self.peak,
                time: start + self.attack_end(),
            },
            GainRamp::Exponential {
                value: self.floor,
                time: start + self.stop_time(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_env() -> PercussiveEnvelope {
        PercussiveEnvelope {
            peak: 0.5,
            attack: 0.005,
            decay: 0.245,
            floor: 0.0001,
        }
    }

    #[test]
    fn starts_silent_and_reaches_peak() {
        let env = key_env();
        assert_eq!(env.gain_at(0.0), 0.0);
        assert!((env.gain_at(env.attack_end() - 1e-12) - 0.5).abs() < 1e-6);
        assert!((env.gain_at(env.attack_end()) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn decays_to_floor_just_before_stop() {
        let env = key_env();
        let g = env.gain_at(env.stop_time() - 1e-9);
        assert!(g > 0.0 && g <= 0.001, "expected near floor, got {g}");
        assert_eq!(env.gain_at(env.stop_time()), 0.0);
    }

    #[test]
    fn decay_is_monotonic() {
        let env = key_env();
        let mut prev = env.gain_at(env.attack_end());
        let mut t = env.attack_end();
        while t < env.stop_time() {
            let g = env.gain_at(t);
            assert!(g <= prev + 1e-12);
            prev = g;
            t += 0.001;
        }
    }

    #[test]
    fn zero_attack_jumps_straight_into_decay() {
        let env = PercussiveEnvelope { attack: 0.0, ..key_env() };
        assert!((env.gain_at(1e-9) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn ramps_are_absolute() {
        let env = key_env();
        let [set, lin, exp] = env.ramps(2.0);
        assert_eq!(set, GainRamp::Set { value: 0.0, time: 2.0 });
        assert!((lin.time() - 2.005).abs() < 1e-12);
        assert_eq!(lin.value(), 0.5);
        assert!((exp.time() - 2.25).abs() < 1e-12);
        assert_eq!(exp.value(), 0.0001);
    }
}
