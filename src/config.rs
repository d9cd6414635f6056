//! Tunable constants for tone character and trigger timing.

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::ToneError;

/// Envelope shape of a class of tones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneCharacter {
    /// Peak gain in (0, 1].
    pub peak: f64,
    /// Attack in seconds.
    pub attack: f64,
    /// Decay in seconds after the attack ends.
    pub decay: f64,
}

impl ToneCharacter {
    /// Short mallet-like strike used for piano keys. Ends 250 ms after the trigger.
    pub const KEY: ToneCharacter = ToneCharacter {
        peak: 0.5,
        attack: 0.005,
        decay: 0.245,
    };

    /// Softer, longer blip for generic page elements.
    pub const AMBIENT: ToneCharacter = ToneCharacter {
        peak: 0.3,
        attack: 0.01,
        decay: 0.39,
    };

    fn validate(&self, name: &str) -> Result<(), ToneError> {
        if !(self.peak > 0.0 && self.peak <= 1.0) {
            return Err(ToneError::Config(format!(
                "{name}.peak must be in (0, 1], got {}",
                self.peak
            )));
        }
        if !(self.attack >= 0.0 && self.attack.is_finite()) {
            return Err(ToneError::Config(format!(
                "{name}.attack must be >= 0, got {}",
                self.attack
            )));
        }
        if !(self.decay > 0.0 && self.decay.is_finite()) {
            return Err(ToneError::Config(format!(
                "{name}.decay must be > 0, got {}",
                self.decay
            )));
        }
        Ok(())
    }
}

/// What generic clickable elements sound like.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AmbientPolicy {
    /// A frequency drawn uniformly from the note table.
    RandomNote,
    /// One fixed tone, independent of the note table.
    Blip { frequency: f64, waveform: Waveform },
}

impl Default for AmbientPolicy {
    fn default() -> Self {
        AmbientPolicy::RandomNote
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub key: ToneCharacter,
    pub ambient: ToneCharacter,
    /// Target of the exponential decay; must be in (0, 0.001].
    pub floor: f64,
    pub default_waveform: Waveform,
    pub ambient_policy: AmbientPolicy,
    /// How long a randomly played key stays highlighted.
    pub pulse_ms: u32,
    /// Spacing between the notes of the acknowledgment arpeggio.
    pub chord_step_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            key: ToneCharacter::KEY,
            ambient: ToneCharacter::AMBIENT,
            floor: 0.0001,
            default_waveform: Waveform::Triangle,
            ambient_policy: AmbientPolicy::RandomNote,
            pulse_ms: 200,
            chord_step_ms: 100,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ToneError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ToneError> {
        self.key.validate("key")?;
        self.ambient.validate("ambient")?;
        if !(self.floor > 0.0 && self.floor <= 0.001) {
            return Err(ToneError::Config(format!(
                "floor must be in (0, 0.001], got {}",
                self.floor
            )));
        }
        if let AmbientPolicy::Blip { frequency, .. } = self.ambient_policy {
            if !(frequency > 0.0 && frequency.is_finite()) {
                return Err(ToneError::Config(format!(
                    "blip frequency must be > 0, got {frequency}"
                )));
            }
        }
        Ok(())
    }
}
