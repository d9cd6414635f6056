//! Tone Synthesis Engine: Turns a frequency and waveform into one
//! self-terminating, envelope-shaped voice on the shared audio output.
//!
//! The engine keeps no record of the voices it schedules. Each voice is
//! handed to the output with its full automation and stop time, and the
//! output's renderer disposes of it once the stop time passes.

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ToneCharacter};
use crate::dsp::envelope::{GainRamp, PercussiveEnvelope};
use crate::dsp::oscillator::Waveform;
use crate::error::ToneError;
use crate::output::AudioOutput;

/// One requested tone. Built per trigger and consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneRequest {
    pub frequency: f64,
    pub waveform: Waveform,
    pub peak: f64,
    pub attack: f64,
    pub decay: f64,
}

impl ToneRequest {
    pub fn new(frequency: f64, waveform: Waveform, character: &ToneCharacter) -> Self {
        ToneRequest {
            frequency,
            waveform,
            peak: character.peak,
            attack: character.attack,
            decay: character.decay,
        }
    }

    pub fn validate(&self) -> Result<(), ToneError> {
        let invalid = |field: &'static str, value: f64| -> Result<(), ToneError> {
            Err(ToneError::InvalidRequest { field, value })
        };
        if !(self.frequency > 0.0 && self.frequency.is_finite()) {
            return invalid("frequency", self.frequency);
        }
        if !(self.peak > 0.0 && self.peak <= 1.0) {
            return invalid("peak", self.peak);
        }
        if !(self.attack >= 0.0 && self.attack.is_finite()) {
            return invalid("attack", self.attack);
        }
        if !(self.decay > 0.0 && self.decay.is_finite()) {
            return invalid("decay", self.decay);
        }
        Ok(())
    }
}

/// Everything the realtime renderer needs to play and dispose of one voice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSchedule {
    pub frequency: f64,
    pub waveform: Waveform,
    /// Start time on the output clock, in seconds.
    pub start: f64,
    pub envelope: PercussiveEnvelope,
}

impl VoiceSchedule {
    pub fn from_request(request: &ToneRequest, start: f64, floor: f64) -> Self {
        VoiceSchedule {
            frequency: request.frequency,
            waveform: request.waveform,
            start,
            envelope: PercussiveEnvelope {
                peak: request.peak,
                attack: request.attack,
                decay: request.decay,
                floor,
            },
        }
    }

    pub fn attack_end(&self) -> f64 {
        self.start + self.envelope.attack_end()
    }

    /// When the generator stops and the voice is released.
    pub fn stop_time(&self) -> f64 {
        self.start + self.envelope.stop_time()
    }

    pub fn ramps(&self) -> [GainRamp; 3] {
        self.envelope.ramps(self.start)
    }

    /// Gain at absolute output time `t`.
    pub fn gain_at(&self, t: f64) -> f64 {
        self.envelope.gain_at(t - self.start)
    }
}

pub struct ToneEngine<O: AudioOutput> {
    output: O,
    config: EngineConfig,
}

impl<O: AudioOutput> ToneEngine<O> {
    pub fn new(output: O, config: EngineConfig) -> Self {
        ToneEngine { output, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Play a key-character tone. `None` selects the configured default waveform.
    pub fn play_tone(&mut self, frequency: f64, waveform: Option<Waveform>) {
        let waveform = waveform.unwrap_or(self.config.default_waveform);
        let request = ToneRequest::new(frequency, waveform, &self.config.key);
        self.play(request);
    }

    /// Play a request, treating every failure as "no sound".
    pub fn play(&mut self, request: ToneRequest) {
        if let Err(e) = self.try_play(request) {
            log::debug!("tone at {} Hz not played: {e}", request.frequency);
        }
    }

    /// Resume the output if needed, then hand one voice to it.
    pub fn try_play(&mut self, request: ToneRequest) -> Result<VoiceSchedule, ToneError> {
        request.validate()?;
        self.output.ensure_running()?;
        let now = self.output.current_time();
        let schedule = VoiceSchedule::from_request(&request, now, self.config.floor);
        self.output.schedule_voice(&schedule)?;
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputState;
    use crate::output::offline::OfflineOutput;

    fn engine() -> ToneEngine<OfflineOutput> {
        ToneEngine::new(OfflineOutput::new(44100.0), EngineConfig::default())
    }

    #[test]
    fn play_tone_schedules_one_voice_per_call() {
        let mut e = engine();
        for w in Waveform::ALL {
            e.play_tone(261.63, Some(w));
        }
        let history = e.output().history();
        assert_eq!(history.len(), 4);
        for (voice, w) in history.iter().zip(Waveform::ALL) {
            assert_eq!(voice.waveform, w);
            assert_eq!(voice.frequency, 261.63);
        }
    }

    #[test]
    fn envelope_shape_of_scheduled_voice() {
        let mut e = engine();
        e.output_mut().advance(1.5);
        let v = e
            .try_play(ToneRequest::new(329.63, Waveform::Sine, &ToneCharacter::KEY))
            .unwrap();

        assert_eq!(v.start, 1.5);
        assert_eq!(v.gain_at(v.start), 0.0);
        assert!((v.gain_at(v.attack_end()) - 0.5).abs() < 1e-12);
        let tail = v.gain_at(v.stop_time() - 1e-9);
        assert!(tail > 0.0 && tail <= 0.001);
        assert!((v.stop_time() - (v.attack_end() + ToneCharacter::KEY.decay)).abs() < 1e-12);
    }

    #[test]
    fn default_waveform_is_triangle() {
        let mut e = engine();
        e.play_tone(440.0, None);
        assert_eq!(e.output().history()[0].waveform, Waveform::Triangle);
    }

    #[test]
    fn suspended_output_is_resumed_before_scheduling() {
        let mut e = engine();
        assert_eq!(e.output().state(), OutputState::Suspended);
        e.play_tone(440.0, None);
        assert_eq!(e.output().state(), OutputState::Running);
        assert_eq!(e.output().resume_count(), 1);

        e.play_tone(440.0, None);
        assert_eq!(e.output().resume_count(), 1, "running output is not resumed again");
    }

    #[test]
    fn overlapping_calls_do_not_share_envelopes() {
        let mut e = engine();
        let a = e
            .try_play(ToneRequest::new(261.63, Waveform::Triangle, &ToneCharacter::KEY))
            .unwrap();
        e.output_mut().advance(0.1);
        let b = e
            .try_play(ToneRequest::new(261.63, Waveform::Triangle, &ToneCharacter::KEY))
            .unwrap();
        assert_eq!(a.envelope, b.envelope);
        assert!((b.start - a.start - 0.1).abs() < 1e-12);
        assert_eq!(e.output().live_voices().len(), 2);
    }

    #[test]
    fn invalid_frequency_is_silent() {
        let mut e = engine();
        e.play_tone(0.0, None);
        e.play_tone(-5.0, None);
        e.play_tone(f64::NAN, None);
        assert!(e.output().history().is_empty());

        let err = e
            .try_play(ToneRequest::new(0.0, Waveform::Sine, &ToneCharacter::KEY))
            .unwrap_err();
        assert!(matches!(err, ToneError::InvalidRequest { field: "frequency", .. }));
    }

    #[test]
    fn denied_output_produces_no_sound_and_no_error() {
        let mut e = engine();
        e.output_mut().deny("autoplay policy");
        e.play_tone(440.0, None);
        assert!(e.output().history().is_empty());

        let err = e
            .try_play(ToneRequest::new(440.0, Waveform::Sine, &ToneCharacter::KEY))
            .unwrap_err();
        assert!(matches!(err, ToneError::OutputUnavailable { .. }));
    }
}
