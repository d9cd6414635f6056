//! WebAudio output: one `AudioContext` for the page, one oscillator + gain
//! pair per voice.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use super::{AudioOutput, OutputState};
use crate::dsp::envelope::GainRamp;
use crate::dsp::oscillator::Waveform;
use crate::engine::VoiceSchedule;
use crate::error::ToneError;

pub struct WebAudioOutput {
    ctx: AudioContext,
}

fn unavailable(e: JsValue) -> ToneError {
    ToneError::OutputUnavailable {
        reason: e.as_string().unwrap_or_else(|| format!("{e:?}")),
    }
}

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Triangle => OscillatorType::Triangle,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
    }
}

impl WebAudioOutput {
    pub fn new() -> Result<Self, ToneError> {
        let ctx = AudioContext::new().map_err(unavailable)?;
        Ok(WebAudioOutput { ctx })
    }

    fn build_voice(&self, voice: &VoiceSchedule) -> Result<(OscillatorNode, GainNode), JsValue> {
        let osc = self.ctx.create_oscillator()?;
        let gain = self.ctx.create_gain()?;

        osc.set_type(oscillator_type(voice.waveform));
        osc.frequency()
            .set_value_at_time(voice.frequency as f32, voice.start)?;

        let param = gain.gain();
        for ramp in voice.ramps() {
            match ramp {
                GainRamp::Set { value, time } => param.set_value_at_time(value as f32, time)?,
                GainRamp::Linear { value, time } => {
                    param.linear_ramp_to_value_at_time(value as f32, time)?
                }
                GainRamp::Exponential { value, time } => {
                    param.exponential_ramp_to_value_at_time(value as f32, time)?
                }
            };
        }

        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&self.ctx.destination())?;
        Ok((osc, gain))
    }
}

impl AudioOutput for WebAudioOutput {
    fn state(&self) -> OutputState {
        match self.ctx.state() {
            AudioContextState::Running => OutputState::Running,
            AudioContextState::Suspended => OutputState::Suspended,
            _ => OutputState::Closed,
        }
    }

    fn resume(&mut self) -> Result<(), ToneError> {
        if self.state() == OutputState::Running {
            return Ok(());
        }
        // The promise settles later; voices scheduled meanwhile start once it does.
        let _ = self.ctx.resume().map_err(unavailable)?;
        log::debug!("audio context resume requested");
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn schedule_voice(&mut self, voice: &VoiceSchedule) -> Result<(), ToneError> {
        let (osc, gain) = self.build_voice(voice).map_err(unavailable)?;

        // Disconnect both nodes once the oscillator stops so the graph does
        // not keep references to finished voices.
        let (ended_osc, ended_gain) = (osc.clone(), gain.clone());
        let on_ended = Closure::once_into_js(move || {
            let _ = ended_osc.disconnect();
            let _ = ended_gain.disconnect();
        });
        osc.set_onended(Some(on_ended.unchecked_ref()));

        osc.start_with_when(voice.start).map_err(unavailable)?;
        osc.stop_with_when(voice.stop_time()).map_err(unavailable)?;
        Ok(())
    }
}
