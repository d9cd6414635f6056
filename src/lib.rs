pub mod config;
pub mod dispatcher;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod notes;
pub mod output;
pub mod quotes;
pub mod random;
pub mod sequencer;
#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::config::ToneCharacter;
use crate::dsp::oscillator::Waveform;
use crate::engine::{ToneRequest, VoiceSchedule};
use crate::error::ToneError;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the keytone version string.
#[wasm_bindgen(js_name = coreVersion)]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Render one key-character tone to WAV bytes, without any audio device.
pub fn render_tone(frequency: f64, waveform: Waveform, sample_rate: u32) -> Result<Vec<u8>, ToneError> {
    let request = ToneRequest::new(frequency, waveform, &ToneCharacter::KEY);
    request.validate()?;
    let floor = config::EngineConfig::default().floor;
    let voice = VoiceSchedule::from_request(&request, 0.0, floor);
    Ok(dsp::renderer::render_wav(&[voice], sample_rate))
}

/// WASM-exposed: preview a tone as a WAV byte array.
#[wasm_bindgen(js_name = renderToneWav)]
pub fn render_tone_wav(frequency: f64, waveform: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    let waveform = Waveform::parse(waveform)
        .ok_or_else(|| JsValue::from_str(&format!("unknown waveform '{waveform}'")))?;
    render_tone(frequency, waveform, sample_rate).map_err(|e| JsValue::from_str(&format!("{e}")))
}
