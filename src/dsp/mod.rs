//! DSP: Offline rendition of scheduled voices.
//!
//! In the browser the audio context renders voices itself; this module
//! renders the same envelope and waveform math in Rust so tones can be
//! previewed, exported as WAV, and checked in tests.

pub mod envelope;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod voice;
