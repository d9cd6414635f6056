//! In-memory audio output with a manually advanced clock.
//!
//! Stands in for the browser's audio context in tests and native previews:
//! it records every scheduled voice, drops voices once their stop time has
//! passed, and can render what it was given into samples.

use super::{AudioOutput, OutputState};
use crate::dsp::renderer;
use crate::engine::VoiceSchedule;
use crate::error::ToneError;

#[derive(Debug, Clone)]
pub struct OfflineOutput {
    sample_rate: f64,
    time: f64,
    state: OutputState,
    denied: Option<String>,
    resumes: usize,
    live: Vec<VoiceSchedule>,
    history: Vec<VoiceSchedule>,
}

impl OfflineOutput {
    /// A new output starts suspended, like a browser context created before any gesture.
    pub fn new(sample_rate: f64) -> Self {
        OfflineOutput {
            sample_rate,
            time: 0.0,
            state: OutputState::Suspended,
            denied: None,
            resumes: 0,
            live: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Refuse to resume until [`allow`](Self::allow) is called.
    pub fn deny(&mut self, reason: &str) {
        self.denied = Some(reason.to_string());
    }

    pub fn allow(&mut self) {
        self.denied = None;
    }

    pub fn close(&mut self) {
        self.state = OutputState::Closed;
        self.live.clear();
    }

    /// Move the output clock forward, releasing voices whose stop time has passed.
    pub fn advance(&mut self, seconds: f64) {
        self.time += seconds;
        let now = self.time;
        self.live.retain(|v| v.stop_time() > now);
    }

    /// Voices still sounding at the current time.
    pub fn live_voices(&self) -> &[VoiceSchedule] {
        &self.live
    }

    /// Every voice ever scheduled, in scheduling order.
    pub fn history(&self) -> &[VoiceSchedule] {
        &self.history
    }

    /// Number of suspended → running transitions.
    pub fn resume_count(&self) -> usize {
        self.resumes
    }

    /// Render every scheduled voice into `seconds` of mono audio from time 0.
    pub fn render(&self, seconds: f64) -> Vec<f64> {
        renderer::render_voices(&self.history, self.sample_rate, seconds)
    }
}

impl AudioOutput for OfflineOutput {
    fn state(&self) -> OutputState {
        self.state
    }

    fn resume(&mut self) -> Result<(), ToneError> {
        match self.state {
            OutputState::Running => Ok(()),
            OutputState::Closed => Err(ToneError::OutputUnavailable {
                reason: "output is closed".to_string(),
            }),
            OutputState::Suspended => {
                if let Some(reason) = &self.denied {
                    return Err(ToneError::OutputUnavailable {
                        reason: reason.clone(),
                    });
                }
                self.state = OutputState::Running;
                self.resumes += 1;
                Ok(())
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn schedule_voice(&mut self, voice: &VoiceSchedule) -> Result<(), ToneError> {
        if self.state == OutputState::Closed {
            return Err(ToneError::OutputUnavailable {
                reason: "output is closed".to_string(),
            });
        }
        self.live.push(*voice);
        self.history.push(*voice);
        Ok(())
    }
}
