//! The shared audio output: the one rendering graph every voice is mixed into.

pub mod offline;
#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::engine::VoiceSchedule;
use crate::error::ToneError;

/// Lifecycle of the audio output, mirroring WebAudio's `AudioContextState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Suspended,
    Running,
    Closed,
}

/// A destination that voices can be scheduled on.
///
/// Scheduling is one-way: the output receives start time, gain automation
/// and stop time, and renders the voice on its own clock without further
/// involvement from the caller.
pub trait AudioOutput {
    fn state(&self) -> OutputState;

    /// Ask the output to start rendering. Must be a no-op when already running.
    fn resume(&mut self) -> Result<(), ToneError>;

    /// Current time of the output's own clock, in seconds.
    fn current_time(&self) -> f64;

    fn schedule_voice(&mut self, voice: &VoiceSchedule) -> Result<(), ToneError>;

    /// Resume only if suspended. Safe to call before every voice.
    fn ensure_running(&mut self) -> Result<(), ToneError> {
        match self.state() {
            OutputState::Running => Ok(()),
            OutputState::Suspended => self.resume(),
            OutputState::Closed => Err(ToneError::OutputUnavailable {
                reason: "output is closed".to_string(),
            }),
        }
    }
}

/// Creates the real output on first use.
///
/// Browsers may refuse to create an audio context before a user gesture,
/// so a failed creation is not remembered: the next call tries again.
pub struct LazyOutput<O, F> {
    inner: Option<O>,
    create: F,
}

impl<O, F> LazyOutput<O, F>
where
    O: AudioOutput,
    F: FnMut() -> Result<O, ToneError>,
{
    pub fn new(create: F) -> Self {
        LazyOutput { inner: None, create }
    }

    pub fn get(&self) -> Option<&O> {
        self.inner.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.inner.is_some()
    }

    fn get_or_create(&mut self) -> Result<&mut O, ToneError> {
        if self.inner.is_none() {
            let output = (self.create)()?;
            log::info!("audio output created ({:?})", output.state());
            self.inner = Some(output);
        }
        self.inner.as_mut().ok_or_else(|| ToneError::OutputUnavailable {
            reason: "output was not created".to_string(),
        })
    }
}

impl<O, F> AudioOutput for LazyOutput<O, F>
where
    O: AudioOutput,
    F: FnMut() -> Result<O, ToneError>,
{
    fn state(&self) -> OutputState {
        // Not created yet behaves like suspended: the next ensure_running creates it.
        self.inner
            .as_ref()
            .map_or(OutputState::Suspended, |o| o.state())
    }

    fn resume(&mut self) -> Result<(), ToneError> {
        self.get_or_create()?.resume()
    }

    fn current_time(&self) -> f64 {
        self.inner.as_ref().map_or(0.0, |o| o.current_time())
    }

    fn schedule_voice(&mut self, voice: &VoiceSchedule) -> Result<(), ToneError> {
        match self.inner.as_mut() {
            Some(o) => o.schedule_voice(voice),
            None => Err(ToneError::OutputUnavailable {
                reason: "output was not created".to_string(),
            }),
        }
    }

    fn ensure_running(&mut self) -> Result<(), ToneError> {
        self.get_or_create()?.ensure_running()
    }
}
