//! Trigger Dispatcher: Maps input events to tones.
//!
//! Four event classes are handled: key presses, the random-note button,
//! generic clickable elements ("ambient" presses) and the form-submission
//! acknowledgment chord. Visual key highlighting is driven only by
//! press/release events and by the pulse timer; it is never tied to how
//! long a tone actually sounds.

use crate::config::{AmbientPolicy, EngineConfig};
use crate::dsp::oscillator::Waveform;
use crate::engine::{ToneEngine, ToneRequest};
use crate::error::ToneError;
use crate::notes::NoteTable;
use crate::output::AudioOutput;
use crate::random::RandomSource;
use crate::sequencer::{Deferred, ManualTimer, Sequencer, TaskId, Timer};

/// An on-screen key: carries a note-name label and an "active" highlight.
pub trait KeyElement {
    fn note(&self) -> Option<String>;
    fn set_active(&self, active: bool);
}

/// Finds the on-screen key for a note name.
pub trait Keyboard {
    type Key: KeyElement;

    fn find_key(&self, note: &str) -> Option<Self::Key>;
}

/// How a key press arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Pointer,
    Touch,
}

/// Whether the host should cancel the browser's default handling of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Default,
    PreventDefault,
}

pub struct TriggerDispatcher<O: AudioOutput, T: Timer> {
    engine: ToneEngine<O>,
    notes: NoteTable,
    sequencer: Sequencer,
    timer: T,
    rng: Box<dyn RandomSource>,
}

impl<O: AudioOutput, T: Timer> TriggerDispatcher<O, T> {
    pub fn new(
        engine: ToneEngine<O>,
        notes: NoteTable,
        timer: T,
        rng: impl RandomSource + 'static,
    ) -> Self {
        TriggerDispatcher {
            engine,
            notes,
            sequencer: Sequencer::new(),
            timer,
            rng: Box::new(rng),
        }
    }

    pub fn engine(&self) -> &ToneEngine<O> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ToneEngine<O> {
        &mut self.engine
    }

    pub fn notes(&self) -> &NoteTable {
        &self.notes
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn pending(&self) -> usize {
        self.sequencer.pending()
    }

    /// Replace the configuration after validating it.
    pub fn configure(&mut self, config: EngineConfig) -> Result<(), ToneError> {
        config.validate()?;
        self.engine.set_config(config);
        Ok(())
    }

    pub fn play_tone(&mut self, frequency: f64, waveform: Option<Waveform>) {
        self.engine.play_tone(frequency, waveform);
    }

    /// Play the key's note and highlight it. Keys with a missing or unknown
    /// label are ignored.
    pub fn trigger_key<K: KeyElement + ?Sized>(&mut self, key: &K) {
        match self.resolve_key(key) {
            Ok(frequency) => {
                self.engine.play_tone(frequency, None);
                key.set_active(true);
            }
            Err(e) => log::debug!("key ignored: {e}"),
        }
    }

    /// Press-start on a key. Touch presses ask the host to cancel the
    /// default action so the browser does not follow up with an emulated
    /// mouse press that would trigger the key a second time.
    pub fn press_key<K: KeyElement + ?Sized>(&mut self, key: &K, kind: PressKind) -> EventDisposition {
        self.trigger_key(key);
        match kind {
            PressKind::Touch => EventDisposition::PreventDefault,
            PressKind::Pointer => EventDisposition::Default,
        }
    }

    /// Press-end or pointer-leave: clear the highlight. The tone keeps decaying.
    pub fn remove_active<K: KeyElement + ?Sized>(&self, key: &K) {
        key.set_active(false);
    }

    /// Play a uniformly chosen note and briefly highlight its key, if one is
    /// on screen. Returns the note name.
    pub fn play_random_note<B: Keyboard>(&mut self, keys: &B) -> Option<String> {
        let index = self.rng.pick(self.notes.len());
        let (name, frequency) = self.notes.entry(index)?;
        let name = name.to_string();
        self.engine.play_tone(frequency, None);

        match keys.find_key(&name) {
            Some(key) => {
                key.set_active(true);
                let pulse = self.engine.config().pulse_ms;
                self.sequencer.schedule(
                    &mut self.timer,
                    pulse,
                    Deferred::ClearActive(name.clone()),
                );
            }
            None => log::debug!(
                "{}",
                ToneError::MissingTargetElement { note: name.clone() }
            ),
        }
        Some(name)
    }

    /// Press-start on a generic interactive element. Never looks at keys.
    pub fn ambient_press(&mut self) {
        let config = self.engine.config();
        let (frequency, waveform) = match config.ambient_policy {
            AmbientPolicy::RandomNote => {
                let index = self.rng.pick(self.notes.len());
                let Some((_, frequency)) = self.notes.entry(index) else {
                    return;
                };
                (frequency, config.default_waveform)
            }
            AmbientPolicy::Blip { frequency, waveform } => (frequency, waveform),
        };
        let request = ToneRequest::new(frequency, waveform, &config.ambient);
        self.engine.play(request);
    }

    /// Form submission: schedule the root major triad as an arpeggio and
    /// ask the host to suppress the default navigation.
    pub fn acknowledge(&mut self) -> EventDisposition {
        match self.notes.major_triad() {
            Ok(triad) => {
                let config = self.engine.config();
                let steps: Vec<(u32, Deferred)> = triad
                    .iter()
                    .zip(0u32..)
                    .map(|(&frequency, i)| {
                        let request =
                            ToneRequest::new(frequency, config.default_waveform, &config.key);
                        (i * config.chord_step_ms, Deferred::Tone(request))
                    })
                    .collect();
                self.sequencer.schedule_all(&mut self.timer, steps);
            }
            Err(e) => log::debug!("no acknowledgment chord: {e}"),
        }
        EventDisposition::PreventDefault
    }

    /// Run a deferred action whose timeout has fired. Cancelled or unknown
    /// ids are ignored.
    pub fn fire<B: Keyboard>(&mut self, id: TaskId, keys: &B) {
        match self.sequencer.take(id) {
            Some(Deferred::Tone(request)) => self.engine.play(request),
            Some(Deferred::ClearActive(note)) => {
                if let Some(key) = keys.find_key(&note) {
                    key.set_active(false);
                }
            }
            None => {}
        }
    }

    pub fn cancel_pending(&mut self) {
        self.sequencer.cancel_all(&mut self.timer);
    }

    fn resolve_key<K: KeyElement + ?Sized>(&self, key: &K) -> Result<f64, ToneError> {
        let note = key.note().ok_or_else(|| ToneError::UnknownNote {
            name: String::new(),
        })?;
        self.notes.lookup(&note)
    }
}

impl<O: AudioOutput> TriggerDispatcher<O, ManualTimer> {
    /// Advance the virtual page clock and run everything that came due.
    pub fn advance<B: Keyboard>(&mut self, ms: u64, keys: &B) {
        for id in self.timer.advance(ms) {
            self.fire(id, keys);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::offline::OfflineOutput;
    use crate::random::{RngSource, ScriptedSource};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct TestKey {
        note: Option<String>,
        active: Cell<bool>,
        changes: RefCell<Vec<bool>>,
    }

    impl TestKey {
        fn new(note: &str) -> Rc<Self> {
            Rc::new(TestKey {
                note: Some(note.to_string()),
                active: Cell::new(false),
                changes: RefCell::new(Vec::new()),
            })
        }

        fn unlabeled() -> Rc<Self> {
            Rc::new(TestKey {
                note: None,
                active: Cell::new(false),
                changes: RefCell::new(Vec::new()),
            })
        }
    }

    impl KeyElement for Rc<TestKey> {
        fn note(&self) -> Option<String> {
            self.note.clone()
        }

        fn set_active(&self, active: bool) {
            self.active.set(active);
            self.changes.borrow_mut().push(active);
        }
    }

    struct TestKeyboard {
        keys: Vec<Rc<TestKey>>,
        lookups: Cell<usize>,
    }

    impl TestKeyboard {
        fn full() -> Self {
            TestKeyboard::with_notes(NoteTable::default().names())
        }

        fn with_notes<'a>(notes: impl Iterator<Item = &'a str>) -> Self {
            TestKeyboard {
                keys: notes.map(TestKey::new).collect(),
                lookups: Cell::new(0),
            }
        }

        fn key(&self, note: &str) -> &Rc<TestKey> {
            self.keys
                .iter()
                .find(|k| k.note.as_deref() == Some(note))
                .unwrap()
        }

        fn any_active(&self) -> bool {
            self.keys.iter().any(|k| k.active.get())
        }

        fn any_changed(&self) -> bool {
            self.keys.iter().any(|k| !k.changes.borrow().is_empty())
        }
    }

    impl Keyboard for TestKeyboard {
        type Key = Rc<TestKey>;

        fn find_key(&self, note: &str) -> Option<Rc<TestKey>> {
            self.lookups.set(self.lookups.get() + 1);
            self.keys
                .iter()
                .find(|k| k.note.as_deref() == Some(note))
                .cloned()
        }
    }

    fn dispatcher_with(
        rng: impl RandomSource + 'static,
        config: EngineConfig,
    ) -> TriggerDispatcher<OfflineOutput, ManualTimer> {
        let engine = ToneEngine::new(OfflineOutput::new(44100.0), config);
        TriggerDispatcher::new(engine, NoteTable::default(), ManualTimer::new(), rng)
    }

    fn dispatcher() -> TriggerDispatcher<OfflineOutput, ManualTimer> {
        dispatcher_with(RngSource::seeded(1), EngineConfig::default())
    }

    fn played(d: &TriggerDispatcher<OfflineOutput, ManualTimer>) -> Vec<f64> {
        d.engine().output().history().iter().map(|v| v.frequency).collect()
    }

    #[test]
    fn every_known_key_plays_its_frequency() {
        let keys = TestKeyboard::full();
        let mut d = dispatcher();
        for (name, freq) in CHROMATIC {
            d.trigger_key(keys.key(name));
            assert_eq!(played(&d).last(), Some(&freq));
        }
        assert_eq!(played(&d).len(), CHROMATIC.len());
    }

    const CHROMATIC: [(&str, f64); 8] = [
        ("C", 261.63),
        ("C#", 277.18),
        ("D", 293.66),
        ("D#", 311.13),
        ("E", 329.63),
        ("F", 349.23),
        ("F#", 369.99),
        ("G", 392.00),
    ];

    #[test]
    fn unknown_or_missing_label_is_a_no_op() {
        let mut d = dispatcher();
        let unknown = TestKey::new("A");
        let unlabeled = TestKey::unlabeled();
        d.trigger_key(&unknown);
        d.trigger_key(&unlabeled);
        assert!(played(&d).is_empty());
        assert!(unknown.changes.borrow().is_empty());
        assert!(unlabeled.changes.borrow().is_empty());
    }

    #[test]
    fn release_clears_highlight_while_tone_still_sounds() {
        let keys = TestKeyboard::full();
        let c = keys.key("C");
        let mut d = dispatcher();

        d.press_key(c, PressKind::Pointer);
        assert!(c.active.get());
        d.remove_active(c);
        assert!(!c.active.get());
        assert_eq!(*c.changes.borrow(), vec![true, false]);

        // The voice is still scheduled on the output.
        let output = d.engine().output();
        assert_eq!(output.live_voices().len(), 1);
        assert_eq!(output.live_voices()[0].frequency, 261.63);
        assert!(output.live_voices()[0].stop_time() > output.current_time());
    }

    #[test]
    fn touch_press_cancels_emulated_mouse_events() {
        let keys = TestKeyboard::full();
        let mut d = dispatcher();
        assert_eq!(
            d.press_key(keys.key("D"), PressKind::Touch),
            EventDisposition::PreventDefault
        );
        assert_eq!(
            d.press_key(keys.key("D"), PressKind::Pointer),
            EventDisposition::Default
        );
    }

    #[test]
    fn random_note_covers_the_whole_table() {
        let keys = TestKeyboard::full();
        let table = NoteTable::default();
        let mut d = dispatcher_with(ScriptedSource::counting(table.len()), EngineConfig::default());

        let picked: Vec<String> = (0..table.len())
            .map(|_| d.play_random_note(&keys).unwrap())
            .collect();

        for name in table.names() {
            assert!(picked.iter().any(|p| p == name), "{name} never picked");
        }
        for freq in played(&d) {
            assert!(table.frequencies().any(|f| f == freq));
        }
    }

    #[test]
    fn random_note_frequencies_always_come_from_the_table() {
        let keys = TestKeyboard::full();
        let table = NoteTable::default();
        let mut d = dispatcher();
        for _ in 0..200 {
            d.play_random_note(&keys);
        }
        assert_eq!(played(&d).len(), 200);
        for freq in played(&d) {
            assert!(table.frequencies().any(|f| f == freq));
        }
    }

    #[test]
    fn random_note_pulses_its_key() {
        let keys = TestKeyboard::full();
        let mut d = dispatcher_with(ScriptedSource::new(vec![4]), EngineConfig::default());

        assert_eq!(d.play_random_note(&keys).as_deref(), Some("E"));
        assert!(keys.key("E").active.get());

        d.advance(199, &keys);
        assert!(keys.key("E").active.get());
        d.advance(1, &keys);
        assert!(!keys.key("E").active.get());
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn random_note_without_element_still_plays() {
        let keys = TestKeyboard::with_notes(["C"].into_iter());
        let mut d = dispatcher_with(ScriptedSource::new(vec![7]), EngineConfig::default());

        assert_eq!(d.play_random_note(&keys).as_deref(), Some("G"));
        assert_eq!(played(&d), vec![392.00]);
        assert_eq!(d.pending(), 0);
        assert!(!keys.any_active());
    }

    #[test]
    fn ambient_press_never_touches_keys() {
        let keys = TestKeyboard::full();
        let table = NoteTable::default();
        let mut d = dispatcher();
        for _ in 0..20 {
            d.ambient_press();
        }
        assert_eq!(played(&d).len(), 20);
        for freq in played(&d) {
            assert!(table.frequencies().any(|f| f == freq));
        }
        assert!(!keys.any_changed());
        assert_eq!(keys.lookups.get(), 0);
    }

    #[test]
    fn ambient_blip_policy_plays_fixed_tone() {
        let config = EngineConfig {
            ambient_policy: AmbientPolicy::Blip {
                frequency: 880.0,
                waveform: Waveform::Sine,
            },
            ..EngineConfig::default()
        };
        let mut d = dispatcher_with(RngSource::seeded(3), config);
        d.ambient_press();
        d.ambient_press();

        let history = d.engine().output().history();
        assert_eq!(history.len(), 2);
        for v in history {
            assert_eq!(v.frequency, 880.0);
            assert_eq!(v.waveform, Waveform::Sine);
            assert_eq!(v.envelope.peak, EngineConfig::default().ambient.peak);
        }
    }

    #[test]
    fn acknowledgment_plays_c_e_g_arpeggio() {
        let keys = TestKeyboard::full();
        let mut d = dispatcher();

        assert_eq!(d.acknowledge(), EventDisposition::PreventDefault);
        let due: Vec<u64> = d.timer().scheduled().iter().map(|&(t, _)| t).collect();
        assert_eq!(due, vec![0, 100, 200]);
        assert!(played(&d).is_empty(), "nothing plays before the timers fire");

        d.advance(0, &keys);
        assert_eq!(played(&d), vec![261.63]);
        d.advance(100, &keys);
        assert_eq!(played(&d), vec![261.63, 329.63]);
        d.advance(100, &keys);
        assert_eq!(played(&d), vec![261.63, 329.63, 392.00]);
        assert!(!keys.any_changed());
    }

    #[test]
    fn cancelled_acknowledgment_stays_silent() {
        let keys = TestKeyboard::full();
        let mut d = dispatcher();
        d.acknowledge();
        d.advance(0, &keys);
        d.cancel_pending();
        d.advance(500, &keys);
        assert_eq!(played(&d), vec![261.63]);
    }

    #[test]
    fn rapid_presses_overlap() {
        let keys = TestKeyboard::full();
        let mut d = dispatcher();
        for _ in 0..10 {
            d.trigger_key(keys.key("F"));
        }
        assert_eq!(d.engine().output().live_voices().len(), 10);
    }

    #[test]
    fn denied_output_keeps_visuals_working() {
        let keys = TestKeyboard::full();
        let mut d = dispatcher();
        d.engine_mut().output_mut().deny("no user gesture");

        d.trigger_key(keys.key("C"));
        assert!(keys.key("C").active.get());
        assert!(played(&d).is_empty());

        d.engine_mut().output_mut().allow();
        d.trigger_key(keys.key("C"));
        assert_eq!(played(&d), vec![261.63]);
    }

    #[test]
    fn configure_rejects_invalid_config() {
        let mut d = dispatcher();
        let mut config = EngineConfig::default();
        config.floor = 0.5;
        assert!(d.configure(config).is_err());

        let config = EngineConfig {
            chord_step_ms: 50,
            ..EngineConfig::default()
        };
        d.configure(config).unwrap();
        d.acknowledge();
        let due: Vec<u64> = d.timer().scheduled().iter().map(|&(t, _)| t).collect();
        assert_eq!(due, vec![0, 50, 100]);
    }
}
