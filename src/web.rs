//! Browser glue: DOM listeners, `setTimeout`, and the JS-facing API.
//!
//! All state lives in one thread-local dispatcher. Every listener and
//! export borrows it for the duration of a single event and never calls
//! back into JS while holding the borrow.

use std::cell::RefCell;
use std::collections::HashMap;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, EventTarget, HtmlFormElement};

use crate::config::EngineConfig;
use crate::dispatcher::{EventDisposition, KeyElement, Keyboard, PressKind, TriggerDispatcher};
use crate::dsp::oscillator::Waveform;
use crate::engine::ToneEngine;
use crate::error::ToneError;
use crate::notes::NoteTable;
use crate::output::LazyOutput;
use crate::output::web::WebAudioOutput;
use crate::quotes;
use crate::random::RngSource;
use crate::sequencer::{TaskId, Timer};

const ACTIVE_CLASS: &str = "playing";
const KEY_SELECTOR: &str = ".key";
const AMBIENT_SELECTOR: &str = "a, button, .card";
const FORM_ID: &str = "contact-form";
const QUOTE_ID: &str = "dynamic-quote";
const SUBMIT_NOTICE: &str =
    "Thanks for the message! Your message wasn't actually sent (static site), but it sounded good!";

type WebOutput = LazyOutput<WebAudioOutput, fn() -> Result<WebAudioOutput, ToneError>>;
type WebDispatcher = TriggerDispatcher<WebOutput, WindowTimer>;

thread_local! {
    static DISPATCHER: RefCell<Option<WebDispatcher>> = const { RefCell::new(None) };
}

fn random_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

fn new_dispatcher() -> WebDispatcher {
    let create: fn() -> Result<WebAudioOutput, ToneError> = WebAudioOutput::new;
    let engine = ToneEngine::new(LazyOutput::new(create), EngineConfig::default());
    TriggerDispatcher::new(
        engine,
        NoteTable::default(),
        WindowTimer::default(),
        RngSource::seeded(random_seed()),
    )
}

fn with_dispatcher<R>(f: impl FnOnce(&mut WebDispatcher) -> R) -> R {
    DISPATCHER.with(|cell| {
        let mut slot = cell.borrow_mut();
        f(slot.get_or_insert_with(new_dispatcher))
    })
}

/// A `.key` element: note in `data-note`, highlight via the `playing` class.
pub struct DomKey(pub Element);

impl KeyElement for DomKey {
    fn note(&self) -> Option<String> {
        self.0.get_attribute("data-note")
    }

    fn set_active(&self, active: bool) {
        let classes = self.0.class_list();
        let result = if active {
            classes.add_1(ACTIVE_CLASS)
        } else {
            classes.remove_1(ACTIVE_CLASS)
        };
        if let Err(e) = result {
            log::debug!("class toggle failed: {e:?}");
        }
    }
}

/// Looks keys up in the live document.
pub struct DomKeyboard {
    document: Option<Document>,
}

impl DomKeyboard {
    pub fn current() -> Self {
        DomKeyboard {
            document: web_sys::window().and_then(|w| w.document()),
        }
    }
}

impl Keyboard for DomKeyboard {
    type Key = DomKey;

    fn find_key(&self, note: &str) -> Option<DomKey> {
        let selector = format!("{KEY_SELECTOR}[data-note=\"{note}\"]");
        self.document
            .as_ref()?
            .query_selector(&selector)
            .ok()
            .flatten()
            .map(DomKey)
    }
}

/// `setTimeout`-backed timer. Fired timeouts call back into the dispatcher.
#[derive(Default)]
pub struct WindowTimer {
    handles: HashMap<TaskId, i32>,
}

impl WindowTimer {
    fn forget(&mut self, id: TaskId) {
        self.handles.remove(&id);
    }
}

impl Timer for WindowTimer {
    fn set_timeout(&mut self, id: TaskId, delay_ms: u32) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback = Closure::once_into_js(move || {
            let keys = DomKeyboard::current();
            with_dispatcher(|d| {
                d.timer_mut().forget(id);
                d.fire(id, &keys);
            });
        });
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay_ms as i32,
        ) {
            Ok(handle) => {
                self.handles.insert(id, handle);
            }
            Err(e) => log::debug!("setTimeout failed: {e:?}"),
        }
    }

    fn clear_timeout(&mut self, id: TaskId) {
        if let (Some(handle), Some(window)) = (self.handles.remove(&id), web_sys::window()) {
            window.clear_timeout_with_handle(handle);
        }
    }
}

/// Attach a listener for the lifetime of the page.
fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn elements(document: &Document, selector: &str) -> Result<Vec<Element>, JsValue> {
    let list = document.query_selector_all(selector)?;
    Ok((0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

fn is_inside_key(event: &Event) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(KEY_SELECTOR).ok().flatten())
        .is_some()
}

fn wire_key(key: &Element) -> Result<(), JsValue> {
    for (event, kind) in [("mousedown", PressKind::Pointer), ("touchstart", PressKind::Touch)] {
        let el = key.clone();
        listen(key, event, move |e: Event| {
            let disposition = with_dispatcher(|d| d.press_key(&DomKey(el.clone()), kind));
            if disposition == EventDisposition::PreventDefault {
                e.prevent_default();
            }
        })?;
    }
    for event in ["mouseup", "mouseleave", "touchend"] {
        let el = key.clone();
        listen(key, event, move |_| {
            with_dispatcher(|d| d.remove_active(&DomKey(el.clone())));
        })?;
    }
    Ok(())
}

fn wire_ambient(element: &Element) -> Result<(), JsValue> {
    for event in ["mousedown", "touchstart"] {
        listen(element, event, |e: Event| {
            if !is_inside_key(&e) {
                with_dispatcher(|d| d.ambient_press());
            }
        })?;
    }
    Ok(())
}

fn wire_form(form: &Element) -> Result<(), JsValue> {
    let form_el = form.clone();
    listen(form, "submit", move |e: Event| {
        if with_dispatcher(|d| d.acknowledge()) == EventDisposition::PreventDefault {
            e.prevent_default();
        }
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(SUBMIT_NOTICE);
        }
        if let Some(form) = form_el.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    })
}

/// Wire up keys, generic interactive elements, the contact form and the
/// quote slot. Any of them may be absent from the page.
#[wasm_bindgen]
pub fn install() -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let keys = elements(&document, KEY_SELECTOR)?;
    for key in &keys {
        wire_key(key)?;
    }

    let mut ambient = 0;
    for el in elements(&document, AMBIENT_SELECTOR)? {
        if el.matches(KEY_SELECTOR).unwrap_or(false) {
            continue;
        }
        wire_ambient(&el)?;
        ambient += 1;
    }

    if let Some(form) = document.get_element_by_id(FORM_ID) {
        wire_form(&form)?;
    }

    if let Some(slot) = document.get_element_by_id(QUOTE_ID) {
        let mut rng = RngSource::seeded(random_seed());
        slot.set_text_content(Some(quotes::pick_quote(&mut rng)));
    }

    log::info!("installed {} keys, {ambient} ambient elements", keys.len());
    Ok(())
}

/// Play one tone. Unknown waveform names fall back to the default waveform.
#[wasm_bindgen(js_name = playTone)]
pub fn play_tone(frequency: f64, waveform: Option<String>) {
    let waveform = waveform.as_deref().and_then(|w| {
        let parsed = Waveform::parse(w);
        if parsed.is_none() {
            log::debug!("unknown waveform '{w}', using default");
        }
        parsed
    });
    with_dispatcher(|d| d.play_tone(frequency, waveform));
}

#[wasm_bindgen(js_name = playRandomNote)]
pub fn play_random_note() {
    let keys = DomKeyboard::current();
    with_dispatcher(|d| {
        d.play_random_note(&keys);
    });
}

#[wasm_bindgen(js_name = triggerKey)]
pub fn trigger_key(key: Element) {
    with_dispatcher(|d| d.trigger_key(&DomKey(key)));
}

#[wasm_bindgen(js_name = removeActive)]
pub fn remove_active(key: Element) {
    with_dispatcher(|d| d.remove_active(&DomKey(key)));
}

/// Replace the engine configuration with a (possibly partial) config object.
#[wasm_bindgen]
pub fn configure(value: JsValue) -> Result<(), JsValue> {
    let config: EngineConfig =
        serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    with_dispatcher(|d| d.configure(config)).map_err(|e| JsValue::from_str(&e.to_string()))
}
