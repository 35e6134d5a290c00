use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use folio_core::clock::from_millis_f64;
use folio_core::viewport::VisibilityThreshold;
use folio_core::{LoaderConfig, Reveal, RevealConfig, StaggerSchedule, TimerSequencer};
use wasm_bindgen::prelude::*;

mod dom;

use dom::DomIntersectionSource;

struct LoaderEntry {
    sequencer: TimerSequencer,
    fired: Rc<Cell<bool>>,
    on_complete: Option<js_sys::Function>,
}

thread_local! {
    static LOADERS: RefCell<Vec<Option<LoaderEntry>>> = const { RefCell::new(Vec::new()) };
    static SECTIONS: RefCell<Vec<Option<Reveal<DomIntersectionSource>>>> =
        const { RefCell::new(Vec::new()) };
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn insert<T>(slots: &mut Vec<Option<T>>, value: T) -> usize {
    if let Some(idx) = slots.iter().position(Option::is_none) {
        slots[idx] = Some(value);
        idx
    } else {
        slots.push(Some(value));
        slots.len() - 1
    }
}

/// Create a loading-screen sequencer. `config_json` may be empty for the
/// defaults. `on_complete` is called with no arguments at most once.
/// Returns a handle for the other `loader_*` functions.
#[wasm_bindgen]
pub fn create_loader(config_json: &str, on_complete: js_sys::Function) -> Result<usize, JsError> {
    let config = if config_json.trim().is_empty() {
        LoaderConfig::default()
    } else {
        LoaderConfig::from_json(config_json.as_bytes()).map_err(js_err)?
    };
    let fired = Rc::new(Cell::new(false));
    let flag = Rc::clone(&fired);
    let entry = LoaderEntry {
        sequencer: TimerSequencer::new(config, move || flag.set(true)),
        fired,
        on_complete: Some(on_complete),
    };
    Ok(LOADERS.with_borrow_mut(|loaders| insert(loaders, entry)))
}

fn with_loader<R>(
    handle: usize,
    f: impl FnOnce(&mut LoaderEntry) -> R,
) -> Result<R, JsError> {
    LOADERS.with_borrow_mut(|loaders| {
        loaders
            .get_mut(handle)
            .and_then(Option::as_mut)
            .map(f)
            .ok_or_else(|| JsError::new("invalid loader handle"))
    })
}

/// First render of the loading screen at `now_ms` (`performance.now()`).
/// Starts both timers.
#[wasm_bindgen]
pub fn loader_mount(handle: usize, now_ms: f64) -> Result<(), JsError> {
    with_loader(handle, |entry| {
        entry.sequencer.advance_to(from_millis_f64(now_ms));
        entry.sequencer.mount();
        entry.sequencer.start();
    })
}

/// Advance to `now_ms`. Invokes the completion callback, outside of any
/// internal borrow, if it came due.
#[wasm_bindgen]
pub fn loader_tick(handle: usize, now_ms: f64) -> Result<(), JsError> {
    let callback = with_loader(handle, |entry| {
        entry.sequencer.advance_to(from_millis_f64(now_ms));
        if entry.fired.get() {
            entry.on_complete.take()
        } else {
            None
        }
    })?;
    if let Some(callback) = callback
        && let Err(e) = callback.call0(&JsValue::NULL)
    {
        web_sys::console::error_1(&e);
    }
    Ok(())
}

/// Milliseconds until the next scheduled loader event, if any.
#[wasm_bindgen]
pub fn loader_next_deadline(handle: usize) -> Result<Option<f64>, JsError> {
    with_loader(handle, |entry| {
        let now = entry.sequencer.now();
        entry
            .sequencer
            .next_deadline()
            .map(|due| due.saturating_sub(now).as_secs_f64() * 1000.0)
    })
}

/// Current loader state as JSON, or `null` before mount.
#[wasm_bindgen]
pub fn loader_snapshot(handle: usize) -> Result<String, JsError> {
    let snapshot = with_loader(handle, |entry| entry.sequencer.snapshot())?;
    serde_json::to_string(&snapshot).map_err(js_err)
}

/// Tear down a loader. Pending timers and the completion are cancelled.
#[wasm_bindgen]
pub fn release_loader(handle: usize) {
    let released = LOADERS.with_borrow_mut(|loaders| loaders.get_mut(handle).and_then(Option::take));
    if released.is_some() {
        web_sys::console::log_1(&format!("folio: released loader {handle}").into());
    }
}

/// Watch the element with DOM id `element_id`, revealing `children`
/// staggered children once it crosses the configured threshold.
#[wasm_bindgen]
pub fn create_section(
    element_id: &str,
    config_json: &str,
    children: usize,
) -> Result<usize, JsError> {
    let config = if config_json.trim().is_empty() {
        RevealConfig::default()
    } else {
        RevealConfig::from_json(config_json.as_bytes()).map_err(js_err)?
    };
    let section = Reveal::new(DomIntersectionSource::new(element_id), &config, children)
        .map_err(js_err)?;
    Ok(SECTIONS.with_borrow_mut(|sections| insert(sections, section)))
}

fn with_section<R>(
    handle: usize,
    f: impl FnOnce(&mut Reveal<DomIntersectionSource>) -> R,
) -> Result<R, JsError> {
    SECTIONS.with_borrow_mut(|sections| {
        sections
            .get_mut(handle)
            .and_then(Option::as_mut)
            .map(f)
            .ok_or_else(|| JsError::new("invalid section handle"))
    })
}

/// Call after the section's element is in the DOM.
#[wasm_bindgen]
pub fn section_mount(handle: usize) -> Result<(), JsError> {
    with_section(handle, Reveal::mount)
}

/// Drain queued observer ratios, update and return the section state as JSON.
#[wasm_bindgen]
pub fn section_poll(handle: usize, now_ms: f64) -> Result<String, JsError> {
    let snapshot = with_section(handle, |section| {
        let now = from_millis_f64(now_ms);
        section.update(now);
        section.snapshot(now)
    })?;
    serde_json::to_string(&snapshot).map_err(js_err)
}

/// Element unmounted; deregister the observation.
#[wasm_bindgen]
pub fn release_section(handle: usize) {
    SECTIONS.with_borrow_mut(|sections| {
        if let Some(slot) = sections.get_mut(handle) {
            *slot = None;
        }
    });
}

/// Activation offsets in milliseconds for `count` staggered children.
#[wasm_bindgen]
pub fn stagger_schedule(base_delay_ms: f64, stagger_ms: f64, count: usize) -> Vec<f64> {
    let schedule = StaggerSchedule::new(
        from_millis_f64(base_delay_ms),
        from_millis_f64(stagger_ms),
        Duration::ZERO,
    );
    schedule
        .activation_offsets(count)
        .into_iter()
        .map(|d| d.as_secs_f64() * 1000.0)
        .collect()
}

/// Whether `threshold` is usable for `create_section`.
#[wasm_bindgen]
pub fn is_valid_threshold(threshold: f64) -> bool {
    VisibilityThreshold::new(threshold).is_ok()
}
