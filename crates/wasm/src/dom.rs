use std::cell::RefCell;
use std::rc::Rc;

use folio_core::viewport::{IntersectionSource, ObserveError, VisibilityThreshold};
use js_sys::{Array, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

type EntriesCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// A live `IntersectionObserver` registration on one element.
struct Registration {
    observer: IntersectionObserver,
    // Must outlive the observer; dropping it frees the JS function.
    _callback: EntriesCallback,
}

/// Browser-backed intersection source for one element, found by id.
///
/// The browser invokes the observer callback on its own schedule; ratios
/// are queued until the host's next `section_poll`. Environments without
/// `IntersectionObserver` are reported as unsupported so the section
/// fails open.
pub struct DomIntersectionSource {
    element_id: String,
    ratios: Rc<RefCell<Vec<f64>>>,
    registration: Option<Registration>,
}

impl DomIntersectionSource {
    pub fn new(element_id: &str) -> Self {
        Self {
            element_id: element_id.to_owned(),
            ratios: Rc::new(RefCell::new(Vec::new())),
            registration: None,
        }
    }
}

impl IntersectionSource for DomIntersectionSource {
    fn connect(&mut self, threshold: VisibilityThreshold) -> Result<(), ObserveError> {
        let window =
            web_sys::window().ok_or_else(|| ObserveError::Unsupported("no window".into()))?;
        if !Reflect::has(&window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false) {
            return Err(ObserveError::Unsupported(
                "IntersectionObserver not available".into(),
            ));
        }
        let document = window
            .document()
            .ok_or_else(|| ObserveError::Unsupported("no document".into()))?;
        let element = document
            .get_element_by_id(&self.element_id)
            .ok_or_else(|| ObserveError::TargetMissing(self.element_id.clone()))?;

        let queue = Rc::clone(&self.ratios);
        let callback: EntriesCallback =
            Closure::new(move |entries: Array, _observer: IntersectionObserver| {
                let mut queue = queue.borrow_mut();
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    // Leaving entries still carry a ratio; only crossings count.
                    if entry.is_intersecting() {
                        queue.push(entry.intersection_ratio().clamp(0.0, 1.0));
                    }
                }
            });

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(threshold.fraction()));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
                .map_err(|err| {
                    ObserveError::Unsupported(
                        err.as_string()
                            .unwrap_or_else(|| "IntersectionObserver rejected options".into()),
                    )
                })?;
        observer.observe(&element);

        self.ratios.borrow_mut().clear();
        self.registration = Some(Registration {
            observer,
            _callback: callback,
        });
        Ok(())
    }

    fn take_ratios(&mut self) -> Vec<f64> {
        std::mem::take(&mut *self.ratios.borrow_mut())
    }

    fn disconnect(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.observer.disconnect();
        }
        self.ratios.borrow_mut().clear();
    }
}
