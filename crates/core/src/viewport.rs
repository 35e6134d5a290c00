//! Latched viewport visibility.
//!
//! A [`ViewportObserver`] watches one element through an
//! [`IntersectionSource`] and flips to visible the first time the element's
//! intersection ratio reaches the threshold. It never flips back: entrance
//! animations are one-shot.

use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;
use tracing::{debug, warn};

use crate::mount::MountGuard;

#[derive(Debug, Error, PartialEq)]
#[error("visibility threshold must be within [0, 1], got {0}")]
pub struct ThresholdError(pub f64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserveError {
    /// The host cannot report geometry at all.
    #[error("intersection detection unavailable: {0}")]
    Unsupported(String),
    /// The element to watch is not present in the host.
    #[error("observed element `{0}` not found")]
    TargetMissing(String),
}

/// Minimum fraction of an element's area that must intersect the viewport.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct VisibilityThreshold(f64);

impl VisibilityThreshold {
    pub fn new(fraction: f64) -> Result<Self, ThresholdError> {
        if (0.0..=1.0).contains(&fraction) {
            Ok(Self(fraction))
        } else {
            Err(ThresholdError(fraction))
        }
    }

    pub fn fraction(self) -> f64 {
        self.0
    }

    pub fn is_met_by(self, ratio: f64) -> bool {
        ratio >= self.0
    }
}

/// Host capability that reports how much of one element is on screen.
///
/// Implementations own the element reference. `connect` registers the
/// observation, `take_ratios` hands over every ratio reported since the
/// last call (oldest first), and `disconnect` deregisters.
pub trait IntersectionSource {
    fn connect(&mut self, threshold: VisibilityThreshold) -> Result<(), ObserveError>;

    fn take_ratios(&mut self) -> Vec<f64>;

    fn disconnect(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registration {
    /// Not yet mounted; nothing registered.
    Pending,
    Observing,
    /// Deregistered after latching, on release, or because the capability
    /// was missing.
    Done,
}

/// One-shot visibility signal for a single element.
#[derive(Debug)]
pub struct ViewportObserver<S: IntersectionSource> {
    source: S,
    threshold: VisibilityThreshold,
    mount: MountGuard,
    registration: Registration,
    visible: bool,
}

impl<S: IntersectionSource> ViewportObserver<S> {
    /// Create an observer for the element behind `source`. Nothing is
    /// registered until [`mount`](Self::mount).
    pub fn observe(source: S, threshold: VisibilityThreshold) -> Self {
        Self {
            source,
            threshold,
            mount: MountGuard::new(),
            registration: Registration::Pending,
            visible: false,
        }
    }

    /// Host element committed its first render; start observing.
    ///
    /// A missing capability (or element) fails open: the observer reports
    /// visible straight away so content is never stuck hidden.
    pub fn mount(&mut self) {
        if !self.mount.mark_mounted() || self.registration != Registration::Pending {
            return;
        }
        match self.source.connect(self.threshold) {
            Ok(()) => {
                debug!(threshold = self.threshold.fraction(), "observation registered");
                self.registration = Registration::Observing;
            }
            Err(err) => {
                warn!(%err, "showing content without a viewport trigger");
                self.registration = Registration::Done;
                self.visible = true;
            }
        }
    }

    /// Process reported geometry and return the current signal.
    pub fn poll(&mut self) -> bool {
        if self.registration == Registration::Observing {
            let ratios = self.source.take_ratios();
            if ratios.iter().any(|&r| self.threshold.is_met_by(r)) {
                debug!(threshold = self.threshold.fraction(), "element entered viewport");
                self.visible = true;
                self.source.disconnect();
                self.registration = Registration::Done;
            }
        }
        self.is_visible()
    }

    /// `false` before mount; latched `true` after the first crossing.
    pub fn is_visible(&self) -> bool {
        self.mount.is_mounted() && self.visible
    }

    pub fn is_observing(&self) -> bool {
        self.registration == Registration::Observing
    }

    pub fn threshold(&self) -> VisibilityThreshold {
        self.threshold
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Deregister now. The latched value is kept; an observer released
    /// before it latched stays hidden. Idempotent.
    pub fn release(&mut self) {
        if self.registration == Registration::Observing {
            self.source.disconnect();
            debug!("observation released");
        }
        self.registration = Registration::Done;
    }
}

impl<S: IntersectionSource> Drop for ViewportObserver<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Host side of a [`FedSource`]: pushes measured ratios to the observer.
///
/// Hosts should only measure while the observer reports
/// [`is_observing`](ViewportObserver::is_observing); nothing drains the
/// channel after deregistration.
#[derive(Debug, Clone)]
pub struct RatioFeed {
    tx: Sender<f64>,
}

impl RatioFeed {
    /// Report a freshly measured ratio. Returns `false` once the observing
    /// side is gone, so hosts can stop measuring.
    pub fn push(&self, ratio: f64) -> bool {
        self.tx.send(ratio).is_ok()
    }
}

/// Intersection source fed by the host (a layout pass, a terminal scroll
/// model, or a test script).
///
/// Ratios pushed while disconnected are discarded, as is anything measured
/// before `connect`. Non-finite ratios are ignored and the rest are clamped
/// to `[0, 1]`.
#[derive(Debug)]
pub struct FedSource {
    rx: Receiver<f64>,
    connected: bool,
    connects: usize,
    disconnects: usize,
}

/// Create a connected feed/source pair.
pub fn fed_source() -> (FedSource, RatioFeed) {
    let (tx, rx) = mpsc::channel();
    (
        FedSource {
            rx,
            connected: false,
            connects: 0,
            disconnects: 0,
        },
        RatioFeed { tx },
    )
}

impl FedSource {
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// How many times the observation was registered.
    pub fn connects(&self) -> usize {
        self.connects
    }

    /// How many times the observation was deregistered.
    pub fn disconnects(&self) -> usize {
        self.disconnects
    }

    fn drain(&self) -> Vec<f64> {
        self.rx.try_iter().collect()
    }
}

impl IntersectionSource for FedSource {
    fn connect(&mut self, _threshold: VisibilityThreshold) -> Result<(), ObserveError> {
        // Stale pre-mount measurements.
        self.drain();
        self.connected = true;
        self.connects += 1;
        Ok(())
    }

    fn take_ratios(&mut self) -> Vec<f64> {
        let pending = self.drain();
        if !self.connected {
            return Vec::new();
        }
        pending
            .into_iter()
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, 1.0))
            .collect()
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.disconnects += 1;
        }
    }
}
