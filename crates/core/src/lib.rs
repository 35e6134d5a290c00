//! Runtime signals behind an animated portfolio page: latched viewport
//! visibility feeding staggered reveals, and the loading-screen timer
//! sequencer with its single completion.
//!
//! Everything here runs on the host's single event loop. Time is supplied
//! by the host through `advance_to(now)` calls, so the same code drives a
//! browser frame loop, a terminal, or a simulated clock in tests.

pub mod clock;
pub mod config;
pub mod gate;
pub mod mount;
pub mod reveal;
pub mod sequencer;
pub mod shell;
pub mod viewport;

pub use config::{ConfigError, LoaderConfig, RevealConfig, SiteConfig};
pub use gate::{AnimationGate, StaggerSchedule};
pub use mount::MountGuard;
pub use reveal::Reveal;
pub use sequencer::TimerSequencer;
pub use shell::{PageShell, ShellPhase};
pub use viewport::{
    FedSource, IntersectionSource, ObserveError, RatioFeed, ThresholdError, ViewportObserver,
    VisibilityThreshold, fed_source,
};
