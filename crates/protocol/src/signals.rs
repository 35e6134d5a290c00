use serde::{Deserialize, Serialize};

/// Lifecycle phase of the loading-screen sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoaderPhase {
    /// Constructed, timers not started.
    Idle,
    /// Quote rotation and progress ticks are both scheduled.
    Running,
    /// Progress saturated; timers are gone and only the settle delay is
    /// pending before the completion callback fires.
    Settling,
    /// Completion callback delivered. Terminal.
    Complete,
    /// Torn down before completion. Terminal.
    Cancelled,
}

impl LoaderPhase {
    /// Whether no further state changes can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoaderPhase::Complete | LoaderPhase::Cancelled)
    }
}

/// Read-only view of the loader for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderSnapshot {
    pub phase: LoaderPhase,
    /// Raw progress in `[0, 100]`.
    pub progress: f64,
    /// Progress truncated for display.
    pub percent: u8,
    pub quote_index: usize,
    pub quote: String,
}

/// Presentation state of one staggered child.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ChildState {
    Hidden,
    /// Mid-animation; `progress` is linear in `(0, 1)`.
    Entering { progress: f64 },
    Shown,
}

impl ChildState {
    /// Opacity-like scalar for renderers: 0 hidden, 1 shown.
    pub fn amount(self) -> f64 {
        match self {
            ChildState::Hidden => 0.0,
            ChildState::Entering { progress } => progress,
            ChildState::Shown => 1.0,
        }
    }
}

/// Read-only view of a revealed section for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealSnapshot {
    pub visible: bool,
    pub children: Vec<ChildState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_state_json_is_tagged() {
        let json = serde_json::to_string(&ChildState::Entering { progress: 0.5 }).unwrap();
        assert_eq!(json, r#"{"state":"entering","progress":0.5}"#);
        let hidden = serde_json::to_string(&ChildState::Hidden).unwrap();
        assert_eq!(hidden, r#"{"state":"hidden"}"#);
    }

    #[test]
    fn phase_serializes_kebab_case() {
        let json = serde_json::to_string(&LoaderPhase::Settling).unwrap();
        assert_eq!(json, r#""settling""#);
        assert!(LoaderPhase::Cancelled.is_terminal());
        assert!(!LoaderPhase::Settling.is_terminal());
    }
}
