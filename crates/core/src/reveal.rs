use std::time::Duration;

use folio_protocol::{ChildState, RevealSnapshot};

use crate::config::RevealConfig;
use crate::gate::AnimationGate;
use crate::viewport::{IntersectionSource, ThresholdError, ViewportObserver};

/// An animated page section: a viewport observer feeding an animation gate.
///
/// This is what a host keeps per section. It owns the observation, so
/// dropping the section deregisters it.
#[derive(Debug)]
pub struct Reveal<S: IntersectionSource> {
    observer: ViewportObserver<S>,
    gate: AnimationGate,
    children: usize,
}

impl<S: IntersectionSource> Reveal<S> {
    pub fn new(source: S, config: &RevealConfig, children: usize) -> Result<Self, ThresholdError> {
        Ok(Self {
            observer: ViewportObserver::observe(source, config.threshold()?),
            gate: AnimationGate::new(config.schedule()),
            children,
        })
    }

    pub fn mount(&mut self) {
        self.observer.mount();
    }

    /// Pull fresh geometry and advance the gate to `now`.
    pub fn update(&mut self, now: Duration) -> bool {
        let visible = self.observer.poll();
        self.gate.observe(visible, now);
        visible
    }

    pub fn is_visible(&self) -> bool {
        self.observer.is_visible()
    }

    pub fn child_state(&self, index: usize, now: Duration) -> ChildState {
        self.gate.child_state(index, now)
    }

    /// Whether the host still needs to redraw for this section.
    pub fn is_animating(&self, now: Duration) -> bool {
        self.gate.is_revealed() && !self.gate.is_settled(self.children, now)
    }

    pub fn snapshot(&self, now: Duration) -> RevealSnapshot {
        RevealSnapshot {
            visible: self.is_visible(),
            children: self.gate.child_states(self.children, now),
        }
    }

    pub fn observer(&self) -> &ViewportObserver<S> {
        &self.observer
    }

    pub fn gate(&self) -> &AnimationGate {
        &self.gate
    }

    pub fn release(&mut self) {
        self.observer.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::fed_source;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn section_reveals_from_first_crossing() {
        let (source, feed) = fed_source();
        let mut section = Reveal::new(source, &RevealConfig::about(), 3).unwrap();
        section.mount();
        assert!(!section.update(ms(100)));

        feed.push(0.5);
        assert!(section.update(ms(1_000)));
        assert_eq!(section.gate().revealed_at(), Some(ms(1_000)));
        assert_eq!(section.child_state(0, ms(1_100)), ChildState::Hidden);
        assert!(section.is_animating(ms(1_100)));

        let settled = section.snapshot(ms(10_000));
        assert!(settled.visible);
        assert!(settled.children.iter().all(|c| *c == ChildState::Shown));
        assert!(!section.is_animating(ms(10_000)));
    }

    #[test]
    fn unmounted_section_snapshot_is_hidden() {
        let (source, feed) = fed_source();
        let mut section = Reveal::new(source, &RevealConfig::contact(), 2).unwrap();
        feed.push(1.0);
        assert!(!section.update(ms(500)));
        let snap = section.snapshot(ms(500));
        assert!(!snap.visible);
        assert_eq!(snap.children, vec![ChildState::Hidden; 2]);
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let (source, _feed) = fed_source();
        let config = RevealConfig {
            threshold: 2.0,
            ..RevealConfig::about()
        };
        assert!(Reveal::new(source, &config, 1).is_err());
    }
}
