//! Staggered entrance schedule driven by a visibility signal.

use std::time::Duration;

use folio_protocol::ChildState;

/// Child `i` starts `base_delay + i * stagger` after the reveal and takes
/// `child_duration` to finish entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaggerSchedule {
    pub base_delay: Duration,
    pub stagger: Duration,
    pub child_duration: Duration,
}

impl StaggerSchedule {
    pub fn new(base_delay: Duration, stagger: Duration, child_duration: Duration) -> Self {
        Self {
            base_delay,
            stagger,
            child_duration,
        }
    }

    /// Offset from the reveal instant at which child `index` starts.
    pub fn activation_offset(&self, index: usize) -> Duration {
        let steps = u32::try_from(index).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_add(self.stagger.saturating_mul(steps))
    }

    pub fn activation_offsets(&self, count: usize) -> Vec<Duration> {
        (0..count).map(|i| self.activation_offset(i)).collect()
    }

    /// State of child `index` given time elapsed since the reveal, or
    /// `None` if the section has not been revealed yet.
    pub fn child_state(&self, index: usize, elapsed: Option<Duration>) -> ChildState {
        let Some(elapsed) = elapsed else {
            return ChildState::Hidden;
        };
        let start = self.activation_offset(index);
        if elapsed < start {
            return ChildState::Hidden;
        }
        let into = elapsed - start;
        if into >= self.child_duration {
            return ChildState::Shown;
        }
        let progress = into.as_secs_f64() / self.child_duration.as_secs_f64();
        if progress <= 0.0 {
            ChildState::Hidden
        } else {
            ChildState::Entering { progress }
        }
    }

    /// Time after the reveal at which all `count` children are shown.
    pub fn settled_after(&self, count: usize) -> Duration {
        match count {
            0 => Duration::ZERO,
            n => self
                .activation_offset(n - 1)
                .saturating_add(self.child_duration),
        }
    }
}

/// Records when a section's visibility signal first went `true` and maps
/// child indices to presentation states from that instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationGate {
    schedule: StaggerSchedule,
    revealed_at: Option<Duration>,
}

impl AnimationGate {
    pub fn new(schedule: StaggerSchedule) -> Self {
        Self {
            schedule,
            revealed_at: None,
        }
    }

    /// Feed the current visibility signal. The first `true` fixes the
    /// reveal instant; later values are ignored since the signal latches.
    pub fn observe(&mut self, visible: bool, now: Duration) {
        if visible && self.revealed_at.is_none() {
            self.revealed_at = Some(now);
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed_at.is_some()
    }

    pub fn revealed_at(&self) -> Option<Duration> {
        self.revealed_at
    }

    pub fn schedule(&self) -> &StaggerSchedule {
        &self.schedule
    }

    /// Absolute activation times of `count` children, once revealed.
    pub fn activation_times(&self, count: usize) -> Option<Vec<Duration>> {
        let at = self.revealed_at?;
        Some(
            self.schedule
                .activation_offsets(count)
                .into_iter()
                .map(|offset| at.saturating_add(offset))
                .collect(),
        )
    }

    pub fn child_state(&self, index: usize, now: Duration) -> ChildState {
        let elapsed = self.revealed_at.map(|at| now.saturating_sub(at));
        self.schedule.child_state(index, elapsed)
    }

    pub fn child_states(&self, count: usize, now: Duration) -> Vec<ChildState> {
        (0..count).map(|i| self.child_state(i, now)).collect()
    }

    /// Whether every one of `count` children has finished entering.
    pub fn is_settled(&self, count: usize, now: Duration) -> bool {
        self.revealed_at
            .is_some_and(|at| now.saturating_sub(at) >= self.schedule.settled_after(count))
    }
}
