//! Loading-screen sequencer.
//!
//! Two periodic tasks run side by side on the same [`Scheduler`]: quote
//! rotation and progress increments. When progress saturates both are
//! cancelled together and a single completion notification is scheduled
//! after the settle delay. `stop()` (or dropping the sequencer) cancels
//! whatever is still pending; the completion callback is an `FnOnce`, so
//! it cannot be delivered twice.

use std::fmt;
use std::time::Duration;

use folio_protocol::{LoaderPhase, LoaderSnapshot};
use tracing::debug;

use crate::clock::{Scheduler, TaskHandle, TaskId};
use crate::config::{LoaderConfig, PROGRESS_MAX};
use crate::mount::MountGuard;

pub type Completion = Box<dyn FnOnce()>;

pub struct TimerSequencer {
    config: LoaderConfig,
    mount: MountGuard,
    phase: LoaderPhase,
    progress: f64,
    progress_ticks: u32,
    quote_index: usize,
    quote_advances: u32,
    scheduler: Scheduler,
    quote_task: Option<TaskHandle>,
    progress_task: Option<TaskHandle>,
    settle_task: Option<TaskHandle>,
    on_complete: Option<Completion>,
}

impl fmt::Debug for TimerSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSequencer")
            .field("phase", &self.phase)
            .field("progress", &self.progress)
            .field("progress_ticks", &self.progress_ticks)
            .field("quote_index", &self.quote_index)
            .field("now", &self.scheduler.now())
            .finish_non_exhaustive()
    }
}

impl TimerSequencer {
    /// `config` is expected to be validated; an empty quote list is
    /// tolerated and simply never rotates.
    pub fn new(config: LoaderConfig, on_complete: impl FnOnce() + 'static) -> Self {
        Self {
            config,
            mount: MountGuard::new(),
            phase: LoaderPhase::Idle,
            progress: 0.0,
            progress_ticks: 0,
            quote_index: 0,
            quote_advances: 0,
            scheduler: Scheduler::new(),
            quote_task: None,
            progress_task: None,
            settle_task: None,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    /// Loading screen committed its first render.
    pub fn mount(&mut self) {
        if self.mount.mark_mounted() {
            debug!("loader mounted");
        }
    }

    /// Begin quote rotation and progress ticks from the current clock.
    ///
    /// No-op unless mounted and idle, so a second call never adds a second
    /// pair of timers.
    pub fn start(&mut self) {
        if !self.mount.is_mounted() {
            debug!("start ignored: loader not mounted");
            return;
        }
        if self.phase != LoaderPhase::Idle {
            debug!(phase = ?self.phase, "start ignored");
            return;
        }
        self.quote_task = Some(self.scheduler.schedule_repeating(self.config.quote_period()));
        self.progress_task = Some(
            self.scheduler
                .schedule_repeating(self.config.progress_period()),
        );
        self.phase = LoaderPhase::Running;
        debug!(now = ?self.scheduler.now(), "loader running");
    }

    /// Tear down. Cancels both periodic tasks and any pending completion.
    /// Idempotent; no-op from `Idle` or a terminal phase.
    pub fn stop(&mut self) {
        if self.phase == LoaderPhase::Idle || self.phase.is_terminal() {
            return;
        }
        self.cancel_ticks();
        self.settle_task = None;
        self.on_complete = None;
        self.phase = LoaderPhase::Cancelled;
        debug!(progress = self.progress, "loader cancelled");
    }

    /// Advance the clock to `now`, dispatching every task that came due,
    /// in time order.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some(id) = self.scheduler.pop_due(now) {
            self.dispatch(id);
        }
        self.scheduler.advance_clock(now);
    }

    /// When the host should next call [`advance_to`](Self::advance_to).
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    fn dispatch(&mut self, id: TaskId) {
        if is_task(&self.progress_task, id) {
            self.on_progress_tick();
        } else if is_task(&self.quote_task, id) {
            self.on_quote_tick();
        } else if is_task(&self.settle_task, id) {
            self.on_settled();
        }
    }

    fn on_progress_tick(&mut self) {
        if self.phase != LoaderPhase::Running {
            return;
        }
        self.progress_ticks += 1;
        // Derived from the tick count so float error cannot add or drop a tick.
        let saturated = self.progress_ticks >= self.config.ticks_to_saturation();
        self.progress = if saturated {
            PROGRESS_MAX
        } else {
            (f64::from(self.progress_ticks) * self.config.progress_step).min(PROGRESS_MAX)
        };
        if saturated {
            self.cancel_ticks();
            self.settle_task = Some(self.scheduler.schedule_once(self.config.settle_delay()));
            self.phase = LoaderPhase::Settling;
            debug!(
                ticks = self.progress_ticks,
                now = ?self.scheduler.now(),
                "progress saturated"
            );
        }
    }

    fn on_quote_tick(&mut self) {
        if self.phase != LoaderPhase::Running || self.config.quotes.is_empty() {
            return;
        }
        self.quote_index = (self.quote_index + 1) % self.config.quotes.len();
        self.quote_advances += 1;
    }

    fn on_settled(&mut self) {
        if self.phase != LoaderPhase::Settling {
            return;
        }
        debug_assert!(self.progress_task.is_none() && self.quote_task.is_none());
        self.settle_task = None;
        self.phase = LoaderPhase::Complete;
        debug!(now = ?self.scheduler.now(), "loader complete");
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }

    fn cancel_ticks(&mut self) {
        self.quote_task = None;
        self.progress_task = None;
    }

    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_mounted()
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Progress truncated for display.
    pub fn percent(&self) -> u8 {
        self.progress.floor() as u8
    }

    pub fn progress_ticks(&self) -> u32 {
        self.progress_ticks
    }

    pub fn quote_index(&self) -> usize {
        self.quote_index
    }

    pub fn quote_advances(&self) -> u32 {
        self.quote_advances
    }

    pub fn quote(&self) -> &str {
        self.config
            .quotes
            .get(self.quote_index)
            .map_or("", String::as_str)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Values for one render pass; `None` before mount.
    pub fn snapshot(&self) -> Option<LoaderSnapshot> {
        if !self.mount.is_mounted() {
            return None;
        }
        Some(LoaderSnapshot {
            phase: self.phase,
            progress: self.progress,
            percent: self.percent(),
            quote_index: self.quote_index,
            quote: self.quote().to_owned(),
        })
    }
}

impl Drop for TimerSequencer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn is_task(handle: &Option<TaskHandle>, id: TaskId) -> bool {
    handle.as_ref().is_some_and(|h| h.id() == id)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Host frame interval used by the tests; divides every default period.
    const FRAME: Duration = Duration::from_millis(10);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Advance frame by frame up to `until`, as a host render loop would.
    fn run_to(sequencer: &mut TimerSequencer, until: Duration) {
        let mut now = sequencer.now();
        while now < until {
            now = (now + FRAME).min(until);
            sequencer.advance_to(now);
        }
    }

    fn counted(config: LoaderConfig) -> (TimerSequencer, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let sequencer = TimerSequencer::new(config, move || seen.set(seen.get() + 1));
        (sequencer, calls)
    }

    fn running(config: LoaderConfig) -> (TimerSequencer, Rc<Cell<u32>>) {
        let (mut sequencer, calls) = counted(config);
        sequencer.mount();
        sequencer.start();
        (sequencer, calls)
    }

    #[test]
    fn start_before_mount_does_nothing() {
        let (mut sequencer, calls) = counted(LoaderConfig::default());
        sequencer.start();
        run_to(&mut sequencer, ms(10_000));
        assert_eq!(sequencer.phase(), LoaderPhase::Idle);
        assert_eq!(sequencer.progress_ticks(), 0);
        assert_eq!(sequencer.snapshot(), None);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn final_tick_clamps_to_exactly_one_hundred() {
        let (mut sequencer, _calls) = running(LoaderConfig::default());
        run_to(&mut sequencer, ms(66 * 60));
        assert_eq!(sequencer.progress_ticks(), 66);
        assert_eq!(sequencer.progress(), 99.0);
        assert_eq!(sequencer.phase(), LoaderPhase::Running);

        run_to(&mut sequencer, ms(67 * 60));
        assert_eq!(sequencer.progress_ticks(), 67);
        assert_eq!(sequencer.progress(), 100.0);
        assert_eq!(sequencer.percent(), 100);
        assert_eq!(sequencer.phase(), LoaderPhase::Settling);
    }

    #[test]
    fn inexact_steps_saturate_on_the_computed_tick() {
        for step in [0.1, 0.3, 0.7] {
            let config = LoaderConfig {
                progress_step: step,
                ..LoaderConfig::default()
            };
            let ticks = u64::from(config.ticks_to_saturation());
            let (mut sequencer, _calls) = running(config);

            run_to(&mut sequencer, ms((ticks - 1) * 60));
            assert_eq!(sequencer.phase(), LoaderPhase::Running, "step {step}");
            assert!(sequencer.progress() < 100.0, "step {step}");

            run_to(&mut sequencer, ms(ticks * 60));
            assert_eq!(u64::from(sequencer.progress_ticks()), ticks, "step {step}");
            assert_eq!(sequencer.progress(), 100.0, "step {step}");
            assert_eq!(sequencer.percent(), 100, "step {step}");
            assert_eq!(sequencer.phase(), LoaderPhase::Settling, "step {step}");
        }
    }

    #[test]
    fn completion_waits_for_settle_delay() {
        let (mut sequencer, calls) = running(LoaderConfig::default());
        let saturated = ms(67 * 60);
        run_to(&mut sequencer, saturated + ms(799));
        assert_eq!(calls.get(), 0);
        run_to(&mut sequencer, saturated + ms(800));
        assert_eq!(calls.get(), 1);
        assert_eq!(sequencer.phase(), LoaderPhase::Complete);
        run_to(&mut sequencer, ms(20_000));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn quote_rotation_stops_when_progress_saturates() {
        let (mut sequencer, _calls) = running(LoaderConfig::default());
        run_to(&mut sequencer, ms(20_000));
        // Quote ticks at 1200, 2400, 3600; saturation at 4020.
        assert_eq!(sequencer.quote_advances(), 3);
        assert_eq!(sequencer.quote_index(), 3);
        assert_eq!(sequencer.progress_ticks(), 67);
        assert_eq!(sequencer.next_deadline(), None);
    }

    #[test]
    fn late_frame_runs_each_timer_once() {
        let (mut sequencer, calls) = running(LoaderConfig::default());
        run_to(&mut sequencer, ms(60));
        assert_eq!(sequencer.progress_ticks(), 1);

        sequencer.advance_to(ms(3_060));
        assert_eq!(sequencer.progress_ticks(), 2);
        assert_eq!(sequencer.progress(), 3.0);
        assert_eq!(sequencer.quote_advances(), 1);

        // Re-armed from the late frame, not from the missed grid.
        sequencer.advance_to(ms(3_100));
        assert_eq!(sequencer.progress_ticks(), 2);
        sequencer.advance_to(ms(3_120));
        assert_eq!(sequencer.progress_ticks(), 3);

        sequencer.advance_to(ms(600_000));
        assert_eq!(sequencer.progress_ticks(), 4);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn stop_during_settle_suppresses_completion() {
        let (mut sequencer, calls) = running(LoaderConfig::default());
        run_to(&mut sequencer, ms(67 * 60 + 100));
        assert_eq!(sequencer.phase(), LoaderPhase::Settling);
        sequencer.stop();
        run_to(&mut sequencer, ms(20_000));
        assert_eq!(calls.get(), 0);
        assert_eq!(sequencer.phase(), LoaderPhase::Cancelled);
    }

    #[test]
    fn stop_is_idempotent_and_freezes_state() {
        let (mut sequencer, calls) = running(LoaderConfig::default());
        run_to(&mut sequencer, ms(1_500));
        let progress = sequencer.progress();
        let quote = sequencer.quote_index();
        sequencer.stop();
        sequencer.stop();
        sequencer.start();
        run_to(&mut sequencer, ms(20_000));
        assert_eq!(sequencer.progress(), progress);
        assert_eq!(sequencer.quote_index(), quote);
        assert_eq!(sequencer.phase(), LoaderPhase::Cancelled);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn stop_after_completion_is_ignored() {
        let (mut sequencer, calls) = running(LoaderConfig::default());
        run_to(&mut sequencer, ms(10_000));
        sequencer.stop();
        assert_eq!(sequencer.phase(), LoaderPhase::Complete);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn stop_before_start_is_ignored() {
        let (mut sequencer, calls) = counted(LoaderConfig::default());
        sequencer.mount();
        sequencer.stop();
        assert_eq!(sequencer.phase(), LoaderPhase::Idle);
        sequencer.start();
        run_to(&mut sequencer, ms(10_000));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn double_start_keeps_single_tick_rate() {
        let (mut sequencer, _calls) = running(LoaderConfig::default());
        sequencer.start();
        run_to(&mut sequencer, ms(600));
        assert_eq!(sequencer.progress_ticks(), 10);
        assert_eq!(sequencer.progress(), 15.0);
    }

    #[test]
    fn start_uses_current_clock_as_origin() {
        let (mut sequencer, _calls) = counted(LoaderConfig::default());
        sequencer.mount();
        sequencer.advance_to(ms(5_000));
        sequencer.start();
        sequencer.advance_to(ms(5_059));
        assert_eq!(sequencer.progress_ticks(), 0);
        sequencer.advance_to(ms(5_060));
        assert_eq!(sequencer.progress_ticks(), 1);
    }

    #[test]
    fn dropping_mid_run_never_calls_back() {
        let (mut sequencer, calls) = running(LoaderConfig::default());
        run_to(&mut sequencer, ms(2_000));
        drop(sequencer);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn snapshot_reports_current_quote() {
        let (mut sequencer, _calls) = running(LoaderConfig::default());
        run_to(&mut sequencer, ms(1_200));
        let snap = sequencer.snapshot().unwrap();
        assert_eq!(snap.phase, LoaderPhase::Running);
        assert_eq!(snap.quote_index, 1);
        assert_eq!(snap.quote, "Innovation distinguishes between a leader and a follower.");
        assert_eq!(snap.percent, 30);
    }

    #[test]
    fn zero_settle_delay_completes_on_saturating_frame() {
        let config = LoaderConfig {
            settle_delay_ms: 0,
            progress_step: 50.0,
            ..LoaderConfig::default()
        };
        let (mut sequencer, calls) = running(config);
        run_to(&mut sequencer, ms(120));
        assert_eq!(sequencer.phase(), LoaderPhase::Complete);
        assert_eq!(calls.get(), 1);
    }
}
