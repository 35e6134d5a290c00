use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tracing::info;

use crate::config::LoaderConfig;
use crate::mount::MountGuard;
use crate::sequencer::TimerSequencer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellPhase {
    /// Loading screen is up and scrolling is locked.
    Loading,
    /// Loader torn down; page sections are live.
    Content,
}

/// Top-level page state: the loading screen until its completion fires,
/// then the content.
///
/// The loader is owned here and dropped on the switch to content, which
/// releases its timers.
#[derive(Debug)]
pub struct PageShell {
    mount: MountGuard,
    loader: Option<TimerSequencer>,
    loaded: Rc<Cell<bool>>,
}

impl PageShell {
    pub fn new(config: LoaderConfig) -> Self {
        let loaded = Rc::new(Cell::new(false));
        let flag = Rc::clone(&loaded);
        Self {
            mount: MountGuard::new(),
            loader: Some(TimerSequencer::new(config, move || flag.set(true))),
            loaded,
        }
    }

    /// First render commit at host time `now`; starts the loader.
    pub fn mount(&mut self, now: Duration) {
        if !self.mount.mark_mounted() {
            return;
        }
        if let Some(loader) = self.loader.as_mut() {
            loader.advance_to(now);
            loader.mount();
            loader.start();
        }
    }

    pub fn advance_to(&mut self, now: Duration) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        loader.advance_to(now);
        if self.loaded.get() {
            self.loader = None;
            info!("loading screen finished");
        }
    }

    /// `None` before mount.
    pub fn phase(&self) -> Option<ShellPhase> {
        if !self.mount.is_mounted() {
            return None;
        }
        Some(match self.loader {
            Some(_) => ShellPhase::Loading,
            None => ShellPhase::Content,
        })
    }

    /// The page must not scroll while the loading screen is up.
    pub fn scroll_locked(&self) -> bool {
        self.phase() == Some(ShellPhase::Loading)
    }

    pub fn loader(&self) -> Option<&TimerSequencer> {
        self.loader.as_ref()
    }

    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.loader.as_mut().and_then(TimerSequencer::next_deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_protocol::LoaderPhase;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn renders_nothing_before_mount() {
        let mut shell = PageShell::new(LoaderConfig::default());
        shell.advance_to(ms(60_000));
        assert_eq!(shell.phase(), None);
        assert!(!shell.scroll_locked());
    }

    #[test]
    fn switches_to_content_after_loader_completes() {
        let mut shell = PageShell::new(LoaderConfig::default());
        shell.mount(ms(10_000));
        assert_eq!(shell.phase(), Some(ShellPhase::Loading));
        assert!(shell.scroll_locked());

        // 67 ticks of 60ms, then the 800ms settle.
        let mut now = ms(10_000);
        while now < ms(14_020) {
            now += ms(10);
            shell.advance_to(now);
        }
        assert_eq!(
            shell.loader().map(TimerSequencer::phase),
            Some(LoaderPhase::Settling)
        );
        assert_eq!(shell.next_deadline(), Some(ms(14_820)));

        shell.advance_to(ms(14_820));
        assert_eq!(shell.phase(), Some(ShellPhase::Content));
        assert!(!shell.scroll_locked());
        assert!(shell.loader().is_none());
    }
}
