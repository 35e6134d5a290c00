use std::time::Duration;

use folio_core::{FedSource, RatioFeed, Reveal, RevealConfig, ThresholdError, fed_source};
use folio_protocol::{ChildState, Rect, intersection_ratio};

/// Blank rows between sections.
const SECTION_GAP: u16 = 2;
/// Title row plus the rule under it.
const HEADER_ROWS: u16 = 2;

pub struct SectionDef {
    pub title: &'static str,
    pub lines: &'static [&'static str],
    pub reveal: RevealConfig,
}

pub const SECTIONS: &[SectionDef] = &[
    SectionDef {
        title: "About",
        lines: &[
            "Systems programmer who likes small, well-tested runtimes.",
            "Comfortable from bare metal up to the browser.",
            "Believes every loading screen should end exactly once.",
        ],
        reveal: RevealConfig::about(),
    },
    SectionDef {
        title: "Experience",
        lines: &[
            "2023 - now   Runtime engineer",
            "2021 - 2023  Frontend platform",
            "2019 - 2021  Embedded tooling",
            "2018 - 2019  Intern, build systems",
        ],
        reveal: RevealConfig::experience(),
    },
    SectionDef {
        title: "Skills",
        lines: &[
            "Rust  C  TypeScript",
            "WebAssembly  async runtimes  parsers",
            "Profiling  fuzzing  property tests",
        ],
        reveal: RevealConfig::skills(),
    },
    SectionDef {
        title: "Projects",
        lines: &[
            "folio        reveal and loader signalling",
            "latchkit     one-shot signals for UI hosts",
            "tickq        cancellable timer queues",
        ],
        reveal: RevealConfig::projects(),
    },
    SectionDef {
        title: "Contact",
        lines: &[
            "mail     hello@example.com",
            "github   github.com/example",
            "web      example.com",
        ],
        reveal: RevealConfig::contact(),
    },
];

pub struct SectionView {
    pub def: &'static SectionDef,
    /// First row of the section on the page.
    pub top: u16,
    pub reveal: Reveal<FedSource>,
    feed: RatioFeed,
}

impl SectionView {
    pub fn height(&self) -> u16 {
        HEADER_ROWS + self.def.lines.len() as u16
    }

    pub fn child_state(&self, index: usize, now: Duration) -> ChildState {
        self.reveal.child_state(index, now)
    }
}

/// Sections stacked vertically on a scrollable page.
pub struct Page {
    pub sections: Vec<SectionView>,
    pub scroll: u16,
}

impl Page {
    pub fn new(
        defs: &'static [SectionDef],
        reveal_override: Option<&RevealConfig>,
    ) -> Result<Self, ThresholdError> {
        let mut sections = Vec::with_capacity(defs.len());
        // Leave the first screenful for the hero banner.
        let mut top = 6;
        for def in defs {
            let (source, feed) = fed_source();
            let config = reveal_override.unwrap_or(&def.reveal);
            let reveal = Reveal::new(source, config, def.lines.len())?;
            let view = SectionView {
                def,
                top,
                reveal,
                feed,
            };
            top += view.height() + SECTION_GAP;
            sections.push(view);
        }
        Ok(Self {
            sections,
            scroll: 0,
        })
    }

    pub fn height(&self) -> u16 {
        self.sections
            .last()
            .map_or(0, |s| s.top + s.height())
    }

    pub fn mount(&mut self) {
        for section in &mut self.sections {
            section.reveal.mount();
        }
    }

    pub fn scroll_by(&mut self, delta: i32, view_rows: u16) {
        let max = self.height().saturating_sub(view_rows);
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(max));
        self.scroll = next as u16;
    }

    /// Measure every section against the visible window and update reveals.
    pub fn measure(&mut self, view_cols: u16, view_rows: u16, now: Duration) {
        let viewport = Rect::new(
            0.0,
            f64::from(self.scroll),
            f64::from(view_cols),
            f64::from(view_rows),
        );
        for section in &mut self.sections {
            let target = Rect::new(
                0.0,
                f64::from(section.top),
                f64::from(view_cols),
                f64::from(section.height()),
            );
            if section.reveal.observer().is_observing() {
                section.feed.push(intersection_ratio(&target, &viewport));
            }
            section.reveal.update(now);
        }
    }

    pub fn is_animating(&self, now: Duration) -> bool {
        self.sections.iter().any(|s| s.reveal.is_animating(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn sections_stack_without_overlap() {
        let page = Page::new(SECTIONS, None).unwrap();
        for pair in page.sections.windows(2) {
            assert_eq!(pair[1].top, pair[0].top + pair[0].height() + SECTION_GAP);
        }
        let last = page.sections.last().unwrap();
        assert_eq!(page.height(), last.top + last.height());
    }

    #[test]
    fn sections_use_their_named_presets() {
        let presets: Vec<_> = SECTIONS.iter().map(|s| (s.title, s.reveal)).collect();
        assert_eq!(presets, [
            ("About", RevealConfig::about()),
            ("Experience", RevealConfig::experience()),
            ("Skills", RevealConfig::skills()),
            ("Projects", RevealConfig::projects()),
            ("Contact", RevealConfig::contact()),
        ]);
    }

    #[test]
    fn only_sections_in_view_reveal() {
        let mut page = Page::new(SECTIONS, None).unwrap();
        page.mount();
        // First section occupies rows 6..11; a 10-row window shows 4 of 5.
        page.measure(80, 10, ms(0));
        assert!(page.sections[0].reveal.is_visible());
        let last = page.sections.len() - 1;
        assert!(!page.sections[last].reveal.is_visible());

        page.scroll_by(1_000, 10);
        page.measure(80, 10, ms(500));
        assert!(page.sections[last].reveal.is_visible());
        assert!(page.sections[0].reveal.is_visible());
    }

    #[test]
    fn scroll_is_clamped_to_page() {
        let mut page = Page::new(SECTIONS, None).unwrap();
        page.scroll_by(-5, 10);
        assert_eq!(page.scroll, 0);
        page.scroll_by(10_000, 10);
        assert_eq!(page.scroll, page.height() - 10);
    }

    #[test]
    fn unmounted_page_reveals_nothing() {
        let mut page = Page::new(SECTIONS, None).unwrap();
        page.measure(80, 200, ms(0));
        assert!(page.sections.iter().all(|s| !s.reveal.is_visible()));
    }
}
