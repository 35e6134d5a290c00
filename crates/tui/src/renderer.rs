use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use folio_core::{PageShell, ShellPhase, SiteConfig, TimerSequencer};
use folio_protocol::{ChildState, LoaderSnapshot};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use tracing::{debug, info, warn};

use crate::page::{Page, SECTIONS};

/// Redraw cadence while something is moving.
const FRAME: Duration = Duration::from_millis(16);
/// Poll cadence when idle.
const IDLE: Duration = Duration::from_millis(250);
/// Columns a child slides in from.
const SLIDE_COLS: f64 = 6.0;

/// Restores the terminal however `run` exits: normal return, `?` or panic.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let guard = Self;
        execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            warn!(%err, "failed to leave raw mode");
        }
        if let Err(err) = execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture, Show) {
            warn!(%err, "failed to restore terminal");
        }
    }
}

fn child_style(state: ChildState) -> Option<Style> {
    match state {
        ChildState::Hidden => None,
        ChildState::Entering { progress } if progress < 0.5 => {
            Some(Style::default().fg(Color::DarkGray))
        }
        ChildState::Entering { .. } => Some(Style::default().fg(Color::Gray)),
        ChildState::Shown => Some(Style::default().fg(Color::White)),
    }
}

fn draw_loader(frame: &mut Frame<'_>, snapshot: &LoaderSnapshot) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Fill(1),
        ])
        .split(area);

    let quote = Paragraph::new(Line::from(Span::styled(
        format!("\"{}\"", snapshot.quote),
        Style::default().fg(Color::White).add_modifier(Modifier::ITALIC),
    )))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    frame.render_widget(quote, rows[1]);

    let gauge_area = centered(rows[3], 50);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Black))
        .percent(u16::from(snapshot.percent.min(100)))
        .label(format!("{}%", snapshot.percent));
    frame.render_widget(gauge, gauge_area);
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect::new(area.x + (area.width - width) / 2, area.y, width, area.height)
}

fn draw_page(frame: &mut Frame<'_>, page: &Page, now: Duration) {
    let area = frame.area();
    let header_area = Rect::new(0, 0, area.width, 1);
    let header = Block::default()
        .title(" folio | ↑↓ PgUp/PgDn scroll | q quit ")
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, header_area);

    let content = Rect::new(0, 1, area.width, area.height.saturating_sub(1));
    let buf = frame.buffer_mut();
    let mut put = |row: u16, col: u16, text: &str, style: Style| {
        if row < page.scroll || row - page.scroll >= content.height || col >= content.width {
            return;
        }
        let y = content.y + row - page.scroll;
        let max = usize::from(content.width - col);
        buf.set_stringn(content.x + col, y, text, max, style);
    };

    for section in &page.sections {
        if !section.reveal.is_visible() {
            continue;
        }
        let title_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        put(section.top, 2, section.def.title, title_style);
        put(section.top + 1, 2, &"─".repeat(section.def.title.len()), title_style);

        for (i, line) in section.def.lines.iter().enumerate() {
            let state = section.child_state(i, now);
            let Some(style) = child_style(state) else {
                continue;
            };
            let slide = ((1.0 - state.amount()) * SLIDE_COLS).round() as u16;
            put(section.top + 2 + i as u16, 4 + slide, line, style);
        }
    }
}

pub fn run(config: &SiteConfig) -> Result<()> {
    let mut page = Page::new(SECTIONS, config.reveal.as_ref())?;
    let mut shell = PageShell::new(config.loader.clone());

    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let origin = Instant::now();
    shell.mount(Duration::ZERO);
    let mut content_mounted = false;

    loop {
        let now = origin.elapsed();
        shell.advance_to(now);

        let size = terminal.size()?;
        let view_rows = size.height.saturating_sub(1);

        let timeout = match shell.phase() {
            Some(ShellPhase::Loading) => {
                let snapshot = shell.loader().and_then(TimerSequencer::snapshot);
                terminal.draw(|frame| {
                    if let Some(snapshot) = &snapshot {
                        draw_loader(frame, snapshot);
                    }
                })?;
                shell
                    .next_deadline()
                    .map_or(FRAME, |due| due.saturating_sub(now))
                    .min(FRAME)
            }
            Some(ShellPhase::Content) => {
                if !content_mounted {
                    info!("content mounted");
                    page.mount();
                    content_mounted = true;
                }
                page.measure(size.width, view_rows, now);
                terminal.draw(|frame| draw_page(frame, &page, now))?;
                if page.is_animating(now) { FRAME } else { IDLE }
            }
            None => FRAME,
        };

        if event::poll(timeout)? {
            let scrollable = !shell.scroll_locked();
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Up if scrollable => page.scroll_by(-1, view_rows),
                    KeyCode::Down if scrollable => page.scroll_by(1, view_rows),
                    KeyCode::PageUp if scrollable => {
                        page.scroll_by(-i32::from(view_rows / 2), view_rows);
                    }
                    KeyCode::PageDown if scrollable => {
                        page.scroll_by(i32::from(view_rows / 2), view_rows);
                    }
                    _ => {}
                },
                Event::Mouse(mouse) if scrollable => match mouse.kind {
                    MouseEventKind::ScrollDown => page.scroll_by(2, view_rows),
                    MouseEventKind::ScrollUp => page.scroll_by(-2, view_rows),
                    _ => {}
                },
                _ => {}
            }
            debug!(scroll = page.scroll, "input");
        }
    }

    // Dropping the shell tears down a still-running loader.
    drop(shell);
    Ok(())
}
