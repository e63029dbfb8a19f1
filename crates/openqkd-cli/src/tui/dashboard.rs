//! Metrics dashboard — a single-screen rendering of one run's statistics.
//!
//! ┌──────────────────────────────────────────────┐
//! │  🔬 openqkd    1000 rounds · 336 sifted      │
//! ├──────────────────────────────────────────────┤
//! │  CHSH  ███████████████████░░░  S = 2.791     │
//! │        classical bound 2.0 · quantum 2.828   │
//! │  QBER  █░░░░░░░░░░░░░░░░░░░░░  0.00%         │
//! │  Rate  ███████░░░░░░░░░░░░░░░  0.336         │
//! ├──────────────────────────────────────────────┤
//! │  press any key to close                      │
//! └──────────────────────────────────────────────┘
//!
//! Rendering is strictly optional: when stdout is not a terminal (or the
//! backend cannot start) the caller gets `RenderingUnavailable` and prints a
//! one-line skip notice instead of aborting the run.

use std::io::{self, IsTerminal};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use openqkd_core::{Error, MetricsResult, Result};
use ratatui::{prelude::*, widgets::*};

const CHSH_QUANTUM_MAX: f64 = 2.828_427_124_746_190_3; // 2√2

/// Render the dashboard and block until a key is pressed.
pub fn show(metrics: &MetricsResult) -> Result<()> {
    if !io::stdout().is_terminal() {
        return Err(Error::RenderingUnavailable(
            "stdout is not a terminal".into(),
        ));
    }

    enable_raw_mode().map_err(unavailable)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(unavailable)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(unavailable)?;

    let result = run_loop(&mut terminal, metrics);

    // Always restore the terminal, even if the loop returned an error.
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        crossterm::cursor::Show
    );

    result.map_err(unavailable)
}

fn unavailable(e: io::Error) -> Error {
    Error::RenderingUnavailable(e.to_string())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    metrics: &MetricsResult,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, metrics))?;
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            return Ok(());
        }
    }
}

fn draw(f: &mut Frame, m: &MetricsResult) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(4), // chsh
            Constraint::Length(3), // qber
            Constraint::Length(3), // key rate
            Constraint::Min(0),
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], m);
    draw_chsh(f, rows[1], m);
    draw_qber(f, rows[2], m);
    draw_rate(f, rows[3], m);
    draw_keys(f, rows[5]);
}

fn draw_title(f: &mut Frame, area: Rect, m: &MetricsResult) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" 🔬 openqkd ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(
                format!(
                    " {} rounds · {} sifted · {} rule ",
                    m.rounds, m.matched, m.sifting
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    f.render_widget(block, area);
}

fn draw_chsh(f: &mut Frame, area: Rect, m: &MetricsResult) {
    let ratio = (m.chsh_s / CHSH_QUANTUM_MAX).clamp(0.0, 1.0);
    let color = if m.chsh_s > 2.0 {
        Color::Green
    } else {
        Color::Red
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" CHSH — classical bound 2.0, quantum max 2.828 "),
        )
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("S = {:.3}", m.chsh_s));
    f.render_widget(gauge, area);
}

fn draw_qber(f: &mut Frame, area: Rect, m: &MetricsResult) {
    let color = if m.qber < 0.05 {
        Color::Green
    } else if m.qber < 0.15 {
        Color::Yellow
    } else {
        Color::Red
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" QBER "))
        .gauge_style(Style::default().fg(color))
        .ratio(m.qber.clamp(0.0, 1.0))
        .label(format!("{:.2}%", m.qber * 100.0));
    f.render_widget(gauge, area);
}

fn draw_rate(f: &mut Frame, area: Rect, m: &MetricsResult) {
    let color = if m.key_rate > 0.0 {
        Color::Green
    } else {
        Color::Red
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Usable key rate (bits per round) "),
        )
        .gauge_style(Style::default().fg(color))
        .ratio(m.key_rate.clamp(0.0, 1.0))
        .label(format!("{:.3}", m.key_rate));
    f.render_widget(gauge, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(" press any key to close")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}
