//! Operator console for Rostrum using ratatui.

mod console;
mod input;
mod theme;

pub use console::{Console, StatusKind, StatusLine};
pub use input::{InputPump, apply_key, handle_events};
pub use theme::{Glyphs, Palette, UiOptions, glyphs, palette, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use rostrum_types::{FloorSnapshot, PhaseKind, TurnEnding, format_clock};

/// Main draw function
pub fn draw(frame: &mut Frame, console: &Console) {
    let options = console.options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(5), // Speaker
            Constraint::Min(3),    // Queue + ledger
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, console.snapshot(), chunks[0], &palette, &glyphs);
    draw_speaker(frame, console.snapshot(), chunks[1], &palette);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);
    draw_queue(frame, console.snapshot(), lists[0], &palette, &glyphs);
    draw_ledger(frame, console, lists[1], &palette, &glyphs);

    draw_input(frame, console, chunks[3], &palette, &glyphs);
    draw_status_bar(frame, console, chunks[4], &palette);
}

fn panel<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::border(palette))
        .title_top(Line::from(Span::styled(title, styles::title(palette))))
}

fn draw_header(
    frame: &mut Frame,
    snapshot: &FloorSnapshot,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (glyph, color) = match snapshot.phase() {
        PhaseKind::Active => (glyphs.running, palette.success),
        PhaseKind::Paused => (glyphs.paused, palette.warning),
        PhaseKind::Vacant => (glyphs.vacant, palette.text_muted),
    };
    let admission = if snapshot.admission_open {
        Span::styled("admission open", Style::default().fg(palette.success))
    } else {
        Span::styled("admission closed", Style::default().fg(palette.warning))
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", snapshot.session_id),
            styles::title(palette),
        ),
        Span::styled(
            format!("{glyph} {} ", snapshot.phase()),
            Style::default().fg(color),
        ),
        Span::styled("│ ", styles::muted(palette)),
        admission,
        Span::styled(
            format!(" │ budget {}", format_clock(snapshot.total_budget_seconds)),
            styles::muted(palette),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_speaker(frame: &mut Frame, snapshot: &FloorSnapshot, area: Rect, palette: &Palette) {
    let block = panel(" Speaker ", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let holder = match &snapshot.holder_id {
        Some(holder) => Span::styled(
            format!(" {holder}"),
            Style::default()
                .fg(palette.text_primary)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(" Floor is vacant", styles::muted(palette)),
    };
    frame.render_widget(Paragraph::new(Line::from(holder)), rows[0]);

    let ratio = snapshot.remaining_ratio();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(palette.countdown(ratio)).bg(palette.bg_dark))
        .ratio(ratio)
        .label(Span::styled(
            format!(
                "{} / {}",
                format_clock(snapshot.remaining_seconds),
                format_clock(snapshot.total_budget_seconds)
            ),
            Style::default().fg(palette.text_primary),
        ));
    frame.render_widget(gauge, rows[1]);
}

fn draw_queue(
    frame: &mut Frame,
    snapshot: &FloorSnapshot,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let lines: Vec<Line> = if snapshot.pending.is_empty() {
        vec![Line::from(Span::styled(" No one waiting", styles::muted(palette)))]
    } else {
        snapshot
            .pending
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Line::from(vec![
                    Span::styled(format!(" {:>2}. ", index + 1), styles::muted(palette)),
                    Span::styled(
                        entry.participant_id.to_string(),
                        Style::default().fg(palette.text_primary),
                    ),
                    Span::styled(
                        format!(" {} {}", glyphs.bullet, entry.requested_at.format("%H:%M:%S")),
                        styles::muted(palette),
                    ),
                ])
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines).block(panel(" Queue ", palette)), area);
}

fn draw_ledger(
    frame: &mut Frame,
    console: &Console,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let mut lines: Vec<Line> = console
        .recent_turns()
        .map(|turn| {
            let (tag, color) = match turn.ending() {
                TurnEnding::Finalized => ("done", palette.success),
                TurnEnding::Expired => ("expired", palette.error),
                TurnEnding::Overridden => ("cut", palette.warning),
            };
            Line::from(vec![
                Span::styled(format!(" {} ", glyphs.bullet), styles::muted(palette)),
                Span::styled(
                    turn.participant_id().to_string(),
                    Style::default().fg(palette.text_primary),
                ),
                Span::styled(
                    format!(" {} ", format_clock(turn.seconds_used())),
                    Style::default().fg(palette.accent),
                ),
                Span::styled(tag, Style::default().fg(color)),
            ])
        })
        .collect();
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(" No turns yet", styles::muted(palette))));
    }
    frame.render_widget(Paragraph::new(lines).block(panel(" Ledger ", palette)), area);
}

fn draw_input(
    frame: &mut Frame,
    console: &Console,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let prefix = format!("{} ", glyphs.prompt);
    let line = Line::from(vec![
        Span::styled(prefix.clone(), Style::default().fg(palette.primary)),
        Span::styled(console.input(), Style::default().fg(palette.text_primary)),
    ]);
    let hints = Line::from(Span::styled(" help · q to quit ", styles::muted(palette)))
        .alignment(Alignment::Right);
    let input = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(palette.primary))
            .title_top(hints),
    );
    frame.render_widget(input, area);

    let offset = u16::try_from(prefix.width() + console.input().width()).unwrap_or(u16::MAX);
    let cursor_x = area
        .x
        .saturating_add(1)
        .saturating_add(offset)
        .min(area.right().saturating_sub(2));
    frame.set_cursor_position((cursor_x, area.y.saturating_add(1)));
}

fn draw_status_bar(frame: &mut Frame, console: &Console, area: Rect, palette: &Palette) {
    let (text, style) = match console.status() {
        Some(status) => {
            let (prefix, color) = match status.kind {
                StatusKind::Error => ("Error: ", palette.error),
                StatusKind::Warning => ("Warning: ", palette.warning),
                StatusKind::Info => ("", palette.text_muted),
            };
            (format!("{prefix}{}", status.text), Style::default().fg(color))
        }
        None => (
            format!("Session {}", console.session()),
            styles::muted(palette),
        ),
    };
    let status = Paragraph::new(Line::from(vec![Span::raw(" "), Span::styled(text, style)]));
    frame.render_widget(status, area);
}
