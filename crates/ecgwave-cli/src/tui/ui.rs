//! TUI rendering: twelve lead charts beside a heart-rate panel.
//!
//! ┌ ♥ ecgwave  SUPTECH SANTE M 55  waveform  Gain x10 ─────── ● LIVE ┐
//! ├──────────┬──────────┬──────────┬────────────────────────────────┤
//! │ I        │ II       │ III      │  HR                            │
//! │ aVR      │ aVL      │ aVF      │  75 bpm                        │
//! │ V1       │ V2       │ V3       │                                │
//! │ V4       │ V5       │ V6       │  samples, status               │
//! ├──────────┴──────────┴──────────┴────────────────────────────────┤
//! │ q quit  space pause  c clear  s save  +/- heart rate            │
//! └─────────────────────────────────────────────────────────────────┘

use super::app::App;
use ecgwave_core::ChartSeries;
use ecgwave_core::heart_rate::{MAX_HEART_RATE, MIN_HEART_RATE};
use ratatui::{prelude::*, widgets::*};

const GRID_COLUMNS: usize = 3;

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(12),   // leads + panel
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_header(f, rows[0], app);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(48), Constraint::Length(24)])
        .split(rows[1]);

    draw_leads(f, main[0], &app.charts());
    draw_heart_panel(f, main[1], app);
    draw_keys(f, rows[2], app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let badge = if app.is_connected() {
        Span::styled(" ● LIVE ", Style::default().bold().fg(Color::Green))
    } else if app.is_paused() {
        Span::styled(" ○ PAUSED ", Style::default().bold().fg(Color::Yellow))
    } else {
        Span::styled(" ○ OFFLINE ", Style::default().bold().fg(Color::Red))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" ♥ ecgwave ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(app.patient(), Style::default().bold().fg(Color::Yellow)),
            Span::styled(
                format!(
                    "  {}  {}ms  Gain x10 ",
                    app.generator_name(),
                    app.tick_period().as_millis()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .title(Line::from(badge).right_aligned());

    f.render_widget(block, area);
}

fn draw_leads(f: &mut Frame, area: Rect, charts: &[ChartSeries]) {
    let n_rows = charts.len().div_ceil(GRID_COLUMNS).max(1);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, n_rows as u32); n_rows])
        .split(area);

    for (r, row_area) in rows.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(*row_area);
        for (c, cell) in cells.iter().enumerate() {
            if let Some(series) = charts.get(r * GRID_COLUMNS + c) {
                draw_lead(f, *cell, series);
            }
        }
    }
}

fn draw_lead(f: &mut Frame, area: Rect, series: &ChartSeries) {
    let (r, g, b) = series.color;
    let color = Color::Rgb(r, g, b);
    let latest = series
        .latest()
        .map(|v| format!("{v:+.2}"))
        .unwrap_or_else(|| "--".into());

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&series.points),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Line::from(vec![
                    Span::styled(format!(" {} ", series.lead), Style::default().bold().fg(color)),
                    Span::styled(format!("{latest} "), Style::default().fg(Color::Gray)),
                ])),
        )
        .x_axis(Axis::default().bounds(series.x_bounds))
        .y_axis(Axis::default().bounds(series.y_bounds));

    f.render_widget(chart, area);
}

fn draw_heart_panel(f: &mut Frame, area: Rect, app: &App) {
    let bpm = app.heart_rate();
    let bpm_color = match bpm {
        b if b < 60 => Color::Cyan,
        b if b > 100 => Color::Red,
        _ => Color::Green,
    };

    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{bpm} bpm"),
            Style::default().bold().fg(bpm_color),
        )),
        Line::from(Span::styled(
            format!("range {MIN_HEART_RATE}-{MAX_HEART_RATE}"),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(format!("samples {}", app.samples_seen())),
        Line::from(if app.has_store() {
            "store ready"
        } else {
            "no store"
        }),
    ];
    if let Some(status) = app.status() {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Yellow),
        )));
    }

    let block = Block::default().borders(Borders::ALL).title(" HR ");
    let p = Paragraph::new(text).wrap(Wrap { trim: true }).block(block);
    f.render_widget(p, area);
}

fn draw_keys(f: &mut Frame, area: Rect, app: &App) {
    let pause = if app.is_paused() { "resume" } else { "pause" };
    let bar = Paragraph::new(format!(
        " q quit   space {pause}   c clear   s save   +/- heart rate"
    ))
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecgwave_core::{GeneratorKind, HeartRateDriver};
    use ratatui::backend::TestBackend;

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 44)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn every_lead_gets_a_titled_chart() {
        let mut app = App::new(
            GeneratorKind::Waveform.build_seeded(3),
            HeartRateDriver::new(82),
            "SUPTECH SANTE M 55".into(),
            None,
        );
        for i in 0..50 {
            app.step(i * 40);
        }

        let screen = rendered(&app);
        for name in ["aVR", "aVL", "aVF", "V1", "V6", "III"] {
            assert!(screen.contains(&format!(" {name} ")), "missing {name}");
        }
        assert!(screen.contains("SUPTECH SANTE M 55"));
        assert!(screen.contains("82 bpm"));
        assert!(screen.contains("LIVE"));
    }

    #[test]
    fn empty_buffer_renders_placeholders() {
        let app = App::new(
            GeneratorKind::Noise.build_seeded(1),
            HeartRateDriver::default(),
            "P".into(),
            None,
        );
        let screen = rendered(&app);
        assert!(screen.contains("--"));
        assert!(screen.contains("OFFLINE"));
        assert!(screen.contains("no store"));
    }
}
