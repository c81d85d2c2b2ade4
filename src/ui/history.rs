use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use mimic::{history::StimulusStats, stimulus::StimulusPool};

use crate::App;

/// Pure presenter for a single stimulus history row
pub fn present_row(stats: &StimulusStats, pool: &StimulusPool) -> Row<'static> {
    let name = pool
        .get(&stats.stimulus_id)
        .map(|s| format!("{} {}", s.display_asset, s.display_name))
        .unwrap_or_else(|| stats.stimulus_id.clone());

    let rate = stats.completion_rate();
    let rate_color = if rate >= 80.0 {
        Color::Green
    } else if rate >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    let time_display = stats
        .avg_time_secs
        .map_or_else(|| "—".to_string(), |t| format!("{t:.1}"));

    Row::new(vec![
        Cell::from(name).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{rate:.0}")).style(Style::default().fg(rate_color)),
        Cell::from(time_display),
        Cell::from(format!("{}/{}", stats.completions, stats.attempts)),
    ])
}

/// Render the History screen
pub fn render_history(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Stimulus table
            Constraint::Length(3), // Recent sessions
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let title = Paragraph::new(format!("{} history", app.kind))
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let view = &mut app.history_view;
    if view.stats.is_empty() {
        let no_data = Paragraph::new("No sessions recorded yet. Finish a game to collect data.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = view.stats.len().saturating_sub(table_height);
        if view.scroll_offset > max_scroll {
            view.scroll_offset = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("Stimulus"),
            Cell::from("Completed (%)"),
            Cell::from("Avg Time (s)"),
            Cell::from("Matched"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let pool = app.driver.pool();
        let rows: Vec<Row> = view
            .stats
            .iter()
            .skip(view.scroll_offset)
            .take(table_height)
            .map(|s| present_row(s, pool))
            .collect();

        let widths = [
            Constraint::Min(20),
            Constraint::Length(15),
            Constraint::Length(14),
            Constraint::Length(10),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Per stimulus"))
            .column_spacing(2);
        f.render_widget(table, chunks[1]);
    }

    let recent = match view.recent.first() {
        Some(last) => format!(
            "{} sessions shown, latest {} scored {}/{} on {}",
            view.recent.len(),
            last.child_id,
            last.total_score,
            last.round_count,
            last.started_at.format("%Y-%m-%d %H:%M"),
        ),
        None => String::new(),
    };
    f.render_widget(
        Paragraph::new(recent)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::ITALIC)),
        chunks[2],
    );

    let instructions = Paragraph::new("(↑/↓) scroll  (Home) top  (b/backspace) back  (esc)ape")
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[3]);
}

