pub mod charting;
pub mod history;
pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use mimic::{
    session::{RoundResult, SessionStatus},
    stimulus::Stimulus,
};

use crate::{App, AppScreen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Padding inside the target card, per side.
const CARD_PADDING: u16 = 2;

pub fn draw(app: &mut App, f: &mut Frame) {
    screen::current_screen(app.screen).render(app, f);
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

/// `area` shrunk to `width` x `height` around its centre.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn key_strip(stimuli: &[Stimulus]) -> String {
    stimuli
        .iter()
        .take(9)
        .enumerate()
        .map(|(i, s)| format!("({}) {}", i + 1, s.display_name))
        .join("  ")
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            AppScreen::Instructions => render_instructions(self, area, buf),
            AppScreen::Playing => match self.driver.state().status {
                SessionStatus::CountingDown => render_countdown(self, area, buf),
                _ => render_round(self, area, buf),
            },
            AppScreen::Results => render_results(self, area, buf),
            // drawn by its own screen
            AppScreen::History => {}
        }
    }
}

fn render_instructions(app: &App, area: Rect, buf: &mut Buffer) {
    let config = app.driver.session().config();
    let pool = app.driver.pool();

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} game", app.kind).to_uppercase(),
            bold().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(format!(
            "Copy what you see before the timer runs out. {} rounds, {} seconds each.",
            config.total_rounds, config.round_duration_secs
        )),
        Line::from(""),
    ];
    lines.extend(pool.stimuli().iter().map(|s| {
        Line::from(vec![
            Span::styled(format!("{}  {}", s.display_asset, s.display_name), bold()),
            Span::styled(format!("  {}", s.description), italic()),
        ])
    }));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // notice
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

    if let Some(notice) = &app.notice {
        Paragraph::new(Span::styled(notice.as_str(), bold().fg(Color::Red)))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    }

    Paragraph::new(Span::styled("(enter) start / (h)istory / (esc)ape", italic()))
        .render(chunks[3], buf);
}

fn render_countdown(app: &App, area: Rect, buf: &mut Buffer) {
    let state = app.driver.state();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled("Get ready!", dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    Paragraph::new(Span::styled(
        state.countdown_remaining.to_string(),
        bold().fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}

fn render_round(app: &App, area: Rect, buf: &mut Buffer) {
    let state = app.driver.state();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // round / score / timer
            Constraint::Min(5),    // target card
            Constraint::Length(1), // result banner
            Constraint::Length(1), // last detection
            Constraint::Length(1), // padding
            Constraint::Length(1), // key strip
            Constraint::Length(1), // legend
        ])
        .split(area);

    let timer_style = if state.time_remaining <= 3 {
        bold().fg(Color::Red)
    } else {
        bold()
    };
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!("Round {} of {}", state.round_index, state.total_rounds),
            dim_bold(),
        ),
        Span::raw("   "),
        Span::styled(format!("Score {}", state.score), bold().fg(Color::Green)),
        Span::raw("   "),
        Span::styled(format!("{}s", state.time_remaining), timer_style),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    if let Some(target) = &state.current_stimulus {
        let inner_width = target
            .display_name
            .width()
            .max(target.description.width())
            .max(target.display_asset.width()) as u16;
        let card = centered(chunks[1], inner_width + 2 * CARD_PADDING + 2, 7);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(target.display_asset.as_str(), bold())),
            Line::from(Span::styled(target.display_name.as_str(), bold().fg(Color::Cyan))),
            Line::from(Span::styled(target.description.as_str(), italic())),
        ];
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Copy me"))
            .render(card, buf);
    }

    if state.status == SessionStatus::RoundSettling {
        let banner = match state.last_result {
            Some(RoundResult::Correct) => Span::styled("Great job!", bold().fg(Color::Green)),
            Some(RoundResult::TimesUp) => Span::styled("Time's up!", bold().fg(Color::Red)),
            None => Span::raw(""),
        };
        Paragraph::new(banner)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    let seen = if !app.driver.camera_active() {
        Span::styled("camera off", bold().fg(Color::Red))
    } else {
        match &state.last_detection {
            Some(d) => Span::styled(
                format!("seen: {} ({:.2})", d.label, d.confidence),
                dim_bold(),
            ),
            None => Span::styled("waiting for camera…", dim_bold()),
        }
    };
    Paragraph::new(seen)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(key_strip(app.driver.pool().stimuli()), dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        "(1-9) show stimulus / (c)amera / (x) abandon / (esc)ape",
        italic(),
    ))
    .render(chunks[6], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(record) = app.driver.finished_record() else {
        return;
    };
    let summary = &record.summary;
    let pool = app.driver.pool();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(2), // rounds
            Constraint::Length(1), // encouragement
            Constraint::Length(1), // legend
        ])
        .split(area);

    let (last_round, slowest) = charting::compute_chart_params(
        &summary.rounds,
        app.driver.session().config().round_duration_secs,
    );
    let (hits, misses) = charting::round_points(&summary.rounds);
    let datasets = vec![
        Dataset::default()
            .name("matched")
            .marker(ratatui::symbols::Marker::Dot)
            .style(Style::default().fg(Color::Green))
            .graph_type(GraphType::Scatter)
            .data(&hits),
        Dataset::default()
            .name("time's up")
            .marker(ratatui::symbols::Marker::Dot)
            .style(Style::default().fg(Color::Red))
            .graph_type(GraphType::Scatter)
            .data(&misses),
    ];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("round")
                .bounds([1.0, last_round])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(charting::format_label(last_round), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, slowest])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(slowest), bold()),
                ]),
        )
        .render(chunks[0], buf);

    let mut stats = format!(
        "{}/{} matched   {}% complete   {}s total",
        summary.total_score,
        summary.round_count,
        summary.completion_rate,
        record.duration_secs()
    );
    if let Some(mean) = summary.mean_time_taken_secs {
        stats.push_str(&format!("   {mean:.1}s avg"));
    }
    if let Some(sd) = summary.time_taken_std_dev {
        stats.push_str(&format!("   {sd:.2} sd"));
    }
    Paragraph::new(Span::styled(stats, bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let rounds = summary
        .rounds
        .iter()
        .map(|r| {
            let name = pool
                .get(&r.stimulus_id)
                .map_or(r.stimulus_id.as_str(), |s| s.display_name.as_str());
            let mark = if r.completed { "✓" } else { "✗" };
            format!("{} {mark} {name} {}s", r.round_number, r.time_taken_secs)
        })
        .join(" | ");
    Paragraph::new(Span::styled(rounds, italic().fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        encouragement(summary.total_score, summary.round_count),
        bold().fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Span::styled("(r)etry / (n)ew / (h)istory / (esc)ape", italic()))
        .render(chunks[4], buf);
}

fn encouragement(score: usize, rounds: usize) -> &'static str {
    if rounds > 0 && score == rounds {
        "Perfect! Every round matched!"
    } else if score * 5 >= rounds * 3 && score > 0 {
        "Great job! You're getting better!"
    } else {
        "Keep practicing! You'll improve!"
    }
}
