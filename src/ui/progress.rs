use chrono::{DateTime, Local};
use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::store::GameResult;

/// Scroll state for the progress screen.
#[derive(Debug, Default)]
pub struct ProgressState {
    pub scroll_offset: usize,
}

/// Aggregate over all stored rounds at one n-level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub n_level: usize,
    pub games: usize,
    pub wins: usize,
    pub best_score: i32,
}

impl LevelSummary {
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

/// Group results by n-level, ascending.
pub fn summarize(results: &[GameResult]) -> Vec<LevelSummary> {
    results
        .iter()
        .map(|r| (r.n_level, r))
        .into_group_map()
        .into_iter()
        .map(|(n_level, group)| LevelSummary {
            n_level,
            games: group.len(),
            wins: group.iter().filter(|r| r.won).count(),
            best_score: group.iter().map(|r| r.score).max().unwrap_or(0),
        })
        .sorted_by_key(|s| s.n_level)
        .collect()
}

pub fn format_when(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

/// Largest valid scroll offset for `total_rows` rows in a viewport of
/// `visible_rows`.
pub fn max_scroll(total_rows: usize, visible_rows: usize) -> usize {
    total_rows.saturating_sub(visible_rows)
}

/// Render the progress screen: per-level summaries on top, then the full
/// result log (newest last, matching store order) with scrolling.
pub fn render_progress(results: &[GameResult], state: &mut ProgressState, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(2 + summarize(results).len().max(1) as u16),
            Constraint::Min(0),    // result table
            Constraint::Length(3), // instructions
        ])
        .split(area);

    let title = Paragraph::new("Your Progress")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if results.is_empty() {
        let no_data = Paragraph::new("Play a round to see your progress!")
            .block(Block::default().borders(Borders::ALL).title("No Data"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(no_data, chunks[2]);
    } else {
        render_summaries(results, f, chunks[1]);
        render_result_table(results, state, f, chunks[2]);
    }

    let instructions =
        Paragraph::new("↑/↓ PgUp/PgDn scroll | Home top | (b)ack (esc)ape")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[3]);
}

fn render_summaries(results: &[GameResult], f: &mut Frame, area: ratatui::layout::Rect) {
    let lines: Vec<String> = summarize(results)
        .iter()
        .map(|s| {
            format!(
                "N = {}: {} games, {} wins ({:.0}%), best score {}",
                s.n_level,
                s.games,
                s.wins,
                s.win_rate() * 100.0,
                s.best_score
            )
        })
        .collect();

    let summary = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title("By level"));
    f.render_widget(summary, area);
}

fn render_result_table(
    results: &[GameResult],
    state: &mut ProgressState,
    f: &mut Frame,
    area: ratatui::layout::Rect,
) {
    // Account for borders and header.
    let table_height = area.height.saturating_sub(3) as usize;
    let clamp = max_scroll(results.len(), table_height);
    if state.scroll_offset > clamp {
        state.scroll_offset = clamp;
    }

    let header = Row::new(vec![
        Cell::from("When"),
        Cell::from("N"),
        Cell::from("Score"),
        Cell::from("Turns"),
        Cell::from("Result"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = results
        .iter()
        .skip(state.scroll_offset)
        .take(table_height)
        .map(|r| {
            let (result_text, result_style) = if r.won {
                ("WIN", Style::default().fg(Color::Green))
            } else {
                ("LOSS", Style::default().fg(Color::Red))
            };
            Row::new(vec![
                Cell::from(format_when(&r.timestamp)),
                Cell::from(r.n_level.to_string()),
                Cell::from(r.score.to_string()),
                Cell::from(r.total_turns.to_string()),
                Cell::from(result_text).style(result_style),
            ])
        })
        .collect();

    let scroll_info = if results.len() > table_height {
        format!(
            " ({}/{} rounds)",
            state.scroll_offset + rows.len().min(table_height),
            results.len()
        )
    } else {
        String::new()
    };

    let table = Table::new(
        rows,
        &[
            Constraint::Length(18),
            Constraint::Length(4),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Rounds{}", scroll_info)),
    );

    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ratatui::{backend::TestBackend, Terminal};

    fn result(n_level: usize, score: i32, won: bool) -> GameResult {
        GameResult {
            timestamp: Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            n_level,
            score,
            total_turns: 20,
            won,
        }
    }

    #[test]
    fn summarize_groups_by_level_ascending() {
        let results = vec![
            result(3, 40, false),
            result(2, 80, true),
            result(2, 55, false),
            result(2, 90, true),
        ];

        let summaries = summarize(&results);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].n_level, 2);
        assert_eq!(summaries[0].games, 3);
        assert_eq!(summaries[0].wins, 2);
        assert_eq!(summaries[0].best_score, 90);

        assert_eq!(summaries[1].n_level, 3);
        assert_eq!(summaries[1].games, 1);
        assert_eq!(summaries[1].wins, 0);
        assert_eq!(summaries[1].best_score, 40);
    }

    #[test]
    fn summarize_empty_is_empty() {
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn win_rate_handles_zero_games() {
        let s = LevelSummary {
            n_level: 2,
            games: 0,
            wins: 0,
            best_score: 0,
        };
        assert_eq!(s.win_rate(), 0.0);
    }

    #[test]
    fn win_rate_is_fraction_of_games() {
        let s = LevelSummary {
            n_level: 2,
            games: 4,
            wins: 3,
            best_score: 80,
        };
        assert_eq!(s.win_rate(), 0.75);
    }

    #[test]
    fn format_when_is_minute_precision() {
        let ts = Local.with_ymd_and_hms(2025, 6, 1, 9, 5, 59).unwrap();
        assert_eq!(format_when(&ts), "2025-06-01 09:05");
    }

    #[test]
    fn max_scroll_clamps_to_zero() {
        assert_eq!(max_scroll(3, 10), 0);
        assert_eq!(max_scroll(10, 3), 7);
    }

    #[test]
    fn progress_screen_renders_with_data() {
        let results = vec![result(2, 80, true), result(3, -10, false)];
        let mut state = ProgressState::default();

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render_progress(&results, &mut state, f))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Your Progress"));
        assert!(content.contains("WIN"));
        assert!(content.contains("LOSS"));
    }

    #[test]
    fn progress_screen_renders_without_data() {
        let mut state = ProgressState::default();

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render_progress(&[], &mut state, f))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Play a round"));
    }

    #[test]
    fn scroll_offset_is_clamped_during_render() {
        let results: Vec<GameResult> = (0..5).map(|i| result(2, i, false)).collect();
        let mut state = ProgressState { scroll_offset: 999 };

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render_progress(&results, &mut state, f))
            .unwrap();

        assert!(state.scroll_offset <= results.len());
    }
}
