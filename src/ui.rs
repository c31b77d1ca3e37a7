pub mod progress;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::round::{Feedback, Round};
use crate::stimulus::GRID_CELLS;

const BOARD_CELL_WIDTH: u16 = 9;
const BOARD_CELL_HEIGHT: u16 = 4;

/// Rect of `width` x `height` centered inside `area`, clamped to fit.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn feedback_style(feedback: Feedback) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match feedback {
        Feedback::Correct => bold.fg(Color::Green),
        Feedback::Incorrect => bold.fg(Color::Red),
        Feedback::None => bold,
    }
}

/// Render the in-round screen: header, 3x3 board, sound cue, per-channel
/// feedback, and key hints. The game-over dialog overlays everything once
/// the round has finished with an outcome.
pub fn render_game(round: &Round, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(BOARD_CELL_HEIGHT * 3),
            Constraint::Length(3), // sound + feedback
            Constraint::Length(1), // key hints
        ])
        .split(area);

    let header = Line::from(vec![
        Span::raw(format!("Score: {}", round.score)),
        Span::raw("    "),
        Span::styled(
            format!("N = {}", round.config.n_level),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("    "),
        Span::raw(format!(
            "Turn: {} / {}",
            round.turn, round.config.total_turns
        )),
    ]);
    f.render_widget(
        Paragraph::new(header).alignment(Alignment::Center),
        chunks[0],
    );

    render_board(round, chunks[1], f);

    let sound_line = match round.current_stimulus() {
        Some(stimulus) => Line::from(vec![
            Span::raw("Sound: "),
            Span::styled(
                stimulus.sound_letter().to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from(""),
    };
    let feedback_lines = vec![
        sound_line,
        Line::from(Span::styled(
            format!("Position: {}", round.position_feedback.as_str()),
            feedback_style(round.position_feedback),
        )),
        Line::from(Span::styled(
            format!("Sound: {}", round.sound_feedback.as_str()),
            feedback_style(round.sound_feedback),
        )),
    ];
    f.render_widget(
        Paragraph::new(feedback_lines).alignment(Alignment::Center),
        chunks[2],
    );

    let hints = if round.paused {
        "(p)resume | (esc)ape"
    } else {
        "(f) position match | (j) sound match | (p)ause | (esc)ape"
    };
    f.render_widget(
        Paragraph::new(hints)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC)),
        chunks[3],
    );

    if round.paused {
        render_pause_banner(area, f);
    }

    if round.over && !round.outcome_title.is_empty() {
        render_game_over(round, area, f);
    }
}

fn render_board(round: &Round, area: Rect, f: &mut Frame) {
    let board = centered_rect(BOARD_CELL_WIDTH * 3 + 2, BOARD_CELL_HEIGHT * 3 + 2, area);
    f.render_widget(Block::default().borders(Borders::ALL), board);

    let inner = Rect {
        x: board.x + 1,
        y: board.y + 1,
        width: board.width.saturating_sub(2),
        height: board.height.saturating_sub(2),
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(inner);

    let lit = round.current_stimulus().map(|s| s.position);
    for (r, row) in rows.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(*row);
        for (c, cell) in cells.iter().enumerate() {
            let index = (r * 3 + c) as u8;
            debug_assert!(index < GRID_CELLS);
            let style = if lit == Some(index) {
                Style::default().bg(Color::Yellow)
            } else {
                Style::default()
            };
            f.render_widget(
                Block::default().borders(Borders::ALL).style(style),
                *cell,
            );
        }
    }
}

fn render_pause_banner(area: Rect, f: &mut Frame) {
    let banner = centered_rect(20, 3, area);
    f.render_widget(Clear, banner);
    f.render_widget(
        Paragraph::new(Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL)),
        banner,
    );
}

fn render_game_over(round: &Round, area: Rect, f: &mut Frame) {
    let dialog = centered_rect(44, 8, area);
    f.render_widget(Clear, dialog);

    let title_style = if round.outcome_title == "You Win!" {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(Span::styled(
        round.outcome_title.clone(),
        title_style,
    ))];
    for text_line in round.outcome_text.lines() {
        lines.push(Line::from(text_line.to_string()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(r)eplay | (n)ew | (v)iew progress | (esc)ape",
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Round over")),
        dialog,
    );
}
