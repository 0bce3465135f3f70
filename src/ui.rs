use chrono::{DateTime, Local, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, Screen},
    export::local_date,
    options::FIELDS,
    scheduler::Scheduler,
    session::{Feedback, Phase, SessionState},
    settings::Settings,
    stats::{GameResult, Statistics},
    storage::KeyValueStore,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const LOW_TIME_SECS: u32 = 10;

impl<S: Scheduler, K: KeyValueStore> Widget for &App<S, K> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Drill => render_drill(
                self.game.session(),
                self.game.settings(),
                self.game.last_result(),
                area,
                buf,
            ),
            Screen::Statistics => render_statistics(self.game.statistics(), area, buf),
            Screen::Options => {
                render_options(self.game.settings(), self.options_cursor, area, buf)
            }
        }
    }
}

/// Local date plus hours and minutes, for compact history lists
pub fn game_stamp(date: &DateTime<Utc>) -> String {
    format!(
        "{} {}",
        local_date(date),
        date.with_timezone(&Local).format("%I:%M %p")
    )
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn status_line(state: &SessionState) -> Line<'static> {
    let timer_style = if state.is_playing() && state.time_remaining <= LOW_TIME_SECS {
        bold().fg(Color::Red)
    } else {
        bold().fg(Color::Blue)
    };
    Line::from(vec![
        Span::styled(format!("{}s", state.time_remaining), timer_style),
        Span::raw("   "),
        Span::styled(format!("score {}", state.score), bold()),
        Span::raw("   "),
        Span::styled(format!("{}% acc", state.accuracy()), bold()),
    ])
}

fn render_drill(
    state: &SessionState,
    settings: &Settings,
    last_result: Option<&GameResult>,
    area: Rect,
    buf: &mut Buffer,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Min(1),
            Constraint::Length(3), // problem / message
            Constraint::Length(1), // input
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(status_line(state))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let (body, legend): (Vec<Line>, &str) = match state.phase {
        Phase::NotStarted => (
            vec![
                Line::from(Span::styled("Press Enter to start", bold())),
                Line::from(Span::styled(
                    format!(
                        "{}s · {} · {}",
                        settings.duration,
                        settings.difficulty,
                        settings
                            .operations
                            .enabled()
                            .iter()
                            .map(|op| op.symbol().to_string())
                            .collect::<Vec<_>>()
                            .join(" ")
                    ),
                    italic(),
                )),
            ],
            "(enter) start / (s)tats / (o)ptions / (esc)ape",
        ),
        Phase::Running => (
            vec![Line::from(Span::styled(
                state
                    .current_problem
                    .as_ref()
                    .map(|p| p.display_text.clone())
                    .unwrap_or_default(),
                bold(),
            ))],
            "(enter) submit / (p)ause / (r)eset / (s)tats / (o)ptions / (esc)ape",
        ),
        Phase::Paused => (
            vec![Line::from(Span::styled(
                "Game Paused",
                bold().fg(Color::Yellow),
            ))],
            "(p) resume / (r)eset / (s)tats / (o)ptions / (esc)ape",
        ),
        Phase::Ended => {
            let mut lines = vec![Line::from(Span::styled("Time's up!", bold()))];
            if let Some(result) = last_result {
                lines.push(Line::from(format!(
                    "score {}   accuracy {}%   problems {}",
                    result.score, result.accuracy, result.problems_solved
                )));
            }
            (lines, "(enter) play again / (r)eset / (s)tats / (o)ptions / (esc)ape")
        }
    };

    Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    if state.phase == Phase::Running {
        let input_style = match state.feedback {
            Some(Feedback::Correct) => bold().fg(Color::Green),
            Some(Feedback::Incorrect) => bold().fg(Color::Red),
            None => dim_bold().add_modifier(Modifier::UNDERLINED),
        };
        let shown = if state.input.is_empty() {
            "_".to_string()
        } else {
            state.input.clone()
        };
        Paragraph::new(Span::styled(shown, input_style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    Paragraph::new(Span::styled(legend, italic()))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
}

fn render_statistics(stats: &Statistics, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled("Statistics", bold())),
        Line::from(format!(
            "games {}   best {}   average {}   best accuracy {}%",
            stats.total_games,
            stats.best_score,
            stats.average_score(),
            stats.best_accuracy
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let recent: Vec<Line> = if stats.recent_games.is_empty() {
        vec![Line::from(Span::styled("No games played yet", italic()))]
    } else {
        stats
            .recent_games
            .iter()
            .map(|game| {
                Line::from(vec![
                    Span::styled(game_stamp(&game.date), dim_bold()),
                    Span::raw("   "),
                    Span::raw(format!("Score: {}", game.score)),
                    Span::raw("   "),
                    Span::raw(format!("Accuracy: {}%", game.accuracy)),
                ])
            })
            .collect()
    };

    Paragraph::new(recent)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled("(s)/(enter) back / (esc)ape", italic()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

fn render_options(settings: &Settings, cursor: usize, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Line::from(Span::styled("Options", bold())))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let rows: Vec<Line> = FIELDS
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let selected = idx == cursor;
            let marker = if selected { "> " } else { "  " };
            let value_style = if selected {
                bold().fg(Color::Yellow)
            } else {
                bold()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<20}", field.label()), dim_bold()),
                Span::styled(format!("{:>8}", field.value(settings)), value_style),
            ])
        })
        .collect();

    Paragraph::new(rows)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(↑/↓) select / (←/→) change / (o) back / (esc)ape",
        italic(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::runtime::Action;
    use crate::scheduler::{ManualClock, TimerQueue};
    use crate::storage::SqliteStore;
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> (ManualClock, App<TimerQueue<ManualClock>, SqliteStore>) {
        let clock = ManualClock::new();
        let game = Game::load(
            TimerQueue::new(clock.clone()),
            SqliteStore::open_in_memory().unwrap(),
            SqliteStore::open_in_memory().unwrap(),
        );
        (clock, App::new(game))
    }

    fn draw(app: &App<TimerQueue<ManualClock>, SqliteStore>) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| f.render_widget(app, f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn idle_screen_prompts_to_start() {
        let (_, app) = app();
        let content = draw(&app);
        assert!(content.contains("Press Enter to start"));
        assert!(content.contains("120s"));
    }

    #[test]
    fn running_screen_shows_problem() {
        let (_, mut app) = app();
        app.handle_action(Action::Enter).unwrap();
        let text = app
            .game
            .session()
            .current_problem
            .as_ref()
            .unwrap()
            .display_text
            .clone();
        let content = draw(&app);
        // wide glyphs occupy an extra blank cell, compare operands only
        let left = text.split(' ').next().unwrap();
        assert!(content.contains(left));
        assert!(content.contains("score 0"));
    }

    #[test]
    fn paused_screen_hides_problem() {
        let (_, mut app) = app();
        app.handle_action(Action::Enter).unwrap();
        app.handle_action(Action::TogglePause).unwrap();
        assert!(draw(&app).contains("Game Paused"));
    }

    #[test]
    fn ended_screen_shows_summary() {
        let (clock, mut app) = app();
        app.game
            .update_settings(Settings {
                duration: 1,
                ..Settings::default()
            })
            .unwrap();
        app.handle_action(Action::Enter).unwrap();
        clock.advance_ms(1000);
        app.pump().unwrap();
        let content = draw(&app);
        assert!(content.contains("Time's up!"));
        assert!(content.contains("problems 0"));
    }

    #[test]
    fn statistics_screen_lists_games() {
        let (clock, mut app) = app();
        let content = {
            app.handle_action(Action::ToggleStats).unwrap();
            draw(&app)
        };
        assert!(content.contains("No games played yet"));

        app.handle_action(Action::ToggleStats).unwrap();
        app.game
            .update_settings(Settings {
                duration: 1,
                ..Settings::default()
            })
            .unwrap();
        app.handle_action(Action::Enter).unwrap();
        clock.advance_ms(1000);
        app.pump().unwrap();
        app.handle_action(Action::ToggleStats).unwrap();
        let content = draw(&app);
        assert!(content.contains("games 1"));
        assert!(content.contains("Score: 0"));
    }

    #[test]
    fn options_screen_lists_current_values() {
        let (_, mut app) = app();
        app.handle_action(Action::ToggleOptions).unwrap();
        let content = draw(&app);
        assert!(content.contains("Options"));
        assert!(content.contains("> Duration"));
        assert!(content.contains("120s"));
        assert!(content.contains("medium"));
        assert!(content.contains("800ms"));

        app.handle_action(Action::Right).unwrap();
        assert!(draw(&app).contains("180s"));
    }

    #[test]
    fn game_stamp_leads_with_local_date() {
        let date = Utc::now();
        let stamp = game_stamp(&date);
        assert!(stamp.starts_with(&local_date(&date)));
        assert!(stamp.ends_with("AM") || stamp.ends_with("PM"));
    }
}
