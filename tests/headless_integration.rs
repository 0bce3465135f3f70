use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use zetadrill::app::App;
use zetadrill::game::Game;
use zetadrill::problem::Operation;
use zetadrill::runtime::{Action, DrillEvent, FixedTicker, Runner, TestEventSource};
use zetadrill::scheduler::{ManualClock, TimerQueue};
use zetadrill::session::Phase;
use zetadrill::settings::{Difficulty, Operations, Settings};
use zetadrill::stats::GameResult;
use zetadrill::storage::SqliteStore;

type DrillApp = App<TimerQueue<ManualClock>, SqliteStore>;
type TestRunner = Runner<TestEventSource, FixedTicker>;

fn key(code: KeyCode) -> DrillEvent {
    DrillEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

// One loop iteration of the binary: handle at most one event, then timers.
fn handle(app: &mut DrillApp, runner: &TestRunner) -> Option<GameResult> {
    if let DrillEvent::Key(k) = runner.step(None) {
        app.handle_action(Action::from(k)).unwrap();
    }
    app.pump().unwrap()
}

// Headless drive of the terminal front end: runner + test event source +
// manual clock, no TTY involved.
#[test]
fn headless_drill_flow_records_result() {
    let clock = ManualClock::new();
    let game = Game::load(
        TimerQueue::new(clock.clone()),
        SqliteStore::open_in_memory().unwrap(),
        SqliteStore::open_in_memory().unwrap(),
    );
    let mut app = App::new(game);
    app.game
        .update_settings(Settings {
            duration: 3,
            difficulty: Difficulty::Easy,
            operations: Operations::only(Operation::Addition),
            auto_submit_delay: 0,
            ..Settings::default()
        })
        .unwrap();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    tx.send(key(KeyCode::Enter)).unwrap();
    handle(&mut app, &runner);
    assert_eq!(app.game.session().phase, Phase::Running);

    // answer two problems correctly
    for _ in 0..2 {
        let answer = app
            .game
            .session()
            .current_problem
            .as_ref()
            .unwrap()
            .correct_answer;
        for c in answer.to_string().chars() {
            tx.send(key(KeyCode::Char(c))).unwrap();
        }
        tx.send(key(KeyCode::Enter)).unwrap();
        for _ in 0..answer.to_string().len() + 1 {
            handle(&mut app, &runner);
        }
    }
    assert_eq!(app.game.session().score, 2);

    // one wrong answer
    tx.send(key(KeyCode::Char('0'))).unwrap();
    tx.send(key(KeyCode::Enter)).unwrap();
    handle(&mut app, &runner);
    handle(&mut app, &runner);
    assert_eq!(app.game.session().total_attempts, 3);

    let mut result = None;
    for _ in 0..3 {
        clock.advance_ms(1000);
        if let Some(r) = handle(&mut app, &runner) {
            result = Some(r);
        }
    }
    let result = result.expect("session should time out");
    assert_eq!(app.game.session().phase, Phase::Ended);
    assert_eq!(result.score, 2);
    assert_eq!(result.accuracy, 67);
    assert_eq!(result.problems_solved, 3);
    assert_eq!(result.duration, 3);
    assert_eq!(app.game.statistics().total_games, 1);

    tx.send(key(KeyCode::Esc)).unwrap();
    handle(&mut app, &runner);
    assert!(app.should_quit);
}

#[test]
fn runner_ticks_when_idle() {
    let (_tx, rx) = mpsc::channel::<DrillEvent>();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );
    assert!(matches!(runner.step(Some(Duration::ZERO)), DrillEvent::Tick));
}
