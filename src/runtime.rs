use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum DrillEvent {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived within the poll interval; time to pump timers
    Tick,
}

/// What a key press means to the drill
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Digit(char),
    Minus,
    Backspace,
    Enter,
    TogglePause,
    Reset,
    ToggleStats,
    ToggleOptions,
    Up,
    Down,
    Left,
    Right,
    Quit,
    Ignore,
}

impl From<KeyEvent> for Action {
    fn from(key: KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Action::Ignore;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => Action::Digit(c),
            KeyCode::Char('-') => Action::Minus,
            KeyCode::Char('p') | KeyCode::Char(' ') => Action::TogglePause,
            KeyCode::Char('r') => Action::Reset,
            KeyCode::Char('s') => Action::ToggleStats,
            KeyCode::Char('o') => Action::ToggleOptions,
            KeyCode::Up => Action::Up,
            KeyCode::Down => Action::Down,
            KeyCode::Left => Action::Left,
            KeyCode::Right => Action::Right,
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Enter => Action::Enter,
            _ => Action::Ignore,
        }
    }
}

/// Anything the loop can block on for the next terminal event
pub trait DrillEventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError>;
}

fn translate(event: CtEvent) -> Option<DrillEvent> {
    match event {
        CtEvent::Key(key) => Some(DrillEvent::Key(key)),
        CtEvent::Resize(..) => Some(DrillEvent::Resize),
        _ => None,
    }
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<DrillEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            // stops on a read error or once the loop drops the receiver
            while let Ok(event) = event::read() {
                let Some(event) = translate(event) else {
                    continue;
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
        });
        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Upper bound on how long one loop iteration sleeps
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker(Duration);

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self(interval)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.0
    }
}

/// Channel-fed source for headless tests
pub struct TestEventSource(Receiver<DrillEvent>);

impl TestEventSource {
    pub fn new(rx: Receiver<DrillEvent>) -> Self {
        Self(rx)
    }
}

impl DrillEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.0.recv_timeout(timeout)
    }
}

/// Hands the loop one event per call, or a tick once the wait runs out
pub struct Runner<E: DrillEventSource, T: Ticker> {
    source: E,
    ticker: T,
}

impl<E: DrillEventSource, T: Ticker> Runner<E, T> {
    pub fn new(source: E, ticker: T) -> Self {
        Self { source, ticker }
    }

    /// Wait at most the tick interval, cut short by the next timer
    /// `deadline` when one is given.
    pub fn step(&self, deadline: Option<Duration>) -> DrillEvent {
        let interval = self.ticker.interval();
        let wait = deadline.map_or(interval, |d| d.min(interval));
        self.source.recv_timeout(wait).unwrap_or(DrillEvent::Tick)
    }
}
