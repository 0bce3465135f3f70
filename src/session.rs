use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use crate::auto_submit::{parse_answer, AutoSubmitPolicy};
use crate::error::DrillError;
use crate::problem::{self, Problem};
use crate::scheduler::{Scheduler, TimerHandle, TimerKind};
use crate::settings::Settings;
use crate::stats::{accuracy_percent, GameResult};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    NotStarted,
    Running,
    Paused,
    Ended,
}

/// Transient signal for the last checked answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
}

/// Read-only snapshot handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub time_remaining: u32,
    pub score: u32,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub current_problem: Option<Problem>,
    pub started_at: Option<DateTime<Utc>>,
    pub input: String,
    pub feedback: Option<Feedback>,
}

impl SessionState {
    fn baseline(duration: u32) -> Self {
        Self {
            phase: Phase::NotStarted,
            time_remaining: duration,
            score: 0,
            total_attempts: 0,
            correct_attempts: 0,
            current_problem: None,
            started_at: None,
            input: String::new(),
            feedback: None,
        }
    }

    pub fn accuracy(&self) -> u32 {
        accuracy_percent(self.correct_attempts, self.total_attempts)
    }

    /// Running or paused
    pub fn is_playing(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Paused)
    }
}

/// One timed play-through and the timers that drive it.
///
/// The session never blocks. The owner calls [`Session::pump`] from its
/// event loop; due timers are dispatched one at a time so a countdown tick
/// can never interleave with a submission.
#[derive(Debug)]
pub struct Session<S: Scheduler> {
    state: SessionState,
    settings: Settings,
    scheduler: S,
    rng: StdRng,
    countdown: Option<TimerHandle>,
    pending_submit: Option<TimerHandle>,
    last_result: Option<GameResult>,
}

impl<S: Scheduler> Session<S> {
    pub fn new(settings: Settings, scheduler: S) -> Self {
        Self::with_rng(settings, scheduler, StdRng::from_entropy())
    }

    pub fn with_rng(settings: Settings, scheduler: S, rng: StdRng) -> Self {
        let settings = settings.normalized();
        Self {
            state: SessionState::baseline(settings.duration),
            settings,
            scheduler,
            rng,
            countdown: None,
            pending_submit: None,
            last_result: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Summary of the most recent timed-out session, cleared on start/reset
    pub fn last_result(&self) -> Option<&GameResult> {
        self.last_result.as_ref()
    }

    pub fn has_pending_submit(&self) -> bool {
        self.pending_submit
            .is_some_and(|h| self.scheduler.is_scheduled(h))
    }

    /// Adopt new settings. The countdown of a session in progress is left
    /// alone; otherwise the displayed time follows the new duration.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings.normalized();
        if !self.state.is_playing() {
            self.state.time_remaining = self.settings.duration;
        }
    }

    pub fn start(&mut self) -> crate::Result<()> {
        if !matches!(self.state.phase, Phase::NotStarted | Phase::Ended) {
            return Err(DrillError::invalid_transition(self.state.phase, "start"));
        }
        let first = problem::generate(&self.settings, &mut self.rng)?;

        self.cancel_timers();
        self.state = SessionState::baseline(self.settings.duration);
        self.state.phase = Phase::Running;
        self.state.started_at = Some(Utc::now());
        self.state.current_problem = Some(first);
        self.last_result = None;
        self.start_countdown();

        tracing::info!(
            duration = self.settings.duration,
            difficulty = %self.settings.difficulty,
            "session started"
        );
        Ok(())
    }

    pub fn pause(&mut self) -> crate::Result<()> {
        if self.state.phase != Phase::Running {
            return Err(DrillError::invalid_transition(self.state.phase, "pause"));
        }
        self.cancel_timers();
        self.state.phase = Phase::Paused;
        tracing::debug!(time_remaining = self.state.time_remaining, "session paused");
        Ok(())
    }

    pub fn resume(&mut self) -> crate::Result<()> {
        if self.state.phase != Phase::Paused {
            return Err(DrillError::invalid_transition(self.state.phase, "resume"));
        }
        self.state.phase = Phase::Running;
        self.start_countdown();
        tracing::debug!(time_remaining = self.state.time_remaining, "session resumed");
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> crate::Result<()> {
        match self.state.phase {
            Phase::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    /// Back to the not-started baseline from any phase.
    pub fn reset(&mut self) {
        self.cancel_timers();
        self.state = SessionState::baseline(self.settings.duration);
        self.last_result = None;
        tracing::info!("session reset");
    }

    /// Replace the typed answer. Any pending auto-submit is dropped and a new
    /// one is scheduled when the input looks complete.
    pub fn input(&mut self, raw: &str) -> crate::Result<()> {
        if self.state.phase != Phase::Running {
            return Err(DrillError::invalid_transition(self.state.phase, "type"));
        }
        self.cancel_pending_submit();
        self.state.input = raw.to_string();
        self.state.feedback = None;

        let policy = AutoSubmitPolicy::from_millis(self.settings.auto_submit_delay);
        let expected = self.state.current_problem.as_ref().map(|p| p.correct_answer);
        if let Some(delay) = expected.and_then(|answer| policy.schedule_delay(raw.trim(), answer)) {
            self.pending_submit = Some(self.scheduler.schedule_once(delay, TimerKind::AutoSubmit));
            tracing::debug!(delay_ms = delay.as_millis() as u64, "auto-submit scheduled");
        }
        Ok(())
    }

    pub fn push_char(&mut self, c: char) -> crate::Result<()> {
        let mut next = self.state.input.clone();
        next.push(c);
        self.input(&next)
    }

    pub fn backspace(&mut self) -> crate::Result<()> {
        let mut next = self.state.input.clone();
        next.pop();
        self.input(&next)
    }

    /// Check the current input buffer.
    pub fn submit(&mut self) -> crate::Result<Option<Feedback>> {
        let raw = std::mem::take(&mut self.state.input);
        let outcome = self.submit_answer(&raw);
        // unparseable input stays in the box
        if !matches!(outcome, Ok(Some(_))) {
            self.state.input = raw;
        }
        outcome
    }

    /// Check an answer against the current problem. Unparseable input is
    /// ignored and does not count as an attempt.
    pub fn submit_answer(&mut self, raw: &str) -> crate::Result<Option<Feedback>> {
        if self.state.phase != Phase::Running {
            return Err(DrillError::invalid_transition(self.state.phase, "submit"));
        }
        self.cancel_pending_submit();

        let Some(answer) = parse_answer(raw) else {
            return Ok(None);
        };
        let correct = self
            .state
            .current_problem
            .as_ref()
            .is_some_and(|p| p.is_correct(answer));
        let next = problem::generate(&self.settings, &mut self.rng)?;

        self.state.total_attempts += 1;
        let feedback = if correct {
            self.state.correct_attempts += 1;
            self.state.score += 1;
            Feedback::Correct
        } else {
            Feedback::Incorrect
        };
        self.state.feedback = Some(feedback);
        self.state.current_problem = Some(next);
        self.state.input.clear();

        tracing::debug!(answer, ?feedback, score = self.state.score, "answer checked");
        Ok(Some(feedback))
    }

    /// One elapsed second. Returns the result when time runs out.
    pub fn tick(&mut self) -> crate::Result<Option<GameResult>> {
        if self.state.phase != Phase::Running {
            return Err(DrillError::invalid_transition(self.state.phase, "tick"));
        }
        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        if self.state.time_remaining == 0 {
            return Ok(Some(self.finish()));
        }
        Ok(None)
    }

    /// Dispatch a fired timer.
    pub fn fire(&mut self, kind: TimerKind) -> crate::Result<Option<GameResult>> {
        match kind {
            TimerKind::Countdown if self.state.phase == Phase::Running => self.tick(),
            TimerKind::AutoSubmit => {
                self.pending_submit = None;
                if self.state.phase == Phase::Running {
                    self.submit()?;
                }
                Ok(None)
            }
            TimerKind::Countdown => Ok(None),
        }
    }

    /// Run every timer that has come due. Returns the result if the session
    /// ended along the way.
    pub fn pump(&mut self) -> crate::Result<Option<GameResult>> {
        let mut ended = None;
        while let Some(kind) = self.scheduler.pop_due() {
            if let Some(result) = self.fire(kind)? {
                ended = Some(result);
            }
        }
        Ok(ended)
    }

    fn finish(&mut self) -> GameResult {
        self.cancel_timers();
        self.state.phase = Phase::Ended;
        let result = GameResult {
            score: self.state.score,
            accuracy: self.state.accuracy(),
            problems_solved: self.state.total_attempts,
            duration: self.settings.duration,
            date: Utc::now(),
        };
        tracing::info!(
            score = result.score,
            accuracy = result.accuracy,
            problems = result.problems_solved,
            "session ended"
        );
        self.last_result = Some(result.clone());
        result
    }

    fn start_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            self.scheduler.cancel(handle);
        }
        self.countdown = Some(
            self.scheduler
                .schedule_periodic(TICK_PERIOD, TimerKind::Countdown),
        );
    }

    fn cancel_pending_submit(&mut self) {
        if let Some(handle) = self.pending_submit.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn cancel_timers(&mut self) {
        self.cancel_pending_submit();
        if let Some(handle) = self.countdown.take() {
            self.scheduler.cancel(handle);
        }
    }
}
