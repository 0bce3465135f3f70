use chrono::{DateTime, Local};

use crate::export;
use crate::scheduler::Scheduler;
use crate::session::{Feedback, Session, SessionState};
use crate::settings::{Settings, SettingsStore};
use crate::stats::{GameResult, Statistics, StatisticsStore};
use crate::storage::KeyValueStore;

/// Everything one player's drill needs: durable settings and statistics
/// plus the live session. The presentation layer owns exactly one of these
/// and feeds it events one at a time.
#[derive(Debug)]
pub struct Game<S: Scheduler, K: KeyValueStore> {
    session: Session<S>,
    settings: SettingsStore<K>,
    stats: StatisticsStore<K>,
}

impl<S: Scheduler, K: KeyValueStore> Game<S, K> {
    /// Load settings and statistics and build an idle session from them.
    pub fn load(scheduler: S, settings_kv: K, stats_kv: K) -> Self {
        let settings = SettingsStore::new(settings_kv);
        let session = Session::new(settings.load(), scheduler);
        Self::from_parts(session, settings, StatisticsStore::load(stats_kv))
    }

    pub fn from_parts(
        session: Session<S>,
        settings: SettingsStore<K>,
        stats: StatisticsStore<K>,
    ) -> Self {
        Self {
            session,
            settings,
            stats,
        }
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn settings(&self) -> &Settings {
        self.session.settings()
    }

    pub fn statistics(&self) -> &Statistics {
        self.stats.statistics()
    }

    pub fn last_result(&self) -> Option<&GameResult> {
        self.session.last_result()
    }

    pub fn scheduler(&self) -> &S {
        self.session.scheduler()
    }

    /// Normalize, persist, and hand the settings to the session.
    pub fn update_settings(&mut self, settings: Settings) -> crate::Result<&Settings> {
        let stored = self.settings.update(settings)?;
        self.session.apply_settings(stored);
        Ok(self.session.settings())
    }

    pub fn start(&mut self) -> crate::Result<()> {
        self.session.start()
    }

    pub fn toggle_pause(&mut self) -> crate::Result<()> {
        self.session.toggle_pause()
    }

    pub fn reset(&mut self) {
        self.session.reset()
    }

    pub fn input(&mut self, raw: &str) -> crate::Result<()> {
        self.session.input(raw)
    }

    pub fn push_char(&mut self, c: char) -> crate::Result<()> {
        self.session.push_char(c)
    }

    pub fn backspace(&mut self) -> crate::Result<()> {
        self.session.backspace()
    }

    pub fn submit(&mut self) -> crate::Result<Option<Feedback>> {
        self.session.submit()
    }

    /// Run due timers; a session that times out is recorded in the
    /// statistics before this returns.
    pub fn pump(&mut self) -> crate::Result<Option<GameResult>> {
        let Some(result) = self.session.pump()? else {
            return Ok(None);
        };
        self.stats.append_result(result.clone())?;
        Ok(Some(result))
    }

    pub fn clear_statistics(&mut self) -> crate::Result<()> {
        self.stats.clear()
    }

    pub fn export_csv(&self, exported_at: DateTime<Local>) -> crate::Result<String> {
        export::render_csv(self.stats.statistics(), exported_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Operation;
    use crate::scheduler::{ManualClock, TimerQueue};
    use crate::session::Phase;
    use crate::settings::{Difficulty, Operations};
    use crate::storage::SqliteStore;

    fn game() -> (ManualClock, Game<TimerQueue<ManualClock>, SqliteStore>) {
        let clock = ManualClock::new();
        let game = Game::load(
            TimerQueue::new(clock.clone()),
            SqliteStore::open_in_memory().unwrap(),
            SqliteStore::open_in_memory().unwrap(),
        );
        (clock, game)
    }

    #[test]
    fn loads_defaults_into_idle_session() {
        let (_, game) = game();
        assert_eq!(game.settings(), &Settings::default());
        assert_eq!(game.session().phase, Phase::NotStarted);
        assert_eq!(game.session().time_remaining, 120);
        assert_eq!(game.statistics().total_games, 0);
    }

    #[test]
    fn timed_out_session_is_recorded_once() {
        let (clock, mut game) = game();
        game.update_settings(Settings {
            duration: 2,
            difficulty: Difficulty::Easy,
            operations: Operations::only(Operation::Addition),
            ..Settings::default()
        })
        .unwrap();
        game.start().unwrap();
        let answer = game.session().current_problem.as_ref().unwrap().correct_answer;
        game.input(&answer.to_string()).unwrap();
        game.submit().unwrap();

        clock.advance_ms(1000);
        assert!(game.pump().unwrap().is_none());
        clock.advance_ms(1000);
        let result = game.pump().unwrap().expect("ended");
        assert_eq!(result.score, 1);
        assert_eq!(result.accuracy, 100);

        clock.advance_ms(5000);
        assert!(game.pump().unwrap().is_none());
        let stats = game.statistics();
        assert_eq!(stats.total_games, 1);
        assert_eq!(stats.best_score, 1);
        assert_eq!(stats.recent_games[0], result);
        assert_eq!(game.last_result(), Some(&result));
    }

    #[test]
    fn update_settings_forces_an_operation() {
        let (_, mut game) = game();
        let stored = game
            .update_settings(Settings {
                operations: Operations::none(),
                duration: 60,
                ..Settings::default()
            })
            .unwrap()
            .clone();
        assert!(stored.operations.addition);
        assert_eq!(game.session().time_remaining, 60);
    }

    #[test]
    fn clear_statistics_wipes_history() {
        let (clock, mut game) = game();
        game.update_settings(Settings {
            duration: 1,
            ..Settings::default()
        })
        .unwrap();
        game.start().unwrap();
        clock.advance_ms(1000);
        game.pump().unwrap();
        assert_eq!(game.statistics().total_games, 1);
        game.clear_statistics().unwrap();
        assert_eq!(game.statistics(), &Statistics::default());
    }
}
