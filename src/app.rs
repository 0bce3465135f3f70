use crate::game::Game;
use crate::options::{OptionField, FIELDS};
use crate::runtime::Action;
use crate::scheduler::Scheduler;
use crate::session::Phase;
use crate::stats::GameResult;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Drill,
    Statistics,
    Options,
}

/// Terminal front end state: the game plus which screen is showing
#[derive(Debug)]
pub struct App<S: Scheduler, K: KeyValueStore> {
    pub game: Game<S, K>,
    pub screen: Screen,
    /// Selected row on the options screen
    pub options_cursor: usize,
    pub should_quit: bool,
}

impl<S: Scheduler, K: KeyValueStore> App<S, K> {
    pub fn new(game: Game<S, K>) -> Self {
        Self {
            game,
            screen: Screen::Drill,
            options_cursor: 0,
            should_quit: false,
        }
    }

    pub fn handle_action(&mut self, action: Action) -> crate::Result<()> {
        match (self.screen, action) {
            (_, Action::Quit) => self.should_quit = true,
            (Screen::Statistics, Action::ToggleStats | Action::Enter | Action::Backspace) => {
                self.screen = Screen::Drill;
            }
            (Screen::Statistics, _) => {}
            (Screen::Options, Action::ToggleOptions | Action::Backspace) => {
                self.screen = Screen::Drill;
            }
            (Screen::Options, action) => self.handle_options_action(action)?,
            (Screen::Drill, Action::ToggleStats) => self.leave_drill(Screen::Statistics)?,
            (Screen::Drill, Action::ToggleOptions) => self.leave_drill(Screen::Options)?,
            (Screen::Drill, action) => self.handle_drill_action(action)?,
        }
        Ok(())
    }

    fn leave_drill(&mut self, screen: Screen) -> crate::Result<()> {
        // looking away from the drill pauses it
        if self.game.session().phase == Phase::Running {
            self.game.toggle_pause()?;
        }
        self.screen = screen;
        Ok(())
    }

    pub fn selected_option(&self) -> OptionField {
        FIELDS[self.options_cursor.min(FIELDS.len() - 1)]
    }

    fn handle_options_action(&mut self, action: Action) -> crate::Result<()> {
        let forward = match action {
            Action::Up => {
                self.options_cursor = self.options_cursor.saturating_sub(1);
                return Ok(());
            }
            Action::Down => {
                self.options_cursor = (self.options_cursor + 1).min(FIELDS.len() - 1);
                return Ok(());
            }
            Action::Right | Action::Enter | Action::TogglePause => true,
            Action::Left => false,
            _ => return Ok(()),
        };
        let field = self.selected_option();
        let next = field.adjust(self.game.settings().clone(), forward);
        self.game.update_settings(next)?;
        Ok(())
    }

    fn handle_drill_action(&mut self, action: Action) -> crate::Result<()> {
        let phase = self.game.session().phase;
        match (phase, action) {
            (_, Action::Reset) => self.game.reset(),
            (Phase::NotStarted | Phase::Ended, Action::Enter) => self.game.start()?,
            (Phase::Running | Phase::Paused, Action::TogglePause) => self.game.toggle_pause()?,
            (Phase::Running, Action::Digit(c)) => self.game.push_char(c)?,
            (Phase::Running, Action::Minus) => self.game.push_char('-')?,
            (Phase::Running, Action::Backspace) => self.game.backspace()?,
            (Phase::Running, Action::Enter) => {
                self.game.submit()?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn pump(&mut self) -> crate::Result<Option<GameResult>> {
        self.game.pump()
    }
}
