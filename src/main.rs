use anyhow::Context;
use chrono::Local;
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

use zetadrill::{
    app::App,
    app_dirs::{AppDirs, DB_FILE, LOG_FILE},
    export,
    game::Game,
    problem::Operation,
    runtime::{Action, CrosstermEventSource, DrillEvent, FixedTicker, Runner},
    scheduler::{Scheduler, SystemClock, TimerQueue},
    settings::{Difficulty, Operations, Settings},
    stats::Statistics,
    storage::{KeyValueStore, SqliteStore},
    ui::game_stamp,
};

// Upper bound on how long the loop sleeps between timer checks.
const TICK_RATE_MS: u64 = 50;

/// timed mental arithmetic drills in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed mental arithmetic drills in the terminal. Answer as many problems as you can before the clock runs out; scores and accuracy are tracked across sessions."
)]
pub struct Cli {
    /// directory holding the database and log file
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,

    #[clap(flatten)]
    overrides: SettingsOverrides,

    #[clap(subcommand)]
    command: Option<Command>,
}

/// Changes to the saved settings, persisted before the command runs
#[derive(Args, Debug, Clone, Default)]
struct SettingsOverrides {
    /// session length in seconds
    #[clap(short = 'd', long)]
    duration: Option<u32>,

    /// operand range tier
    #[clap(long, value_enum)]
    difficulty: Option<DifficultyArg>,

    /// operations to drill, comma separated
    #[clap(long, value_enum, value_delimiter = ',')]
    ops: Option<Vec<OperationArg>>,

    /// allow subtraction problems with negative answers
    #[clap(long)]
    allow_negatives: Option<bool>,

    /// milliseconds to wait before checking a plausible answer, 0 to disable
    #[clap(long)]
    auto_submit_delay: Option<u64>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// play a timed session (default)
    Play,
    /// print lifetime statistics and recent games
    Stats,
    /// write statistics as CSV
    Export {
        /// output file or directory
        #[clap(short, long)]
        out: Option<PathBuf>,
    },
    /// erase all recorded statistics
    ClearStats {
        /// confirm the deletion
        #[clap(long)]
        yes: bool,
    },
    /// print the saved settings
    Settings,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
            DifficultyArg::Expert => Difficulty::Expert,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum OperationArg {
    Add,
    Sub,
    Mul,
    Div,
}

impl From<OperationArg> for Operation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Add => Operation::Addition,
            OperationArg::Sub => Operation::Subtraction,
            OperationArg::Mul => Operation::Multiplication,
            OperationArg::Div => Operation::Division,
        }
    }
}

impl SettingsOverrides {
    fn is_empty(&self) -> bool {
        self.duration.is_none()
            && self.difficulty.is_none()
            && self.ops.is_none()
            && self.allow_negatives.is_none()
            && self.auto_submit_delay.is_none()
    }

    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(duration) = self.duration {
            settings.duration = duration;
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty.into();
        }
        if let Some(ops) = &self.ops {
            settings.operations = ops.iter().copied().map(Operation::from).collect::<Operations>();
        }
        if let Some(allow) = self.allow_negatives {
            settings.allow_negatives = allow;
        }
        if let Some(delay) = self.auto_submit_delay {
            settings.auto_submit_delay = delay;
        }
        settings
    }
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = AppDirs::resolve(cli.data_dir.as_deref());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    init_logging(&data_dir.join(LOG_FILE))?;

    let db = data_dir.join(DB_FILE);
    let mut game = Game::load(
        TimerQueue::new(SystemClock::new()),
        SqliteStore::open(&db).with_context(|| format!("opening {}", db.display()))?,
        SqliteStore::open(&db)?,
    );
    tracing::info!(data_dir = %data_dir.display(), "zetadrill starting");

    if !cli.overrides.is_empty() {
        let settings = cli.overrides.apply(game.settings().clone());
        game.update_settings(settings)?;
    }

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => play(game),
        Command::Stats => {
            print!("{}", format_statistics(game.statistics()));
            Ok(())
        }
        Command::Export { out } => {
            let path = export::export_to(game.statistics(), Local::now(), out.as_deref())?;
            println!("exported statistics to {}", path.display());
            Ok(())
        }
        Command::ClearStats { yes } => {
            if !yes {
                let mut cmd = Cli::command();
                cmd.error(
                    ErrorKind::MissingRequiredArgument,
                    "refusing to clear statistics without --yes",
                )
                .exit();
            }
            game.clear_statistics()?;
            println!("statistics cleared");
            Ok(())
        }
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(game.settings())?);
            Ok(())
        }
    }
}

fn format_statistics(stats: &Statistics) -> String {
    let mut out = format!(
        "games played   {}\nbest score     {}\naverage score  {}\nbest accuracy  {}%\n",
        stats.total_games,
        stats.best_score,
        stats.average_score(),
        stats.best_accuracy
    );
    if stats.recent_games.is_empty() {
        out.push_str("\nNo games played yet\n");
        return out;
    }
    out.push_str("\nrecent games\n");
    for game in &stats.recent_games {
        out.push_str(&format!(
            "{}  score {}  accuracy {}%  problems {}  {}s\n",
            game_stamp(&game.date),
            game.score,
            game.accuracy,
            game.problems_solved,
            game.duration
        ));
    }
    out
}

fn play(game: Game<TimerQueue<SystemClock>, SqliteStore>) -> anyhow::Result<()> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(game);
    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("zetadrill exiting");
    outcome
}

fn start_tui<B: Backend, S: Scheduler, K: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, K>,
) -> anyhow::Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit {
        match runner.step(app.game.scheduler().next_deadline_in()) {
            DrillEvent::Key(key) => {
                let action = Action::from(key);
                if let Err(e) = app.handle_action(action) {
                    tracing::warn!(error = %e, ?action, "key ignored");
                }
            }
            DrillEvent::Resize | DrillEvent::Tick => {}
        }

        // the session keeps its in-memory result even if recording fails
        if let Err(e) = app.pump() {
            tracing::error!(error = %e, "failed to record finished session");
        }

        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}
