use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

use nback::{
    audio::{BellPlayer, NullPlayer, SoundPlayer},
    config::{Config, ConfigStore, FileConfigStore},
    round::{Round, RoundConfig, RoundError},
    runtime::{
        CrosstermEventSource, EventSource, FixedTicker, InputEvent, Runner, Ticker, TurnPacer,
    },
    stimulus::SeededDraws,
    store::{GameResult, ResultStore},
    ui::{
        self,
        progress::{render_progress, ProgressState},
    },
    TICK_RATE_MS,
};

/// Pacing intervals below this make the round unplayable.
const MIN_TURN_MS: u64 = 500;

/// dual n-back trainer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal dual n-back trainer: watch the board, listen for the cue, and call out which channels match the stimulus from n turns back. Results are stored locally so progress per level can be reviewed in the app."
)]
pub struct Cli {
    /// n-back level (how many turns back to compare against)
    #[clap(short = 'n', long)]
    level: Option<usize>,

    /// number of turns in a round
    #[clap(short = 't', long)]
    turns: Option<usize>,

    /// milliseconds between turns
    #[clap(long)]
    turn_ms: Option<u64>,

    /// seed for the stimulus sequence (random when omitted)
    #[clap(long)]
    seed: Option<u64>,

    /// do not ring the terminal bell on each stimulus
    #[clap(long)]
    mute: bool,
}

impl Cli {
    /// Flags override the saved settings; anything not given keeps the
    /// last-used value.
    fn effective_config(&self, saved: Config) -> Config {
        Config {
            n_level: self.level.unwrap_or(saved.n_level),
            total_turns: self.turns.unwrap_or(saved.total_turns),
            turn_ms: self.turn_ms.unwrap_or(saved.turn_ms).max(MIN_TURN_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Playing,
    Progress,
}

pub struct App {
    pub settings: Config,
    pub seed: Option<u64>,
    pub round: Round,
    pub state: AppState,
    pub pacer: TurnPacer,
    pub progress_state: ProgressState,
    pub results: Vec<GameResult>,
    player: Box<dyn SoundPlayer>,
}

impl App {
    pub fn new(
        settings: Config,
        seed: Option<u64>,
        player: Box<dyn SoundPlayer>,
    ) -> Result<Self, RoundError> {
        let round = Self::build_round(&settings, seed)?;
        let pacer = TurnPacer::new(settings.turn_ms, TICK_RATE_MS);
        Ok(Self {
            settings,
            seed,
            round,
            state: AppState::Playing,
            pacer,
            progress_state: ProgressState::default(),
            results: Vec::new(),
            player,
        })
    }

    fn build_round(settings: &Config, seed: Option<u64>) -> Result<Round, RoundError> {
        let config = RoundConfig::new(settings.n_level, settings.total_turns)?;
        let mut round = Round::new(
            config,
            Box::new(SeededDraws::new(seed)),
            ResultStore::new().ok(),
        );
        round.start();
        Ok(round)
    }

    fn start_round(&mut self, seed: Option<u64>) {
        if let Ok(round) = Self::build_round(&self.settings, seed) {
            self.round = round;
        }
        self.pacer.reset();
        self.state = AppState::Playing;
    }

    /// Start a fresh round with the same settings. With a fixed seed this
    /// replays the identical stimulus sequence.
    pub fn replay(&mut self) {
        self.start_round(self.seed);
    }

    /// Start a fresh round with a new stimulus sequence, dropping any
    /// fixed seed.
    pub fn new_round(&mut self) {
        self.seed = None;
        self.start_round(None);
    }

    /// One UI tick: advance the round when a turn boundary is crossed and
    /// play the cue for the freshly generated stimulus.
    pub fn on_tick(&mut self) {
        if self.state != AppState::Playing || !self.round.running || self.round.over {
            return;
        }
        if self.pacer.on_tick(self.round.paused) {
            self.round.advance_turn();
            if let Some(stimulus) = self.round.current_stimulus() {
                self.player.play(stimulus);
            }
        }
    }

    pub fn open_progress(&mut self) {
        self.results = ResultStore::new()
            .and_then(|store| store.all_results())
            .unwrap_or_default();
        self.progress_state = ProgressState::default();
        self.state = AppState::Progress;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let settings = cli.effective_config(config_store.load());

    if let Err(e) = RoundConfig::new(settings.n_level, settings.total_turns) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }
    let _ = config_store.save(&settings);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let player: Box<dyn SoundPlayer> = if cli.mute {
        Box::new(NullPlayer)
    } else {
        Box::new(BellPlayer)
    };
    let mut app = App::new(settings, cli.seed, player)?;
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    let res = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| render(app, f))?;

    loop {
        match runner.step() {
            InputEvent::Tick => app.on_tick(),
            InputEvent::Resize => {}
            InputEvent::Key(key) => {
                if handle_key(app, key) {
                    // Quitting mid-round records the loss and tears the
                    // round down regardless of how far it got.
                    app.round.stop(false);
                    break;
                }
            }
        }
        terminal.draw(|f| render(app, f))?;
    }

    Ok(())
}

/// Route a key press to the current screen. Returns true to quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match app.state {
        AppState::Playing => {
            if app.round.over && !app.round.outcome_title.is_empty() {
                match key.code {
                    KeyCode::Char('r') => app.replay(),
                    KeyCode::Char('n') => app.new_round(),
                    KeyCode::Char('v') => app.open_progress(),
                    KeyCode::Esc | KeyCode::Char('q') => return true,
                    _ => {}
                }
            } else {
                match key.code {
                    KeyCode::Char('f') => app.round.claim_position(),
                    KeyCode::Char('j') => app.round.claim_sound(),
                    KeyCode::Char('p') => {
                        if app.round.paused {
                            app.round.resume();
                        } else {
                            app.round.pause();
                        }
                    }
                    KeyCode::Esc => return true,
                    _ => {}
                }
            }
        }
        AppState::Progress => match key.code {
            KeyCode::Up => {
                app.progress_state.scroll_offset =
                    app.progress_state.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down => {
                // Clamped against the row count in the render pass.
                app.progress_state.scroll_offset += 1;
            }
            KeyCode::PageUp => {
                app.progress_state.scroll_offset =
                    app.progress_state.scroll_offset.saturating_sub(10);
            }
            KeyCode::PageDown => {
                app.progress_state.scroll_offset += 10;
            }
            KeyCode::Home => {
                app.progress_state.scroll_offset = 0;
            }
            KeyCode::Char('b') | KeyCode::Backspace => {
                app.state = AppState::Playing;
            }
            KeyCode::Esc => return true,
            _ => {}
        },
    }

    false
}

fn render(app: &mut App, f: &mut Frame) {
    match app.state {
        AppState::Playing => ui::render_game(&app.round, f),
        AppState::Progress => render_progress(&app.results, &mut app.progress_state, f),
    }
}
