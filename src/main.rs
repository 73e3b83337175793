mod ui;

use clap::Parser;
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::LevelFilter;
use membuilder::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, Runner, TrainerEvent},
    session::{Mode, Trainer},
    store::SqliteStore,
    user::User,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{File, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    str::FromStr,
    time::{Duration, Instant},
};

/// Longest wait for input while no countdown is running
const IDLE_WAIT: Duration = Duration::from_millis(500);

/// sentence memorisation trainer: timed prompts, typed or self-judged answers
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Shows a random sentence from the current list for a limited time, then checks your typed answer (or asks you to judge it) and keeps per-list and lifetime scores."
)]
pub struct Cli {
    /// sqlite database holding the profile and sentence lists
    #[clap(long)]
    db: Option<PathBuf>,

    /// sentence file loaded on first run, one sentence per line
    #[clap(long)]
    default_sentences: Option<PathBuf>,

    /// import a sentence file and practise it
    #[clap(short = 'o', long)]
    open: Option<PathBuf>,

    /// log level written to the log file (error, warn, info, debug, trace)
    #[clap(long)]
    log_level: Option<String>,

    /// seconds a sentence stays visible with the fixed timer
    #[clap(short = 't', long)]
    timer: Option<u32>,

    /// milliseconds per character with the character-based timer
    #[clap(long)]
    char_timer: Option<u32>,

    /// base the timer on sentence length
    #[clap(long)]
    char_based_timer: Option<bool>,

    /// judge your own answers instead of typing them
    #[clap(long)]
    no_typing: Option<bool>,

    /// start the next sentence automatically after each answer
    #[clap(long)]
    auto_start: Option<bool>,

    /// always show the correct sentence after answering
    #[clap(long)]
    show_correct: Option<bool>,
}

impl Cli {
    /// Profile settings with command line overrides applied
    fn apply_overrides(&self, user: &User) -> User {
        User {
            timer_duration: self.timer.unwrap_or(user.timer_duration),
            char_timer_value: self.char_timer.unwrap_or(user.char_timer_value),
            char_based_timer: self.char_based_timer.unwrap_or(user.char_based_timer),
            no_typing: self.no_typing.unwrap_or(user.no_typing),
            auto_start: self.auto_start.unwrap_or(user.auto_start),
            show_correct_sentence: self.show_correct.unwrap_or(user.show_correct_sentence),
            ..user.clone()
        }
    }

    fn merge_config(&self, mut cfg: Config) -> Config {
        if let Some(db) = &self.db {
            cfg.db_path = Some(db.clone());
        }
        if let Some(path) = &self.default_sentences {
            cfg.default_sentences = path.clone();
        }
        if let Some(level) = &self.log_level {
            cfg.log_level = level.clone();
        }
        cfg
    }
}

pub struct App {
    pub trainer: Trainer<SqliteStore>,
}

impl App {
    pub fn new(cli: &Cli, cfg: &Config) -> Result<Self, Box<dyn Error>> {
        let store = SqliteStore::open(&cfg.resolved_db_path())?;
        let mut trainer = Trainer::open(store, Some(cfg.default_sentences.as_path()))?;
        let settings = cli.apply_overrides(trainer.user());
        trainer.apply_settings(settings);
        if let Some(path) = &cli.open {
            trainer.import_file(path)?;
        }
        Ok(Self { trainer })
    }

    fn next_list(&mut self) -> membuilder::Result<()> {
        let count = self.trainer.registry().lists().len();
        if count == 0 {
            return Ok(());
        }
        let next = self
            .trainer
            .registry()
            .current_index()
            .map_or(0, |idx| (idx + 1) % count);
        self.trainer.switch_list(next)
    }

    fn toggle_mode(&mut self) {
        let mut settings = self.trainer.user().clone();
        settings.no_typing = !settings.no_typing;
        self.trainer.apply_settings(settings);
    }

    fn toggle_auto_start(&mut self) {
        let mut settings = self.trainer.user().clone();
        settings.auto_start = !settings.auto_start;
        self.trainer.apply_settings(settings);
    }

    /// Deliver due countdowns. Returns true when the screen needs a redraw.
    fn on_tick(&mut self, now: Instant) -> bool {
        self.trainer.on_tick(now)
    }

    /// Returns false when the key asks to quit
    fn on_key(&mut self, key: KeyEvent) -> membuilder::Result<bool> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Ok(false),
            KeyCode::Char('c') if ctrl => return Ok(false),
            KeyCode::Char('n') if ctrl => self.toggle_mode(),
            KeyCode::Char('a') if ctrl => self.toggle_auto_start(),
            KeyCode::Tab => self.next_list()?,
            _ => match self.trainer.mode() {
                Mode::Typed => match key.code {
                    KeyCode::Enter => self.trainer.submit_input(),
                    KeyCode::Backspace => self.trainer.pop_input(),
                    KeyCode::Char(c) if self.trainer.sentence_active() => {
                        self.trainer.push_input(c)
                    }
                    _ => {}
                },
                Mode::Judged => match key.code {
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        self.trainer.generate_sentence();
                    }
                    KeyCode::Char('z') => self.trainer.judge(true),
                    KeyCode::Char('x') => self.trainer.judge(false),
                    KeyCode::Char('c') => self.trainer.toggle_answer(),
                    _ => {}
                },
            },
        }
        Ok(true)
    }
}

/// Open the log file for appending, creating its directory first
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn init_logging(cfg: &Config) {
    let mut level = LevelFilter::from_str(&cfg.log_level).unwrap_or(LevelFilter::Info);
    let log_path = AppDirs::log_path().unwrap_or_else(|| PathBuf::from("membuilder.log"));

    // The terminal belongs to the UI, so logs go to a file or nowhere
    let mut builder = env_logger::Builder::new();
    match open_log_file(&log_path) {
        Ok(log_file) => {
            builder.target(env_logger::Target::Pipe(Box::new(log_file)));
        }
        Err(err) => {
            eprintln!(
                "warning: logging disabled, cannot open {}: {}",
                log_path.display(),
                err
            );
            level = LevelFilter::Off;
        }
    }
    builder.filter_level(level);
    if level != LevelFilter::Off {
        builder.parse_default_env();
    }
    if let Err(err) = builder.try_init() {
        eprintln!("warning: logger already initialised: {}", err);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let cfg = cli.merge_config(FileConfigStore::new().load());
    init_logging(&cfg);

    if !stdin().is_tty() {
        return Err("stdin must be a tty".into());
    }

    let mut app = App::new(&cli, &cfg).inspect_err(|err| {
        log::error!("startup failed: {}", err);
    })?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.trainer.shutdown()?;
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), IDLE_WAIT);

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    loop {
        match runner.next(&app.trainer) {
            TrainerEvent::Tick => {
                if !app.on_tick(Instant::now()) {
                    continue;
                }
            }
            TrainerEvent::Resize => {}
            TrainerEvent::Key(key) => {
                if !app.on_key(key)? {
                    break;
                }
            }
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use membuilder::session::{Phase, PROMPT_TYPE};

    fn app_in_memory(lists: &[(&str, &str)]) -> App {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut trainer = Trainer::open(store, None).unwrap().with_seed(1);
        for (path, contents) in lists {
            trainer.import_list(Path::new(*path), contents).unwrap();
        }
        App { trainer }
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["membuilder"]);
        assert_eq!(cli.db, None);
        assert_eq!(cli.open, None);
        assert_eq!(cli.timer, None);
        assert_eq!(cli.no_typing, None);
    }

    #[test]
    fn test_cli_overrides_apply_to_profile() {
        let cli = Cli::parse_from([
            "membuilder",
            "-t",
            "5",
            "--char-based-timer",
            "false",
            "--no-typing",
            "true",
        ]);
        let user = User {
            num_correct: 9,
            ..User::default()
        };
        let merged = cli.apply_overrides(&user);
        assert_eq!(merged.timer_duration, 5);
        assert!(!merged.char_based_timer);
        assert!(merged.no_typing);
        assert_eq!(merged.num_correct, 9);
        assert_eq!(merged.char_timer_value, user.char_timer_value);
    }

    #[test]
    fn test_cli_merges_into_config() {
        let cli = Cli::parse_from(["membuilder", "--db", "/tmp/x.db", "--log-level", "debug"]);
        let cfg = cli.merge_config(Config::default());
        assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.default_sentences, PathBuf::from("default_sentences.txt"));
    }

    #[test]
    fn test_enter_starts_then_typing_submits() {
        let mut app = app_in_memory(&[("one.txt", "hi")]);
        assert!(press(&mut app, KeyCode::Enter));
        assert!(app.trainer.sentence_active());

        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('i'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.trainer.view().result, "Correct!");
        assert_eq!(app.trainer.list_correct(), 1);
    }

    #[test]
    fn test_escape_quits() {
        let mut app = app_in_memory(&[]);
        assert!(!press(&mut app, KeyCode::Esc));
        assert!(!app
            .on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .unwrap());
    }

    #[test]
    fn test_tab_cycles_lists() {
        let mut app = app_in_memory(&[("a.txt", "a"), ("b.txt", "b")]);
        assert_eq!(app.trainer.current_list_title(), "b.txt");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.trainer.current_list_title(), "a.txt");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.trainer.current_list_title(), "b.txt");
    }

    #[test]
    fn test_judged_keys() {
        let mut app = app_in_memory(&[("a.txt", "alpha\nbeta")]);
        app.on_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL))
            .unwrap();
        assert_eq!(app.trainer.mode(), Mode::Judged);

        press(&mut app, KeyCode::Char(' '));
        app.trainer.response_timeout();
        assert_eq!(app.trainer.phase(), Phase::AwaitingJudgement);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.trainer.view().answer, app.trainer.current_sentence());
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.trainer.view().result, "Incorrect!");
    }

    #[test]
    fn test_ctrl_a_toggles_auto_start() {
        let mut app = app_in_memory(&[]);
        let before = app.trainer.user().auto_start;
        app.on_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL))
            .unwrap();
        assert_eq!(app.trainer.user().auto_start, !before);
    }

    #[test]
    fn test_typed_timeout_needs_redraw() {
        let mut app = app_in_memory(&[("one.txt", "hidden")]);
        let mut settings = app.trainer.user().clone();
        settings.char_based_timer = false;
        settings.timer_duration = 3;
        app.trainer.apply_settings(settings);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.trainer.view().prompt, "hidden");
        assert!(!app.on_tick(Instant::now()));

        let phase = app.trainer.phase();
        assert!(app.on_tick(Instant::now() + Duration::from_secs(4)));
        assert_eq!(app.trainer.phase(), phase);
        assert_eq!(app.trainer.view().prompt, PROMPT_TYPE);
    }

    #[test]
    fn test_log_file_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("membuilder.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_log_file_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();
        assert!(open_log_file(&blocker.join("membuilder.log")).is_err());
    }
}
