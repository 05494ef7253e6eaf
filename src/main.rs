use clap::{error::ErrorKind, CommandFactory, Parser};
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
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use typing_challenge::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging::{init_logging, LogLevel},
    passages::{BuiltinPack, PassageBook},
    runtime::{CrosstermEventSource, Runner, Step},
    PassageError,
};

const POLL_INTERVAL_MS: u64 = 250;

/// type a passage, get your words per minute and error percentage
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing challenge for the terminal. Reproduce the passage as it is shown; the timer starts with your first letter and the round ends when your text is as long as the passage."
)]
pub struct Cli {
    /// custom passage to type instead of a built-in one
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// built-in passage pack to draw from
    #[clap(short = 'k', long, value_enum)]
    pack: Option<BuiltinPack>,

    /// JSON file with your own passages: {"name": "...", "passages": ["..."]}
    #[clap(short = 'f', long)]
    passages_file: Option<PathBuf>,

    /// log verbosity, written to the log file (RUST_LOG overrides)
    #[clap(long, value_enum)]
    log_level: Option<LogLevel>,

    /// remember the pack, passages file and log level as defaults
    #[clap(long)]
    save_config: bool,
}

/// Command line merged over the config file.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    prompt: Option<String>,
    pack: BuiltinPack,
    passages_file: Option<PathBuf>,
    log_level: LogLevel,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Result<Self, PassageError> {
        // naming a pack on the command line beats a passages file from the config
        let passages_file = match (&cli.passages_file, cli.pack) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(_)) => None,
            (None, None) => config.passages_file.clone(),
        };

        // a prompt or passages file replaces the pack, so a bad pack name only
        // matters when the pack is what gets typed
        let pack = match cli.pack {
            Some(pack) => pack,
            None if cli.prompt.is_some() || passages_file.is_some() => {
                BuiltinPack::from_name(&config.pack).unwrap_or_default()
            }
            None => BuiltinPack::from_name(&config.pack)?,
        };

        let log_level = cli
            .log_level
            .or_else(|| LogLevel::parse(&config.log_level))
            .unwrap_or_default();

        Ok(Self {
            prompt: cli.prompt.clone(),
            pack,
            passages_file,
            log_level,
        })
    }

    fn passages(&self) -> Result<PassageBook, PassageError> {
        if let Some(prompt) = &self.prompt {
            return PassageBook::single(prompt.clone());
        }
        if let Some(path) = &self.passages_file {
            return PassageBook::from_file(path);
        }
        PassageBook::builtin(self.pack)
    }

    fn to_config(&self) -> Config {
        Config {
            pack: self.pack.to_string().to_lowercase(),
            passages_file: self.passages_file.clone(),
            log_level: self.log_level.as_str().to_string(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let (config, config_err) = match store.try_load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    let settings = Settings::resolve(&cli, &config)?;
    if cli.save_config {
        store.save(&settings.to_config())?;
    }

    let log_path = init_logging(settings.log_level, AppDirs::log_path().as_deref());
    if let Some(err) = config_err {
        tracing::warn!(path = %store.path().display(), %err, "ignoring malformed config");
    }
    let passages = settings.passages()?;
    tracing::info!(
        pack = passages.name(),
        passages = passages.len(),
        log = ?log_path,
        "starting"
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, passages);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    passages: PassageBook,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(POLL_INTERVAL_MS),
    );
    let mut app = App::new(passages, runner.sender());

    terminal.draw(|f| f.render_widget(&app, f.area()))?;

    while !app.should_quit {
        match runner.step() {
            Step::Event(event) => {
                if app.handle_event(event) {
                    terminal.draw(|f| f.render_widget(&app, f.area()))?;
                }
            }
            Step::Idle => {}
        }
    }

    tracing::info!("bye");
    Ok(())
}
