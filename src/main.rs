use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    cursor, execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Arc,
};
use tracing_subscriber::EnvFilter;
use typemeteor::{
    config::{Config, ConfigStore, FileConfigStore},
    language::{Language, SupportedLanguage, WordCatalog},
    leaderboard::{open_store, BackendKind, LeaderboardStore, ScoreSubmission},
    practice::{Flow, PracticeController},
    runtime::{CrosstermEventSource, Runner},
    server::{self, AppState},
    session::SessionEngine,
    ui,
};

/// typing speed test with per-language leaderboards
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// config file to read instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run the HTTP API
    Serve {
        /// address to listen on
        #[clap(long)]
        bind: Option<String>,

        /// leaderboard storage backend
        #[clap(long, value_enum)]
        backend: Option<BackendKind>,

        /// leaderboard file or database location
        #[clap(long)]
        data: Option<PathBuf>,

        /// scores kept per language, 0 keeps everything
        #[clap(long)]
        retention: Option<usize>,
    },
    /// take a timed typing test in the terminal
    Practice {
        /// language to pull words from
        #[clap(short = 'l', long, value_enum, default_value_t = SupportedLanguage::English)]
        language: SupportedLanguage,

        /// number of seconds to run test
        #[clap(short = 's', long)]
        secs: Option<u32>,

        /// save the result to the leaderboard under this name
        #[clap(long)]
        name: Option<String>,
    },
    /// print the top scores
    Leaderboard {
        /// only show one language
        #[clap(short = 'l', long)]
        language: Option<String>,

        /// rows to print
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// list bundled languages
    Languages,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if std::env::var_os("TYPEMETEOR_LOG_JSON").is_some() {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = config_store.load();
    tracing::debug!(path = %config_store.path().display(), "configuration loaded");

    match cli.command {
        Command::Serve {
            bind,
            backend,
            data,
            retention,
        } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(backend) = backend {
                config.store.backend = backend;
            }
            if data.is_some() {
                config.store.path = data;
            }
            if let Some(cap) = retention {
                config.store.retention_cap = (cap > 0).then_some(cap);
            }
            run_server(config)
        }
        Command::Practice {
            language,
            secs,
            name,
        } => {
            if let Some(secs) = secs {
                config.session.duration_secs = secs;
            }
            let name = name.or_else(|| config.player_name.clone());
            run_practice(&config, language, name)
        }
        Command::Leaderboard { language, limit } => {
            let store = open_store(&config.store)?;
            let scores = match language.as_deref() {
                Some(lang) => store.top_n(lang, limit)?,
                None => store.top_n_all(limit)?,
            };
            if scores.is_empty() {
                println!("no scores yet");
            } else {
                print!("{}", ui::leaderboard_table(&scores));
            }
            Ok(())
        }
        Command::Languages => {
            for lang in WordCatalog::bundled()?.iter() {
                println!("{:<12} {} words", lang.name, lang.words.len());
            }
            Ok(())
        }
    }
}

fn run_server(config: Config) -> Result<(), Box<dyn Error>> {
    let store = open_store(&config.store)?;
    let catalog = WordCatalog::bundled()?;
    let state = AppState::new(store, catalog, config.server);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(server::serve(state))?;
    Ok(())
}

fn run_practice(
    config: &Config,
    language: SupportedLanguage,
    name: Option<String>,
) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let pool: Arc<Language> = Arc::new(language.as_lang()?);
    let store = match &name {
        Some(_) => Some(open_store(&config.store)?),
        None => None,
    };
    let mut controller = PracticeController::new(SessionEngine::new(pool, config.session));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    enter_screen(&mut stdout, disable_raw_mode)?;

    let results = practice_loop(&mut stdout, &mut controller, name.as_deref());

    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen, cursor::Show)?;

    for result in results? {
        println!("{}", result.summary);
        if let (Some(store), Some(submission)) = (&store, result.submission) {
            save_score(store.as_ref(), submission);
        }
    }
    Ok(())
}

fn save_score(store: &dyn LeaderboardStore, submission: ScoreSubmission) {
    match store.append(submission) {
        Ok(score) => println!("saved {} wpm for {} (#{})", score.wpm, score.name, score.id),
        Err(e) => {
            tracing::error!(error = %e, "failed to save score");
            eprintln!("could not save score: {e}");
        }
    }
}

/// Switch to the practice screen. `restore` runs when the switch fails so the
/// terminal is not left in raw mode.
fn enter_screen<W: Write>(out: &mut W, restore: impl FnOnce() -> io::Result<()>) -> io::Result<()> {
    if let Err(e) = execute!(out, EnterAlternateScreen, cursor::Hide) {
        restore()?;
        return Err(e);
    }
    Ok(())
}

/// One finished test, captured before the engine is reset for the next.
struct Finished {
    summary: String,
    submission: Option<ScoreSubmission>,
}

fn practice_loop<W: Write>(
    out: &mut W,
    controller: &mut PracticeController,
    name: Option<&str>,
) -> Result<Vec<Finished>, Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new());
    let mut finished = Vec::new();
    ui::draw(out, &controller.engine, terminal::size()?)?;

    loop {
        let event = runner.step(&mut controller.countdown);
        match controller.handle(event) {
            Flow::Quit => break,
            Flow::Continue => {}
            Flow::Redraw => ui::draw(out, &controller.engine, terminal::size()?)?,
            Flow::Finished => {
                let engine = &controller.engine;
                let m = engine.metrics();
                let message = engine.rating().map(|r| r.message()).unwrap_or_default();
                finished.push(Finished {
                    summary: format!("{} wpm, {}% accuracy. {message}", m.wpm, m.accuracy),
                    submission: name.and_then(|n| engine.submission(n)),
                });
                ui::draw(out, engine, terminal::size()?)?;
            }
        }
    }
    Ok(finished)
}
