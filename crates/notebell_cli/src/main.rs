//! notebell command line front-end.
//!
//! # Responsibility
//! - Edit events and tags in a notebook database.
//! - Run the reminder loop in the foreground (`watch`).
//!
//! # Invariants
//! - Every mutating command loads, mutates and saves the whole notebook.
//! - `watch` runs on a current-thread runtime until Ctrl-C.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use clap::{Parser, Subcommand};
use log::{error, info};
use notebell_core::{
    init_logging, open_db, AudioPlayer, CommandAudioPlayer, EpochMs, EventDraft, EventId,
    NotebellConfig, NotificationDispatcher, ReminderCalculator, ReminderConfig, ReminderLoop,
    ReminderService, SqliteNotebookRepository, SystemClock, TagDraft, TagId, VisualAlert,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "notebell")]
#[command(about = "Calendar events with scheduled reminders")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', default_value = "notebell.toml")]
    config: PathBuf,

    /// Database file path
    #[arg(long, default_value = "notebell.db")]
    db_path: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an event
    Add {
        title: String,
        /// Start as RFC 3339 or local `YYYY-MM-DD HH:MM`
        start: String,
        /// Compact reminder, e.g. `15m`, `after 1h`, `on-time`, `at 8:30`, `none`
        #[arg(long)]
        reminder: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        tag: Option<TagId>,
        /// Sound played when the reminder fires
        #[arg(long)]
        sound: Option<String>,
    },
    /// List events, optionally for one local day
    List {
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Delete an event
    Delete { id: EventId },
    /// Create a tag
    TagAdd {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a tag and clear it from events and notes
    TagDelete { id: TagId },
    /// Fire reminders in the foreground until Ctrl-C
    Watch,
}

/// Prints reminders to stdout.
struct ConsoleAlert;

impl VisualAlert for ConsoleAlert {
    fn show(&self, title: &str, description: &str, _duration_ms: u64) {
        println!("[{title}] {description}");
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("event=cli_exit module=cli status=error error={}", err);
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = NotebellConfig::load(&cli.config)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &absolute(log_dir)?)?;
    }
    let calculator = config.calculator()?;

    let mut conn = open_db(&cli.db_path)?;
    let mut repo = SqliteNotebookRepository::try_new(&mut conn)?;
    let mut service = ReminderService::load(
        &repo,
        calculator,
        config.reload_policy,
        build_dispatcher(&config),
        Arc::new(SystemClock),
    )?;

    match cli.command {
        Commands::Add {
            title,
            start,
            reminder,
            description,
            tag,
            sound,
        } => {
            let start_time = parse_start(&calculator, &start)?;
            let reminder = match reminder {
                Some(text) => Some(text.parse::<ReminderConfig>()?),
                None => config.default_reminder()?,
            };
            let draft = EventDraft {
                description,
                tag_id: tag,
                custom_sound_url: sound,
                reminder,
                ..EventDraft::new(title, start_time)
            };
            let id = service.create_event(draft)?;
            service.save(&mut repo)?;
            println!("{id}");
        }
        Commands::List { day } => {
            let store = service.store();
            let events = match day {
                Some(date) => store.events_on_day(date),
                None => store.events().iter().collect(),
            };
            for event in events {
                println!(
                    "{}  {}  reminder={}  {}",
                    event.id,
                    format_instant(&calculator, event.start_time),
                    event
                        .reminder_time
                        .map_or_else(|| "-".to_string(), |at| format_instant(&calculator, at)),
                    event.title
                );
            }
        }
        Commands::Delete { id } => {
            if !service.delete_event(id) {
                return Err(format!("event not found: {id}").into());
            }
            service.save(&mut repo)?;
        }
        Commands::TagAdd { name, color } => {
            let id = service.add_tag(TagDraft {
                name: Some(name),
                color,
            });
            service.save(&mut repo)?;
            println!("{id}");
        }
        Commands::TagDelete { id } => {
            if !service.delete_tag(id) {
                return Err(format!("tag not found: {id}").into());
            }
            service.save(&mut repo)?;
        }
        Commands::Watch => {
            watch(service)?;
        }
    }
    Ok(())
}

fn watch(service: ReminderService) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let driver = ReminderLoop::new(service);

    info!("event=watch_start module=cli status=ok");
    runtime.block_on(driver.run_until(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("event=watch_signal module=cli status=error error={}", err);
        }
    }));

    if let Some(mut service) = driver.into_service() {
        service.dispose();
    }
    info!("event=watch_stop module=cli status=ok");
    Ok(())
}

fn build_dispatcher(config: &NotebellConfig) -> NotificationDispatcher {
    let audio = CommandAudioPlayer::from_command_line(&config.sound_command)
        .map(|player| Arc::new(player) as Arc<dyn AudioPlayer>);
    NotificationDispatcher::new(Arc::new(ConsoleAlert), audio, config.dispatch_settings())
}

fn parse_start(calculator: &ReminderCalculator, text: &str) -> CliResult<EpochMs> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.timestamp_millis());
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))?;
    calculator
        .resolve_local(naive)
        .ok_or_else(|| format!("start time `{text}` is out of range").into())
}

fn format_instant(calculator: &ReminderCalculator, at: EpochMs) -> String {
    calculator
        .timezone()
        .timestamp_millis_opt(at)
        .single()
        .map_or_else(|| at.to_string(), |local| local.format("%Y-%m-%d %H:%M").to_string())
}

fn absolute(path: &Path) -> CliResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
