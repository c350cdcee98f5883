use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use quiz_core::model::{QuizSettingsDraft, default_exam_date};
use services::{Clock, StartRequest};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod client;

use client::Client;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidLogCap { raw: String },
    InvalidExamDate { raw: String },
    MissingAnswer,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLogCap { raw } => write!(f, "invalid --log-cap value: {raw}"),
            ArgsError::InvalidExamDate { raw } => {
                write!(f, "invalid --exam-date value (expected YYYY-MM-DD): {raw}")
            }
            ArgsError::MissingAnswer => write!(f, "answer requires <question-id> <text>"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [global options] <command> [command options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  home   [--chart-cat <category>]");
    eprintln!("  start  [--mode fill|ox] [--cat <category>] [--count <n>] [--review]");
    eprintln!("  study");
    eprintln!("  answer <question-id> <text>");
    eprintln!("  next");
    eprintln!("  result");
    eprintln!("  reset");
    eprintln!("  play   # answer questions interactively until the session ends");
    eprintln!();
    eprintln!("Global options (defaults):");
    eprintln!("  --data <dir>              (csv_data)");
    eprintln!("  --db <sqlite_url>         (sqlite:quiz.sqlite3)");
    eprintln!("  --log-cap <n>             (100)");
    eprintln!("  --exam-date <YYYY-MM-DD>  ({})", default_exam_date());
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DATA_DIR, QUIZ_DB_URL, QUIZ_LOG_CAP, QUIZ_EXAM_DATE, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Home { chart_category: Option<String> },
    Start(StartRequest),
    Study,
    Answer { question_id: String, text: String },
    Next,
    Result,
    Reset,
    Play,
}

impl Command {
    fn parse(name: &str, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        match name {
            "home" => {
                let mut chart_category = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--chart-cat" => chart_category = Some(require_value(args, "--chart-cat")?),
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Ok(Self::Home { chart_category })
            }
            "start" => {
                let (mut mode, mut category, mut count, mut review) = (None, None, None, false);
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--mode" => mode = Some(require_value(args, "--mode")?),
                        "--cat" => category = Some(require_value(args, "--cat")?),
                        "--count" => count = Some(require_value(args, "--count")?),
                        "--review" => review = true,
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Ok(Self::Start(StartRequest::from_raw(
                    mode.as_deref(),
                    category.as_deref(),
                    count.as_deref(),
                    review,
                )))
            }
            "answer" => {
                let question_id = args.next().ok_or(ArgsError::MissingAnswer)?;
                let text = args.collect::<Vec<_>>().join(" ");
                Ok(Self::Answer { question_id, text })
            }
            "study" | "next" | "result" | "reset" | "play" => {
                if let Some(extra) = args.next() {
                    return Err(ArgsError::UnknownArg(extra));
                }
                Ok(match name {
                    "study" => Self::Study,
                    "next" => Self::Next,
                    "result" => Self::Result,
                    "reset" => Self::Reset,
                    _ => Self::Play,
                })
            }
            other => Err(ArgsError::UnknownCommand(other.to_string())),
        }
    }
}

struct Args {
    data_dir: PathBuf,
    db_url: String,
    settings: QuizSettingsDraft,
    command: Command,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut data_dir = std::env::var("QUIZ_DATA_DIR")
            .ok()
            .map_or_else(|| PathBuf::from("csv_data"), PathBuf::from);
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3".into()), normalize_sqlite_url);
        let mut settings = QuizSettingsDraft::new();
        if let Ok(raw) = std::env::var("QUIZ_LOG_CAP") {
            settings.log_cap = parse_log_cap(raw)?;
        }
        if let Ok(raw) = std::env::var("QUIZ_EXAM_DATE") {
            settings.exam_date = parse_exam_date(raw)?;
        }

        let mut command = Command::Home {
            chart_category: None,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data" => data_dir = PathBuf::from(require_value(args, "--data")?),
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--log-cap" => settings.log_cap = parse_log_cap(require_value(args, "--log-cap")?)?,
                "--exam-date" => {
                    settings.exam_date = parse_exam_date(require_value(args, "--exam-date")?)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                name => {
                    command = Command::parse(name, args)?;
                    break;
                }
            }
        }

        Ok(Self {
            data_dir,
            db_url,
            settings,
            command,
        })
    }
}

fn parse_log_cap(raw: String) -> Result<usize, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidLogCap { raw })
}

fn parse_exam_date(raw: String) -> Result<NaiveDate, ArgsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ArgsError::InvalidExamDate { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = parsed.settings.validate()?;

    // The jar stands in for the browser's cookie store between invocations.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::open(&parsed.data_dir, &parsed.db_url).await?;
    let client = Client::new(Clock::default_clock(), settings, storage);

    match parsed.command {
        Command::Home { chart_category } => client.home(chart_category.as_deref()).await,
        Command::Start(request) => client.start(&request).await,
        Command::Study => client.study().await,
        Command::Answer { question_id, text } => client.answer(&question_id, &text).await,
        Command::Next => client.next().await,
        Command::Result => client.result().await,
        Command::Reset => client.reset().await,
        Command::Play => client.play().await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
