use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuizSettings};
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn require_number(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<u32, ArgsError> {
    let value = require_value(args, flag)?;
    value
        .trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw: value })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play      [options]");
    eprintln!("  cargo run -p app -- stats     [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- bookmarks [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>      storage location (default sqlite://quiz.sqlite3)");
    eprintln!("  --questions <file>     import a JSON question set instead of the bundled one");
    eprintln!("  --lives <n>            lives per session (default 3)");
    eprintln!("  --time-limit <secs>    per-question countdown, 5..=600 (default: untimed)");
    eprintln!("  --reset-seen           forget which questions were already answered");
    eprintln!("  --no-sound             start with feedback cues muted");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Stats,
    Bookmarks,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            "bookmarks" => Some(Self::Bookmarks),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    questions: Option<PathBuf>,
    max_lives: Option<u32>,
    time_limit_secs: Option<u32>,
    reset_seen: bool,
    sound: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url),
            questions: None,
            max_lives: None,
            time_limit_secs: None,
            reset_seen: false,
            sound: true,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--questions" => {
                    parsed.questions = Some(PathBuf::from(require_value(args, "--questions")?));
                }
                "--lives" => parsed.max_lives = Some(require_number(args, "--lives")?),
                "--time-limit" => {
                    parsed.time_limit_secs = Some(require_number(args, "--time-limit")?);
                }
                "--reset-seen" => parsed.reset_seen = true,
                "--no-sound" => parsed.sound = false,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn settings(&self) -> Result<QuizSettings, quiz_core::Error> {
        let mut settings = QuizSettings::default()
            .with_question_time_limit(self.time_limit_secs)?
            .with_sound(self.sound);
        if let Some(lives) = self.max_lives {
            settings = settings.with_max_lives(lives)?;
        }
        Ok(settings)
    }
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

fn load_bank(path: Option<&PathBuf>) -> Result<QuestionBank, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(QuestionBank::builtin());
    };
    let json = std::fs::read_to_string(path)?;
    let bank = parse_bank(&json)?;
    tracing::info!(path = %path.display(), questions = bank.len(), "imported question set");
    Ok(bank)
}

fn parse_bank(json: &str) -> Result<QuestionBank, quiz_core::Error> {
    Ok(QuestionBank::from_json(json)?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = parsed.settings()?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let clock = Clock::default_clock();
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        clock,
        settings,
        Arc::new(terminal::TerminalBell),
    )
    .await?;

    match cmd {
        Command::Play => {
            if parsed.reset_seen {
                services.session_loop().reset_seen().await?;
            }
            let bank = load_bank(parsed.questions.as_ref())?;
            terminal::play(&services, &bank, clock).await
        }
        Command::Stats => terminal::print_stats(&services).await,
        Command::Bookmarks => terminal::print_bookmarks(&services).await,
    }
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

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn parses_flags_into_settings() {
        let args = parse(&["--lives", "5", "--time-limit", "30", "--no-sound", "--reset-seen"])
            .unwrap();
        assert!(args.reset_seen);

        let settings = args.settings().unwrap();
        assert_eq!(settings.max_lives(), 5);
        assert_eq!(settings.question_time_limit_secs(), Some(30));
        assert!(!settings.sound_enabled());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(&["--lives"]),
            Err(ArgsError::MissingValue { flag: "--lives" })
        ));
        assert!(matches!(
            parse(&["--lives", "many"]),
            Err(ArgsError::InvalidNumber { .. })
        ));
        assert!(matches!(parse(&["--wat"]), Err(ArgsError::UnknownArg(_))));
        assert!(parse(&["--time-limit", "1"]).unwrap().settings().is_err());
        assert!(parse(&["--lives", "0"]).unwrap().settings().is_err());
    }

    #[test]
    fn normalizes_relative_sqlite_paths() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite://a.db".into()), "sqlite://a.db");
        assert!(normalize_sqlite_url("sqlite:a.db".into()).starts_with("sqlite:///"));
    }

    #[test]
    fn bank_import_errors_are_reported() {
        assert!(matches!(parse_bank("[]"), Err(quiz_core::Error::Import(_))));
        assert!(parse_bank("{").is_err());
    }
}
