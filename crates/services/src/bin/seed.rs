use std::fmt;
use std::fs::File;
use std::io;
use std::path::PathBuf;

use drill_core::model::{UserId, migrate_cards};
use drill_core::pool::{ensure_unique_ids, progress_histogram};
use services::{default_seed_pool, export_csv, import_csv};
use storage::repository::Storage;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    csv: Option<PathBuf>,
    export: Option<PathBuf>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUser { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
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

fn parse_user(raw: String) -> Result<UserId, ArgsError> {
    raw.parse::<UserId>()
        .map_err(|_| ArgsError::InvalidUser { raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("DRILL_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user_id = parse_user(std::env::var("DRILL_USER_ID").unwrap_or_else(|_| "local".into()))?;
        let mut csv = None;
        let mut export = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    user_id = parse_user(require_value(&mut args, "--user")?)?;
                }
                "--csv" => {
                    csv = Some(PathBuf::from(require_value(&mut args, "--csv")?));
                }
                "--export" => {
                    export = Some(PathBuf::from(require_value(&mut args, "--export")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            csv,
            export,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p services --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --user <id>               User whose pool is seeded (default: local)");
    eprintln!("  --csv <path>              Append cards from a word,sentence,word_mean,sentence_translation file");
    eprintln!("  --export <path>           Write the resulting pool as CSV");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Without --csv an empty pool receives the built-in starter cards.");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  DRILL_DB_URL, DRILL_USER_ID, RUST_LOG");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let mut pool = migrate_cards(storage.cards.load_card_pool(&args.user_id).await?);
    let before = pool.len();

    match &args.csv {
        Some(path) => {
            let imported = import_csv(File::open(path)?)?;
            let report = imported.report;
            pool.extend(imported.cards);
            info!(
                path = %path.display(),
                rows = report.total_rows,
                imported = report.imported,
                failed = report.failed,
                cleaned = report.cleaned_sentences,
                pipe_cleaned = report.pipe_cleaned,
                matched = report.word_matched,
                "imported csv"
            );
        }
        None if pool.is_empty() => pool = default_seed_pool(),
        None => info!(cards = before, "pool already populated, nothing to seed"),
    }

    let pool = ensure_unique_ids(pool);
    storage.cards.save_card_pool(&args.user_id, &pool).await?;

    if let Some(path) = &args.export {
        let written = export_csv(&pool, File::create(path)?)?;
        info!(path = %path.display(), rows = written, "exported pool");
    }

    let histogram = progress_histogram(&pool);
    println!(
        "Seeded user {} with {} cards ({} new) into {}; progress buckets 0..=5: {:?}",
        args.user_id,
        pool.len(),
        pool.len().saturating_sub(before),
        args.db_url,
        histogram
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
