use std::env;
use std::fmt;

use services::{AppServices, Clock, ReviewConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod terminal;

const ENV_LOG_JSON: &str = "KANJI_LOG_JSON";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw:?}"),
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
    eprintln!("  cargo run -p app -- review [--api <url>] [--token <token>]");
    eprintln!("  cargo run -p app -- due    [--api <url>] [--token <token>]");
    eprintln!("  cargo run -p app -- flip   [--api <url>] [--token <token>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api {}", services::config::DEFAULT_API_BASE_URL);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  KANJI_API_BASE_URL, KANJI_API_TOKEN, KANJI_BATCH_FLUSH_MS, KANJI_BATCH_DEDUP,");
    eprintln!("  KANJI_TRANSITION_MS, KANJI_DEFAULT_SELECTION, KANJI_LOG_JSON, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Review,
    Due,
    Flip,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "review" => Some(Self::Review),
            "due" => Some(Self::Due),
            "flip" => Some(Self::Flip),
            _ => None,
        }
    }
}

/// Flag overrides applied on top of the environment.
#[derive(Debug, Default)]
struct Args {
    api: Option<String>,
    token: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    parsed.api = Some(value.trim().to_owned());
                }
                "--token" => parsed.token = Some(require_value(args, "--token")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn apply(self, mut config: ReviewConfig) -> ReviewConfig {
        if let Some(api) = self.api {
            config.api.base_url = api;
        }
        if self.token.is_some() {
            config.api = config.api.with_token(self.token);
        }
        config
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the session prompts.
    if env_bool(ENV_LOG_JSON, false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = env::args().skip(1).collect();

    // No subcommand means an interactive review session.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Review,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Review,
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

    init_tracing();

    let config = parsed.apply(ReviewConfig::from_env()?);
    tracing::debug!(
        api = %config.api.base_url,
        authenticated = config.api.token.is_some(),
        "review client configured"
    );
    let services = AppServices::new_http(&config, Clock::default())?;

    match cmd {
        Command::Review => terminal::run_review(&services).await?,
        Command::Due => terminal::list_due(&services).await?,
        Command::Flip => terminal::run_flip(&services).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = raw.iter().map(|s| (*s).to_owned());
        Args::parse(&mut iter)
    }

    #[test]
    fn flags_override_environment() {
        let parsed = args(&["--api", " https://kanji.example/api ", "--token", "t0k"]).unwrap();
        let config = parsed.apply(ReviewConfig::default());
        assert_eq!(config.api.base_url, "https://kanji.example/api");
        assert_eq!(config.api.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn missing_flag_value_is_rejected() {
        assert!(matches!(
            args(&["--api"]),
            Err(ArgsError::MissingValue { flag: "--api" })
        ));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(matches!(args(&["--db", "x"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn no_flags_keep_config() {
        let config = args(&[]).unwrap().apply(ReviewConfig::default());
        assert_eq!(config.api.base_url, services::config::DEFAULT_API_BASE_URL);
        assert!(config.api.token.is_none());
    }
}
