use std::fmt;
use std::sync::Arc;

use backend::{Backend, BackendConfig};
use practice_core::model::SubjectId;
use practice_core::session::SessionContext;
use services::{Clock, EngineConfig, PracticeEngine};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod demo;
mod terminal;

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSubjectId { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSubjectId { raw } => write!(f, "invalid --subject value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
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
    eprintln!("  cargo run -p app -- run  [--subject <id>] [--tag <text>] [--api <url>] [--no-test-session]");
    eprintln!("  cargo run -p app -- demo [--subject <id>] [--tag <text>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --subject 1");
    eprintln!("  --api {}", backend::config::DEFAULT_API_URL);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PRACTICE_SUBJECT_ID, PRACTICE_TAG, PRACTICE_API_URL, PRACTICE_API_TOKEN,");
    eprintln!("  PRACTICE_USER_ID, PRACTICE_REQUEST_TIMEOUT_SECS, PRACTICE_AI_THRESHOLD,");
    eprintln!("  PRACTICE_PREDICTION_TIMEOUT_MS, PRACTICE_PERSIST_TIMEOUT_MS,");
    eprintln!("  PRACTICE_LIFECYCLE_TIMEOUT_MS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Demo,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "demo" => Some(Self::Demo),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    subject_id: SubjectId,
    tag: Option<String>,
    api_url: Option<String>,
    test_session: bool,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            subject_id: env("PRACTICE_SUBJECT_ID")
                .and_then(|value| value.trim().parse::<SubjectId>().ok())
                .unwrap_or(SubjectId::new(1)),
            tag: env("PRACTICE_TAG").filter(|t| !t.trim().is_empty()),
            api_url: None,
            test_session: true,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--subject" => {
                    let value = require_value(args, "--subject")?;
                    parsed.subject_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSubjectId { raw: value.clone() })?;
                }
                "--tag" => {
                    let value = require_value(args, "--tag")?;
                    parsed.tag = (!value.trim().is_empty()).then_some(value);
                }
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if !(value.starts_with("http://") || value.starts_with("https://")) {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    parsed.api_url = Some(value);
                }
                "--no-test-session" => parsed.test_session = false,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn context(&self) -> SessionContext {
        let context = SessionContext::new(self.subject_id);
        match &self.tag {
            Some(tag) => context.with_tag(tag.clone()),
            None => context,
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: the interactive demo when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Demo,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Demo,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter(), |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = EngineConfig::from_env()?;
    let (engine, context) = match cmd {
        Command::Run => {
            let mut backend_config = BackendConfig::from_env()?;
            if let Some(url) = &parsed.api_url {
                backend_config = backend_config.with_base_url(url.clone());
            }
            tracing::info!(?backend_config, "using platform API");
            let engine = PracticeEngine::new(&Backend::http(&backend_config)?, config)
                .with_clock(Clock::default_clock());

            let mut context = parsed.context();
            if parsed.test_session {
                let id = engine
                    .open_test_session(parsed.subject_id, context.tag.as_deref())
                    .await;
                context = context.with_test_session(id);
            }
            (engine, context)
        }
        Command::Demo => {
            let store = demo::store()?;
            let engine = PracticeEngine::new(&Backend::with_memory(&store), config)
                .with_topic_names(Arc::new(demo::topics()));
            (engine, parsed.context())
        }
    };

    let mut input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    terminal::practice(&engine, context, &mut input, &mut out).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
