//! Binary entry point for the subtitle translator.

use anyhow::Result;
use asstl_core::files;
use asstl_core::translate::azure::{AzureTranslator, DEFAULT_ENDPOINT};
use asstl_core::translate::batch::{BatchLimits, DEFAULT_MAX_CHARS, DEFAULT_MAX_ITEMS};
use asstl_core::translate::{process_file, LanguagePair, Mode, PipelineOptions};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

const KEY_ENV: &str = "TRANSLATOR_KEY";

/// Translate .ass subtitle dialogue lines.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input file path.
    input: PathBuf,

    /// Output file path, created if it doesn't exist (stdout by default).
    output: Option<PathBuf>,

    /// Source and target languages as source:target codes (for example en:de).
    #[arg(short, long)]
    languages: LanguagePair,

    /// Translate line by line. Uses less memory, takes longer.
    #[arg(short, long)]
    stream: bool,

    /// Print status messages (only if output is not stdout).
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug and trace logs (only if output is not stdout).
    #[arg(long)]
    debug: bool,

    /// Translator API key, if not set as the TRANSLATOR_KEY environment variable.
    #[arg(long)]
    key: Option<String>,

    /// Translator service endpoint.
    #[arg(long, env = "TRANSLATOR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Azure region of the Translator resource, if it is not global.
    #[arg(long, env = "TRANSLATOR_REGION")]
    region: Option<String>,

    /// Maximum number of lines per request in buffered mode.
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ITEMS as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    max_batch_items: u64,

    /// Characters per request in buffered mode stay below this number.
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_CHARS as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    max_batch_chars: u64,
}

/// The environment variable takes precedence over `--key`.
fn resolve_key(flag: Option<String>) -> Option<String> {
    std::env::var(KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .or(flag)
}

/// Application entry point which parses CLI args and maps failures to exit codes.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            let code = err
                .downcast_ref::<asstl_core::Error>()
                .map_or(1, asstl_core::Error::exit_code);
            ExitCode::from(code)
        }
    }
}

/// Logs go to stderr. Verbosity only applies when output is a file so piped
/// subtitles stay clean.
fn init_logging(cli: &Cli) {
    let to_file = !files::is_stdout(cli.output.as_deref());
    let filter = if cli.debug && to_file {
        EnvFilter::default()
            .add_directive("asstl=trace".parse().unwrap())
            .add_directive("asstl_core=trace".parse().unwrap())
            .add_directive("info".parse().unwrap())
    } else if cli.verbose && to_file {
        EnvFilter::default()
            .add_directive("asstl=info".parse().unwrap())
            .add_directive("asstl_core=info".parse().unwrap())
            .add_directive("warn".parse().unwrap())
    } else {
        EnvFilter::default().add_directive("warn".parse().unwrap())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let key = resolve_key(cli.key);
    let translator = AzureTranslator::new(key, &cli.endpoint, cli.region, cli.languages)?;
    let options = PipelineOptions {
        mode: if cli.stream {
            Mode::Streaming
        } else {
            Mode::Buffered
        },
        limits: BatchLimits {
            max_items: usize::try_from(cli.max_batch_items)?,
            max_chars: usize::try_from(cli.max_batch_chars)?,
        },
    };
    info!(
        "translating {} ({})",
        cli.input.display(),
        translator.config().languages
    );
    process_file(&cli.input, cli.output.as_deref(), &translator, &options).await?;
    info!("Finished!");
    Ok(())
}
