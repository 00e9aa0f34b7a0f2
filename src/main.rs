use clap::{ArgAction, Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

use faultline::classify::Classifier;
use faultline::failure::Failure;
use faultline::logging::{init_logging, LoggingConfig};
use faultline::output::Renderer;
use faultline::report::{FailureReport, Reporter, TracingReporter};
use faultline::settings::{Settings, SettingsError};

#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(version)]
#[command(about = "Classify failures into user-facing messages and telemetry decisions")]
struct Cli {
    /// Settings file (TOML); FAULTLINE_* environment variables override it
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Disable colors (also respects NO_COLOR environment variable)
    #[arg(long, global = true)]
    no_color: bool,

    /// Suppress all log output except errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a failure read as JSON from FILE or stdin
    Explain {
        /// JSON file describing the failure; reads stdin when omitted
        file: Option<PathBuf>,

        /// Print the classification as JSON
        #[arg(long)]
        json: bool,

        /// Forward reportable failures to the log as error events
        #[arg(long)]
        report: bool,
    },
    /// List the rule catalog in precedence order
    Rules,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read failure input: {0}")]
    Io(#[from] io::Error),

    #[error("invalid failure JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Exit codes for the faultline binary.
mod exit_codes {
    use std::process::ExitCode;

    /// Input, settings, or output could not be handled.
    pub fn bad_input() -> ExitCode {
        ExitCode::from(2)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let use_color = !cli.no_color && std::env::var("NO_COLOR").is_err();
    init_logging(LoggingConfig::from_verbosity(cli.verbose, cli.quiet).with_ansi(use_color));

    match run(&cli, use_color) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            exit_codes::bad_input()
        }
    }
}

fn run(cli: &Cli, use_color: bool) -> Result<(), CliError> {
    let settings = Settings::load(cli.config.as_deref())?;
    let classifier = settings.classifier();
    let renderer = Renderer::new(use_color);

    match &cli.command {
        Commands::Explain { file, json, report } => {
            let failure = read_failure(file.as_deref())?;
            explain(&classifier, &settings, &renderer, &failure, *json, *report)
        }
        Commands::Rules => {
            println!("{}", renderer.render_catalog(classifier.catalog()));
            Ok(())
        }
    }
}

fn read_failure(file: Option<&Path>) -> Result<Failure, CliError> {
    let text = match file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn explain(
    classifier: &Classifier,
    settings: &Settings,
    renderer: &Renderer,
    failure: &Failure,
    json: bool,
    report: bool,
) -> Result<(), CliError> {
    let context = settings.context();
    let matched = classifier.classify(failure);
    let classification = matched.to_classification(&context);

    if report && matched.should_report() {
        TracingReporter.forward(&FailureReport::new(
            &matched,
            classification.message.clone(),
            classifier,
        ));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        println!("{}", renderer.render_classification(&classification));
    }
    Ok(())
}
