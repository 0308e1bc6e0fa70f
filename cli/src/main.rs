
mod form;
mod render;
mod transport;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use recommend::endpoint::{ApiEnvironment, resolve_base_url};
use recommend::{FormSession, RequestState, ResponseOrdering, SubmitRejected};
use tokio::io::{AsyncReadExt, BufReader};

use crate::form::InteractiveOptions;
use crate::transport::{HttpApi, Route};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http client build failed: {0}")]
    HttpClientBuild(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(#[from] SubmitRejected),
    /// Carries the banner text exactly as the form shows it.
    #[error("{0}")]
    Request(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "recommend-cli", about = "Assessment recommendation form for the terminal")]
struct Cli {
    /// Service base URL; overrides `--env`.
    #[arg(long, env = "RECOMMENDER_API_URL")]
    base_url: Option<String>,

    /// Deployment environment used to pick the default base URL.
    #[arg(long = "env", env = "RECOMMENDER_ENV", default_value = "development")]
    environment: ApiEnvironment,

    /// Which completion wins when requests overlap: `latest` or `arrival`.
    #[arg(long, env = "RECOMMENDER_ORDERING", default_value = "latest")]
    ordering: ResponseOrdering,

    /// Request timeout in seconds (at least 1); unset keeps the transport default.
    #[arg(long, env = "RECOMMENDER_TIMEOUT_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a job description via `GET /api/recommend`.
    Query(QueryArgs),
    /// Submit a job description read from a file or stdin via `POST /api/recommend/text`.
    Text(TextArgs),
    /// Submit a job posting URL via `GET /api/recommend/url`.
    Url(UrlArgs),
    /// Prompt loop: one submission per input line.
    Interactive(InteractiveArgs),
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Cap the number of recommendations (1-10).
    #[arg(long)]
    max_results: Option<u8>,

    /// Print the raw result as JSON instead of the table.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct QueryArgs {
    query: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct TextArgs {
    #[arg(long, default_value = "-", help = "Input file path, or - for stdin")]
    input: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct UrlArgs {
    url: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct InteractiveArgs {
    /// Cap the number of recommendations (1-10).
    #[arg(long)]
    max_results: Option<u8>,

    /// Accept new lines while a request is still in flight.
    #[arg(long, default_value_t = false)]
    allow_overlap: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let base_url = resolve_base_url(cli.base_url.as_deref(), cli.environment);
    let api = HttpApi::new(base_url, cli.timeout_secs.map(Duration::from_secs))?;
    tracing::info!(base_url = api.base_url(), environment = %cli.environment, ordering = %cli.ordering, "recommendation service configured");
    let session = FormSession::new(cli.ordering);

    match cli.command {
        Command::Query(args) => run_single(&api, session, Route::Query, args.query, &args.output).await,
        Command::Text(args) => {
            let text = read_input(&args.input).await?;
            run_single(&api, session, Route::Text, text, &args.output).await
        }
        Command::Url(args) => run_single(&api, session, Route::Url, args.url, &args.output).await,
        Command::Interactive(args) => run_interactive(api, session, &args).await,
    }
}

async fn run_single(
    api: &HttpApi,
    mut session: FormSession,
    route: Route,
    text: String,
    output: &OutputArgs,
) -> Result<(), CliError> {
    session.set_query(text);
    session.set_max_results(output.max_results);
    if output.json {
        form::submit_once(&mut session, api, route, &mut io::stderr(), io::stderr().is_terminal()).await?;
    } else {
        form::submit_once(&mut session, api, route, &mut io::stdout(), stdout_is_tty()).await?;
    }

    if session.state() == RequestState::Error {
        let banner = session.error().unwrap_or(recommend::failure::FALLBACK_MESSAGE);
        return Err(CliError::Request(banner.to_owned()));
    }

    let mut stdout = io::stdout().lock();
    if output.json {
        if let Some(result) = session.result() {
            writeln!(stdout, "{}", serde_json::to_string_pretty(result)?)?;
        }
    } else {
        form::print_view(&mut stdout, &session, stdout_is_tty())?;
    }
    Ok(())
}

async fn run_interactive(api: HttpApi, mut session: FormSession, args: &InteractiveArgs) -> Result<(), CliError> {
    session.set_max_results(args.max_results);
    let options = InteractiveOptions { allow_overlap: args.allow_overlap, color: stdout_is_tty() };
    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    let session = form::run_interactive(input, &mut stdout, Arc::new(api), session, options).await?;
    tracing::debug!(state = ?session.state(), "interactive session ended");
    Ok(())
}

async fn read_input(path: &str) -> Result<String, CliError> {
    if path == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        Ok(text)
    } else {
        Ok(tokio::fs::read_to_string(PathBuf::from(path)).await?)
    }
}

fn stdout_is_tty() -> bool {
    io::stdout().is_terminal()
}
