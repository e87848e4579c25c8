//! Binary entry point for `support-desk`.
//!
//! This module provides the command-line interface for support-desk with
//! options for configuration file paths and logging verbosity. It either serves
//! the HTTP API or runs the terminal chat client against a running server.

use clap::{Parser, Subcommand};
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use support_desk::base::{config::Config, types::Void};
use tracing::Subscriber;
use tracing_subscriber::{
    Layer,
    fmt::{MakeWriter, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Support-desk – an AI-triaged customer support ticketing service.
///
/// Configuration can come from `config.toml` or `SUPPORT_DESK_*` environment
/// variables.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
struct Args {
    /// Override the config file path (optional).
    ///
    /// By default, the service will look for a config file at `.hidden/config.toml`
    /// in the current directory.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// Use multiple times to increase verbosity:
    /// - No flag: INFO level
    /// - -v: DEBUG level
    /// - -vv or more: TRACE level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// What to run; defaults to `serve`.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API.
    Serve,
    /// Chat with a running server from the terminal.
    Chat {
        /// Base URL of the server.
        #[arg(short, long, default_value = "http://localhost:3000")]
        server: String,
    },
}

/// Main entry point for the support-desk binary.
///
/// Sets up logging based on verbosity, then runs the selected command.
#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    // Construct the level filter.

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(level);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            // Prepare the otlp layer.

            let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
            let tracer = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build().tracer("support-desk");
            let otel = tracing_opentelemetry::layer().with_tracer(tracer);

            tracing_subscriber::registry().with(otel).with(level_filter).with(fmt_layer(std::io::stdout)).init();

            let config = Config::load(args.config.as_deref())?;

            support_desk::start(config).await
        }
        Command::Chat { server } => {
            // Keep the prompt readable: only warnings unless asked for more.
            let level_filter = if args.verbose == 0 { tracing_subscriber::filter::LevelFilter::WARN } else { level_filter };

            tracing_subscriber::registry().with(level_filter).with(fmt_layer(std::io::stderr)).init();

            support_desk::client::terminal::run(&server).await
        }
    }
}

/// The human-readable log layer, writing to `writer`.
fn fmt_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_file(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(writer)
}

// Tests.
