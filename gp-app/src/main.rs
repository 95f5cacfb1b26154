//! groq-probe: validate an API key against an OpenAI-compatible model host.
//!
//! Runs three probes in order (model listing, plain chat, chat with tools) and prints a
//! human-readable report to stdout. Diagnostics go to stderr through `tracing`.

mod config;
mod credential;
mod probes;
mod report;

use clap::Parser;
use config::ProbeConfig;
use credential::{API_KEY_ENV, Credential, USAGE};
use gp_llm::LlmClient;
use probes::Validator;
use std::io::Write;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(
    name = "groq-probe",
    version,
    about = "Validate a Groq API key against the models and chat completion endpoints"
)]
struct Cli {
    /// API key, used only when GROQ_API_KEY is unset or empty.
    #[arg(value_name = "API_KEY")]
    args: Vec<String>,
}

/// Exit status when no API key can be resolved.
const MISSING_KEY_EXIT: i32 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_path = dotenvy::dotenv().ok();
    init_tracing()?;
    install_panic_hook();
    tracing::debug!(dotenv_path = ?dotenv_path, "environment loaded");

    let cli = Cli::parse();

    let env_key = std::env::var(API_KEY_ENV).ok();
    let credential =
        match credential_or_usage(env_key.as_deref(), &cli.args, &mut std::io::stdout()) {
            Ok(v) => v,
            Err(code) => std::process::exit(code),
        };

    let cfg = ProbeConfig::from_env()?;
    tracing::info!(
        base_url = %cfg.base_url,
        model = %cfg.model,
        timeout_secs = cfg.timeout_secs,
        credential = %credential,
        "starting validation"
    );

    let client = LlmClient::new(credential.expose(), &cfg.model)
        .with_base_url(&cfg.base_url)
        .with_timeout(cfg.timeout());
    let report = Validator::new(client).run().await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report::render(&report, &mut out)?;

    tracing::info!(
        passed = report.passed_count(),
        total = probes::ValidationReport::PROBE_COUNT,
        "validation complete"
    );
    Ok(())
}

/// Resolves the key, or writes the usage text and returns the exit status to use.
///
/// Runs before any client exists, so a missing key never reaches the network.
fn credential_or_usage(
    env_key: Option<&str>,
    args: &[String],
    out: &mut impl Write,
) -> Result<Credential, i32> {
    credential::resolve(env_key, args).map_err(|e| {
        tracing::debug!(%e, "credential resolution failed");
        let _ = writeln!(out, "{USAGE}");
        MISSING_KEY_EXIT
    })
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("warn"),
    };
    let log_format = std::env::var("GROQ_PROBE_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported GROQ_PROBE_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(
        log_format = %log_format,
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(
            panic_location = %location,
            panic_payload = panic_message(panic_info.payload()),
            active_probe = active_span_name(),
            "panic during validation"
        );
        default_hook(panic_info);
    }));
}

/// Name of the innermost entered span; probe methods each open one.
fn active_span_name() -> &'static str {
    tracing::Span::current()
        .metadata()
        .map_or("none", |meta| meta.name())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
