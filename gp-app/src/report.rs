//! Console rendering of a `ValidationReport`.

use crate::probes::{ProbeOutcome, ValidationReport};
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;

fn heavy_rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

fn light_rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))
}

pub fn render(report: &ValidationReport, out: &mut impl Write) -> io::Result<()> {
    heavy_rule(out)?;
    writeln!(out, "GROQ API KEY VALIDATION TEST")?;
    heavy_rule(out)?;
    writeln!(out)?;

    writeln!(out, "Test 1: Listing available models...")?;
    light_rule(out)?;
    section(
        out,
        &report.models,
        "API key is VALID",
        "API key test FAILED",
        |out, models| {
            writeln!(out, "\nAvailable models:")?;
            for model in models {
                writeln!(out, "  - {}", model.id)?;
            }
            Ok(())
        },
    )?;
    writeln!(out)?;
    heavy_rule(out)?;

    writeln!(
        out,
        "Test 2: Testing chat completion with {}...",
        report.model
    )?;
    light_rule(out)?;
    section(
        out,
        &report.chat,
        "Chat completion SUCCESSFUL",
        "Chat completion FAILED",
        |out, completion| {
            writeln!(out, "\nResponse: {}", completion.content)?;
            writeln!(
                out,
                "Finish reason: {} (prompt_tokens={} completion_tokens={})",
                completion.finish_reason,
                completion.usage.prompt_tokens,
                completion.usage.completion_tokens
            )
        },
    )?;
    writeln!(out)?;
    heavy_rule(out)?;

    writeln!(out, "Test 3: Testing chat completion with tools...")?;
    light_rule(out)?;
    section(
        out,
        &report.tool_chat,
        "Chat completion with tools SUCCESSFUL",
        "Chat completion with tools FAILED",
        |out, body| {
            let pretty = serde_json::to_string_pretty(body).map_err(io::Error::other)?;
            writeln!(out, "\nResponse: {pretty}")
        },
    )?;
    writeln!(out)?;

    heavy_rule(out)?;
    writeln!(out, "TEST COMPLETE")?;
    writeln!(
        out,
        "Summary: {}/{} probes passed",
        report.passed_count(),
        ValidationReport::PROBE_COUNT
    )?;
    heavy_rule(out)
}

fn section<T, W: Write>(
    out: &mut W,
    outcome: &ProbeOutcome<T>,
    passed: &str,
    failed: &str,
    on_success: impl FnOnce(&mut W, &T) -> io::Result<()>,
) -> io::Result<()> {
    match outcome {
        ProbeOutcome::Passed(value) => {
            writeln!(out, "Status Code: 200")?;
            writeln!(out, "✅ {passed}")?;
            on_success(out, value)
        }
        ProbeOutcome::EndpointError { status, body } => {
            writeln!(out, "Status Code: {status}")?;
            writeln!(out, "❌ {failed}")?;
            writeln!(out, "Error: {body}")
        }
        ProbeOutcome::TransportFault { status, cause } => {
            match status {
                Some(status) => writeln!(out, "Status Code: {status}")?,
                None => writeln!(out, "Status Code: n/a")?,
            }
            writeln!(out, "❌ {failed}")?;
            writeln!(out, "Error: {cause}")
        }
    }
}
