//! `klass run`: run the conformance suite and report.

use crate::config::{OutputFormat, RunConfig};
use crate::conformance::{self, CaseResult};
use crate::output::{self, StyledOutput};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
struct Summary {
    passed: usize,
    failed: usize,
    total: usize,
    duration_ms: f64,
}

/// Run every selected case. Returns `true` when all of them passed.
pub fn execute(config: &RunConfig) -> anyhow::Result<bool> {
    let mut out = StyledOutput::stdout(output::resolve_color_choice(config.color));

    let cases: Vec<_> = conformance::cases()
        .into_iter()
        .filter(|case| {
            config
                .filter
                .as_deref()
                .map_or(true, |pattern| case.name.contains(pattern))
        })
        .collect();

    if cases.is_empty() {
        anyhow::bail!(
            "no conformance cases match filter {:?}",
            config.filter.as_deref().unwrap_or_default()
        );
    }

    let overall_start = Instant::now();
    let mut results: Vec<CaseResult> = Vec::with_capacity(cases.len());

    for case in &cases {
        let result = conformance::run_case(case);
        match config.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&result)?),
            OutputFormat::Text => print_result(&mut out, &result),
        }

        let failed = !result.passed;
        results.push(result);
        if failed && config.fail_fast {
            break;
        }
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let summary = Summary {
        passed,
        failed: results.len() - passed,
        total: cases.len(),
        duration_ms: overall_start.elapsed().as_secs_f64() * 1000.0,
    };

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        OutputFormat::Text => print_summary(&mut out, &summary),
    }
    out.flush();

    Ok(summary.failed == 0 && results.len() == cases.len())
}

// ── Text Reporter ────────────────────────────────────────────────────────

fn print_result(out: &mut StyledOutput, result: &CaseResult) {
    out.status_badge(result.passed);
    out.plain(&format!("  {}", result.name));
    out.dim(&format!(" ({:.2}ms)", result.duration_ms));
    out.newline();

    if let Some(error) = &result.error {
        out.error("    ✗ ");
        out.error(error);
        out.newline();
    }
}

fn print_summary(out: &mut StyledOutput, summary: &Summary) {
    out.newline();
    out.plain("Cases: ");
    if summary.failed > 0 {
        out.error(&format!("{} failed", summary.failed));
        out.plain(", ");
    }
    out.success(&format!("{} passed", summary.passed));
    out.plain(&format!(", {} total", summary.total));
    out.dim(&format!(" ({:.2}ms)", summary.duration_ms));
    out.newline();
}
