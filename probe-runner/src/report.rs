//! End-of-run report
//!
//! Renders a [`RunSummary`] as a plain-text table for the terminal and
//! writes it as JSON when a summary path is configured.

use anyhow::{Context, Result};
use probe_core::domain::report::{LatencyStats, RunSummary};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Renders the summary as text
pub fn render(summary: &RunSummary) -> String {
    let mut out = String::new();
    let duration = summary.finished_at - summary.started_at;
    let overall = summary.overall_checks();

    let _ = writeln!(out);
    let _ = writeln!(out, "  scenario ........: {}", summary.scenario);
    let _ = writeln!(
        out,
        "  duration ........: {:.1}s",
        duration.num_milliseconds() as f64 / 1000.0
    );
    let _ = writeln!(out, "  iterations ......: {}", summary.iterations);
    let _ = writeln!(out, "  vus_max .........: {}", summary.vus_max);
    let _ = writeln!(out, "  failed requests .: {}", summary.failed_requests);

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  checks ({:.2}% of {} passed)",
        overall.pass_rate() * 100.0,
        overall.total()
    );
    for (name, tally) in &summary.checks {
        let mark = if tally.fails == 0 { '✓' } else { '✗' };
        let _ = writeln!(
            out,
            "    {} {:<40} {:>6.2}%  ✓ {} ✗ {}",
            mark,
            name,
            tally.pass_rate() * 100.0,
            tally.passes,
            tally.fails
        );
    }

    if !summary.requests.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  request durations");
        for (name, stats) in &summary.requests {
            let _ = writeln!(out, "    {:<12} {}", name, format_stats(stats));
        }
    }

    if !summary.request_errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  requests without response");
        for (name, count) in &summary.request_errors {
            let _ = writeln!(out, "    {:<12} {}", name, count);
        }
    }

    if !summary.poll_outcomes.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  banner polls");
        for (label, count) in &summary.poll_outcomes {
            let _ = writeln!(out, "    {:<12} {}", label, count);
        }
        if let Some(stats) = &summary.poll_elapsed {
            let _ = writeln!(out, "    {:<12} {}", "elapsed", format_stats(stats));
        }
    }

    out
}

fn format_stats(stats: &LatencyStats) -> String {
    format!(
        "count={} min={:.1}ms avg={:.1}ms p90={:.1}ms p95={:.1}ms max={:.1}ms",
        stats.count, stats.min_ms, stats.mean_ms, stats.p90_ms, stats.p95_ms, stats.max_ms
    )
}

/// Writes the summary as pretty JSON
pub fn write_json(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).context("Failed to write summary JSON")?;
    writer.flush().context("Failed to write summary JSON")?;

    Ok(())
}
