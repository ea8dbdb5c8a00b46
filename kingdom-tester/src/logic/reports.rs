use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::RunRecord;

const CAPPED: &str = "round cap";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_runs: usize,
    pub passed: usize,
    pub failed: usize,
    pub average_rounds: f64,
    pub longest_reign: u32,
    pub total_retries: u32,
    pub endings: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn from_records(records: &[RunRecord]) -> Self {
        let total_runs = records.len();
        let passed = records.iter().filter(|r| r.passed).count();
        let total_rounds: u32 = records.iter().map(|r| r.progress.rounds_played).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_rounds = if total_runs == 0 {
            0.0
        } else {
            f64::from(total_rounds) / total_runs as f64
        };
        let mut endings = BTreeMap::new();
        for record in records.iter().filter(|r| r.error.is_none()) {
            let key = record
                .progress
                .ending
                .clone()
                .unwrap_or_else(|| CAPPED.to_string());
            *endings.entry(key).or_insert(0) += 1;
        }
        Self {
            total_runs,
            passed,
            failed: total_runs - passed,
            average_rounds,
            longest_reign: records
                .iter()
                .map(|r| r.progress.rounds_played)
                .max()
                .unwrap_or(0),
            total_retries: records.iter().map(|r| r.progress.retries).sum(),
            endings,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: BatchSummary,
    runs: &'a [RunRecord],
}

/// # Errors
///
/// Returns an error if the report cannot be written.
pub fn write_console_report<W: Write + ?Sized>(
    out: &mut W,
    records: &[RunRecord],
    total_duration: Duration,
) -> Result<()> {
    let summary = BatchSummary::from_records(records);

    writeln!(out)?;
    writeln!(out, "{}", "📊 Playthrough Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "======================".cyan())?;
    writeln!(out, "Total runs: {}", summary.total_runs)?;
    writeln!(out, "Passed: {}", summary.passed.to_string().green())?;
    writeln!(out, "Failed: {}", summary.failed.to_string().red())?;
    writeln!(out, "Average reign: {:.1} rounds", summary.average_rounds)?;
    writeln!(out, "Longest reign: {} rounds", summary.longest_reign)?;
    writeln!(out, "Retries: {}", summary.total_retries)?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for record in records {
        let status = if record.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        let ending = record.progress.ending.as_deref().unwrap_or(CAPPED);
        writeln!(
            out,
            "{} {} seed {} run {}",
            status,
            record.strategy.label().bold(),
            record.seed,
            record.run
        )?;
        writeln!(
            out,
            "   Rounds: {} ({ending}), retries: {}, {} ms",
            record.progress.rounds_played, record.progress.retries, record.duration_ms
        )?;
        if let Some(error) = &record.error {
            writeln!(out, "   Error: {}", error.red())?;
        }
        for failure in &record.progress.failures {
            writeln!(out, "     • {}", failure.red())?;
        }
    }

    if !summary.endings.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "👑 Endings".bright_yellow().bold())?;
        writeln!(out, "{}", "==========".yellow())?;
        for (ending, count) in &summary.endings {
            writeln!(out, "{ending:12} {count}")?;
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json_report<W: Write + ?Sized>(out: &mut W, records: &[RunRecord]) -> Result<()> {
    let report = JsonReport {
        summary: BatchSummary::from_records(records),
        runs: records,
    };
    let json_output = serde_json::to_string_pretty(&report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}
