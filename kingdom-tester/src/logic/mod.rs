pub mod policy;
pub mod reports;
mod session;

pub use policy::Strategy;
pub use session::RunSettings;

use session::{BusyCounter, RunProgress, play};

use anyhow::{Context, Result};
use kingdom_game::{GameConfig, Gateway, MemoryStorage, TurnMachine};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::rc::Rc;
use std::time::Instant;

use crate::backend::BackendPlan;

/// Outcome of one playthrough.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub seed: u64,
    pub run: u32,
    pub backend: &'static str,
    pub strategy: Strategy,
    pub passed: bool,
    #[serde(flatten)]
    pub progress: RunProgress,
    pub busy_raised: u32,
    pub content_calls: Option<u32>,
    pub injected_outages: Option<u32>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

pub struct BatchPlan {
    pub seeds: Vec<u64>,
    pub runs_per_seed: u32,
    pub settings: RunSettings,
    pub backend: BackendPlan,
    pub config: GameConfig,
}

/// Play every seed `runs_per_seed` times, one fresh session each.
///
/// Must run inside a `tokio::task::LocalSet`.
///
/// # Errors
///
/// Returns an error only when a backend cannot be built; gameplay problems
/// are recorded on the run instead.
pub async fn run_batch(plan: &BatchPlan) -> Result<Vec<RunRecord>> {
    let mut records = Vec::new();
    for &seed in &plan.seeds {
        for run in 0..plan.runs_per_seed {
            records.push(run_one(plan, seed, run).await?);
        }
    }
    Ok(records)
}

async fn run_one(plan: &BatchPlan, seed: u64, run: u32) -> Result<RunRecord> {
    let started = Instant::now();
    let backend = Rc::new(
        plan.backend
            .build(content_seed(seed, run))
            .context("failed to build the HTTP client")?,
    );
    let busy = Rc::new(BusyCounter::default());
    let gateway = Gateway::new(Rc::clone(&backend)).with_busy_indicator(busy.clone());
    let machine = TurnMachine::new(MemoryStorage::new(), gateway, plan.config.clone());

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(run));
    let sleeper = plan.backend.sleeper();

    let mut progress = RunProgress::default();
    let outcome = play(
        &machine,
        &plan.settings,
        &mut rng,
        sleeper.as_ref(),
        &mut progress,
    )
    .await;
    let error = outcome.err().map(|err| {
        log::error!("seed {seed} run {run}: {err}");
        err.to_string()
    });

    let counters = backend.counters();
    Ok(RunRecord {
        seed,
        run,
        backend: backend.label(),
        strategy: plan.settings.strategy,
        passed: error.is_none() && progress.failures.is_empty(),
        progress,
        busy_raised: busy.raised(),
        content_calls: counters.map(|(calls, _)| calls),
        injected_outages: counters.map(|(_, outages)| outages),
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        error,
    })
}

/// Content and player draw from unrelated streams of the same seed.
fn content_seed(seed: u64, run: u32) -> u64 {
    seed.rotate_left(17) ^ u64::from(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(outage_rate: f64, strategy: Strategy) -> BatchPlan {
        BatchPlan {
            seeds: vec![11, 12, 13],
            runs_per_seed: 2,
            settings: RunSettings {
                strategy,
                max_rounds: 40,
                max_retries: 20,
            },
            backend: BackendPlan::Scripted { outage_rate },
            config: GameConfig::default(),
        }
    }

    fn run_local(plan: &BatchPlan) -> Vec<RunRecord> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let local = tokio::task::LocalSet::new();
        local.block_on(&runtime, run_batch(plan)).unwrap()
    }

    #[test]
    fn scripted_batches_play_cleanly() {
        let records = run_local(&plan(0.0, Strategy::Random));
        assert_eq!(records.len(), 6);
        for record in &records {
            assert!(record.passed, "{record:?}");
            assert!(record.progress.rounds_played >= 1);
            assert!(record.progress.rounds_played <= 40);
            assert_eq!(record.progress.retries, 0);
            assert_eq!(record.injected_outages, Some(0));
            // Background and first event are the only foreground calls.
            assert_eq!(record.busy_raised, 2);
        }
    }

    #[test]
    fn reckless_play_reaches_an_ending() {
        let records = run_local(&plan(0.0, Strategy::Reckless));
        for record in &records {
            assert!(record.passed, "{record:?}");
            assert!(record.progress.ending.is_some(), "{record:?}");
            assert!(record.progress.ending_text.is_some());
        }
    }

    #[test]
    fn outages_are_retried_through() {
        let records = run_local(&plan(0.25, Strategy::Cautious));
        assert!(records.iter().all(|record| record.passed));
        let outages: u32 = records.iter().filter_map(|r| r.injected_outages).sum();
        let retries: u32 = records.iter().map(|r| r.progress.retries).sum();
        assert_eq!(outages, retries);
    }

    #[test]
    fn same_seed_replays_the_same_game() {
        let first = run_local(&plan(0.1, Strategy::Random));
        let second = run_local(&plan(0.1, Strategy::Random));
        let summary = |records: &[RunRecord]| -> Vec<(u32, Option<String>, u32)> {
            records
                .iter()
                .map(|r| {
                    let progress = &r.progress;
                    (progress.rounds_played, progress.ending.clone(), progress.retries)
                })
                .collect()
        };
        assert_eq!(summary(&first), summary(&second));
    }
}
