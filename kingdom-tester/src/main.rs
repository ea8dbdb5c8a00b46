mod backend;
mod logic;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use kingdom_game::GameConfig;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use backend::{BackendKind, BackendPlan};
use logic::{BatchPlan, RunRecord, RunSettings, Strategy, run_batch};
use util::parse_seeds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for humans
    Console,
    /// Machine-readable summary plus every run
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "kingdom-tester", version)]
#[command(about = "Headless playthroughs of Kingdom against a scripted or live content service")]
struct Args {
    /// Content source: scripted (fast, seeded) or remote (live endpoint)
    #[arg(long, value_enum, default_value_t = BackendKind::Scripted)]
    backend: BackendKind,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Playthroughs per seed
    #[arg(long, default_value_t = 3)]
    runs: u32,

    /// How the automated player picks options
    #[arg(long, value_enum, default_value_t = Strategy::Random)]
    strategy: Strategy,

    /// Stop a playthrough after this many rounds
    #[arg(long, default_value_t = 40)]
    max_rounds: u32,

    /// Retries for a failed start or next-turn fetch before the run fails
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Chance (0.0 to 1.0) that a scripted call answers 503
    #[arg(long, default_value_t = 0.0)]
    outage_rate: f64,

    /// Game configuration JSON (defaults apply to missing fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured content endpoint (remote backend)
    #[arg(long)]
    endpoint: Option<String>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let plan = build_plan(&args)?;
    if args.verbose {
        println!(
            "🎲 {} backend, {} strategy, {} seed(s) x {} run(s)",
            args.backend.label().yellow(),
            plan.settings.strategy.label().yellow(),
            plan.seeds.len(),
            plan.runs_per_seed
        );
    }

    let local = tokio::task::LocalSet::new();
    let records = local.run_until(run_batch(&plan)).await?;

    write_reports(&args, &records, start_time)?;

    if records.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "👑 Kingdom Automated Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn load_config(path: Option<&Path>, endpoint: Option<&str>) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            GameConfig::from_json(&json)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint.to_string();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_plan(args: &Args) -> Result<BatchPlan> {
    let seeds = parse_seeds(&args.seeds)?;
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    if !(0.0..=1.0).contains(&args.outage_rate) {
        bail!("--outage-rate must lie between 0.0 and 1.0");
    }
    let config = load_config(args.config.as_deref(), args.endpoint.as_deref())?;
    let backend = match args.backend {
        BackendKind::Scripted => BackendPlan::Scripted {
            outage_rate: args.outage_rate,
        },
        BackendKind::Remote => BackendPlan::Remote {
            endpoint: config.endpoint.clone(),
            timeout: config.poll_timeout() + Duration::from_secs(5),
        },
    };
    Ok(BatchPlan {
        seeds,
        runs_per_seed: args.runs,
        settings: RunSettings {
            strategy: args.strategy,
            max_rounds: args.max_rounds,
            max_retries: args.max_retries,
        },
        backend,
        config,
    })
}

fn write_reports(args: &Args, records: &[RunRecord], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => logic::reports::write_json_report(&mut output_target, records)?,
        ReportFormat::Console => {
            if records.is_empty() {
                writeln!(&mut output_target, "No playthroughs executed.")?;
            } else {
                logic::reports::write_console_report(
                    &mut output_target,
                    records,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            backend: BackendKind::Scripted,
            seeds: "1337".to_string(),
            runs: 1,
            strategy: Strategy::Random,
            max_rounds: 40,
            max_retries: 3,
            outage_rate: 0.0,
            config: None,
            endpoint: None,
            report: ReportFormat::Json,
            output: None,
            verbose: false,
        }
    }

    #[test]
    fn plan_follows_the_flags() {
        let mut args = base_args();
        args.seeds = "1, 2".to_string();
        args.runs = 4;
        args.strategy = Strategy::Cautious;
        let plan = build_plan(&args).unwrap();
        assert_eq!(plan.seeds, vec![1, 2]);
        assert_eq!(plan.runs_per_seed, 4);
        assert_eq!(plan.settings.strategy, Strategy::Cautious);
        assert!(matches!(plan.backend, BackendPlan::Scripted { .. }));
    }

    #[test]
    fn remote_plans_use_the_endpoint_override() {
        let mut args = base_args();
        args.backend = BackendKind::Remote;
        args.endpoint = Some("http://127.0.0.1:9/api/kingdom".to_string());
        let plan = build_plan(&args).unwrap();
        match plan.backend {
            BackendPlan::Remote { endpoint, timeout } => {
                assert_eq!(endpoint, "http://127.0.0.1:9/api/kingdom");
                assert!(timeout > plan.config.poll_timeout());
            }
            BackendPlan::Scripted { .. } => panic!("expected a remote plan"),
        }
    }

    #[test]
    fn bad_flags_are_rejected_before_playing() {
        let mut args = base_args();
        args.seeds = " , ".to_string();
        assert!(build_plan(&args).is_err());

        let mut args = base_args();
        args.outage_rate = 1.5;
        assert!(build_plan(&args).is_err());

        let mut args = base_args();
        args.endpoint = Some("   ".to_string());
        assert!(build_plan(&args).is_err());
    }

    #[test]
    fn config_files_are_read_and_validated() {
        let path =
            std::env::temp_dir().join(format!("kingdom-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "historyLimit": 8, "pollIntervalMs": 100 }"#).unwrap();
        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.history_limit, 8);
        assert_eq!(config.poll_interval_ms, 100);

        std::fs::write(&path, r#"{ "pollIntervalMs": 0 }"#).unwrap();
        assert!(load_config(Some(&path), None).is_err());
        let _ = std::fs::remove_file(&path);

        assert!(load_config(Some(Path::new("/nonexistent/kingdom.json")), None).is_err());
    }

    #[test]
    fn output_target_writes_files() {
        let path =
            std::env::temp_dir().join(format!("kingdom-output-{}.txt", std::process::id()));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush_inner().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let _ = std::fs::remove_file(&path);
    }
}
