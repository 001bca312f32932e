//! Command-line interface for the regression benchmark

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::benchmark::{Benchmark, BenchmarkConfig, BenchmarkReport};
use crate::training::default_registry;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "regbench")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark a fixed set of regression models on one dataset")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train and score every candidate model on a CSV file
    Run {
        /// Input CSV file with a header row
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name (required unless set in --config)
        #[arg(short, long)]
        target: Option<String>,

        /// Comma-separated categorical columns to label-encode
        #[arg(long, value_delimiter = ',')]
        categorical: Vec<String>,

        /// Fraction of rows held out for testing
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Seed for the split and every stochastic model
        #[arg(long)]
        seed: Option<u64>,

        /// JSON benchmark configuration; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output path for the model results CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for the feature importance CSV
        #[arg(long)]
        importance_output: Option<PathBuf>,

        /// Evaluate models concurrently
        #[arg(long)]
        parallel: bool,

        /// Skip standard scaling of features
        #[arg(long)]
        no_scale: bool,
    },

    /// List the candidate models in evaluation order
    Models,
}

/// Options of the `run` command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub target: Option<String>,
    pub categorical: Vec<String>,
    pub test_fraction: Option<f64>,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub importance_output: Option<PathBuf>,
    pub parallel: bool,
    pub no_scale: bool,
}

impl RunArgs {
    /// Start from the config file (or defaults) and apply every flag given
    pub fn into_config(self) -> anyhow::Result<BenchmarkConfig> {
        let mut config = match &self.config {
            Some(path) => BenchmarkConfig::load(path)?,
            None => {
                let target = self
                    .target
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("--target is required when no --config is given"))?;
                BenchmarkConfig::new(target)
            }
        };

        if let Some(target) = self.target {
            config.target_column = target;
        }
        if !self.categorical.is_empty() {
            config.categorical_columns = self.categorical;
        }
        if let Some(fraction) = self.test_fraction {
            config.test_fraction = fraction;
        }
        if let Some(seed) = self.seed {
            config.random_state = seed;
        }
        if let Some(path) = self.output {
            config.results_path = path;
        }
        if let Some(path) = self.importance_output {
            config.importance_path = path;
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.no_scale {
            config.scale_features = false;
        }

        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(data_path: &Path, args: RunArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;

    section("Regression Benchmark");
    println!("  {}", kv("data  ", &data_path.display().to_string()));
    println!("  {}", kv("target", &config.target_column));
    println!("  {}", kv("seed  ", &config.random_state.to_string()));

    let benchmark = Benchmark::new(config);

    step_run("Training models");
    let start = Instant::now();
    let report = benchmark.run_csv(data_path)?;
    step_done(&format!(
        "{} train / {} test rows in {:.2?}",
        report.n_train,
        report.n_test,
        start.elapsed()
    ));

    print_results(&report);
    print_importances(&report);

    step_run("Writing outputs");
    benchmark.save_outputs(&report)?;
    let mut written = vec![benchmark.config().results_path.display().to_string()];
    if report.importances.is_some() {
        written.push(benchmark.config().importance_path.display().to_string());
    }
    step_done(&written.join(", "));
    println!();

    Ok(())
}

fn print_results(report: &BenchmarkReport) {
    section("Results");
    println!(
        "  {:<22} {:>10} {:>10} {:>10} {:>8} {:>10}",
        muted("Model"),
        muted("MAE"),
        muted("MSE"),
        muted("RMSE"),
        muted("R²"),
        muted("Fit"),
    );
    println!("  {}", dim(&"─".repeat(75)));

    for record in report.results.records() {
        let fit = report
            .timings
            .iter()
            .find(|t| t.model == record.model)
            .map(|t| format!("{:.3}s", t.fit_secs))
            .unwrap_or_default();
        println!(
            "  {:<22} {:>10.4} {:>10.4} {:>10.4} {:>8.4} {:>10}",
            record.model, record.mae, record.mse, record.rmse, record.r2, fit
        );
    }
    for failure in &report.failures {
        println!(
            "  {:<22} {}",
            failure.model,
            format!("{} failed: {}", failure.stage, failure.message).red()
        );
    }
    println!("  {}", dim(&"─".repeat(75)));

    if let Some(best) = report.results.best_by_r2() {
        println!("  {} {} {}", ok("★"), kv("best R²  ", &best.model), dim(&format!("{:.4}", best.r2)));
    }
    if let Some(best) = report.results.best_by_rmse() {
        println!("  {} {} {}", ok("★"), kv("best RMSE", &best.model), dim(&format!("{:.4}", best.rmse)));
    }
}

fn print_importances(report: &BenchmarkReport) {
    let Some(table) = &report.importances else {
        println!();
        println!("  {}", dim("feature importances unavailable"));
        return;
    };

    section(&format!("Feature Importance ({})", table.model()));
    for record in table.records() {
        let bar_len = (record.importance * 30.0).round().max(0.0) as usize;
        println!(
            "  {:<22} {:>8.4} {}",
            record.feature,
            record.importance,
            accent(&"█".repeat(bar_len))
        );
    }
}

pub fn cmd_models() -> anyhow::Result<()> {
    section("Candidate Models");
    for (i, spec) in default_registry(42).specs().iter().enumerate() {
        println!("  {} {:<22} {}", dim(&format!("{}.", i + 1)), spec.name, muted(&spec.kind().to_string()));
    }
    println!();
    Ok(())
}
