//! Command-line interface for the sales pipeline

use clap::{Parser, Subcommand};
use colored::*;
use ndarray::Array1;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{load_csv, save_csv, to_feature_matrix};
use crate::model::{
    compare_models, default_models, GradientBoostingRegressor, Model, RandomizedSearch,
    RegressionMetrics, SearchSpace,
};
use crate::pipeline::columns::{ITEM_ID, OUTLET_ID, TARGET};
use crate::pipeline::{PipelineConfig, SalesPipeline};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

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

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "martcast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Retail sales preprocessing and prediction pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train on a labeled table, compare models, and score a test table
    Run {
        /// Labeled training CSV (must carry the sales target)
        #[arg(short, long)]
        train: PathBuf,

        /// Unlabeled test CSV to score with the best model
        #[arg(long)]
        test: Option<PathBuf>,

        /// Directory for output artifacts
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Tune gradient boosting with randomized search before scoring
        #[arg(long)]
        tune: bool,

        /// Randomized search iterations
        #[arg(long, default_value = "10")]
        search_iterations: usize,

        /// Cross-validation folds for the search
        #[arg(long, default_value = "5")]
        cv_folds: usize,

        /// Year outlet age is measured against
        #[arg(long, default_value = "2025")]
        reference_year: i32,

        /// Random seed for splits, ensembles, and the search
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Clean, engineer, and encode a labeled table to CSV
    Preprocess {
        /// Labeled input CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV for the encoded feature table
        #[arg(short, long)]
        output: PathBuf,

        /// Year outlet age is measured against
        #[arg(long, default_value = "2025")]
        reference_year: i32,
    },

    /// Show a summary of a CSV table
    Info {
        /// Input CSV
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(
    train_path: &Path,
    test_path: Option<&Path>,
    output_dir: &Path,
    tune: bool,
    search_iterations: usize,
    cv_folds: usize,
    reference_year: i32,
    seed: u64,
) -> anyhow::Result<()> {
    section("Run");
    std::fs::create_dir_all(output_dir)?;

    step_run("Loading training data");
    let start = Instant::now();
    let train = load_csv(train_path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        train.height(),
        train.width(),
        start.elapsed()
    ));

    let config = PipelineConfig::new()
        .with_reference_year(reference_year)
        .with_random_state(seed);
    let mut pipeline = SalesPipeline::new(config.clone());

    step_run("Fitting pipeline");
    let start = Instant::now();
    let (features, target) = pipeline.fit_transform(&train)?;
    step_done(&format!(
        "{} feature columns in {:?}",
        features.width(),
        start.elapsed()
    ));

    let mut encoded_out = features.clone();
    encoded_out.with_column(target.clone())?;
    save_csv(&mut encoded_out, &output_dir.join("encoded_train.csv"))?;
    pipeline.save(&output_dir.join("pipeline.json"))?;

    let x = to_feature_matrix(&features)?;
    let y = series_to_array(&target)?;

    step_run("Comparing models");
    let start = Instant::now();
    let (x_train, x_val, y_train, y_val) =
        crate::model::train_test_split(&x, &y, config.validation_fraction, seed)?;
    save_split(&features, &x_train, &y_train, output_dir, "train")?;
    save_split(&features, &x_val, &y_val, output_dir, "val")?;
    let mut models = default_models(seed);
    let reports = compare_models(&mut models, &x_train, &y_train, &x_val, &y_val)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    for report in &reports {
        println!(
            "  {:<20} {}",
            muted(&report.name),
            format!(
                "RMSE {:>10.2}   R² {:>7.4}",
                report.metrics.rmse, report.metrics.r2
            )
            .white()
        );
    }

    save_comparison(&reports, &output_dir.join("model_comparison.csv"))?;

    let final_name: String;
    let final_metrics: RegressionMetrics;
    let best: Box<dyn Model> = if tune {
        step_run("Tuning gradient boosting");
        let start = Instant::now();
        let outcome = RandomizedSearch::new(SearchSpace::default())
            .with_n_iter(search_iterations)
            .with_n_folds(cv_folds)
            .with_seed(seed)
            .run(&x_train, &y_train)?;
        step_done(&format!(
            "best CV RMSE {:.2} in {:?}",
            outcome.best_rmse,
            start.elapsed()
        ));

        let holdout_check = {
            let mut model = GradientBoostingRegressor::new(outcome.best_config.clone());
            model.fit(&x_train, &y_train)?;
            let predictions = model.predict(&x_val)?;
            RegressionMetrics::compute(&y_val, &predictions)?
        };
        println!(
            "  {:<20} {}",
            muted("tuned boosting"),
            format!(
                "RMSE {:>10.2}   R² {:>7.4}",
                holdout_check.rmse, holdout_check.r2
            )
            .white()
        );

        let trials_json = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(output_dir.join("search_trials.json"), trials_json)?;
        final_name = "gradient_boosting_tuned".to_string();
        final_metrics = holdout_check;
        Box::new(GradientBoostingRegressor::new(outcome.best_config))
    } else {
        let winner = reports[0].name.clone();
        final_name = winner.clone();
        final_metrics = reports[0].metrics;
        default_models(seed)
            .into_iter()
            .find(|m| m.name() == winner.as_str())
            .ok_or_else(|| anyhow::anyhow!("unknown model '{winner}'"))?
    };

    let mut metrics_df = df!(
        "model" => &[final_name.as_str()],
        "mae" => &[final_metrics.mae],
        "mse" => &[final_metrics.mse],
        "rmse" => &[final_metrics.rmse],
        "r2" => &[final_metrics.r2],
    )?;
    save_csv(&mut metrics_df, &output_dir.join("metrics.csv"))?;

    step_run(&format!("Refitting {} on the full table", best.name().cyan()));
    let start = Instant::now();
    let mut best = best;
    best.fit(&x, &y)?;
    step_done(&format!("{:?}", start.elapsed()));

    if let Some(test_path) = test_path {
        step_run("Scoring test data");
        let start = Instant::now();
        let test = load_csv(test_path)?;
        let test_features = pipeline.transform(&test)?;
        let x_test = to_feature_matrix(&test_features)?;
        let predictions = best.predict(&x_test)?;
        step_done(&format!("{} rows in {:?}", test.height(), start.elapsed()));

        let mut out = test.select([ITEM_ID, OUTLET_ID])?;
        out.with_column(Series::new(TARGET.into(), predictions.to_vec()))?;
        save_csv(&mut out, &output_dir.join("predictions.csv"))?;
    }

    println!();
    println!(
        "  {} artifacts written to {}",
        ok("✓"),
        output_dir.display().to_string().white()
    );
    println!();
    Ok(())
}

pub fn cmd_preprocess(
    data_path: &Path,
    output_path: &Path,
    reference_year: i32,
) -> anyhow::Result<()> {
    section("Preprocess");

    step_run("Loading data");
    let df = load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let config = PipelineConfig::new().with_reference_year(reference_year);
    let mut pipeline = SalesPipeline::new(config);

    step_run("Processing");
    let start = Instant::now();
    let (features, target) = pipeline.fit_transform(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output_path.display()));
    let mut out = features;
    out.with_column(target)?;
    save_csv(&mut out, output_path)?;
    step_done(&format!("{} rows × {} cols", out.height(), out.width()));

    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Info");

    let df = load_csv(data_path)?;
    println!("  {:<24} {}", muted("Rows"), df.height().to_string().white());
    println!("  {:<24} {}", muted("Columns"), df.width().to_string().white());
    println!();

    for col in df.get_columns() {
        let nulls = col.null_count();
        let null_note = if nulls > 0 {
            format!("{nulls} missing").yellow().to_string()
        } else {
            dim("complete").to_string()
        };
        println!(
            "  {:<28} {:<10} {}",
            col.name().to_string().white(),
            dim(&col.dtype().to_string()),
            null_note
        );
    }
    println!();
    Ok(())
}

// ─── Helpers ───────────────────────────────────────────────────────────────────

fn series_to_array(series: &Series) -> anyhow::Result<Array1<f64>> {
    let values: Vec<f64> = series
        .f64()?
        .into_iter()
        .map(|v| v.ok_or_else(|| anyhow::anyhow!("null value in target column")))
        .collect::<anyhow::Result<Vec<f64>>>()?;
    Ok(Array1::from_vec(values))
}

/// Write one side of the train/validation split as `x_{tag}.csv` and
/// `y_{tag}.csv`, reusing the feature table's column names
fn save_split(
    features: &DataFrame,
    x: &ndarray::Array2<f64>,
    y: &Array1<f64>,
    output_dir: &Path,
    tag: &str,
) -> anyhow::Result<()> {
    let columns: Vec<Column> = features
        .get_column_names()
        .into_iter()
        .enumerate()
        .map(|(j, name)| Column::new(name.clone(), x.column(j).to_vec()))
        .collect();
    let mut x_df = DataFrame::new(columns)?;
    save_csv(&mut x_df, &output_dir.join(format!("x_{tag}.csv")))?;

    let mut y_df = df!(TARGET => y.to_vec())?;
    save_csv(&mut y_df, &output_dir.join(format!("y_{tag}.csv")))?;
    Ok(())
}

fn save_comparison(reports: &[crate::model::ModelReport], path: &Path) -> anyhow::Result<()> {
    let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
    let mae: Vec<f64> = reports.iter().map(|r| r.metrics.mae).collect();
    let mse: Vec<f64> = reports.iter().map(|r| r.metrics.mse).collect();
    let rmse: Vec<f64> = reports.iter().map(|r| r.metrics.rmse).collect();
    let r2: Vec<f64> = reports.iter().map(|r| r.metrics.r2).collect();

    let mut df = df!(
        "model" => names,
        "mae" => mae,
        "mse" => mse,
        "rmse" => rmse,
        "r2" => r2,
    )?;
    save_csv(&mut df, path)?;
    Ok(())
}
