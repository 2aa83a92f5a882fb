//! Swim Podium CLI - train, inspect and query the winner model

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use swim_podium::config::DEFAULT_MODEL_PATH;
use swim_podium::data::PrepareOptions;
use swim_podium::features::record::{DISTANCE_FIELD, YEAR_FIELD};
use swim_podium::features::CategoricalGroup;
use swim_podium::metrics::EvaluationReport;
use swim_podium::{train_from_csv, ModelBundle, PredictionService, RawRecord, TrainingConfig};

const DEFAULT_DATA_PATH: &str = "data/Olympic_Swimming_Results_1912to2020.csv";

#[derive(Parser)]
#[command(name = "swim-podium")]
#[command(author, version, about = "Olympic swimming winner prediction CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model bundle from the results dataset
    Train {
        /// Path to the results CSV
        #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Where to write the model bundle
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        output: PathBuf,

        /// Share of each team's rows held out for evaluation
        #[arg(long, default_value = "0.3")]
        test_size: f64,

        /// Number of most frequent medal-winning teams to keep
        #[arg(long, default_value = "10")]
        top_teams: usize,

        /// Maximum tree depth (unbounded if not set)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Print the frozen feature schema of a bundle
    Schema {
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },

    /// Show what a bundle was trained on and how well it scored
    Inspect {
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },

    /// Predict the winning team for one event
    Predict {
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Games year
        #[arg(long)]
        year: Option<i32>,

        /// Distance descriptor, e.g. "100m" or "4x200m"
        #[arg(long)]
        distance: Option<String>,

        #[arg(long)]
        stroke: Option<String>,

        #[arg(long)]
        gender: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    println!("{}", format!("Swim Podium CLI v{}", env!("CARGO_PKG_VERSION")).cyan().bold());
    println!();

    match cli.command {
        Commands::Train {
            data,
            output,
            test_size,
            top_teams,
            max_depth,
        } => run_train(&data, &output, test_size, top_teams, max_depth),
        Commands::Schema { model } => show_schema(&model),
        Commands::Inspect { model } => inspect_bundle(&model),
        Commands::Predict {
            model,
            year,
            distance,
            stroke,
            gender,
        } => run_predict(&model, year, distance, stroke, gender),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb
}

fn run_train(
    data: &Path,
    output: &Path,
    test_size: f64,
    top_teams: usize,
    max_depth: Option<usize>,
) -> Result<()> {
    if top_teams == 0 {
        bail!("--top-teams must be at least 1");
    }

    println!("{} {:?}", "Training from".green(), data);
    println!("Test size: {:.0}%", test_size * 100.0);
    println!("Top teams: {}", top_teams);
    match max_depth {
        Some(depth) => println!("Max depth: {}", depth),
        None => println!("Max depth: unbounded"),
    }
    println!();

    let defaults = TrainingConfig::default();
    let config = TrainingConfig {
        prepare: PrepareOptions {
            top_teams,
            ..defaults.prepare
        },
        test_fraction: test_size,
        tree: defaults.tree.with_max_depth(max_depth),
    };

    let pb = spinner("Loading results and fitting decision tree...");
    let outcome = train_from_csv(data, &config)
        .with_context(|| format!("Training failed for {:?}", data))?;
    pb.finish_and_clear();

    let dataset = &outcome.dataset;
    println!("{}", "Dataset:".yellow().bold());
    println!("  Examples:            {}", dataset.examples.len());
    println!("  Train / test:        {} / {}", outcome.train_size, outcome.test_size);
    println!("  Dropped (distance):  {}", dataset.dropped.unparsable_distance);
    println!("  Dropped (missing):   {}", dataset.dropped.missing_fields);
    println!("  Dropped (rank):      {}", dataset.dropped.not_medalist);
    println!("  Dropped (team):      {}", dataset.dropped.outside_top_teams);
    println!();

    println!("{}", "Top Teams:".yellow().bold());
    println!("{:<8} {:>8}", "Team", "Medals");
    println!("{}", "-".repeat(17));
    for (team, count) in &dataset.team_counts {
        println!("{:<8} {:>8}", team, count);
    }
    println!();

    print_columns(&outcome.bundle);

    let model = &outcome.bundle.model;
    println!(
        "{} {} nodes, {} leaves, depth {}",
        "Tree:".yellow().bold(),
        model.node_count(),
        model.leaf_count(),
        model.depth()
    );
    println!();

    match &outcome.bundle.evaluation {
        Some(report) => print_report(report),
        None => println!("{}", "No rows held out; evaluation skipped.".dimmed()),
    }

    outcome
        .bundle
        .save(output)
        .with_context(|| format!("Failed to save bundle to {:?}", output))?;
    println!("{}: {:?}", "Saved".green(), output);

    Ok(())
}

fn print_columns(bundle: &ModelBundle) {
    println!(
        "{} (version {})",
        "Feature Columns:".yellow().bold(),
        bundle.schema.version()
    );
    for (i, name) in bundle.schema.column_names().iter().enumerate() {
        println!("{:>4}  {}", i, name);
    }
    println!();
}

fn print_report(report: &EvaluationReport) {
    println!("{}", "Evaluation:".yellow().bold());
    println!("  Accuracy: {}", format!("{:.3}", report.accuracy).green());
    println!();
    println!(
        "{:<8} {:>10} {:>10} {:>10} {:>8}",
        "Team", "Precision", "Recall", "F1", "Support"
    );
    println!("{}", "-".repeat(50));
    for class in &report.per_class {
        println!(
            "{:<8} {:>10.2} {:>10.2} {:>10.2} {:>8}",
            class.label, class.precision, class.recall, class.f1, class.support
        );
    }
    println!("{}", "-".repeat(50));
    println!("{:<8} {:>32.2} {:>8}", "macro", report.macro_f1, report.test_size);
    println!("{:<8} {:>32.2} {:>8}", "weighted", report.weighted_f1, report.test_size);
    println!();
}

fn load_bundle(model: &Path) -> Result<ModelBundle> {
    ModelBundle::load(model).with_context(|| format!("Failed to load model bundle from {:?}", model))
}

fn show_schema(model: &Path) -> Result<()> {
    let bundle = load_bundle(model)?;
    println!(
        "Trained at {}",
        bundle.trained_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
    print_columns(&bundle);
    Ok(())
}

fn inspect_bundle(model: &Path) -> Result<()> {
    let bundle = load_bundle(model)?;
    let summary = bundle.summary();

    println!("{}", "Bundle:".yellow().bold());
    println!("  Format version: {}", summary.format_version);
    println!(
        "  Trained at:     {}",
        summary.trained_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Features:       {}", summary.feature_count);
    println!();

    println!("{}", "Vocabulary:".yellow().bold());
    for (group, values) in &summary.vocabulary {
        println!("  {:<8} {}", group.name(), values.join(", "));
    }
    println!();

    println!("{} {}", "Teams:".yellow().bold(), summary.labels.join(", "));
    println!(
        "{} {} nodes, {} leaves, depth {}",
        "Tree:".yellow().bold(),
        summary.node_count,
        summary.leaf_count,
        summary.depth
    );
    println!();

    match &bundle.evaluation {
        Some(report) => print_report(report),
        None => println!("{}", "No evaluation stored in this bundle.".dimmed()),
    }
    Ok(())
}

fn run_predict(
    model: &Path,
    year: Option<i32>,
    distance: Option<String>,
    stroke: Option<String>,
    gender: Option<String>,
) -> Result<()> {
    let service = PredictionService::from_bundle(load_bundle(model)?);

    let mut record = RawRecord::new();
    if let Some(year) = year {
        record.insert(YEAR_FIELD, year);
    }
    if let Some(distance) = distance {
        record.insert(DISTANCE_FIELD, distance);
    }
    if let Some(stroke) = stroke {
        record.insert(CategoricalGroup::Stroke.field(), stroke);
    }
    if let Some(gender) = gender {
        record.insert(CategoricalGroup::Gender.field(), gender);
    }

    let (encoded, team) = service.predict_encoded(&record)?;

    println!("{}", "Encoded Row:".yellow().bold());
    if let Some(schema) = service.schema() {
        for (name, value) in schema.column_names().iter().zip(encoded.as_slice()) {
            println!("  {:<20} {}", name, value);
        }
    }
    for oov in &encoded.out_of_vocabulary {
        println!(
            "  {} {} '{}' was not seen in training",
            "!".yellow(),
            oov.group,
            oov.value
        );
    }
    if encoded.distance_fallback {
        println!("  {} distance could not be parsed; used 100m", "!".yellow());
    }
    println!();

    println!("{} {}", "Predicted winner:".green().bold(), team.bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["swim-podium", "inspect", "--model", "bundle.json"]).unwrap();
        match cli.command {
            Commands::Inspect { model } => assert_eq!(model, PathBuf::from("bundle.json")),
            _ => panic!("expected inspect"),
        }
    }

    #[test]
    fn test_parse_train_defaults() {
        let cli = Cli::try_parse_from(["swim-podium", "train"]).unwrap();
        match cli.command {
            Commands::Train {
                test_size,
                top_teams,
                max_depth,
                output,
                ..
            } => {
                assert_eq!(test_size, 0.3);
                assert_eq!(top_teams, 10);
                assert_eq!(max_depth, None);
                assert_eq!(output, PathBuf::from(DEFAULT_MODEL_PATH));
            }
            _ => panic!("expected train"),
        }
    }
}
