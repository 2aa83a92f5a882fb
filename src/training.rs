//! Offline training pipeline
//!
//! prepare rows -> build schema -> encode matrix -> stratified split -> fit ->
//! evaluate -> bundle. The schema is derived here and only here.

use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::artifact::{ArtifactError, ModelBundle};
use crate::classifier::{Classifier, ClassifierError, DecisionTreeConfig, Trainer};
use crate::data::{load_results, prepare_training_set, DataError, PrepareOptions, PreparedDataset, TrainingExample};
use crate::features::{build_schema, encode_values, CategoricalGroup, FeatureSchema};
use crate::metrics::{evaluate, EvaluationReport};

/// Training errors
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Training failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Test fraction must be in [0, 1), got {0}")]
    InvalidTestFraction(f64),
}

/// Pipeline settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub prepare: PrepareOptions,
    /// Share of each team's examples held out for evaluation
    pub test_fraction: f64,
    pub tree: DecisionTreeConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            prepare: PrepareOptions::default(),
            test_fraction: 0.3,
            tree: DecisionTreeConfig::default(),
        }
    }
}

/// Everything the training run produced
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub bundle: ModelBundle,
    pub dataset: PreparedDataset,
    pub train_size: usize,
    pub test_size: usize,
}

/// Encode examples into rows matching `schema`
pub fn encode_examples(examples: &[TrainingExample], schema: &FeatureSchema) -> Vec<Vec<f64>> {
    examples
        .iter()
        .map(|e| encode_values(&e.feature_values(), schema).values)
        .collect()
}

/// Deterministic stratified split, returning (train, test) indices
///
/// Within each label, examples are taken in order and every position where the
/// running share crosses the next multiple of `test_fraction` goes to test.
/// Labels with a single example always stay in train.
pub fn stratified_split(labels: &[String], test_fraction: f64) -> (Vec<usize>, Vec<usize>) {
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        match groups.iter_mut().find(|(l, _)| *l == label.as_str()) {
            Some((_, members)) => members.push(i),
            None => groups.push((label.as_str(), vec![i])),
        }
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_, members) in &groups {
        if members.len() < 2 {
            train.extend(members);
            continue;
        }
        for (pos, &idx) in members.iter().enumerate() {
            let before = (pos as f64 * test_fraction).floor();
            let after = ((pos + 1) as f64 * test_fraction).floor();
            if after > before {
                test.push(idx);
            } else {
                train.push(idx);
            }
        }
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

/// Train a bundle from a prepared dataset
pub fn train(dataset: PreparedDataset, config: &TrainingConfig) -> Result<TrainingOutcome, TrainingError> {
    if !(0.0..1.0).contains(&config.test_fraction) {
        return Err(TrainingError::InvalidTestFraction(config.test_fraction));
    }

    let schema = build_schema(&dataset.examples, &CategoricalGroup::ALL);
    info!("Feature schema: {:?}", schema.column_names());

    let rows = encode_examples(&dataset.examples, &schema);
    let labels: Vec<String> = dataset.examples.iter().map(|e| e.team.clone()).collect();

    let (train_idx, test_idx) = stratified_split(&labels, config.test_fraction);
    let train_rows = select(&rows, &train_idx);
    let train_labels = select(&labels, &train_idx);

    info!(
        "Fitting decision tree on {} rows ({} held out)",
        train_idx.len(),
        test_idx.len()
    );
    let model = config.tree.fit(&train_rows, &train_labels)?;

    let evaluation: Option<EvaluationReport> = if test_idx.is_empty() {
        None
    } else {
        let predicted = model.predict(&select(&rows, &test_idx))?;
        let report = evaluate(&select(&labels, &test_idx), &predicted, train_idx.len());
        info!("Test accuracy: {:.3}", report.accuracy);
        Some(report)
    };

    let bundle = ModelBundle::new(schema, model, evaluation)?;

    Ok(TrainingOutcome {
        bundle,
        dataset,
        train_size: train_idx.len(),
        test_size: test_idx.len(),
    })
}

/// Load a results CSV and train on it
pub fn train_from_csv<P: AsRef<Path>>(
    csv_path: P,
    config: &TrainingConfig,
) -> Result<TrainingOutcome, TrainingError> {
    let rows = load_results(csv_path)?;
    let dataset = prepare_training_set(&rows, &config.prepare)?;
    train(dataset, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ResultRow;
    use crate::features::RawRecord;
    use crate::predictor::PredictionService;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn result(year: f64, distance: &str, stroke: &str, gender: &str, team: &str, rank: f64) -> ResultRow {
        ResultRow {
            year: Some(year),
            distance: Some(distance.to_string()),
            relay: None,
            stroke: Some(stroke.to_string()),
            gender: Some(gender.to_string()),
            team: Some(team.to_string()),
            rank: Some(rank),
            athlete: Some("Athlete".to_string()),
            results: Some("1:00.00".to_string()),
        }
    }

    fn dataset() -> PreparedDataset {
        let mut rows = Vec::new();
        for year in [2004.0, 2008.0, 2012.0, 2016.0, 2020.0] {
            rows.push(result(year, "4x100m", "Medley", "Women", "AUS", 1.0));
            rows.push(result(year, "200m", "Individual medley", "Women", "AUS", 2.0));
            rows.push(result(year, "100m", "Freestyle", "Men", "USA", 1.0));
            rows.push(result(year, "200m", "Backstroke", "Men", "USA", 1.0));
            rows.push(result(year, "100m", "Freestyle", "Men", "GBR", 9.0));
        }
        prepare_training_set(&rows, &PrepareOptions::default()).unwrap()
    }

    #[test]
    fn test_stratified_split_proportions() {
        let y: Vec<String> = (0..20).map(|i| if i < 10 { "A" } else { "B" }.to_string()).collect();
        let (train, test) = stratified_split(&y, 0.3);

        assert_eq!(test.len(), 6);
        assert_eq!(train.len(), 14);
        assert_eq!(test.iter().filter(|&&i| i < 10).count(), 3);
    }

    #[test]
    fn test_stratified_split_keeps_singletons_in_train() {
        let (train, test) = stratified_split(&labels(&["A", "B", "B", "B", "B"]), 0.5);
        assert!(train.contains(&0));
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn test_stratified_split_zero_fraction() {
        let (train, test) = stratified_split(&labels(&["A", "A", "B"]), 0.0);
        assert_eq!(train, vec![0, 1, 2]);
        assert!(test.is_empty());
    }

    #[test]
    fn test_train_rejects_bad_fraction() {
        let config = TrainingConfig {
            test_fraction: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            train(dataset(), &config),
            Err(TrainingError::InvalidTestFraction(_))
        ));
    }

    #[test]
    fn test_train_builds_consistent_bundle() {
        let outcome = train(dataset(), &TrainingConfig::default()).unwrap();
        let schema = &outcome.bundle.schema;

        assert_eq!(
            schema.column_names(),
            vec![
                "Year",
                "Distance_m",
                "Relay?",
                "Stroke_Medley",
                "Stroke_Freestyle",
                "Stroke_Backstroke",
                "Gender_Women",
                "Gender_Men",
            ]
        );
        assert_eq!(outcome.bundle.model.n_features(), schema.len());
        assert_eq!(outcome.train_size + outcome.test_size, 20);
        assert!(outcome.bundle.evaluation.is_some());
        assert_eq!(outcome.dataset.dropped.not_medalist, 5);
    }

    #[test]
    fn test_trained_bundle_serves_predictions() {
        let outcome = train(dataset(), &TrainingConfig::default()).unwrap();
        let service = PredictionService::from_bundle(outcome.bundle);

        let women = RawRecord::new()
            .with("Year", 2024)
            .with("Distance (in meters)", "4x100m")
            .with("Stroke", "Medley")
            .with("Gender", "Women");
        assert_eq!(service.predict(&women).unwrap(), "AUS");

        let men = RawRecord::new().with("Gender", "Men").with("Stroke", "Backstroke");
        assert_eq!(service.predict(&men).unwrap(), "USA");
    }

    #[test]
    fn test_encode_examples_width() {
        let data = dataset();
        let schema = build_schema(&data.examples, &CategoricalGroup::ALL);
        let rows = encode_examples(&data.examples, &schema);
        assert_eq!(rows.len(), data.examples.len());
        assert!(rows.iter().all(|r| r.len() == schema.len()));
        // 4x100m medley relay
        assert_eq!(&rows[0][..4], &[2004.0, 400.0, 1.0, 1.0]);
    }
}
