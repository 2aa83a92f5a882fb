//! Classification metrics
//!
//! Accuracy plus a per-label precision / recall / F1 / support report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics for a single label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Evaluation of a classifier on a held-out set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub train_size: usize,
    pub test_size: usize,
    pub per_class: Vec<ClassMetrics>,
    pub macro_f1: f64,
    pub weighted_f1: f64,
}

#[derive(Default)]
struct Tally {
    true_positive: usize,
    predicted: usize,
    actual: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Score `predicted` against `actual`; labels are reported in sorted order
pub fn evaluate(actual: &[String], predicted: &[String], train_size: usize) -> EvaluationReport {
    let total = actual.len().min(predicted.len());
    if total == 0 {
        return EvaluationReport {
            train_size,
            ..Default::default()
        };
    }

    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut correct = 0;

    for (a, p) in actual.iter().zip(predicted) {
        tallies.entry(a.as_str()).or_default().actual += 1;
        tallies.entry(p.as_str()).or_default().predicted += 1;
        if a == p {
            correct += 1;
            tallies.entry(a.as_str()).or_default().true_positive += 1;
        }
    }

    let per_class: Vec<ClassMetrics> = tallies
        .iter()
        .map(|(label, t)| {
            let precision = ratio(t.true_positive, t.predicted);
            let recall = ratio(t.true_positive, t.actual);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: label.to_string(),
                precision,
                recall,
                f1,
                support: t.actual,
            }
        })
        .collect();

    let macro_f1 = per_class.iter().map(|c| c.f1).sum::<f64>() / per_class.len() as f64;
    let weighted_f1 = per_class
        .iter()
        .map(|c| c.f1 * c.support as f64)
        .sum::<f64>()
        / total as f64;

    EvaluationReport {
        accuracy: ratio(correct, total),
        train_size,
        test_size: total,
        per_class,
        macro_f1,
        weighted_f1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_perfect_predictions() {
        let y = labels(&["USA", "AUS", "USA"]);
        let report = evaluate(&y, &y, 10);

        assert!((report.accuracy - 1.0).abs() < 1e-9);
        assert_eq!(report.train_size, 10);
        assert_eq!(report.test_size, 3);
        assert!((report.macro_f1 - 1.0).abs() < 1e-9);
        assert_eq!(report.per_class.len(), 2);
        assert_eq!(report.per_class[0].label, "AUS");
        assert_eq!(report.per_class[1].support, 2);
    }

    #[test]
    fn test_mixed_predictions() {
        let actual = labels(&["USA", "USA", "AUS", "GBR"]);
        let predicted = labels(&["USA", "AUS", "AUS", "USA"]);
        let report = evaluate(&actual, &predicted, 0);

        assert!((report.accuracy - 0.5).abs() < 1e-9);

        let usa = report.per_class.iter().find(|c| c.label == "USA").unwrap();
        assert!((usa.precision - 0.5).abs() < 1e-9);
        assert!((usa.recall - 0.5).abs() < 1e-9);

        let aus = report.per_class.iter().find(|c| c.label == "AUS").unwrap();
        assert!((aus.precision - 0.5).abs() < 1e-9);
        assert!((aus.recall - 1.0).abs() < 1e-9);

        let gbr = report.per_class.iter().find(|c| c.label == "GBR").unwrap();
        assert_eq!(gbr.f1, 0.0);
        assert_eq!(gbr.support, 1);
    }

    #[test]
    fn test_empty_input() {
        let report = evaluate(&[], &[], 5);
        assert_eq!(report.test_size, 0);
        assert_eq!(report.train_size, 5);
        assert!(report.per_class.is_empty());
        assert_eq!(
            report,
            EvaluationReport {
                train_size: 5,
                ..EvaluationReport::default()
            }
        );
    }
}
