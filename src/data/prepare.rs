//! Training set preparation
//!
//! Turns raw result rows into labelled examples: rows with an unparsable
//! distance or missing fields are dropped, only medalists are kept, and the
//! label space is narrowed to the most decorated teams.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use super::results::ResultRow;
use super::DataError;
use crate::features::{parse_distance, CategoricalGroup, CategorySource, FeatureValues, ParsedDistance};

/// Filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrepareOptions {
    /// Highest rank still counted as a medal
    pub max_rank: f64,
    /// Number of teams kept as labels
    pub top_teams: usize,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            max_rank: 3.0,
            top_teams: 10,
        }
    }
}

/// A labelled training example; categories are kept as found in the data
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub year: f64,
    pub distance: ParsedDistance,
    pub stroke: String,
    pub gender: String,
    pub team: String,
}

impl TrainingExample {
    pub fn feature_values(&self) -> FeatureValues {
        FeatureValues::new(self.year, self.distance, &self.stroke, &self.gender)
    }
}

impl CategorySource for TrainingExample {
    fn category_value(&self, group: CategoricalGroup) -> Option<&str> {
        match group {
            CategoricalGroup::Stroke => Some(&self.stroke),
            CategoricalGroup::Gender => Some(&self.gender),
        }
    }
}

/// How many rows each filter removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropStats {
    pub unparsable_distance: usize,
    pub missing_fields: usize,
    pub not_medalist: usize,
    pub outside_top_teams: usize,
}

/// Result of preparation
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub examples: Vec<TrainingExample>,
    /// Kept teams with their medal counts, most medals first
    pub team_counts: Vec<(String, usize)>,
    pub dropped: DropStats,
}

/// Convert one row, or say why it was rejected
fn to_example(row: &ResultRow, stats: &mut DropStats) -> Option<(TrainingExample, Option<f64>)> {
    let distance = match row.distance.as_deref().map(parse_distance) {
        Some(Ok(d)) => d,
        _ => {
            stats.unparsable_distance += 1;
            return None;
        }
    };

    let (Some(year), Some(stroke), Some(gender), Some(team), Some(_), Some(_)) = (
        row.year,
        row.stroke.as_ref(),
        row.gender.as_ref(),
        row.team.as_ref(),
        row.athlete.as_ref(),
        row.results.as_ref(),
    ) else {
        stats.missing_fields += 1;
        return None;
    };

    // The dataset's own relay column wins over the one derived from the distance
    let relay = row.relay.map(|r| r != 0.0).unwrap_or(distance.relay);

    Some((
        TrainingExample {
            year,
            distance: ParsedDistance::new(distance.meters, relay),
            stroke: stroke.clone(),
            gender: gender.clone(),
            team: team.clone(),
        },
        row.rank,
    ))
}

/// Teams ranked by example count; ties keep first-seen order
pub fn rank_teams(examples: &[TrainingExample]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for example in examples {
        match positions.get(example.team.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(&example.team, counts.len());
                counts.push((example.team.clone(), 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Apply all filters to raw rows
pub fn prepare_training_set(
    rows: &[ResultRow],
    options: &PrepareOptions,
) -> Result<PreparedDataset, DataError> {
    let mut dropped = DropStats::default();

    let mut medalists = Vec::new();
    for row in rows {
        let Some((example, rank)) = to_example(row, &mut dropped) else {
            continue;
        };
        match rank {
            Some(r) if r <= options.max_rank => medalists.push(example),
            _ => dropped.not_medalist += 1,
        }
    }

    let mut team_counts = rank_teams(&medalists);
    team_counts.truncate(options.top_teams);
    debug!("Top teams: {:?}", team_counts);

    let before = medalists.len();
    let examples: Vec<TrainingExample> = medalists
        .into_iter()
        .filter(|e| team_counts.iter().any(|(team, _)| *team == e.team))
        .collect();
    dropped.outside_top_teams = before - examples.len();

    if examples.is_empty() {
        return Err(DataError::EmptyTrainingSet);
    }

    info!(
        "Prepared {} training examples from {} rows ({} teams)",
        examples.len(),
        rows.len(),
        team_counts.len()
    );

    Ok(PreparedDataset {
        examples,
        team_counts,
        dropped,
    })
}
