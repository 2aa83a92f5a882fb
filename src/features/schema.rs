//! Feature schema
//!
//! The ordered list of columns a trained model was fit on. It is derived once
//! from the training data, shipped inside the model bundle, and only ever read
//! at serving time. Column order is the contract: the classifier consumes rows
//! as plain vectors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use super::category::{canonical_category, CategoricalGroup};

/// Current schema format version
pub const SCHEMA_VERSION: u32 = 1;

/// Numeric features, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContinuousFeature {
    #[serde(rename = "Year")]
    Year,
    #[serde(rename = "Distance_m")]
    DistanceMeters,
    #[serde(rename = "Relay?")]
    Relay,
}

impl ContinuousFeature {
    pub const ALL: [ContinuousFeature; 3] = [
        ContinuousFeature::Year,
        ContinuousFeature::DistanceMeters,
        ContinuousFeature::Relay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContinuousFeature::Year => "Year",
            ContinuousFeature::DistanceMeters => "Distance_m",
            ContinuousFeature::Relay => "Relay?",
        }
    }
}

/// Identity of one schema column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureColumn {
    Continuous { feature: ContinuousFeature },
    Indicator { group: CategoricalGroup, value: String },
}

impl FeatureColumn {
    pub fn continuous(feature: ContinuousFeature) -> Self {
        FeatureColumn::Continuous { feature }
    }

    pub fn indicator(group: CategoricalGroup, value: impl Into<String>) -> Self {
        FeatureColumn::Indicator {
            group,
            value: value.into(),
        }
    }

    /// Flat column name (`Year`, `Stroke_Medley`, `Gender_Women`)
    pub fn name(&self) -> String {
        match self {
            FeatureColumn::Continuous { feature } => feature.name().to_string(),
            FeatureColumn::Indicator { group, value } => format!("{}_{}", group.name(), value),
        }
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Schema construction and lookup errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("unsupported schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("row has {actual} values but schema has {expected} columns")]
    WidthMismatch { expected: usize, actual: usize },
}

#[derive(Serialize, Deserialize)]
struct SchemaRepr {
    version: u32,
    columns: Vec<FeatureColumn>,
}

/// Immutable, ordered set of unique feature columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaRepr", into = "SchemaRepr")]
pub struct FeatureSchema {
    version: u32,
    columns: Vec<FeatureColumn>,
    index: HashMap<FeatureColumn, usize>,
}

impl FeatureSchema {
    /// Create a schema, rejecting duplicate columns
    pub fn new(columns: Vec<FeatureColumn>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if index.insert(column.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(column.name()));
            }
        }

        Ok(Self {
            version: SCHEMA_VERSION,
            columns,
            index,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column, if the schema has it
    pub fn index_of(&self, column: &FeatureColumn) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn contains(&self, column: &FeatureColumn) -> bool {
        self.index.contains_key(column)
    }

    /// Flat column names in schema order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(FeatureColumn::name).collect()
    }

    /// Category values with an indicator column for `group`, in schema order
    pub fn categories(&self, group: CategoricalGroup) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                FeatureColumn::Indicator { group: g, value } if *g == group => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Check that a row was produced for this schema
    pub fn check_width(&self, row: &[f64]) -> Result<(), SchemaError> {
        if row.len() != self.columns.len() {
            return Err(SchemaError::WidthMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        Ok(())
    }
}

impl TryFrom<SchemaRepr> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(repr: SchemaRepr) -> Result<Self, Self::Error> {
        if repr.version != SCHEMA_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                found: repr.version,
                expected: SCHEMA_VERSION,
            });
        }
        FeatureSchema::new(repr.columns)
    }
}

impl From<FeatureSchema> for SchemaRepr {
    fn from(schema: FeatureSchema) -> Self {
        SchemaRepr {
            version: schema.version,
            columns: schema.columns,
        }
    }
}

/// Anything that carries raw category values for the schema builder
pub trait CategorySource {
    fn category_value(&self, group: CategoricalGroup) -> Option<&str>;
}

/// Derives a [`FeatureSchema`] from observed training data
///
/// Categories are canonicalized and recorded in first-seen order per group.
/// The final column order is: continuous features in declaration order, then
/// one block of indicators per group in the order the groups were given.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    groups: Vec<(CategoricalGroup, Vec<String>)>,
}

impl SchemaBuilder {
    pub fn new(groups: &[CategoricalGroup]) -> Self {
        let mut unique: Vec<(CategoricalGroup, Vec<String>)> = Vec::with_capacity(groups.len());
        for &group in groups {
            if !unique.iter().any(|(g, _)| *g == group) {
                unique.push((group, Vec::new()));
            }
        }
        Self { groups: unique }
    }

    /// Record one raw category value; groups the builder was not created with are ignored
    pub fn observe(&mut self, group: CategoricalGroup, raw: &str) {
        if let Some((_, seen)) = self.groups.iter_mut().find(|(g, _)| *g == group) {
            let value = canonical_category(group, raw);
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
    }

    /// Record every tracked category of one row
    pub fn observe_row<R: CategorySource + ?Sized>(&mut self, row: &R) {
        let groups: Vec<CategoricalGroup> = self.groups.iter().map(|(g, _)| *g).collect();
        for group in groups {
            if let Some(raw) = row.category_value(group) {
                self.observe(group, raw);
            }
        }
    }

    pub fn build(self) -> FeatureSchema {
        let mut columns: Vec<FeatureColumn> = ContinuousFeature::ALL
            .iter()
            .map(|&f| FeatureColumn::continuous(f))
            .collect();

        for (group, values) in self.groups {
            columns.extend(values.into_iter().map(|v| FeatureColumn::indicator(group, v)));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            index.insert(column.clone(), i);
        }

        FeatureSchema {
            version: SCHEMA_VERSION,
            columns,
            index,
        }
    }
}

/// Build the schema for `rows`, enumerating categories of `groups`
pub fn build_schema<R: CategorySource>(rows: &[R], groups: &[CategoricalGroup]) -> FeatureSchema {
    let mut builder = SchemaBuilder::new(groups);
    for row in rows {
        builder.observe_row(row);
    }
    builder.build()
}
