//! Categorical groups and label canonicalization
//!
//! Every category value, whether it comes from the training dataset or from a
//! prediction request, goes through [`canonical_category`] before it is matched
//! against a schema column. Label-cleaning rules live here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical stroke label shared by every medley variant
pub const MEDLEY: &str = "Medley";

/// A categorical field that is one-hot encoded into indicator columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalGroup {
    Stroke,
    Gender,
}

impl CategoricalGroup {
    /// All groups in schema order
    pub const ALL: [CategoricalGroup; 2] = [CategoricalGroup::Stroke, CategoricalGroup::Gender];

    /// Column-name prefix (`Stroke_Freestyle`, `Gender_Men`)
    pub fn name(self) -> &'static str {
        match self {
            CategoricalGroup::Stroke => "Stroke",
            CategoricalGroup::Gender => "Gender",
        }
    }

    /// Field name carrying this group in raw records and the dataset
    pub fn field(self) -> &'static str {
        match self {
            CategoricalGroup::Stroke => "Stroke",
            CategoricalGroup::Gender => "Gender",
        }
    }

    /// Value assumed when a request omits the field
    pub fn default_value(self) -> &'static str {
        match self {
            CategoricalGroup::Stroke => "Freestyle",
            CategoricalGroup::Gender => "Men",
        }
    }
}

impl fmt::Display for CategoricalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper-case the first character and lower-case the rest ("individual MEDLEY" -> "Individual medley")
pub fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Map a raw category value to its canonical form for `group`
///
/// Whitespace is trimmed and the value title-cased. For strokes, anything whose
/// lower-cased form ends in "medley" collapses into [`MEDLEY`], so "Medley" and
/// "Individual medley" share one indicator column.
pub fn canonical_category(group: CategoricalGroup, raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match group {
        CategoricalGroup::Stroke if lowered.ends_with("medley") => MEDLEY.to_string(),
        _ => title_case(&lowered),
    }
}
