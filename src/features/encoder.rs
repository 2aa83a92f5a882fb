//! Row encoding against a frozen schema
//!
//! Both stages encode through [`encode_values`]: training rows arrive already
//! parsed, serving requests are first defaulted by [`FeatureValues::from_record`].
//! The output always has exactly one entry per schema column, in schema order.

use super::category::{canonical_category, CategoricalGroup};
use super::distance::{normalize_distance_checked, ParsedDistance};
use super::record::RawRecord;
use super::schema::{ContinuousFeature, FeatureColumn, FeatureSchema};

/// Typed, canonical feature values for one event
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureValues {
    pub year: f64,
    pub distance: ParsedDistance,
    pub stroke: String,
    pub gender: String,
}

impl FeatureValues {
    /// Build from raw category labels, canonicalizing them
    pub fn new(year: f64, distance: ParsedDistance, stroke: &str, gender: &str) -> Self {
        Self {
            year,
            distance,
            stroke: canonical_category(CategoricalGroup::Stroke, stroke),
            gender: canonical_category(CategoricalGroup::Gender, gender),
        }
    }

    /// Apply serving defaults to a raw record; also reports whether the distance fell back
    pub fn from_record(record: &RawRecord) -> (Self, bool) {
        let (distance, fallback) = normalize_distance_checked(&record.distance());
        let values = Self::new(
            record.year(),
            distance,
            &record.category(CategoricalGroup::Stroke),
            &record.category(CategoricalGroup::Gender),
        );
        (values, fallback)
    }

    pub fn category(&self, group: CategoricalGroup) -> &str {
        match group {
            CategoricalGroup::Stroke => &self.stroke,
            CategoricalGroup::Gender => &self.gender,
        }
    }

    fn continuous(&self, feature: ContinuousFeature) -> f64 {
        match feature {
            ContinuousFeature::Year => self.year,
            ContinuousFeature::DistanceMeters => self.distance.meters,
            ContinuousFeature::Relay => self.distance.relay_value(),
        }
    }
}

/// A category value with no column in the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfVocabulary {
    pub group: CategoricalGroup,
    pub value: String,
}

/// Dense feature row in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub values: Vec<f64>,
    /// Categories that matched no indicator column and were left all-zero
    pub out_of_vocabulary: Vec<OutOfVocabulary>,
    /// Whether the distance descriptor was unparsable and defaulted
    pub distance_fallback: bool,
}

impl EncodedRow {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Encode canonical values against `schema`
pub fn encode_values(values: &FeatureValues, schema: &FeatureSchema) -> EncodedRow {
    let mut row = vec![0.0; schema.len()];

    for feature in ContinuousFeature::ALL {
        if let Some(i) = schema.index_of(&FeatureColumn::continuous(feature)) {
            row[i] = values.continuous(feature);
        }
    }

    let mut out_of_vocabulary = Vec::new();
    for group in CategoricalGroup::ALL {
        let value = values.category(group);
        match schema.index_of(&FeatureColumn::indicator(group, value)) {
            Some(i) => row[i] = 1.0,
            None => out_of_vocabulary.push(OutOfVocabulary {
                group,
                value: value.to_string(),
            }),
        }
    }

    EncodedRow {
        values: row,
        out_of_vocabulary,
        distance_fallback: false,
    }
}

/// Encode a serving-time record; never fails
pub fn encode(record: &RawRecord, schema: &FeatureSchema) -> EncodedRow {
    let (values, distance_fallback) = FeatureValues::from_record(record);
    EncodedRow {
        distance_fallback,
        ..encode_values(&values, schema)
    }
}
