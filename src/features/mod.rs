//! Feature encoding: distance parsing, category canonicalization, the frozen
//! feature schema and row encoding

pub mod category;
pub mod distance;
pub mod encoder;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use category::{canonical_category, title_case, CategoricalGroup, MEDLEY};
pub use distance::{normalize_distance, parse_distance, DistanceParseError, ParsedDistance};
pub use encoder::{encode, encode_values, EncodedRow, FeatureValues, OutOfVocabulary};
pub use record::RawRecord;
pub use schema::{
    build_schema, CategorySource, ContinuousFeature, FeatureColumn, FeatureSchema, SchemaBuilder,
    SchemaError,
};
