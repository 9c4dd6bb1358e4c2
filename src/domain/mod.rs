//! Domain types and the instrument field vocabulary.

pub mod fields;
pub mod types;

pub use fields::{UNKNOWN_FIELD_KEY, canonical_key};
pub use types::{
    CHANNEL_ELONGATION, CHANNEL_TENSION, CROSS_SECTION_MM2, DerivedMetrics, Experiment,
    FieldScalar, FieldValue, GAUGE_LENGTH_MM, ModulusFit, ParseOptions, ProbeFile,
};
