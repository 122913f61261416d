//! Normalization: raw source records into canonical [`Event`](crate::types::Event)s.
//!
//! Each source family has one normalizer. Field resolution goes through
//! ordered candidate key lists (first present, non-empty value wins), so the
//! mapping tables stay declarative and every normalizer is a pure function.

pub mod normalizers;
pub mod registry;

pub use normalizers::{NormalizerUtils, SourceNormalizer};
pub use registry::NormalizationRegistry;
