// Base trait and utilities for source-specific normalizers
pub mod base;

// One normalizer per source family
pub mod agenda_page;
pub mod hal_api;
pub mod paged_json;

// Re-export the main components
pub use agenda_page::AgendaPageNormalizer;
pub use base::{NormalizerUtils, SourceNormalizer};
pub use hal_api::HalApiNormalizer;
pub use paged_json::PagedJsonNormalizer;
