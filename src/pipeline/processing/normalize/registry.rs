use std::collections::HashMap;

use super::normalizers::{
    AgendaPageNormalizer, HalApiNormalizer, PagedJsonNormalizer, SourceNormalizer,
};
use crate::types::{Event, RawEventData, SourceContext, SourceKind};

/// Registry for family-specific normalization strategies
pub struct NormalizationRegistry {
    normalizers: HashMap<SourceKind, Box<dyn SourceNormalizer>>,
}

impl NormalizationRegistry {
    /// Create a new normalization registry with the built-in normalizers
    pub fn new() -> Self {
        let mut registry = Self {
            normalizers: HashMap::new(),
        };
        registry.register(Box::new(HalApiNormalizer::new()));
        registry.register(Box::new(PagedJsonNormalizer::new()));
        registry.register(Box::new(AgendaPageNormalizer::new()));
        registry
    }

    /// Register a normalizer, replacing any previous one for the same family
    pub fn register(&mut self, normalizer: Box<dyn SourceNormalizer>) {
        self.normalizers.insert(normalizer.kind(), normalizer);
    }

    /// Get the appropriate normalizer for a family
    pub fn get_normalizer(&self, kind: SourceKind) -> Option<&dyn SourceNormalizer> {
        self.normalizers.get(&kind).map(|n| n.as_ref())
    }

    /// Normalize every raw record of one source. `None` when no normalizer
    /// is registered for the family.
    pub fn normalize_all(
        &self,
        kind: SourceKind,
        ctx: &SourceContext,
        raw_events: &[RawEventData],
    ) -> Option<Vec<Event>> {
        let normalizer = self.get_normalizer(kind)?;
        Some(raw_events.iter().map(|raw| normalizer.normalize(ctx, raw)).collect())
    }

    /// List all registered families
    pub fn list_kinds(&self) -> Vec<SourceKind> {
        self.normalizers.keys().copied().collect()
    }
}

impl Default for NormalizationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
