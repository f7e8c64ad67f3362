//! Lens registration and lookup

use crate::error::ConsensusError;
use crate::lens::{Lens, LensDescriptor};
use crate::lenses::{CommunityNotesLens, EvidenceFirstLens, ExpertJuryLens, MarketSignalLens};
use std::sync::Arc;

/// Registered lenses, in registration order
#[derive(Clone, Default)]
pub struct LensRegistry {
    lenses: Vec<Arc<dyn Lens>>,
}

impl std::fmt::Debug for LensRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.lenses.iter().map(|l| &l.descriptor().id))
            .finish()
    }
}

impl LensRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in lenses
    pub fn with_default_lenses() -> Self {
        let lenses: Vec<Arc<dyn Lens>> = vec![
            Arc::new(EvidenceFirstLens::new()),
            Arc::new(ExpertJuryLens::new()),
            Arc::new(CommunityNotesLens::new()),
            Arc::new(MarketSignalLens::new()),
        ];
        Self { lenses }
    }

    /// Add a lens; ids must be unique
    pub fn register(&mut self, lens: Arc<dyn Lens>) -> Result<(), ConsensusError> {
        let id = &lens.descriptor().id;
        if self.get(id).is_some() {
            return Err(ConsensusError::DuplicateLens(id.clone()));
        }
        self.lenses.push(lens);
        Ok(())
    }

    /// Look up a lens by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn Lens>> {
        self.lenses.iter().find(|l| l.descriptor().id == id).cloned()
    }

    /// Registration index of a lens id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.lenses.iter().position(|l| l.descriptor().id == id)
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<LensDescriptor> {
        self.lenses.iter().map(|l| l.descriptor().clone()).collect()
    }

    /// Number of registered lenses
    pub fn len(&self) -> usize {
        self.lenses.len()
    }

    /// Whether no lens is registered
    pub fn is_empty(&self) -> bool {
        self.lenses.is_empty()
    }
}
