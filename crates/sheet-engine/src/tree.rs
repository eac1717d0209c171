use uuid::Uuid;

use crate::types::{EngineError, Feature, FeatureTree, Operation};

impl FeatureTree {
    /// Add a feature at the end of the tree. New features follow the
    /// sheet-metal definition.
    pub fn add_feature(&mut self, name: String, operation: Operation) -> Uuid {
        let id = Uuid::new_v4();
        self.features.push(Feature {
            id,
            name,
            operation,
            suppressed: false,
            follows_definition: true,
        });
        id
    }

    /// Remove a feature by ID. Returns the removed feature.
    pub fn remove_feature(&mut self, id: Uuid) -> Result<Feature, EngineError> {
        let pos = self
            .feature_index(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        Ok(self.features.remove(pos))
    }

    /// Move a feature to `new_pos`, clamped to the end of the tree.
    pub fn reorder_feature(&mut self, id: Uuid, new_pos: usize) -> Result<(), EngineError> {
        let old_pos = self
            .feature_index(id)
            .ok_or(EngineError::FeatureNotFound { id })?;

        let feature = self.features.remove(old_pos);
        let clamped_pos = new_pos.min(self.features.len());
        self.features.insert(clamped_pos, feature);

        Ok(())
    }

    /// Suppress or unsuppress a feature.
    pub fn set_suppressed(&mut self, id: Uuid, suppressed: bool) -> Result<(), EngineError> {
        let feature = self
            .find_feature_mut(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        feature.suppressed = suppressed;
        Ok(())
    }

    /// Find a feature by ID.
    pub fn find_feature(&self, id: Uuid) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Find a feature by ID (mutable).
    pub fn find_feature_mut(&mut self, id: Uuid) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.id == id)
    }

    /// Get index of a feature by ID.
    pub fn feature_index(&self, id: Uuid) -> Option<usize> {
        self.features.iter().position(|f| f.id == id)
    }
}
