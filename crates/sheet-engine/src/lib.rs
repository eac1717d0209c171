pub mod config;
pub mod definition;
pub mod rebuild;
pub mod resolve;
pub mod tree;
pub mod types;

use std::collections::HashMap;
use std::path::Path;

use tracing::info;
use uuid::Uuid;

use sheet_kernel::{KernelId, KernelIntrospect};
use sheet_ops::{BaseShapeRequest, KernelBundle, OpResult};
use sheet_types::{GeomRef, TopoKind};

use crate::config::EngineConfig;
use crate::definition::SheetMetalDefinition;
use crate::rebuild::RebuildState;
use crate::types::{BendEdge, EngineError, FeatureTree, Operation};

/// The parametric sheet-metal engine.
///
/// Manages the feature tree and the document's sheet-metal definition, and
/// coordinates rebuilds with GeomRef resolution.
pub struct Engine {
    /// The feature tree.
    pub tree: FeatureTree,
    /// Cached results from the last rebuild.
    pub feature_results: HashMap<Uuid, OpResult>,
    /// Warnings per feature from the last rebuild.
    pub warnings: Vec<(Uuid, String)>,
    /// Errors from the last rebuild.
    pub errors: Vec<(Uuid, String)>,
    definition: Option<SheetMetalDefinition>,
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            tree: FeatureTree::new(),
            feature_results: HashMap::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            definition: None,
            config,
        }
    }

    /// Create an engine configured from a JSON file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Ok(Self::with_config(EngineConfig::load(path)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn definition(&self) -> Option<&SheetMetalDefinition> {
        self.definition.as_ref()
    }

    /// Parameters for a new base shape: the configured defaults, with
    /// thickness and radius taken from the definition when there is one.
    pub fn base_shape_defaults(&self) -> BaseShapeRequest {
        let mut request = self.config.base_shape.to_request();
        if let Some(definition) = &self.definition {
            request.dims.thickness = definition.thickness;
            request.dims.radius = definition.radius;
        }
        request
    }

    /// Capture a persistent reference to an edge picked on a feature's
    /// finished solid, using the configured solid-bend policy.
    pub fn bend_edge(
        &self,
        feature_id: Uuid,
        edge: KernelId,
        introspect: &dyn KernelIntrospect,
    ) -> Result<BendEdge, EngineError> {
        let solid = self
            .get_result(feature_id)
            .and_then(OpResult::main)
            .ok_or_else(|| EngineError::ResolutionFailed {
                reason: format!("Feature {} has no finished solid", feature_id),
            })?;
        if !introspect.list_edges(solid).contains(&edge) {
            return Err(EngineError::ResolutionFailed {
                reason: format!("Edge {:?} is not part of feature {}", edge, feature_id),
            });
        }
        let signature = introspect.compute_signature(edge, TopoKind::Edge);
        let reference = GeomRef::by_signature(TopoKind::Edge, feature_id, signature)
            .with_policy(self.config.solid_bend_policy);
        Ok(reference.into())
    }

    /// Create or overwrite the sheet-metal definition, push it into every
    /// feature that follows it, and rebuild.
    ///
    /// Overwriting takes thickness, radius and toolset from `definition`; the
    /// k-factor set when the definition was created is kept.
    pub fn set_definition(
        &mut self,
        mut definition: SheetMetalDefinition,
        kb: &mut dyn KernelBundle,
    ) -> Result<(), EngineError> {
        definition.validate()?;
        if let Some(existing) = &self.definition {
            definition.k_factor = existing.k_factor;
            info!(?definition, "sheet-metal definition overwritten");
        } else {
            info!(?definition, "sheet-metal definition created");
        }

        let mut first_changed = None;
        for (i, feature) in self.tree.features.iter_mut().enumerate() {
            if feature.follows_definition && feature.operation.apply_definition(&definition) {
                first_changed.get_or_insert(i);
            }
        }
        self.definition = Some(definition);

        if let Some(from) = first_changed {
            self.rebuild(kb, from);
        }
        Ok(())
    }

    /// Add a feature and rebuild.
    pub fn add_feature(
        &mut self,
        name: String,
        operation: Operation,
        kb: &mut dyn KernelBundle,
    ) -> Result<Uuid, EngineError> {
        let id = self.tree.add_feature(name, operation);
        let rebuild_from = self.tree.feature_index(id).unwrap_or(0);
        self.rebuild(kb, rebuild_from);
        Ok(id)
    }

    /// Remove a feature and rebuild.
    pub fn remove_feature(
        &mut self,
        id: Uuid,
        kb: &mut dyn KernelBundle,
    ) -> Result<(), EngineError> {
        let pos = self
            .tree
            .feature_index(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        self.tree.remove_feature(id)?;
        self.feature_results.remove(&id);
        self.rebuild(kb, pos);
        Ok(())
    }

    /// Edit a feature's operation and rebuild from that point.
    pub fn edit_feature(
        &mut self,
        id: Uuid,
        operation: Operation,
        kb: &mut dyn KernelBundle,
    ) -> Result<(), EngineError> {
        let pos = self
            .tree
            .feature_index(id)
            .ok_or(EngineError::FeatureNotFound { id })?;

        let feature = self
            .tree
            .find_feature_mut(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        feature.operation = operation;

        self.rebuild(kb, pos);
        Ok(())
    }

    /// Move a feature and rebuild from the earlier of its two positions.
    pub fn reorder_feature(
        &mut self,
        id: Uuid,
        new_pos: usize,
        kb: &mut dyn KernelBundle,
    ) -> Result<(), EngineError> {
        let old_pos = self
            .tree
            .feature_index(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        self.tree.reorder_feature(id, new_pos)?;
        self.rebuild(kb, old_pos.min(new_pos));
        Ok(())
    }

    /// Suppress/unsuppress a feature and rebuild.
    pub fn set_suppressed(
        &mut self,
        id: Uuid,
        suppressed: bool,
        kb: &mut dyn KernelBundle,
    ) -> Result<(), EngineError> {
        let pos = self
            .tree
            .feature_index(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        self.tree.set_suppressed(id, suppressed)?;
        self.rebuild(kb, pos);
        Ok(())
    }

    /// Choose whether a feature follows later definition changes. Turning it
    /// back on applies the current definition immediately.
    pub fn set_follows_definition(
        &mut self,
        id: Uuid,
        follows: bool,
        kb: &mut dyn KernelBundle,
    ) -> Result<(), EngineError> {
        let pos = self
            .tree
            .feature_index(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        let feature = self
            .tree
            .find_feature_mut(id)
            .ok_or(EngineError::FeatureNotFound { id })?;
        feature.follows_definition = follows;

        let changed = match (&self.definition, follows) {
            (Some(definition), true) => feature.operation.apply_definition(definition),
            _ => false,
        };
        if changed {
            self.rebuild(kb, pos);
        }
        Ok(())
    }

    /// Rebuild the feature tree from the given index.
    fn rebuild(&mut self, kb: &mut dyn KernelBundle, from_index: usize) {
        let previous = RebuildState {
            feature_results: std::mem::take(&mut self.feature_results),
            warnings: std::mem::take(&mut self.warnings),
            errors: std::mem::take(&mut self.errors),
        };
        let state = rebuild::rebuild(&self.tree, kb, from_index, previous);
        self.feature_results = state.feature_results;
        self.warnings = state.warnings;
        self.errors = state.errors;
    }

    /// Get the OpResult for a feature.
    pub fn get_result(&self, feature_id: Uuid) -> Option<&OpResult> {
        self.feature_results.get(&feature_id)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
