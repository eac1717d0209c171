use std::collections::{HashMap, HashSet};

use sheet_ops::{execute_base_shape, execute_solid_bend, KernelBundle, OpResult};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::resolve::{find_solid_handle, resolve_with_fallback};
use crate::types::{EngineError, Feature, FeatureTree, Operation, SolidBendParams};

/// State of the engine after a rebuild.
#[derive(Debug, Default)]
pub struct RebuildState {
    /// OpResult for each successfully built feature.
    pub feature_results: HashMap<Uuid, OpResult>,
    /// Warnings accumulated during rebuild, with the feature that raised them.
    pub warnings: Vec<(Uuid, String)>,
    /// Features that failed to rebuild, with error messages.
    pub errors: Vec<(Uuid, String)>,
}

/// Rebuild the feature tree from a change point.
///
/// Results, warnings and errors of active features before `from_index` are
/// taken from `previous`; everything from there on is replayed in order. A
/// failing feature is recorded and the rebuild moves on to the next one.
pub fn rebuild(
    tree: &FeatureTree,
    kb: &mut dyn KernelBundle,
    from_index: usize,
    previous: RebuildState,
) -> RebuildState {
    let kept: HashSet<Uuid> = tree
        .active_features()
        .take_while(|(i, _)| *i < from_index)
        .map(|(_, f)| f.id)
        .collect();
    let mut state = RebuildState {
        feature_results: previous
            .feature_results
            .into_iter()
            .filter(|(id, _)| kept.contains(id))
            .collect(),
        warnings: previous
            .warnings
            .into_iter()
            .filter(|(id, _)| kept.contains(id))
            .collect(),
        errors: previous
            .errors
            .into_iter()
            .filter(|(id, _)| kept.contains(id))
            .collect(),
    };

    for (_, feature) in tree.active_features().filter(|(i, _)| *i >= from_index) {
        match execute_feature(feature, kb, &state.feature_results) {
            Ok((result, warnings)) => {
                debug!(feature = %feature.name, outputs = result.outputs.len(), "feature built");
                let diagnostics = result
                    .diagnostics
                    .warnings
                    .iter()
                    .map(|w| format!("Feature '{}': {}", feature.name, w));
                state.warnings.extend(
                    warnings
                        .into_iter()
                        .chain(diagnostics)
                        .map(|w| (feature.id, w)),
                );
                state.feature_results.insert(feature.id, result);
            }
            Err(e) => {
                warn!(feature = %feature.name, error = %e, "feature failed to rebuild");
                state.errors.push((feature.id, e.to_string()));
            }
        }
    }

    state
}

/// Execute a single feature's operation, returning its result and any
/// reference-resolution warnings.
fn execute_feature(
    feature: &Feature,
    kb: &mut dyn KernelBundle,
    feature_results: &HashMap<Uuid, OpResult>,
) -> Result<(OpResult, Vec<String>), EngineError> {
    match &feature.operation {
        Operation::BaseShape { params } => Ok((execute_base_shape(kb, params)?, Vec::new())),
        Operation::SolidBend { params } => {
            execute_solid_bend_feature(feature, params, kb, feature_results)
        }
    }
}

fn execute_solid_bend_feature(
    feature: &Feature,
    params: &SolidBendParams,
    kb: &mut dyn KernelBundle,
    feature_results: &HashMap<Uuid, OpResult>,
) -> Result<(OpResult, Vec<String>), EngineError> {
    let first = params.edges.first().ok_or(EngineError::ResolutionFailed {
        reason: "Solid bend needs at least one edge reference".to_string(),
    })?;
    let solid_handle = find_solid_handle(&first.reference, feature_results)?;

    let mut warnings = Vec::new();
    let mut edge_ids = Vec::with_capacity(params.edges.len());
    for edge in &params.edges {
        let resolved = resolve_with_fallback(edge, feature_results, kb.as_introspect()).map_err(
            |e| EngineError::ResolutionFailed {
                reason: format!("Failed to resolve bend edge: {}", e),
            },
        )?;
        warnings.extend(
            resolved
                .warnings
                .into_iter()
                .map(|w| format!("Feature '{}': {}", feature.name, w)),
        );
        edge_ids.push(resolved.kernel_id);
    }

    let result = execute_solid_bend(kb, &solid_handle, &edge_ids, params.radius)?;
    Ok((result, warnings))
}
