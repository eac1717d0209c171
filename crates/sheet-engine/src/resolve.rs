use std::collections::HashMap;

use sheet_kernel::{KernelId, KernelIntrospect, KernelSolidHandle};
use sheet_ops::OpResult;
use sheet_types::{GeomRef, OutputKey, ResolvePolicy, Role, Selector, TopoKind, TopoSignature};
use uuid::Uuid;

use crate::types::{BendEdge, EngineError};

/// Signature matches at or above this are taken without a warning.
const CONFIDENT_MATCH: f64 = 0.9;
/// Below this a signature match only succeeds under BestEffort.
const MINIMUM_MATCH: f64 = 0.5;

/// Result of resolving a GeomRef to a concrete KernelId.
#[derive(Debug, Clone)]
pub struct ResolvedRef {
    pub kernel_id: KernelId,
    pub warnings: Vec<String>,
}

/// The solid a GeomRef points into.
pub fn find_solid_handle(
    geom_ref: &GeomRef,
    feature_results: &HashMap<Uuid, OpResult>,
) -> Result<KernelSolidHandle, EngineError> {
    let op_result = feature_result(geom_ref.feature_id, feature_results)?;
    op_result
        .output(&geom_ref.output_key)
        .cloned()
        .ok_or_else(|| EngineError::ResolutionFailed {
            reason: format!(
                "Output key {:?} not found in feature {}",
                geom_ref.output_key, geom_ref.feature_id
            ),
        })
}

/// Resolve a GeomRef to a KernelId using the feature results map.
pub fn resolve_geom_ref(
    geom_ref: &GeomRef,
    feature_results: &HashMap<Uuid, OpResult>,
    introspect: &dyn KernelIntrospect,
) -> Result<ResolvedRef, EngineError> {
    match &geom_ref.selector {
        Selector::Role { role, index } => {
            // Roles are only recorded for the finished solid.
            if geom_ref.output_key != OutputKey::Main {
                return Err(EngineError::ResolutionFailed {
                    reason: format!("Role {:?} requested on {:?}", role, geom_ref.output_key),
                });
            }
            let op_result = feature_result(geom_ref.feature_id, feature_results)?;
            resolve_by_role(op_result, role, *index, geom_ref.policy)
        }
        Selector::Signature { signature } => {
            let solid = find_solid_handle(geom_ref, feature_results)?;
            let candidates = introspect.compute_all_signatures(&solid, geom_ref.kind);
            resolve_by_signature(&candidates, signature, geom_ref.kind, geom_ref.policy)
        }
    }
}

/// Resolve a bend edge: its reference first, then its captured signature.
pub fn resolve_with_fallback(
    edge: &BendEdge,
    feature_results: &HashMap<Uuid, OpResult>,
    introspect: &dyn KernelIntrospect,
) -> Result<ResolvedRef, EngineError> {
    let primary_err = match resolve_geom_ref(&edge.reference, feature_results, introspect) {
        Ok(resolved) => return Ok(resolved),
        Err(e) => e,
    };
    let Some(signature) = &edge.fallback else {
        return Err(primary_err);
    };

    let fallback = GeomRef {
        selector: Selector::Signature {
            signature: signature.clone(),
        },
        ..edge.reference.clone()
    };
    let mut resolved = resolve_geom_ref(&fallback, feature_results, introspect)?;
    resolved
        .warnings
        .insert(0, format!("Fell back to signature match: {}", primary_err));
    Ok(resolved)
}

fn feature_result(
    feature_id: Uuid,
    feature_results: &HashMap<Uuid, OpResult>,
) -> Result<&OpResult, EngineError> {
    feature_results
        .get(&feature_id)
        .ok_or(EngineError::ResolutionFailed {
            reason: format!("Feature {} has no result (not yet rebuilt?)", feature_id),
        })
}

/// Resolve by semantic role.
fn resolve_by_role(
    op_result: &OpResult,
    role: &Role,
    index: usize,
    policy: ResolvePolicy,
) -> Result<ResolvedRef, EngineError> {
    let matching = op_result.with_role(role);
    let Some(&last) = matching.last() else {
        return Err(EngineError::ResolutionFailed {
            reason: format!("No entity with role {:?}", role),
        });
    };

    if let Some(&kernel_id) = matching.get(index) {
        return Ok(ResolvedRef {
            kernel_id,
            warnings: Vec::new(),
        });
    }
    match policy {
        ResolvePolicy::Strict => Err(EngineError::ResolutionFailed {
            reason: format!(
                "Role {:?} index {} out of range (found {})",
                role,
                index,
                matching.len()
            ),
        }),
        ResolvePolicy::BestEffort => Ok(ResolvedRef {
            kernel_id: last,
            warnings: vec![format!(
                "Role {:?} index {} clamped to {} (BestEffort)",
                role,
                index,
                matching.len() - 1
            )],
        }),
    }
}

/// Resolve by geometric signature against the live entities of a solid.
fn resolve_by_signature(
    candidates: &[(KernelId, TopoSignature)],
    target_sig: &TopoSignature,
    kind: TopoKind,
    policy: ResolvePolicy,
) -> Result<ResolvedRef, EngineError> {
    let mut best_match: Option<(KernelId, f64)> = None;
    for (id, sig) in candidates {
        let sim = sheet_ops::signature_similarity(sig, target_sig);
        if best_match.map_or(true, |(_, best_sim)| sim > best_sim) {
            best_match = Some((*id, sim));
        }
    }

    match best_match {
        Some((id, sim)) if sim > MINIMUM_MATCH => {
            let mut warnings = Vec::new();
            if sim < CONFIDENT_MATCH {
                warnings.push(format!("Signature match confidence: {:.1}%", sim * 100.0));
            }
            Ok(ResolvedRef {
                kernel_id: id,
                warnings,
            })
        }
        Some((id, sim)) => match policy {
            ResolvePolicy::BestEffort => Ok(ResolvedRef {
                kernel_id: id,
                warnings: vec![format!(
                    "Low-confidence signature match: {:.1}%",
                    sim * 100.0
                )],
            }),
            ResolvePolicy::Strict => Err(EngineError::ResolutionFailed {
                reason: format!("Best signature match too low: {:.1}%", sim * 100.0),
            }),
        },
        None => Err(EngineError::ResolutionFailed {
            reason: format!("No {:?} entities to match signature against", kind),
        }),
    }
}
