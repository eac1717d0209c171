use std::collections::{HashMap, HashSet};

use sheet_kernel::{KernelId, KernelIntrospect, KernelSolidHandle};
use sheet_types::{Role, TopoKind, TopoSignature};

use crate::types::EntityRecord;

/// Below this similarity a vanished entity is not paired with a new one.
const SURVIVAL_THRESHOLD: f64 = 0.7;

/// A snapshot of the topology of a solid at a point in time.
#[derive(Debug, Clone, Default)]
pub struct TopoSnapshot {
    pub faces: Vec<(KernelId, TopoSignature)>,
    pub edges: Vec<(KernelId, TopoSignature)>,
    pub vertices: Vec<(KernelId, TopoSignature)>,
}

impl TopoSnapshot {
    /// Remove the given faces from the snapshot and return them as records.
    /// Faces consumed by an operation must not be paired with new geometry.
    pub fn take_faces(&mut self, ids: &[KernelId]) -> Vec<EntityRecord> {
        take(&mut self.faces, ids, TopoKind::Face)
    }

    /// Edge counterpart of [`TopoSnapshot::take_faces`].
    pub fn take_edges(&mut self, ids: &[KernelId]) -> Vec<EntityRecord> {
        take(&mut self.edges, ids, TopoKind::Edge)
    }
}

fn take(
    entities: &mut Vec<(KernelId, TopoSignature)>,
    ids: &[KernelId],
    kind: TopoKind,
) -> Vec<EntityRecord> {
    let wanted: HashSet<KernelId> = ids.iter().copied().collect();
    let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(entities)
        .into_iter()
        .partition(|(id, _)| wanted.contains(id));
    *entities = kept;
    taken
        .into_iter()
        .map(|(kernel_id, signature)| EntityRecord {
            kernel_id,
            kind,
            signature,
        })
        .collect()
}

/// Take a topology snapshot of a solid for diffing.
pub fn snapshot(introspect: &dyn KernelIntrospect, solid: &KernelSolidHandle) -> TopoSnapshot {
    TopoSnapshot {
        faces: introspect.compute_all_signatures(solid, TopoKind::Face),
        edges: introspect.compute_all_signatures(solid, TopoKind::Edge),
        vertices: introspect.compute_all_signatures(solid, TopoKind::Vertex),
    }
}

/// Result of diffing two topology snapshots.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// Entities present in `after` but not in `before`.
    pub created: Vec<EntityRecord>,
    /// Entities present in `before` but not in `after`.
    pub deleted: Vec<EntityRecord>,
    /// (before, after) pairs that correspond by ID or signature similarity.
    pub survived: Vec<(KernelId, KernelId)>,
}

impl DiffResult {
    /// Map from an entity's ID before the operation to its ID after.
    pub fn id_map(&self) -> HashMap<KernelId, KernelId> {
        self.survived.iter().copied().collect()
    }

    /// Carry role assignments of surviving entities over to their new IDs.
    pub fn carry_roles(&self, roles: &[(KernelId, Role)]) -> Vec<(KernelId, Role)> {
        let map = self.id_map();
        roles
            .iter()
            .filter_map(|(id, role)| map.get(id).map(|new_id| (*new_id, role.clone())))
            .collect()
    }
}

/// Diff two topology snapshots to find created, deleted, and surviving entities.
/// For a solid built from nothing, pass an empty snapshot as `before`.
pub fn diff(before: &TopoSnapshot, after: &TopoSnapshot) -> DiffResult {
    let mut result = DiffResult::default();
    diff_kind(&before.faces, &after.faces, TopoKind::Face, &mut result);
    diff_kind(&before.edges, &after.edges, TopoKind::Edge, &mut result);
    diff_kind(&before.vertices, &after.vertices, TopoKind::Vertex, &mut result);
    result
}

/// Diff a single kind of topology entity.
fn diff_kind(
    before: &[(KernelId, TopoSignature)],
    after: &[(KernelId, TopoSignature)],
    kind: TopoKind,
    result: &mut DiffResult,
) {
    let after_ids: HashSet<KernelId> = after.iter().map(|(id, _)| *id).collect();
    let before_ids: HashSet<KernelId> = before.iter().map(|(id, _)| *id).collect();

    // Same ID on both sides: survived unchanged
    for (id, _) in before.iter().filter(|(id, _)| after_ids.contains(id)) {
        result.survived.push((*id, *id));
    }

    // Kernels re-ID on every operation, so pair the rest greedily by signature.
    // Iteration follows snapshot order to keep the pairing deterministic.
    let gone: Vec<&(KernelId, TopoSignature)> = before
        .iter()
        .filter(|(id, _)| !after_ids.contains(id))
        .collect();
    let fresh: Vec<&(KernelId, TopoSignature)> = after
        .iter()
        .filter(|(id, _)| !before_ids.contains(id))
        .collect();
    let mut taken = vec![false; fresh.len()];

    for (gone_id, gone_sig) in &gone {
        let mut best: Option<(usize, f64)> = None;
        for (i, (_, new_sig)) in fresh.iter().enumerate() {
            if taken[i] {
                continue;
            }
            let similarity = signature_similarity(gone_sig, new_sig);
            if similarity > SURVIVAL_THRESHOLD && best.map_or(true, |(_, s)| similarity > s) {
                best = Some((i, similarity));
            }
        }

        match best {
            Some((i, _)) => {
                taken[i] = true;
                result.survived.push((*gone_id, fresh[i].0));
            }
            None => result.deleted.push(EntityRecord {
                kernel_id: *gone_id,
                kind,
                signature: gone_sig.clone(),
            }),
        }
    }

    for (i, (new_id, new_sig)) in fresh.iter().enumerate() {
        if !taken[i] {
            result.created.push(EntityRecord {
                kernel_id: *new_id,
                kind,
                signature: new_sig.clone(),
            });
        }
    }
}

/// Compute similarity between two topology signatures (0.0 to 1.0).
/// Higher means more similar. Used for signature-based matching.
pub fn signature_similarity(a: &TopoSignature, b: &TopoSignature) -> f64 {
    let mut score = 0.0;
    let mut weight = 0.0;

    // Surface type match (high weight)
    if let (Some(st_a), Some(st_b)) = (&a.surface_type, &b.surface_type) {
        weight += 3.0;
        if st_a == st_b {
            score += 3.0;
        }
    }

    if let (Some(area_a), Some(area_b)) = (a.area, b.area) {
        weight += 2.0;
        score += 2.0 * relative_closeness(area_a, area_b);
    }

    // Centroid proximity: full score when coincident, zero beyond 10 units
    if let (Some(c_a), Some(c_b)) = (a.centroid, b.centroid) {
        weight += 2.0;
        let dist =
            ((c_a[0] - c_b[0]).powi(2) + (c_a[1] - c_b[1]).powi(2) + (c_a[2] - c_b[2]).powi(2))
                .sqrt();
        score += 2.0 * (1.0 - (dist / 10.0).min(1.0));
    }

    // Normal alignment: dot = 1.0 parallel, -1.0 anti-parallel
    if let (Some(n_a), Some(n_b)) = (a.normal, b.normal) {
        weight += 2.0;
        let dot = n_a[0] * n_b[0] + n_a[1] * n_b[1] + n_a[2] * n_b[2];
        score += 2.0 * ((dot + 1.0) / 2.0).max(0.0);
    }

    if let (Some(len_a), Some(len_b)) = (a.length, b.length) {
        weight += 2.0;
        score += 2.0 * relative_closeness(len_a, len_b);
    }

    if weight > 0.0 {
        score / weight
    } else {
        0.0
    }
}

/// 1.0 for equal magnitudes, falling to 0.0 as they diverge.
fn relative_closeness(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max > 1e-12 {
        1.0 - ((a - b).abs() / max).min(1.0)
    } else {
        1.0
    }
}
