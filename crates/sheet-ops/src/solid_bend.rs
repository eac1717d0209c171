//! Solid bend: round a sharp corner of a solid sheet part into a bend.
//!
//! The user picks the outer edges of the corner. For each one the matching
//! inner edge is found across the sheet, the inner edge is filleted with the
//! bend radius and the outer edge with `radius + thickness`, so the corner
//! keeps a constant wall thickness.

use std::collections::HashSet;

use sheet_kernel::{KernelError, KernelId, KernelIntrospect, KernelSolidHandle};
use sheet_types::{OutputKey, Role, TopoKind};
use tracing::{debug, instrument, warn};

use crate::diff;
use crate::kernel_ext::KernelBundle;
use crate::types::{BodyOutput, Diagnostics, OpError, OpResult, Provenance};

/// An outer edge with the inner edge on the other side of the sheet.
struct MatchedCorner {
    outer: KernelId,
    inner: KernelId,
    /// Distance from the outer edge's first vertex to its counterpart.
    thickness: f64,
}

/// Bend the corners along `outer_edges` of `solid` with inner radius `radius`.
///
/// Edges with no inner counterpart are skipped and reported as warnings.
/// The sheet thickness is measured at the first matched corner and assumed
/// uniform.
#[instrument(skip(kb, outer_edges), fields(edge_count = outer_edges.len()))]
pub fn execute_solid_bend(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    outer_edges: &[KernelId],
    radius: f64,
) -> Result<OpResult, OpError> {
    if !(radius > 0.0) {
        return Err(OpError::InvalidParameter {
            reason: format!("bend radius must be positive, got {}", radius),
        });
    }
    if outer_edges.is_empty() {
        return Err(OpError::EmptySelection {
            stage: "solid bend".to_string(),
        });
    }

    let introspect = kb.as_introspect();
    let solid_edges: HashSet<KernelId> = introspect.list_edges(solid).into_iter().collect();
    let mut diagnostics = Diagnostics::default();
    let mut corners = Vec::new();
    for &edge in outer_edges {
        if !solid_edges.contains(&edge) {
            return Err(KernelError::EntityNotFound { id: edge }.into());
        }
        match match_inner_edge(introspect, solid, edge) {
            Some(corner) => corners.push(corner),
            None => {
                warn!(?edge, "no matching inner edge, skipping");
                diagnostics
                    .warnings
                    .push(format!("edge {:?} has no matching inner edge", edge));
            }
        }
    }

    let Some(thickness) = corners.first().map(|c| c.thickness) else {
        return Err(OpError::NoMatchingInnerEdge {
            count: outer_edges.len(),
        });
    };
    let inner: Vec<KernelId> = corners.iter().map(|c| c.inner).collect();
    let outer: Vec<KernelId> = corners.iter().map(|c| c.outer).collect();
    debug!(matched = corners.len(), thickness, "matched bend corners");

    let mut before = diff::snapshot(kb.as_introspect(), solid);
    let mut consumed = before.take_edges(&inner);

    let mid = kb.fillet_edges(solid, &inner, radius)?;

    // The inner fillet re-IDs the whole solid; follow the outer edges across it.
    let mid_snapshot = diff::snapshot(kb.as_introspect(), &mid);
    let mid_map = diff::diff(&before, &mid_snapshot).id_map();
    let outer_mid = outer
        .iter()
        .map(|edge| mid_map.get(edge).copied().ok_or(OpError::EdgeLost { edge: *edge }))
        .collect::<Result<Vec<_>, _>>()?;

    let handle = kb.fillet_edges(&mid, &outer_mid, radius + thickness)?;

    consumed.extend(before.take_edges(&outer));
    let after = diff::snapshot(kb.as_introspect(), &handle);
    let diff_result = diff::diff(&before, &after);

    let role_assignments: Vec<(KernelId, Role)> = diff_result
        .created
        .iter()
        .filter(|r| r.kind == TopoKind::Face && r.signature.is_cylindrical())
        .enumerate()
        .map(|(index, r)| (r.kernel_id, Role::BendRelief { index }))
        .collect();

    let mut deleted = diff_result.deleted;
    deleted.extend(consumed);

    Ok(OpResult {
        outputs: vec![(OutputKey::Main, BodyOutput { handle })],
        provenance: Provenance {
            created: diff_result.created,
            deleted,
            role_assignments,
        },
        diagnostics,
    })
}

fn match_inner_edge(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    edge: KernelId,
) -> Option<MatchedCorner> {
    let (start, end) = introspect.edge_vertices(edge);
    let inner_start = matching_vertex(introspect, solid, edge, start)?;
    let inner_end = matching_vertex(introspect, solid, edge, end)?;
    let inner = edge_between(introspect, solid, inner_start, inner_end)?;
    let thickness = distance(
        introspect.vertex_position(start)?,
        introspect.vertex_position(inner_start)?,
    );
    Some(MatchedCorner {
        outer: edge,
        inner,
        thickness,
    })
}

/// Across the sheet from `vertex`: the closest other vertex of the first
/// face that touches `vertex` but not `edge`.
fn matching_vertex(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    edge: KernelId,
    vertex: KernelId,
) -> Option<KernelId> {
    let edge_faces = introspect.edge_faces(edge);
    let side_face = introspect
        .list_faces(solid)
        .into_iter()
        .filter(|face| !edge_faces.contains(face))
        .find(|face| face_vertices(introspect, *face).contains(&vertex))?;

    let origin = introspect.vertex_position(vertex)?;
    face_vertices(introspect, side_face)
        .into_iter()
        .filter(|v| *v != vertex)
        .filter_map(|v| introspect.vertex_position(v).map(|p| (v, distance(origin, p))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(v, _)| v)
}

fn face_vertices(introspect: &dyn KernelIntrospect, face: KernelId) -> Vec<KernelId> {
    let mut vertices = Vec::new();
    for edge in introspect.face_edges(face) {
        let (a, b) = introspect.edge_vertices(edge);
        for v in [a, b] {
            if !vertices.contains(&v) {
                vertices.push(v);
            }
        }
    }
    vertices
}

fn edge_between(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    a: KernelId,
    b: KernelId,
) -> Option<KernelId> {
    introspect.list_edges(solid).into_iter().find(|edge| {
        let (s, e) = introspect.edge_vertices(*edge);
        (s == a && e == b) || (s == b && e == a)
    })
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}
