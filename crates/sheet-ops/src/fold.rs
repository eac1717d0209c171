use std::fmt;

use sheet_kernel::{FoldParams, KernelId, KernelSolidHandle};
use sheet_types::{OutputKey, Role};
use tracing::{debug, instrument};

use crate::diff;
use crate::kernel_ext::KernelBundle;
use crate::types::{BodyOutput, Diagnostics, OpError, OpResult, Provenance};

/// Which fold of a staged base shape is being applied. Decides the role
/// given to the planar faces the fold creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldStage {
    Walls,
    Flanges,
}

impl FoldStage {
    fn planar_role(self, index: usize) -> Role {
        match self {
            FoldStage::Walls => Role::WallFace { index },
            FoldStage::Flanges => Role::FlangeFace { index },
        }
    }
}

impl fmt::Display for FoldStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldStage::Walls => f.write_str("wall"),
            FoldStage::Flanges => f.write_str("flange"),
        }
    }
}

/// Fold the given faces of `solid` and return the new solid.
///
/// `prior_roles` are the roles already held by entities of `solid`; those
/// that survive are carried over to their new IDs, and bend numbering
/// continues after the bends already present.
#[instrument(skip(kb, prior_roles, faces, params), fields(face_count = faces.len()))]
pub fn execute_fold(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    prior_roles: &[(KernelId, Role)],
    faces: &[KernelId],
    params: &FoldParams,
    stage: FoldStage,
) -> Result<OpResult, OpError> {
    if faces.is_empty() {
        return Err(OpError::EmptySelection {
            stage: stage.to_string(),
        });
    }
    if !(params.length > 0.0) {
        return Err(OpError::InvalidParameter {
            reason: format!("{} length must be positive, got {}", stage, params.length),
        });
    }

    let mut before = diff::snapshot(kb.as_introspect(), solid);
    // The folded faces become bends; they never survive into the result.
    let consumed = before.take_faces(faces);

    let handle = kb.fold_faces(solid, faces, params)?;

    let after = diff::snapshot(kb.as_introspect(), &handle);
    let diff_result = diff::diff(&before, &after);

    let mut role_assignments = diff_result.carry_roles(prior_roles);
    let mut bend_index = prior_roles
        .iter()
        .filter(|(_, r)| matches!(r, Role::BendFace { .. }))
        .count();
    let mut planar_index = 0;
    for record in diff_result
        .created
        .iter()
        .filter(|r| r.kind == sheet_types::TopoKind::Face)
    {
        if record.signature.is_cylindrical() {
            role_assignments.push((record.kernel_id, Role::BendFace { index: bend_index }));
            bend_index += 1;
        } else {
            role_assignments.push((record.kernel_id, stage.planar_role(planar_index)));
            planar_index += 1;
        }
    }
    debug!(
        %stage,
        planar = planar_index,
        bends = bend_index,
        "fold created faces"
    );

    let mut deleted = diff_result.deleted;
    deleted.extend(consumed);

    Ok(OpResult {
        outputs: vec![(OutputKey::Main, BodyOutput { handle })],
        provenance: Provenance {
            created: diff_result.created,
            deleted,
            role_assignments,
        },
        diagnostics: Diagnostics::default(),
    })
}
