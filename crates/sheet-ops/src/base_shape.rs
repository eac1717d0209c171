//! Base shapes: a flat blank with up to four walls and, for hats and boxes,
//! a flange folded off the top of every wall.
//!
//! The user gives the outer envelope of the finished part. [`resolve`]
//! turns that into the blank size, wall and flange lengths and blank
//! placement that make the folded result land on that envelope, and
//! [`execute_base_shape`] drives the kernel through
//! `blank -> walls -> flanges`, each step producing a new solid.

use serde::{Deserialize, Serialize};
use sheet_kernel::{FoldParams, KernelId};
use sheet_types::{AnchorSide, OriginAnchor, OutputKey, Role, ShapeArchetype, TopoKind};
use tracing::{debug, instrument};

use crate::diff::{self, TopoSnapshot};
use crate::fold::{execute_fold, FoldStage};
use crate::kernel_ext::KernelBundle;
use crate::select::FaceSelector;
use crate::types::{BodyOutput, Diagnostics, OpError, OpResult, Provenance};

/// Nominal dimensions of a base shape, all in model length units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseShapeDims {
    pub thickness: f64,
    /// Inner bend radius.
    pub radius: f64,
    /// Outer extent along Y.
    pub width: f64,
    /// Outer extent along X.
    pub length: f64,
    /// Outer extent along Z.
    pub height: f64,
    /// Outer width of the top flange (Hat and Box only).
    pub flange_width: f64,
}

/// Bend-compensated dimensions and placement of the flat blank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBaseShape {
    pub net_width: f64,
    pub net_length: f64,
    /// Straight wall length of the first fold stage.
    pub net_height: f64,
    /// Straight flange length of the second fold stage.
    pub net_flange_width: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub fold_count: u8,
    pub compensation_x: f64,
    pub compensation_y: f64,
    /// `thickness + radius`: what one bend adds to the outer envelope.
    pub bend_compensation: f64,
}

/// Placement offset along one axis for the chosen anchor side.
pub fn origin_shift(dimension: f64, side: AnchorSide, compensation: f64) -> f64 {
    match side {
        AnchorSide::Positive => -dimension - compensation,
        AnchorSide::Center => -dimension / 2.0,
        AnchorSide::Negative => compensation,
    }
}

/// Compute the blank and fold parameters that produce `dims` as the outer
/// envelope of a folded `archetype`, anchored at `origin`.
///
/// Any resolved width, length, height or flange width below the sheet
/// thickness is raised to the thickness.
pub fn resolve(
    archetype: ShapeArchetype,
    dims: &BaseShapeDims,
    origin: OriginAnchor,
) -> ResolvedBaseShape {
    let bend_compensation = dims.thickness + dims.radius;
    let mut width = dims.width;
    let mut length = dims.length;
    let mut height = dims.height - bend_compensation;
    let mut flange_width = dims.flange_width;
    let mut compensation_x = 0.0;
    let mut compensation_y = 0.0;

    match archetype {
        ShapeArchetype::Flat => {}
        ShapeArchetype::LShape => {
            width -= bend_compensation;
        }
        ShapeArchetype::UShape => {
            width -= 2.0 * bend_compensation;
            compensation_y = bend_compensation;
        }
        ShapeArchetype::Tub | ShapeArchetype::Hat | ShapeArchetype::Box => {
            width -= 2.0 * bend_compensation;
            length -= 2.0 * bend_compensation;
            compensation_x = bend_compensation;
            compensation_y = bend_compensation;
        }
    }
    if archetype.has_flange_stage() {
        height -= bend_compensation;
        flange_width -= dims.radius;
    }

    let floor = |value: f64| value.max(dims.thickness);
    let width = floor(width);
    let length = floor(length);
    let height = floor(height);
    let flange_width = floor(flange_width);

    let offset_x = origin_shift(length, origin.x, compensation_x);
    let mut offset_y = origin_shift(width, origin.y, compensation_y);
    // The single wall of an L sits on +Y, so it is the outermost edge there.
    if archetype == ShapeArchetype::LShape && origin.y == AnchorSide::Positive {
        offset_y -= bend_compensation;
    }

    ResolvedBaseShape {
        net_width: width,
        net_length: length,
        net_height: height,
        net_flange_width: flange_width,
        offset_x,
        offset_y,
        fold_count: archetype.fold_count(),
        compensation_x,
        compensation_y,
        bend_compensation,
    }
}

/// [`resolve`] for textual archetype and anchor names such as `"U-Shape"`
/// and `"+X,-Y"`.
pub fn resolve_named(
    archetype: &str,
    dims: &BaseShapeDims,
    origin: &str,
) -> Result<ResolvedBaseShape, OpError> {
    let archetype: ShapeArchetype = archetype.parse()?;
    let origin: OriginAnchor = origin.parse()?;
    Ok(resolve(archetype, dims, origin))
}

/// Everything needed to build one base shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseShapeRequest {
    pub archetype: ShapeArchetype,
    pub dims: BaseShapeDims,
    pub origin: OriginAnchor,
    /// Extend walls and flanges so adjoining corners close.
    pub fill_gaps: bool,
}

/// Build a base shape: flat blank, first-stage walls, and for Hat/Box a
/// second-stage flange.
///
/// Outputs: `Main` is the finished solid, `Stage { 0 }` the flat blank and,
/// when a flange stage runs, `Stage { 1 }` the walled intermediate.
#[instrument(skip(kb, request), fields(archetype = %request.archetype, origin = %request.origin))]
pub fn execute_base_shape(
    kb: &mut dyn KernelBundle,
    request: &BaseShapeRequest,
) -> Result<OpResult, OpError> {
    let dims = &request.dims;
    if !(dims.thickness > 0.0) {
        return Err(OpError::InvalidParameter {
            reason: format!("sheet thickness must be positive, got {}", dims.thickness),
        });
    }

    let resolved = resolve(request.archetype, dims, request.origin);
    debug!(?resolved, "resolved base shape");

    let blank = kb.make_box(
        [resolved.offset_x, resolved.offset_y, 0.0],
        [resolved.net_length, resolved.net_width, dims.thickness],
    )?;
    let blank_roles: Vec<(KernelId, Role)> = kb
        .as_introspect()
        .list_faces(&blank)
        .into_iter()
        .enumerate()
        .map(|(index, id)| (id, Role::BlankFace { index }))
        .collect();

    let mut outputs = vec![(
        OutputKey::Stage { index: 0 },
        BodyOutput {
            handle: blank.clone(),
        },
    )];

    if resolved.fold_count == 0 {
        outputs.insert(0, (OutputKey::Main, BodyOutput { handle: blank.clone() }));
        return Ok(finish(kb, outputs, blank_roles, &blank));
    }

    let fold = |length: f64, flipped: bool| FoldParams {
        thickness: dims.thickness,
        length,
        radius: dims.radius,
        flipped,
        automiter: request.fill_gaps,
    };

    let walls_selector = FaceSelector::Lateral {
        fold_count: resolved.fold_count,
    };
    let wall_faces = walls_selector.select(kb.as_introspect(), &blank);
    debug!(selected = wall_faces.len(), "wall stage selection");
    let walls = execute_fold(
        kb,
        &blank,
        &blank_roles,
        &wall_faces,
        &fold(resolved.net_height, false),
        FoldStage::Walls,
    )?;
    let walled = main_handle(&walls)?;

    if !request.archetype.has_flange_stage() {
        outputs.insert(0, (OutputKey::Main, BodyOutput { handle: walled.clone() }));
        return Ok(finish(kb, outputs, walls.provenance.role_assignments, &walled));
    }

    let flange_selector = FaceSelector::RaisedTop {
        min_height: resolved.bend_compensation,
    };
    let flange_faces = flange_selector.select(kb.as_introspect(), &walled);
    debug!(selected = flange_faces.len(), "flange stage selection");
    let flanges = execute_fold(
        kb,
        &walled,
        &walls.provenance.role_assignments,
        &flange_faces,
        &fold(resolved.net_flange_width, request.archetype.flips_flange()),
        FoldStage::Flanges,
    )?;
    let finished = main_handle(&flanges)?;

    outputs.push((
        OutputKey::Stage { index: 1 },
        BodyOutput {
            handle: walled.clone(),
        },
    ));
    outputs.insert(0, (OutputKey::Main, BodyOutput { handle: finished.clone() }));
    Ok(finish(kb, outputs, flanges.provenance.role_assignments, &finished))
}

fn main_handle(result: &OpResult) -> Result<sheet_kernel::KernelSolidHandle, OpError> {
    result.main().cloned().ok_or_else(|| OpError::InvalidParameter {
        reason: "fold produced no solid".to_string(),
    })
}

/// A base shape starts from nothing, so everything in the final solid is created.
fn finish(
    kb: &dyn KernelBundle,
    outputs: Vec<(OutputKey, BodyOutput)>,
    role_assignments: Vec<(KernelId, Role)>,
    finished: &sheet_kernel::KernelSolidHandle,
) -> OpResult {
    let after = diff::snapshot(kb.as_introspect(), finished);
    let created = diff::diff(&TopoSnapshot::default(), &after).created;
    debug!(
        faces = created.iter().filter(|r| r.kind == TopoKind::Face).count(),
        "base shape built"
    );
    OpResult {
        outputs,
        provenance: Provenance {
            created,
            deleted: Vec::new(),
            role_assignments,
        },
        diagnostics: Diagnostics::default(),
    }
}
