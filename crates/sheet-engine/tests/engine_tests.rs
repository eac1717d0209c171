use std::f64::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use sheet_engine::config::EngineConfig;
use sheet_engine::definition::{BendTableRow, SheetMetalDefinition};
use sheet_engine::resolve::{resolve_geom_ref, resolve_with_fallback};
use sheet_engine::types::*;
use sheet_engine::Engine;
use sheet_kernel::{KernelId, KernelIntrospect, MockKernel};
use sheet_types::*;
use uuid::Uuid;

fn base_shape_op(engine: &Engine, archetype: ShapeArchetype) -> Operation {
    let mut params = engine.base_shape_defaults();
    params.archetype = archetype;
    Operation::BaseShape { params }
}

/// Signature of the +Y top edge of the default centred flat blank.
fn top_edge_signature(z: f64) -> TopoSignature {
    TopoSignature {
        surface_type: Some("line".to_string()),
        area: None,
        centroid: Some([0.0, 10.0, z]),
        normal: None,
        length: Some(30.0),
    }
}

fn solid_bend_op(edges: Vec<BendEdge>, radius: f64) -> Operation {
    Operation::SolidBend {
        params: SolidBendParams {
            edges,
            radius,
            thickness: 1.0,
        },
    }
}

fn top_edge_bend(base_id: Uuid, radius: f64) -> Operation {
    let edge = GeomRef::by_signature(TopoKind::Edge, base_id, top_edge_signature(1.0));
    solid_bend_op(vec![edge.into()], radius)
}

/// Flat blank plus a solid bend on its top +Y edge.
fn flat_with_bend(engine: &mut Engine, kernel: &mut MockKernel) -> (Uuid, Uuid) {
    let base = base_shape_op(engine, ShapeArchetype::Flat);
    let base_id = engine.add_feature("Base".to_string(), base, kernel).unwrap();
    let bend_id = engine
        .add_feature("Bend".to_string(), top_edge_bend(base_id, 2.0), kernel)
        .unwrap();
    (base_id, bend_id)
}

fn relief_areas(engine: &Engine, bend_id: Uuid) -> Vec<f64> {
    let result = engine.get_result(bend_id).unwrap();
    result
        .provenance
        .created
        .iter()
        .filter(|r| r.kind == TopoKind::Face && r.signature.is_cylindrical())
        .filter_map(|r| r.signature.area)
        .collect()
}

fn params_of(engine: &Engine, id: Uuid) -> (f64, f64) {
    match &engine.tree.find_feature(id).unwrap().operation {
        Operation::BaseShape { params } => (params.dims.thickness, params.dims.radius),
        Operation::SolidBend { params } => (params.thickness, params.radius),
    }
}

// ── Feature Tree Tests ─────────────────────────────────────────────────────

#[test]
fn tree_add_feature() {
    let engine = Engine::new();
    let mut tree = FeatureTree::new();
    let id = tree.add_feature("Base".to_string(), base_shape_op(&engine, ShapeArchetype::Box));

    assert_eq!(tree.features.len(), 1);
    assert_eq!(tree.features[0].id, id);
    assert_eq!(tree.features[0].name, "Base");
    assert!(!tree.features[0].suppressed);
    assert!(tree.features[0].follows_definition);
}

#[test]
fn tree_remove_nonexistent_returns_error() {
    let mut tree = FeatureTree::new();
    let result = tree.remove_feature(Uuid::new_v4());
    assert!(matches!(result, Err(EngineError::FeatureNotFound { .. })));
}

#[test]
fn tree_reorder_feature() {
    let engine = Engine::new();
    let mut tree = FeatureTree::new();
    let a = tree.add_feature("A".to_string(), base_shape_op(&engine, ShapeArchetype::Flat));
    let b = tree.add_feature("B".to_string(), base_shape_op(&engine, ShapeArchetype::Tub));
    let c = tree.add_feature("C".to_string(), base_shape_op(&engine, ShapeArchetype::Hat));

    tree.reorder_feature(c, 0).unwrap();
    let order: Vec<Uuid> = tree.features.iter().map(|f| f.id).collect();
    assert_eq!(order, vec![c, a, b]);

    tree.reorder_feature(c, 99).unwrap();
    assert_eq!(tree.features[2].id, c);
}

#[test]
fn tree_suppress_feature() {
    let engine = Engine::new();
    let mut tree = FeatureTree::new();
    let a = tree.add_feature("A".to_string(), base_shape_op(&engine, ShapeArchetype::Flat));
    let b = tree.add_feature("B".to_string(), base_shape_op(&engine, ShapeArchetype::Box));

    tree.set_suppressed(a, true).unwrap();
    let active: Vec<Uuid> = tree.active_features().map(|(_, f)| f.id).collect();
    assert_eq!(active, vec![b]);
    assert!(tree.find_feature(a).unwrap().suppressed);
}

#[test]
fn tree_serializes_canonical_names() {
    let engine = Engine::new();
    let mut tree = FeatureTree::new();
    tree.add_feature("Base".to_string(), base_shape_op(&engine, ShapeArchetype::UShape));

    let json = serde_json::to_string(&tree).unwrap();
    assert!(json.contains("\"U-Shape\""));
    assert!(json.contains("\"0,0\""));

    let back: FeatureTree = serde_json::from_str(&json).unwrap();
    match &back.features[0].operation {
        Operation::BaseShape { params } => {
            assert_eq!(params.archetype, ShapeArchetype::UShape);
            assert_eq!(params.origin, OriginAnchor::centered());
        }
        other => panic!("unexpected operation {:?}", other),
    }
}

// ── Engine Integration Tests ───────────────────────────────────────────────

#[test]
fn engine_builds_every_archetype() {
    let expected = [
        (ShapeArchetype::Flat, 6),
        (ShapeArchetype::LShape, 12),
        (ShapeArchetype::UShape, 18),
        (ShapeArchetype::Tub, 30),
        (ShapeArchetype::Hat, 54),
        (ShapeArchetype::Box, 54),
    ];
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    for (archetype, faces) in expected {
        let id = engine
            .add_feature(
                archetype.to_string(),
                base_shape_op(&engine, archetype),
                &mut kernel,
            )
            .unwrap();
        let main = engine.get_result(id).unwrap().main().unwrap().clone();
        assert_eq!(kernel.list_faces(&main).len(), faces, "{archetype}");
    }
    assert!(engine.errors.is_empty());
}

#[test]
fn engine_solid_bend_on_base_shape() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let (_, bend_id) = flat_with_bend(&mut engine, &mut kernel);

    assert!(engine.errors.is_empty(), "{:?}", engine.errors);
    assert!(engine.warnings.is_empty(), "{:?}", engine.warnings);
    let main = engine.get_result(bend_id).unwrap().main().unwrap().clone();
    assert_eq!(kernel.list_faces(&main).len(), 8);

    let areas = relief_areas(&engine, bend_id);
    assert_eq!(areas.len(), 2);
    // Inner radius 2, outer radius 2 + measured thickness 1
    assert!(areas.iter().any(|a| (a - 30.0 * 2.0 * FRAC_PI_2).abs() < 1e-9));
    assert!(areas.iter().any(|a| (a - 30.0 * 3.0 * FRAC_PI_2).abs() < 1e-9));
}

#[test]
fn engine_edit_feature_triggers_rebuild() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let id = engine
        .add_feature(
            "Base".to_string(),
            base_shape_op(&engine, ShapeArchetype::Flat),
            &mut kernel,
        )
        .unwrap();

    engine
        .edit_feature(id, base_shape_op(&engine, ShapeArchetype::UShape), &mut kernel)
        .unwrap();

    let main = engine.get_result(id).unwrap().main().unwrap().clone();
    assert_eq!(kernel.list_faces(&main).len(), 18);
}

#[test]
fn engine_remove_dependency_errors_downstream() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let (base_id, bend_id) = flat_with_bend(&mut engine, &mut kernel);

    engine.remove_feature(base_id, &mut kernel).unwrap();

    assert_eq!(engine.tree.features.len(), 1);
    assert!(engine.get_result(base_id).is_none());
    assert!(engine.get_result(bend_id).is_none());
    assert_eq!(engine.errors.len(), 1);
    assert_eq!(engine.errors[0].0, bend_id);
}

#[test]
fn engine_suppress_dependency_and_restore() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let (base_id, bend_id) = flat_with_bend(&mut engine, &mut kernel);

    engine.set_suppressed(base_id, true, &mut kernel).unwrap();
    assert!(engine.get_result(base_id).is_none());
    assert_eq!(engine.errors.len(), 1);
    assert_eq!(engine.errors[0].0, bend_id);

    engine.set_suppressed(base_id, false, &mut kernel).unwrap();
    assert!(engine.errors.is_empty());
    assert!(engine.get_result(bend_id).is_some());
}

#[test]
fn engine_reorder_bend_before_base_fails() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let (base_id, bend_id) = flat_with_bend(&mut engine, &mut kernel);

    engine.reorder_feature(bend_id, 0, &mut kernel).unwrap();

    assert!(engine.get_result(base_id).is_some());
    assert!(engine.get_result(bend_id).is_none());
    assert_eq!(engine.errors.len(), 1);

    engine.reorder_feature(bend_id, 1, &mut kernel).unwrap();
    assert!(engine.errors.is_empty());
    assert!(engine.get_result(bend_id).is_some());
}

#[test]
fn engine_unknown_feature_errors() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let missing = Uuid::new_v4();

    assert!(matches!(
        engine.remove_feature(missing, &mut kernel),
        Err(EngineError::FeatureNotFound { .. })
    ));
    assert!(matches!(
        engine.set_suppressed(missing, true, &mut kernel),
        Err(EngineError::FeatureNotFound { .. })
    ));
    assert!(matches!(
        engine.reorder_feature(missing, 0, &mut kernel),
        Err(EngineError::FeatureNotFound { .. })
    ));
}

#[test]
fn engine_records_operation_errors_per_feature() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let mut params = engine.base_shape_defaults();
    params.dims.thickness = 0.0;

    let bad = engine
        .add_feature("Bad".to_string(), Operation::BaseShape { params }, &mut kernel)
        .unwrap();
    let good = engine
        .add_feature(
            "Good".to_string(),
            base_shape_op(&engine, ShapeArchetype::Tub),
            &mut kernel,
        )
        .unwrap();

    assert_eq!(engine.errors.len(), 1);
    assert_eq!(engine.errors[0].0, bad);
    assert!(engine.get_result(good).is_some());

    // Later edits replay only from the edited feature; the earlier failure stays
    engine
        .edit_feature(good, base_shape_op(&engine, ShapeArchetype::Box), &mut kernel)
        .unwrap();
    engine.set_suppressed(good, true, &mut kernel).unwrap();
    assert_eq!(engine.errors.len(), 1);
    assert_eq!(engine.errors[0].0, bad);
}

// ── Sheet-Metal Definition Tests ───────────────────────────────────────────

#[test]
fn definition_propagates_and_rebuilds() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let (base_id, bend_id) = flat_with_bend(&mut engine, &mut kernel);

    let definition = SheetMetalDefinition::new(1.5, 3.0, 0.4, "P30D16").unwrap();
    engine.set_definition(definition, &mut kernel).unwrap();

    assert_eq!(params_of(&engine, base_id), (1.5, 3.0));
    assert_eq!(params_of(&engine, bend_id), (1.5, 3.0));
    assert!(engine.errors.is_empty(), "{:?}", engine.errors);
    assert!(engine.warnings.is_empty(), "{:?}", engine.warnings);

    // Thicker blank, bigger radius: outer fillet is 3 + 1.5
    let areas = relief_areas(&engine, bend_id);
    assert!(areas.iter().any(|a| (a - 30.0 * 3.0 * FRAC_PI_2).abs() < 1e-9));
    assert!(areas.iter().any(|a| (a - 30.0 * 4.5 * FRAC_PI_2).abs() < 1e-9));
}

#[test]
fn definition_overwrite_keeps_k_factor() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let base_id = engine
        .add_feature(
            "Base".to_string(),
            base_shape_op(&engine, ShapeArchetype::Box),
            &mut kernel,
        )
        .unwrap();

    engine
        .set_definition(SheetMetalDefinition::new(2.0, 2.0, 0.5, "A").unwrap(), &mut kernel)
        .unwrap();
    engine
        .set_definition(SheetMetalDefinition::new(0.5, 0.8, 0.33, "B").unwrap(), &mut kernel)
        .unwrap();

    let definition = engine.definition().unwrap();
    assert_eq!(definition.toolset, "B");
    assert_eq!(definition.thickness, 0.5);
    assert_eq!(definition.radius, 0.8);
    assert_relative_eq!(definition.k_factor, 0.5);
    assert_eq!(params_of(&engine, base_id), (0.5, 0.8));
    assert!(engine.get_result(base_id).is_some());
}

#[test]
fn apply_definition_writes_thickness_and_radius() {
    let engine = Engine::new();
    let mut op = base_shape_op(&engine, ShapeArchetype::Tub);
    assert_eq!(op.capabilities(), Capabilities::THICKNESS_RADIUS);

    let definition = SheetMetalDefinition::new(2.0, 3.0, 0.4, "").unwrap();
    assert!(op.apply_definition(&definition));
    match &op {
        Operation::BaseShape { params } => {
            assert_eq!((params.dims.thickness, params.dims.radius), (2.0, 3.0));
            assert_eq!(params.dims.width, 20.0);
        }
        other => panic!("unexpected operation {:?}", other),
    }
    // Already in step with the definition
    assert!(!op.apply_definition(&definition));
}

#[test]
fn definition_skips_features_that_opt_out() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let (base_id, bend_id) = flat_with_bend(&mut engine, &mut kernel);

    engine
        .set_follows_definition(base_id, false, &mut kernel)
        .unwrap();
    engine
        .set_definition(SheetMetalDefinition::new(1.5, 3.0, 0.4, "").unwrap(), &mut kernel)
        .unwrap();

    assert_eq!(params_of(&engine, base_id), (1.0, 1.0));
    assert_eq!(params_of(&engine, bend_id), (1.5, 3.0));

    // Opting back in applies the current definition
    engine
        .set_follows_definition(base_id, true, &mut kernel)
        .unwrap();
    assert_eq!(params_of(&engine, base_id), (1.5, 3.0));
    assert!(engine.errors.is_empty());
}

#[test]
fn definition_rejects_invalid_values() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let invalid = SheetMetalDefinition {
        thickness: 1.0,
        radius: 1.0,
        k_factor: 2.0,
        toolset: String::new(),
    };

    let err = engine.set_definition(invalid, &mut kernel).unwrap_err();
    assert!(matches!(err, EngineError::Definition(_)));
    assert!(engine.definition().is_none());
}

#[test]
fn definition_from_bend_table_row() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let row = BendTableRow::parse(&["2,0", "", "P", "2,5", "0,45", "D", "2 mm"]).unwrap();

    engine
        .set_definition(row.to_definition().unwrap(), &mut kernel)
        .unwrap();

    let defaults = engine.base_shape_defaults();
    assert_eq!(defaults.dims.thickness, 2.0);
    assert_eq!(defaults.dims.radius, 2.5);
    assert_eq!(engine.definition().unwrap().toolset, "PD");
}

#[test]
fn base_shape_defaults_follow_config() {
    let config =
        EngineConfig::from_json(r#"{ "base_shape": { "archetype": "Hat", "thickness": 3.0 } }"#)
            .unwrap();
    let engine = Engine::with_config(config);

    let defaults = engine.base_shape_defaults();
    assert_eq!(defaults.archetype, ShapeArchetype::Hat);
    assert_eq!(defaults.dims.thickness, 3.0);
    assert_eq!(defaults.dims.radius, 1.0);
    assert_eq!(defaults.dims.height, 10.0);
}

// ── GeomRef Resolution Tests ──────────────────────────────────────────────

#[test]
fn resolve_by_role_finds_entity() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let id = engine
        .add_feature(
            "Box".to_string(),
            base_shape_op(&engine, ShapeArchetype::Box),
            &mut kernel,
        )
        .unwrap();

    let geom_ref = GeomRef::by_role(TopoKind::Face, id, Role::FlangeFace { index: 0 }, 0);
    let resolved = resolve_geom_ref(&geom_ref, &engine.feature_results, &kernel).unwrap();
    let expected = engine
        .get_result(id)
        .unwrap()
        .with_role(&Role::FlangeFace { index: 0 });
    assert_eq!(vec![resolved.kernel_id], expected);
    assert!(resolved.warnings.is_empty());
}

#[test]
fn resolve_role_index_policy() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let id = engine
        .add_feature(
            "Box".to_string(),
            base_shape_op(&engine, ShapeArchetype::Box),
            &mut kernel,
        )
        .unwrap();

    let strict = GeomRef::by_role(TopoKind::Face, id, Role::FlangeFace { index: 2 }, 3);
    assert!(matches!(
        resolve_geom_ref(&strict, &engine.feature_results, &kernel),
        Err(EngineError::ResolutionFailed { .. })
    ));

    let lenient = strict.with_policy(ResolvePolicy::BestEffort);
    let resolved = resolve_geom_ref(&lenient, &engine.feature_results, &kernel).unwrap();
    assert_eq!(resolved.warnings.len(), 1);

    let missing = GeomRef::by_role(TopoKind::Face, id, Role::BendRelief { index: 0 }, 0)
        .with_policy(ResolvePolicy::BestEffort);
    assert!(resolve_geom_ref(&missing, &engine.feature_results, &kernel).is_err());
}

#[test]
fn resolve_signature_in_stage_output() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let id = engine
        .add_feature(
            "Box".to_string(),
            base_shape_op(&engine, ShapeArchetype::Box),
            &mut kernel,
        )
        .unwrap();
    let result = engine.get_result(id).unwrap();
    let blank = result.output(&OutputKey::Stage { index: 0 }).unwrap().clone();

    // Top face of the 26 x 16 blank
    let signature = TopoSignature {
        surface_type: Some("planar".to_string()),
        area: Some(26.0 * 16.0),
        centroid: Some([0.0, 0.0, 1.0]),
        normal: Some([0.0, 0.0, 1.0]),
        length: None,
    };
    let mut geom_ref = GeomRef::by_signature(TopoKind::Face, id, signature);
    geom_ref.output_key = OutputKey::Stage { index: 0 };

    let resolved = resolve_geom_ref(&geom_ref, &engine.feature_results, &kernel).unwrap();
    assert!(kernel.list_faces(&blank).contains(&resolved.kernel_id));
    assert!(resolved.warnings.is_empty());

    // Roles only describe the finished solid
    let mut by_role = GeomRef::by_role(TopoKind::Face, id, Role::BlankFace { index: 1 }, 0);
    by_role.output_key = OutputKey::Stage { index: 0 };
    assert!(resolve_geom_ref(&by_role, &engine.feature_results, &kernel).is_err());
}

#[test]
fn resolve_signature_policy() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let base_id = engine
        .add_feature(
            "Base".to_string(),
            base_shape_op(&engine, ShapeArchetype::Flat),
            &mut kernel,
        )
        .unwrap();

    let nowhere = TopoSignature {
        surface_type: Some("line".to_string()),
        area: None,
        centroid: Some([500.0, 500.0, 500.0]),
        normal: None,
        length: Some(1000.0),
    };
    let strict = GeomRef::by_signature(TopoKind::Edge, base_id, nowhere);
    let bend_id = engine
        .add_feature(
            "Bend".to_string(),
            solid_bend_op(vec![strict.clone().into()], 1.0),
            &mut kernel,
        )
        .unwrap();
    assert_eq!(engine.errors.len(), 1);
    assert_eq!(engine.errors[0].0, bend_id);

    let lenient = strict.with_policy(ResolvePolicy::BestEffort);
    engine
        .edit_feature(bend_id, solid_bend_op(vec![lenient.into()], 1.0), &mut kernel)
        .unwrap();
    assert!(engine.errors.is_empty(), "{:?}", engine.errors);
    assert!(engine
        .warnings
        .iter()
        .any(|(id, w)| *id == bend_id && w.contains("Low-confidence")));
}

#[test]
fn resolve_with_fallback_uses_signature() {
    let mut kernel = MockKernel::new();
    let mut engine = Engine::new();
    let base_id = engine
        .add_feature(
            "Base".to_string(),
            base_shape_op(&engine, ShapeArchetype::Flat),
            &mut kernel,
        )
        .unwrap();

    // A flat blank has no bends, so the role reference cannot resolve
    let edge = BendEdge {
        reference: GeomRef::by_role(TopoKind::Edge, base_id, Role::BendFace { index: 0 }, 0),
        fallback: Some(top_edge_signature(1.0)),
    };
    let resolved = resolve_with_fallback(&edge, &engine.feature_results, &kernel).unwrap();
    assert_eq!(resolved.warnings.len(), 1);
    assert!(resolved.warnings[0].contains("Fell back"));

    let bend_id = engine
        .add_feature("Bend".to_string(), solid_bend_op(vec![edge], 2.0), &mut kernel)
        .unwrap();
    assert!(engine.get_result(bend_id).is_some());
    assert_eq!(engine.warnings.len(), 1);
    assert_eq!(engine.warnings[0].0, bend_id);

    // Adding a feature after the bend keeps the bend's warning
    let tub = base_shape_op(&engine, ShapeArchetype::Tub);
    engine.add_feature("Tub".to_string(), tub, &mut kernel).unwrap();
    assert_eq!(engine.warnings.len(), 1);
    assert_eq!(engine.warnings[0].0, bend_id);

    let no_fallback = BendEdge::from(GeomRef::by_role(
        TopoKind::Edge,
        base_id,
        Role::BendFace { index: 0 },
        0,
    ));
    assert!(resolve_with_fallback(&no_fallback, &engine.feature_results, &kernel).is_err());
}

#[test]
fn bend_edge_captures_configured_policy() {
    let config = EngineConfig::from_json(r#"{ "solid_bend_policy": { "type": "BestEffort" } }"#)
        .unwrap();
    let mut kernel = MockKernel::new();
    let mut engine = Engine::with_config(config);
    let base = base_shape_op(&engine, ShapeArchetype::Flat);
    let base_id = engine.add_feature("Base".to_string(), base, &mut kernel).unwrap();

    let main = engine.get_result(base_id).unwrap().main().unwrap().clone();
    let top_edge = kernel
        .compute_all_signatures(&main, TopoKind::Edge)
        .into_iter()
        .find(|(_, sig)| sig.centroid == Some([0.0, 10.0, 1.0]))
        .map(|(id, _)| id)
        .unwrap();

    let edge = engine.bend_edge(base_id, top_edge, &kernel).unwrap();
    assert_eq!(edge.reference.policy, ResolvePolicy::BestEffort);
    let resolved = resolve_with_fallback(&edge, &engine.feature_results, &kernel).unwrap();
    assert_eq!(resolved.kernel_id, top_edge);

    assert!(engine.bend_edge(base_id, KernelId(u64::MAX), &kernel).is_err());
    assert!(engine.bend_edge(Uuid::new_v4(), top_edge, &kernel).is_err());
}

#[test]
fn engine_from_missing_config_file() {
    let result = Engine::from_config_file("/nonexistent/sheet-engine.json");
    assert!(matches!(result, Err(EngineError::Config(_))));
}
