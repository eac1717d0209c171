//! MockKernel: deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Models a sheet-metal part as a set of rectangular plates joined by
//! cylindrical bend faces. Entity counts and signatures are predictable, so
//! face selection and provenance can be tested without a real B-rep kernel.

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

/// Face definition tuple: (edge_indices, normal, centroid, area).
type FaceDef = (Vec<usize>, [f64; 3], [f64; 3], f64);

/// A mock vertex with known position.
#[derive(Debug, Clone)]
struct MockVertex {
    id: KernelId,
    position: [f64; 3],
}

/// A mock edge with known endpoints.
#[derive(Debug, Clone)]
struct MockEdge {
    id: KernelId,
    start: KernelId,
    end: KernelId,
    length: f64,
}

/// A mock face with known properties.
#[derive(Debug, Clone)]
struct MockFace {
    id: KernelId,
    edges: Vec<KernelId>,
    normal: [f64; 3],
    centroid: [f64; 3],
    area: f64,
    surface_type: String,
    /// Index of the plate this planar face bounds. Bend faces have none.
    plate: Option<usize>,
}

/// A flat piece of sheet. `up_axis`/`up_sign` give the side an unflipped
/// fold grows toward.
#[derive(Debug, Clone)]
struct MockPlate {
    min: [f64; 3],
    max: [f64; 3],
    up_axis: usize,
    up_sign: f64,
}

/// A synthetic solid with deterministic topology.
#[derive(Debug, Clone, Default)]
struct MockSolid {
    vertices: Vec<MockVertex>,
    edges: Vec<MockEdge>,
    faces: Vec<MockFace>,
    plates: Vec<MockPlate>,
}

/// One validated fold request within a `fold_faces` call.
#[derive(Debug, Clone)]
struct FoldTarget {
    face: KernelId,
    plate: usize,
    normal_axis: usize,
    normal_sign: f64,
    centroid: [f64; 3],
}

/// Deterministic test double for the geometry kernel.
/// Implements both Kernel and KernelIntrospect.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    /// Number of solids held by the kernel, including every intermediate result.
    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn solid(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    fn all_faces(&self) -> impl Iterator<Item = &MockFace> {
        self.solids.values().flat_map(|s| s.faces.iter())
    }

    fn store(&mut self, solid: MockSolid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    /// Box topology with 8 vertices, 12 edges, 6 faces spanning `min..max`.
    /// Faces are ordered bottom, top, front, back, left, right.
    fn box_topology(
        &mut self,
        min: [f64; 3],
        max: [f64; 3],
        plate: usize,
    ) -> (Vec<MockVertex>, Vec<MockEdge>, Vec<MockFace>) {
        let [x0, y0, z0] = min;
        let [x1, y1, z1] = max;
        let (w, h, d) = (x1 - x0, y1 - y0, z1 - z0);
        let (cx, cy, cz) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0, (z0 + z1) / 2.0);

        let positions = [
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ];

        let verts: Vec<MockVertex> = positions
            .iter()
            .map(|&pos| MockVertex {
                id: self.alloc_id(),
                position: pos,
            })
            .collect();

        // 4 bottom, 4 top, 4 vertical
        let edge_pairs = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];

        let edges: Vec<MockEdge> = edge_pairs
            .iter()
            .map(|&(si, ei)| MockEdge {
                id: self.alloc_id(),
                start: verts[si].id,
                end: verts[ei].id,
                length: distance(positions[si], positions[ei]),
            })
            .collect();

        let face_defs: Vec<FaceDef> = vec![
            (vec![0, 1, 2, 3], [0.0, 0.0, -1.0], [cx, cy, z0], w * h),
            (vec![4, 5, 6, 7], [0.0, 0.0, 1.0], [cx, cy, z1], w * h),
            (vec![0, 9, 4, 8], [0.0, -1.0, 0.0], [cx, y0, cz], w * d),
            (vec![2, 11, 6, 10], [0.0, 1.0, 0.0], [cx, y1, cz], w * d),
            (vec![3, 8, 7, 11], [-1.0, 0.0, 0.0], [x0, cy, cz], h * d),
            (vec![1, 10, 5, 9], [1.0, 0.0, 0.0], [x1, cy, cz], h * d),
        ];

        let faces: Vec<MockFace> = face_defs
            .into_iter()
            .map(|(edge_indices, normal, centroid, area)| MockFace {
                id: self.alloc_id(),
                edges: edge_indices.iter().map(|&i| edges[i].id).collect(),
                normal,
                centroid,
                area,
                surface_type: "planar".to_string(),
                plate: Some(plate),
            })
            .collect();

        (verts, edges, faces)
    }

    /// Copy a solid under fresh IDs, leaving out the given edges and faces.
    fn copy_solid(
        &mut self,
        source: &MockSolid,
        skip_edges: &HashSet<KernelId>,
        skip_faces: &HashSet<KernelId>,
    ) -> (MockSolid, HashMap<KernelId, KernelId>) {
        let mut id_map: HashMap<KernelId, KernelId> = HashMap::new();

        let mut vertices = Vec::with_capacity(source.vertices.len());
        for v in &source.vertices {
            let new_id = self.alloc_id();
            id_map.insert(v.id, new_id);
            vertices.push(MockVertex {
                id: new_id,
                position: v.position,
            });
        }

        let mut edges = Vec::with_capacity(source.edges.len());
        for e in &source.edges {
            if skip_edges.contains(&e.id) {
                continue;
            }
            let new_id = self.alloc_id();
            id_map.insert(e.id, new_id);
            edges.push(MockEdge {
                id: new_id,
                start: id_map[&e.start],
                end: id_map[&e.end],
                length: e.length,
            });
        }

        let mut faces = Vec::with_capacity(source.faces.len());
        for f in &source.faces {
            if skip_faces.contains(&f.id) {
                continue;
            }
            let new_id = self.alloc_id();
            id_map.insert(f.id, new_id);
            faces.push(MockFace {
                id: new_id,
                edges: f.edges.iter().filter_map(|e| id_map.get(e).copied()).collect(),
                normal: f.normal,
                centroid: f.centroid,
                area: f.area,
                surface_type: f.surface_type.clone(),
                plate: f.plate,
            });
        }

        let solid = MockSolid {
            vertices,
            edges,
            faces,
            plates: source.plates.clone(),
        };
        (solid, id_map)
    }

    /// Validate one face of a fold request against the source solid.
    fn fold_target(source: &MockSolid, face_id: KernelId) -> Result<FoldTarget, KernelError> {
        let face = source
            .faces
            .iter()
            .find(|f| f.id == face_id)
            .ok_or(KernelError::EntityNotFound { id: face_id })?;
        let plate_index = face.plate.ok_or_else(|| KernelError::FoldFailed {
            reason: format!("face {:?} is not a planar sheet face", face_id),
        })?;
        let plate = &source.plates[plate_index];
        let normal_axis = dominant_axis(face.normal);
        if normal_axis == plate.up_axis {
            return Err(KernelError::FoldFailed {
                reason: format!("face {:?} is a sheet surface, not an edge face", face_id),
            });
        }
        Ok(FoldTarget {
            face: face_id,
            plate: plate_index,
            normal_axis,
            normal_sign: face.normal[normal_axis].signum(),
            centroid: face.centroid,
        })
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

fn dominant_axis(v: [f64; 3]) -> usize {
    let mut axis = 0;
    for i in 1..3 {
        if v[i].abs() > v[axis].abs() {
            axis = i;
        }
    }
    axis
}

fn unit(axis: usize, sign: f64) -> [f64; 3] {
    let mut v = [0.0; 3];
    v[axis] = sign;
    v
}

impl Kernel for MockKernel {
    fn make_box(
        &mut self,
        origin: [f64; 3],
        size: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        if size.iter().any(|&s| !(s > 0.0)) {
            return Err(KernelError::InvalidGeometry {
                reason: format!("box size must be positive, got {:?}", size),
            });
        }
        let max = [origin[0] + size[0], origin[1] + size[1], origin[2] + size[2]];
        let (vertices, edges, faces) = self.box_topology(origin, max, 0);
        let solid = MockSolid {
            vertices,
            edges,
            faces,
            plates: vec![MockPlate {
                min: origin,
                max,
                up_axis: 2,
                up_sign: 1.0,
            }],
        };
        Ok(self.store(solid))
    }

    fn fold_faces(
        &mut self,
        solid: &KernelSolidHandle,
        faces: &[KernelId],
        params: &FoldParams,
    ) -> Result<KernelSolidHandle, KernelError> {
        if faces.is_empty() {
            return Err(KernelError::FoldFailed {
                reason: "no faces selected".to_string(),
            });
        }
        if !(params.thickness > 0.0) || !(params.length > 0.0) || !(params.radius > 0.0) {
            return Err(KernelError::FoldFailed {
                reason: format!(
                    "thickness, length and radius must be positive \
                     (thickness {}, length {}, radius {})",
                    params.thickness, params.length, params.radius
                ),
            });
        }
        let source = self.solid(solid)?.clone();

        let targets = faces
            .iter()
            .map(|&face_id| Self::fold_target(&source, face_id))
            .collect::<Result<Vec<_>, _>>()?;

        let folded: HashSet<KernelId> = faces.iter().copied().collect();
        let (mut result, _) = self.copy_solid(&source, &HashSet::new(), &folded);

        let r = params.radius;
        let t = params.thickness;

        for target in &targets {
            let plate = source.plates[target.plate].clone();
            let kn = target.normal_axis;
            let sn = target.normal_sign;
            let ks = plate.up_axis;
            let ku = 3 - kn - ks;
            let sg = if params.flipped {
                -plate.up_sign
            } else {
                plate.up_sign
            };

            let mut min = [0.0; 3];
            let mut max = [0.0; 3];

            // Across the face: the wall sits one radius beyond the folded face.
            let c = if sn > 0.0 { plate.max[kn] } else { plate.min[kn] };
            if sn > 0.0 {
                min[kn] = c + r;
                max[kn] = c + r + t;
            } else {
                min[kn] = c - r - t;
                max[kn] = c - r;
            }

            // Along the fold direction: starts level with the bend center.
            let center_s = if sg > 0.0 {
                plate.max[ks] + r
            } else {
                plate.min[ks] - r
            };
            if sg > 0.0 {
                min[ks] = center_s;
                max[ks] = center_s + params.length;
            } else {
                min[ks] = center_s - params.length;
                max[ks] = center_s;
            }

            // Along the bend line: the face's span, widened toward folded neighbours.
            min[ku] = plate.min[ku];
            max[ku] = plate.max[ku];
            if params.automiter {
                let quarter = (plate.max[ku] - plate.min[ku]) / 4.0;
                for other in targets.iter().filter(|o| o.face != target.face) {
                    let offset = other.centroid[ku] - target.centroid[ku];
                    if offset > quarter {
                        max[ku] = plate.max[ku] + r + t;
                    } else if offset < -quarter {
                        min[ku] = plate.min[ku] - r - t;
                    }
                }
            }

            let plate_index = result.plates.len();
            result.plates.push(MockPlate {
                min,
                max,
                up_axis: kn,
                up_sign: -sn,
            });

            let (verts, edges, mut wall_faces) = self.box_topology(min, max, plate_index);
            // The end of the wall attached to the bend is not a boundary face.
            let attached = unit(ks, -sg);
            wall_faces.retain(|f| f.normal != attached);

            let mut center = [0.0; 3];
            center[kn] = c;
            center[ks] = center_s;
            center[ku] = (min[ku] + max[ku]) / 2.0;
            let span = max[ku] - min[ku];
            let mut outward = [0.0; 3];
            outward[kn] = sn * FRAC_1_SQRT_2;
            outward[ks] = -sg * FRAC_1_SQRT_2;

            for (bend_radius, normal_sign) in [(r, -1.0), (r + t, 1.0)] {
                let centroid = [
                    center[0] + outward[0] * bend_radius,
                    center[1] + outward[1] * bend_radius,
                    center[2] + outward[2] * bend_radius,
                ];
                let normal = [
                    outward[0] * normal_sign,
                    outward[1] * normal_sign,
                    outward[2] * normal_sign,
                ];
                let bend_face = MockFace {
                    id: self.alloc_id(),
                    edges: Vec::new(),
                    normal,
                    centroid,
                    area: bend_radius * FRAC_PI_2 * span,
                    surface_type: "cylindrical".to_string(),
                    plate: None,
                };
                result.faces.push(bend_face);
            }

            result.vertices.extend(verts);
            result.edges.extend(edges);
            result.faces.extend(wall_faces);
        }

        Ok(self.store(result))
    }

    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        if !(radius > 0.0) {
            return Err(KernelError::FilletFailed {
                reason: "radius must be positive".to_string(),
            });
        }
        let source = self.solid(solid)?.clone();

        // Validate that all requested edges exist
        for eid in edges {
            if !source.edges.iter().any(|e| e.id == *eid) {
                return Err(KernelError::FilletFailed {
                    reason: format!("edge {:?} not found in solid", eid),
                });
            }
        }

        // For each filleted edge: replace edge with a cylindrical face,
        // add 2 new edges (fillet boundaries) and 2 new vertices.
        // Topology: V+2n, E-n+2n=E+n, F+n where n = edges.len()
        let filleted: HashSet<KernelId> = edges.iter().copied().collect();
        let (mut result, id_map) = self.copy_solid(&source, &filleted, &HashSet::new());

        for orig_eid in edges {
            let Some(orig_edge) = source.edges.iter().find(|e| e.id == *orig_eid) else {
                continue;
            };
            let position = |id: KernelId| {
                source
                    .vertices
                    .iter()
                    .find(|v| v.id == id)
                    .map(|v| v.position)
                    .unwrap_or([0.0; 3])
            };
            let sp = position(orig_edge.start);
            let ep = position(orig_edge.end);

            // Two new vertices at fillet tangent points (offset from original edge endpoints)
            let v1 = MockVertex {
                id: self.alloc_id(),
                position: [sp[0] + radius * 0.01, sp[1] + radius * 0.01, sp[2]],
            };
            let v2 = MockVertex {
                id: self.alloc_id(),
                position: [ep[0] + radius * 0.01, ep[1] + radius * 0.01, ep[2]],
            };

            // Two new edges connecting fillet face to adjacent faces
            let e1 = MockEdge {
                id: self.alloc_id(),
                start: id_map[&orig_edge.start],
                end: v1.id,
                length: radius,
            };
            let e2 = MockEdge {
                id: self.alloc_id(),
                start: id_map[&orig_edge.end],
                end: v2.id,
                length: radius,
            };

            let fillet_face = MockFace {
                id: self.alloc_id(),
                edges: vec![e1.id, e2.id],
                normal: [0.0, 0.0, 1.0], // approximate
                centroid: [
                    (sp[0] + ep[0]) / 2.0,
                    (sp[1] + ep[1]) / 2.0,
                    (sp[2] + ep[2]) / 2.0,
                ],
                area: orig_edge.length * radius * FRAC_PI_2,
                surface_type: "cylindrical".to_string(),
                plate: None,
            };

            result.vertices.push(v1);
            result.vertices.push(v2);
            result.edges.push(e1);
            result.edges.push(e2);
            result.faces.push(fillet_face);
        }

        Ok(self.store(result))
    }
}

impl KernelIntrospect for MockKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solid(solid)
            .map(|s| s.faces.iter().map(|f| f.id).collect())
            .unwrap_or_default()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solid(solid)
            .map(|s| s.edges.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solid(solid)
            .map(|s| s.vertices.iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        self.all_faces()
            .find(|f| f.id == face)
            .map(|f| f.edges.clone())
            .unwrap_or_default()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        self.all_faces()
            .filter(|f| f.edges.contains(&edge))
            .map(|f| f.id)
            .collect()
    }

    // Unknown edges report the null vertex pair.
    fn edge_vertices(&self, edge: KernelId) -> (KernelId, KernelId) {
        self.solids
            .values()
            .flat_map(|s| s.edges.iter())
            .find(|e| e.id == edge)
            .map_or((KernelId(0), KernelId(0)), |e| (e.start, e.end))
    }

    fn vertex_position(&self, vertex: KernelId) -> Option<[f64; 3]> {
        self.solids
            .values()
            .flat_map(|s| s.vertices.iter())
            .find(|v| v.id == vertex)
            .map(|v| v.position)
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        for solid in self.solids.values() {
            match kind {
                TopoKind::Face => {
                    if let Some(f) = solid.faces.iter().find(|f| f.id == entity) {
                        return TopoSignature {
                            surface_type: Some(f.surface_type.clone()),
                            area: Some(f.area),
                            centroid: Some(f.centroid),
                            normal: Some(f.normal),
                            length: None,
                        };
                    }
                }
                TopoKind::Edge => {
                    if let Some(e) = solid.edges.iter().find(|e| e.id == entity) {
                        let sv = solid.vertices.iter().find(|v| v.id == e.start);
                        let ev = solid.vertices.iter().find(|v| v.id == e.end);
                        let centroid = match (sv, ev) {
                            (Some(s), Some(e)) => Some([
                                (s.position[0] + e.position[0]) / 2.0,
                                (s.position[1] + e.position[1]) / 2.0,
                                (s.position[2] + e.position[2]) / 2.0,
                            ]),
                            _ => None,
                        };
                        return TopoSignature {
                            surface_type: Some("line".to_string()),
                            area: None,
                            centroid,
                            normal: None,
                            length: Some(e.length),
                        };
                    }
                }
                TopoKind::Vertex => {
                    if let Some(v) = solid.vertices.iter().find(|v| v.id == entity) {
                        return TopoSignature {
                            surface_type: Some("point".to_string()),
                            area: None,
                            centroid: Some(v.position),
                            normal: None,
                            length: None,
                        };
                    }
                }
            }
        }
        TopoSignature::empty()
    }

    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)> {
        let ids = match kind {
            TopoKind::Face => self.list_faces(solid),
            TopoKind::Edge => self.list_edges(solid),
            TopoKind::Vertex => self.list_vertices(solid),
        };
        ids.into_iter()
            .map(|id| {
                let sig = self.compute_signature(id, kind);
                (id, sig)
            })
            .collect()
    }
}
