use crate::types::*;

/// Core geometry kernel trait. The boundary representation work (boxes,
/// folds, fillets) lives behind this seam; sheet operations only orchestrate it.
///
/// Every operation returns a NEW solid. Input solids are never modified.
pub trait Kernel {
    /// Axis-aligned rectangular solid with its minimum corner at `origin`.
    /// `size` is `[length (X), width (Y), thickness (Z)]`.
    fn make_box(&mut self, origin: [f64; 3], size: [f64; 3])
        -> Result<KernelSolidHandle, KernelError>;

    /// Fold each of the given sheet edge faces into a new wall.
    fn fold_faces(
        &mut self,
        solid: &KernelSolidHandle,
        faces: &[KernelId],
        params: &FoldParams,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Fillet (round) the specified edges with the given radius.
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError>;
}

/// Topology introspection trait. Provides read-only queries on kernel geometry.
pub trait KernelIntrospect {
    /// List all faces of a solid.
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all edges of a solid.
    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all vertices of a solid.
    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// Get the edges bounding a face.
    fn face_edges(&self, face: KernelId) -> Vec<KernelId>;

    /// Get the faces adjacent to an edge.
    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId>;

    /// Get the vertices at the ends of an edge.
    fn edge_vertices(&self, edge: KernelId) -> (KernelId, KernelId);

    /// Position of a vertex, if it exists.
    fn vertex_position(&self, vertex: KernelId) -> Option<[f64; 3]>;

    /// Compute the geometric signature of a single entity.
    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature;

    /// Compute signatures for all entities of a given kind in a solid.
    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)>;
}
