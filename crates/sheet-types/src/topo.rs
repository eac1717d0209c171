use serde::{Deserialize, Serialize};

/// The kind of topological entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopoKind {
    Vertex,
    Edge,
    Face,
}

/// Geometric signature of a topological entity.
/// Used for face selection and for signature-based matching when role-based resolution fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopoSignature {
    /// Surface type (planar, cylindrical) for faces, "line" for edges, "point" for vertices.
    pub surface_type: Option<String>,
    /// Surface area (for faces).
    pub area: Option<f64>,
    /// Centroid position [x, y, z].
    pub centroid: Option<[f64; 3]>,
    /// Outward-pointing normal (for faces).
    pub normal: Option<[f64; 3]>,
    /// Edge length (for edges).
    pub length: Option<f64>,
}

impl TopoSignature {
    pub fn empty() -> Self {
        Self {
            surface_type: None,
            area: None,
            centroid: None,
            normal: None,
            length: None,
        }
    }

    pub fn is_planar(&self) -> bool {
        self.surface_type.as_deref() == Some("planar")
    }

    pub fn is_cylindrical(&self) -> bool {
        self.surface_type.as_deref() == Some("cylindrical")
    }
}
