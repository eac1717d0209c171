use serde::{Deserialize, Serialize};

/// Semantic role assigned to topological entities by sheet-metal operations.
/// Roles provide stable, meaningful names for geometry that survive topology changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Role {
    /// A face of the flat blank the part is folded from.
    BlankFace { index: usize },
    /// A planar face created by the first fold stage (the side walls).
    WallFace { index: usize },
    /// A planar face created by the second fold stage (the top flange).
    FlangeFace { index: usize },
    /// A cylindrical face created by a fold.
    BendFace { index: usize },
    /// A face rounded by a solid bend.
    BendRelief { index: usize },
}
