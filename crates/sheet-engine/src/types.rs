use serde::{Deserialize, Serialize};
use sheet_ops::BaseShapeRequest;
use sheet_types::{GeomRef, TopoSignature};
use uuid::Uuid;

use crate::config::ConfigError;
use crate::definition::{DefinitionError, SheetMetalDefinition};

/// The ordered list of sheet-metal features.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureTree {
    /// Ordered list of features. Index 0 is the first feature.
    pub features: Vec<Feature>,
}

impl FeatureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Features that take part in a rebuild.
    pub fn active_features(&self) -> impl Iterator<Item = (usize, &Feature)> {
        self.features
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.suppressed)
    }
}

/// A single feature in the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Unique identifier.
    pub id: Uuid,
    /// User-visible name.
    pub name: String,
    /// The modeling operation this feature performs.
    pub operation: Operation,
    /// Whether this feature is suppressed.
    pub suppressed: bool,
    /// Take thickness and radius from the document's sheet-metal definition
    /// whenever it changes.
    pub follows_definition: bool,
}

/// A sheet-metal operation with its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    BaseShape { params: BaseShapeRequest },
    SolidBend { params: SolidBendParams },
}

impl Operation {
    /// Which definition fields this operation's parameters carry.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Operation::BaseShape { .. } => Capabilities::THICKNESS_RADIUS,
            Operation::SolidBend { .. } => Capabilities::THICKNESS_RADIUS,
        }
    }

    /// Overwrite the parameters named by [`Operation::capabilities`] with
    /// the definition's values. Returns whether anything changed.
    pub fn apply_definition(&mut self, definition: &SheetMetalDefinition) -> bool {
        let caps = self.capabilities();
        let (thickness, radius) = match self {
            Operation::BaseShape { params } => (&mut params.dims.thickness, &mut params.dims.radius),
            Operation::SolidBend { params } => (&mut params.thickness, &mut params.radius),
        };
        let mut changed = false;
        let mut set = |field: &mut f64, value: f64| {
            if *field != value {
                *field = value;
                changed = true;
            }
        };
        if caps.thickness {
            set(thickness, definition.thickness);
        }
        if caps.radius {
            set(radius, definition.radius);
        }
        changed
    }
}

/// Definition fields a parameter record declares. Propagation writes only
/// the declared ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub thickness: bool,
    pub radius: bool,
}

impl Capabilities {
    pub const THICKNESS_RADIUS: Capabilities = Capabilities {
        thickness: true,
        radius: true,
    };
}

/// Parameters for a solid bend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidBendParams {
    /// Outer edges of the corners to bend. The first one also picks the solid.
    pub edges: Vec<BendEdge>,
    /// Inner bend radius.
    pub radius: f64,
    /// Nominal sheet thickness. The bend itself measures the thickness.
    pub thickness: f64,
}

/// One selected outer edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BendEdge {
    pub reference: GeomRef,
    /// Signature captured at selection time, tried when `reference` no
    /// longer resolves.
    #[serde(default)]
    pub fallback: Option<TopoSignature>,
}

impl From<GeomRef> for BendEdge {
    fn from(reference: GeomRef) -> Self {
        Self {
            reference,
            fallback: None,
        }
    }
}

/// Errors from the feature engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("feature not found: {id}")]
    FeatureNotFound { id: Uuid },

    #[error("GeomRef resolution failed: {reason}")]
    ResolutionFailed { reason: String },

    #[error("sheet-metal definition: {0}")]
    Definition(#[from] DefinitionError),

    #[error("operation error: {0}")]
    Op(#[from] sheet_ops::OpError),

    #[error("kernel error: {0}")]
    Kernel(#[from] sheet_kernel::KernelError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
}
