use sheet_kernel::{KernelId, KernelSolidHandle};
use sheet_types::{OutputKey, Role, TopoKind, TopoSignature};

/// Complete result of a modeling operation.
/// Contains everything sheet-engine needs to update the model state
/// and maintain persistent naming.
#[derive(Debug, Clone)]
pub struct OpResult {
    /// The output bodies produced by this operation.
    pub outputs: Vec<(OutputKey, BodyOutput)>,
    /// Provenance: what entities were created and deleted.
    pub provenance: Provenance,
    /// Non-fatal warnings.
    pub diagnostics: Diagnostics,
}

impl OpResult {
    /// Handle of the output stored under `key`, if any.
    pub fn output(&self, key: &OutputKey) -> Option<&KernelSolidHandle> {
        self.outputs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, body)| &body.handle)
    }

    /// Handle of the finished solid.
    pub fn main(&self) -> Option<&KernelSolidHandle> {
        self.output(&OutputKey::Main)
    }

    /// Entities holding `role`, in assignment order.
    pub fn with_role(&self, role: &Role) -> Vec<KernelId> {
        self.provenance
            .role_assignments
            .iter()
            .filter(|(_, r)| r == role)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// A body output from an operation.
#[derive(Debug, Clone)]
pub struct BodyOutput {
    /// Handle to the solid in the kernel. Runtime-only, not persisted.
    pub handle: KernelSolidHandle,
}

/// Provenance tracking: what happened to topology during an operation.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    /// Entities that exist in the result but not in the input.
    pub created: Vec<EntityRecord>,
    /// Entities that existed in the input but not in the result.
    pub deleted: Vec<EntityRecord>,
    /// Semantic role assignments for created/surviving entities.
    pub role_assignments: Vec<(KernelId, Role)>,
}

/// Record of a topological entity with its kernel ID and signature.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    /// The kernel-internal ID. Runtime-only.
    pub kernel_id: KernelId,
    /// What kind of entity (Vertex, Edge, Face).
    pub kind: TopoKind,
    /// Geometric signature for fallback matching.
    pub signature: TopoSignature,
}

/// Non-fatal diagnostics from an operation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Warning messages.
    pub warnings: Vec<String>,
}

/// Errors from modeling operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error("kernel error: {0}")]
    Kernel(#[from] sheet_kernel::KernelError),

    #[error(transparent)]
    Parse(#[from] sheet_types::ParseError),

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("no faces matched the {stage} selection")]
    EmptySelection { stage: String },

    #[error("none of the {count} selected edges has a matching inner edge")]
    NoMatchingInnerEdge { count: usize },

    #[error("edge {edge:?} could not be tracked through the inner fillet")]
    EdgeLost { edge: KernelId },
}
