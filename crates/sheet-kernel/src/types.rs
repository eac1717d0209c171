use serde::{Deserialize, Serialize};

// Re-export shared types from sheet-types
pub use sheet_types::{TopoKind, TopoSignature};

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only for the current kernel session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Transient kernel-internal entity identifier.
/// Stable within a single kernel session but NOT across rebuilds.
/// NEVER persisted; use GeomRef for persistent references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelId(pub u64);

/// Parameters of one fold request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldParams {
    /// Sheet thickness.
    pub thickness: f64,
    /// Straight length of the new wall beyond the bend.
    pub length: f64,
    /// Inner bend radius.
    pub radius: f64,
    /// Fold toward the opposite side of the sheet.
    pub flipped: bool,
    /// Extend adjoining walls so their corners meet.
    pub automiter: bool,
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("fold failed: {reason}")]
    FoldFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("entity not found: {id:?}")]
    EntityNotFound { id: KernelId },

    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

// KernelId persists in diagnostics as a bare integer.
impl Serialize for KernelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KernelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(KernelId)
    }
}
