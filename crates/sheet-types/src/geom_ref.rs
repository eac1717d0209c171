use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;
use crate::topo::{TopoKind, TopoSignature};

/// Persistent geometry reference.
/// A GeomRef identifies a specific topological entity across parametric rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeomRef {
    /// What kind of topological entity this references.
    pub kind: TopoKind,
    /// The feature whose output contains this entity.
    pub feature_id: Uuid,
    /// Which output of that feature to look in.
    pub output_key: OutputKey,
    /// How to find the specific entity within the output.
    pub selector: Selector,
    /// What to do when resolution is ambiguous or fails.
    pub policy: ResolvePolicy,
}

impl GeomRef {
    /// Reference an entity of a feature's main output by role.
    pub fn by_role(kind: TopoKind, feature_id: Uuid, role: Role, index: usize) -> Self {
        Self {
            kind,
            feature_id,
            output_key: OutputKey::Main,
            selector: Selector::Role { role, index },
            policy: ResolvePolicy::Strict,
        }
    }

    /// Reference an entity of a feature's main output by geometric signature.
    pub fn by_signature(kind: TopoKind, feature_id: Uuid, signature: TopoSignature) -> Self {
        Self {
            kind,
            feature_id,
            output_key: OutputKey::Main,
            selector: Selector::Signature { signature },
            policy: ResolvePolicy::Strict,
        }
    }

    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Identifies which output of a feature to look in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputKey {
    /// The finished solid.
    Main,
    /// An intermediate solid of a staged operation (0 = flat blank).
    Stage { index: usize },
}

/// How to find a specific entity within a feature's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selector {
    /// Select by semantic role assigned during the operation.
    Role { role: Role, index: usize },
    /// Select by geometric signature matching.
    Signature { signature: TopoSignature },
}

/// What to do when GeomRef resolution is ambiguous or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolvePolicy {
    /// Fail the rebuild if the reference cannot be uniquely resolved.
    #[default]
    Strict,
    /// Use the closest match and emit a warning.
    BestEffort,
}
