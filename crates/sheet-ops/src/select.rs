use serde::{Deserialize, Serialize};
use sheet_kernel::{KernelId, KernelIntrospect, KernelSolidHandle};
use sheet_types::{TopoKind, TopoSignature};

/// Explicit face-selection predicate for one fold stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FaceSelector {
    /// Lateral edge faces of the flat blank, taken in the fixed order
    /// +Y, -Y, +X, -X until `fold_count` directions are included.
    Lateral { fold_count: u8 },
    /// Upward-facing faces lifted above `min_height`, i.e. the tops of
    /// walls rather than the blank's own top surface.
    RaisedTop { min_height: f64 },
}

impl FaceSelector {
    /// Precedence slot of a matching face, or `None` when it does not match.
    fn rank(&self, sig: &TopoSignature) -> Option<usize> {
        let n = sig.normal?;
        match *self {
            FaceSelector::Lateral { fold_count } => {
                let slot = if n[1] > 0.5 {
                    0
                } else if n[1] < -0.5 {
                    1
                } else if n[0] > 0.5 {
                    2
                } else if n[0] < -0.5 {
                    3
                } else {
                    return None;
                };
                (slot < usize::from(fold_count)).then_some(slot)
            }
            FaceSelector::RaisedTop { min_height } => {
                let z = sig.centroid?[2];
                (n[2] > 0.9999 && z > min_height).then_some(0)
            }
        }
    }

    pub fn matches(&self, sig: &TopoSignature) -> bool {
        self.rank(sig).is_some()
    }

    /// Faces of `solid` accepted by this selector, in precedence order.
    pub fn select(
        &self,
        introspect: &dyn KernelIntrospect,
        solid: &KernelSolidHandle,
    ) -> Vec<KernelId> {
        let mut ranked: Vec<(usize, KernelId)> = introspect
            .compute_all_signatures(solid, TopoKind::Face)
            .into_iter()
            .filter_map(|(id, sig)| self.rank(&sig).map(|slot| (slot, id)))
            .collect();
        ranked.sort_by_key(|(slot, _)| *slot);
        ranked.into_iter().map(|(_, id)| id).collect()
    }
}
