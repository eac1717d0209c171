pub mod base_shape;
pub mod diff;
pub mod fold;
pub mod kernel_ext;
pub mod select;
pub mod solid_bend;
pub mod types;

pub use base_shape::{
    execute_base_shape, origin_shift, resolve, resolve_named, BaseShapeDims, BaseShapeRequest,
    ResolvedBaseShape,
};
pub use diff::{signature_similarity, snapshot, DiffResult, TopoSnapshot};
pub use fold::{execute_fold, FoldStage};
pub use kernel_ext::KernelBundle;
pub use select::FaceSelector;
pub use solid_bend::execute_solid_bend;
pub use types::*;
