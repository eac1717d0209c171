pub mod errors;
pub mod geom_ref;
pub mod roles;
pub mod shape;
pub mod topo;

pub use errors::*;
pub use geom_ref::*;
pub use roles::*;
pub use shape::*;
pub use topo::*;
