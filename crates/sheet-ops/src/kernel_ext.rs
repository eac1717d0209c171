use sheet_kernel::{Kernel, KernelIntrospect};

/// A kernel that sheet-metal operations can both build with and inspect
/// through one `&mut` borrow.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;
}

impl<K> KernelBundle for K
where
    K: Kernel + KernelIntrospect,
{
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
