use wasmi::MemoryRef;

use super::error::ResolverError;

/// Access to the memory the resolver allocated while instantiating a module.
pub(crate) trait MemoryResolver {
    /// Returns the memory instance imported by the module.
    fn memory_ref(&self) -> Result<MemoryRef, ResolverError>;
}
