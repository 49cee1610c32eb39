//! Type registry
//!
//! The single source of truth for which types exist right now. Installed
//! descriptors are immutable and shared; the registry only ever grows.

mod descriptor;
#[allow(clippy::module_inception)]
mod registry;
mod type_ref;

pub use descriptor::{
    Enumerator, Member, Operation, Parameter, TypeDescriptor, TypeKind, TypeShape,
};
pub use registry::{RegistrySnapshot, TypeId, TypeRegistry};
pub use type_ref::{Builtin, TypeRef};
