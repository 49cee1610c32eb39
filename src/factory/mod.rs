//! Descriptor factory
//!
//! Builds immutable type descriptors from compiled schema definitions
//! against a view of the committed registry plus the load unit's own
//! declarations.

mod builder;
mod view;

pub use builder::DescriptorFactory;
pub use view::{Declaration, Declarations, ResolutionView};
