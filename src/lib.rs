//! typeload - transactional schema loading into a live type registry
//!
//! Compiled schema definitions are turned into immutable type descriptors
//! and installed into a shared [`registry::TypeRegistry`] one load unit at
//! a time: every type of a unit becomes visible at once, or none does.
//!
//! ```no_run
//! use typeload::registry::TypeRegistry;
//! use typeload::schema::load_schema;
//!
//! let registry = TypeRegistry::shared();
//! let names = load_schema(&registry, "schemas/Demo.json", &[]).unwrap();
//! for name in &names {
//!     let desc = registry.lookup(name).unwrap();
//!     println!("{} is a {}", desc.name(), desc.kind());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod factory;
pub mod observability;
pub mod registry;
pub mod schema;
