//! Schema loading subsystem
//!
//! Compiled schemas are parsed, resolved into type descriptors, validated
//! as a whole and committed to a [`TypeRegistry`](crate::registry::TypeRegistry)
//! in one step.
//!
//! # Design Principles
//!
//! - A load unit commits all of its types or none of them
//! - Types are never redefined once registered
//! - Readers never observe a partially loaded unit
//! - Every failure is explicit and carries a stable code

mod ast;
mod compiler;
mod errors;
mod loader;
mod source;
mod unit;
mod validator;

pub use ast::{
    ClassDef, CompiledSchema, Definition, DictionaryDef, EnumDef, EnumeratorDef, ExceptionDef,
    Identifier, InterfaceDef, MemberDef, ModuleDef, OperationDef, ParamDef, ScopedName,
    SequenceDef, StructDef, TypeExpr,
};
pub use compiler::{JsonSchemaCompiler, SchemaCompiler};
pub use errors::{LoadError, LoadErrorKind, LoadResult, SourceLocation};
pub use loader::{load_schema, load_schemas, LoadOptions, SchemaLoader};
pub use source::{LoadedSource, SchemaSource, SourceResolver, INLINE_LABEL};
pub use unit::{LoadOutcome, LoadState, LoadUnit, ParsedUnit};
pub use validator::StructuralValidator;
