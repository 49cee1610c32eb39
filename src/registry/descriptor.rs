//! Runtime type descriptors
//!
//! A descriptor is built once by the descriptor factory and never changes
//! after it is installed in a registry.

use std::fmt;

use serde::Serialize;

use super::type_ref::TypeRef;

/// Kind of a schema-defined type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Struct,
    Class,
    Interface,
    Exception,
    Enum,
    Sequence,
    Dictionary,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Struct => "struct",
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Exception => "exception",
            TypeKind::Enum => "enum",
            TypeKind::Sequence => "sequence",
            TypeKind::Dictionary => "dictionary",
        }
    }

    /// Whether values of this kind can appear as members, parameters or
    /// return values. Exceptions are only thrown; interfaces are only
    /// reachable through proxies.
    pub fn is_data_type(&self) -> bool {
        !matches!(self, TypeKind::Exception | TypeKind::Interface)
    }

    /// Whether a proxy may target this kind
    pub fn is_proxy_target(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Class)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data member of a struct, class or exception
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Declaration order, 0-based
    pub ordinal: usize,
}

/// An operation parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub out: bool,
}

/// An operation of an interface or class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub name: String,
    pub params: Vec<Parameter>,
    pub returns: Option<TypeRef>,
    /// Fully-qualified names of declared exceptions
    pub throws: Vec<String>,
    pub idempotent: bool,
}

impl Operation {
    /// Every registry name the signature mentions
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for param in &self.params {
            out.extend(param.ty.referenced_names());
        }
        if let Some(returns) = &self.returns {
            out.extend(returns.referenced_names());
        }
        out.extend(self.throws.iter().map(String::as_str));
        out
    }
}

/// One enumerator with its resolved value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enumerator {
    pub name: String,
    pub value: i64,
}

/// Kind-specific layout of a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    Struct {
        members: Vec<Member>,
    },
    Class {
        base: Option<String>,
        interfaces: Vec<String>,
        members: Vec<Member>,
        operations: Vec<Operation>,
    },
    Interface {
        bases: Vec<String>,
        operations: Vec<Operation>,
    },
    Exception {
        base: Option<String>,
        members: Vec<Member>,
    },
    Enum {
        enumerators: Vec<Enumerator>,
    },
    Sequence {
        element: TypeRef,
    },
    Dictionary {
        key: TypeRef,
        value: TypeRef,
    },
}

/// Runtime description of one schema-defined type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescriptor {
    name: String,
    #[serde(flatten)]
    shape: TypeShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            shape,
            origin: None,
        }
    }

    /// Records the schema source the descriptor was built from
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Fully-qualified name, `::Module::Type`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn kind(&self) -> TypeKind {
        match &self.shape {
            TypeShape::Struct { .. } => TypeKind::Struct,
            TypeShape::Class { .. } => TypeKind::Class,
            TypeShape::Interface { .. } => TypeKind::Interface,
            TypeShape::Exception { .. } => TypeKind::Exception,
            TypeShape::Enum { .. } => TypeKind::Enum,
            TypeShape::Sequence { .. } => TypeKind::Sequence,
            TypeShape::Dictionary { .. } => TypeKind::Dictionary,
        }
    }

    /// Data members declared by this type itself (not inherited)
    pub fn members(&self) -> &[Member] {
        match &self.shape {
            TypeShape::Struct { members }
            | TypeShape::Class { members, .. }
            | TypeShape::Exception { members, .. } => members,
            _ => &[],
        }
    }

    /// Operations declared by this type itself (not inherited)
    pub fn operations(&self) -> &[Operation] {
        match &self.shape {
            TypeShape::Class { operations, .. } | TypeShape::Interface { operations, .. } => {
                operations
            }
            _ => &[],
        }
    }

    pub fn enumerators(&self) -> &[Enumerator] {
        match &self.shape {
            TypeShape::Enum { enumerators } => enumerators,
            _ => &[],
        }
    }

    /// Single base of a class or exception
    pub fn base(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Class { base, .. } | TypeShape::Exception { base, .. } => base.as_deref(),
            _ => None,
        }
    }

    /// Direct supertypes: the base class or exception, implemented
    /// interfaces, or base interfaces
    pub fn supertypes(&self) -> Vec<&str> {
        match &self.shape {
            TypeShape::Class {
                base, interfaces, ..
            } => base
                .as_deref()
                .into_iter()
                .chain(interfaces.iter().map(String::as_str))
                .collect(),
            TypeShape::Interface { bases, .. } => bases.iter().map(String::as_str).collect(),
            TypeShape::Exception { base, .. } => base.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Every registry name this descriptor depends on
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out = self.supertypes();
        for member in self.members() {
            out.extend(member.ty.referenced_names());
        }
        for op in self.operations() {
            out.extend(op.referenced_names());
        }
        match &self.shape {
            TypeShape::Sequence { element } => out.extend(element.referenced_names()),
            TypeShape::Dictionary { key, value } => {
                out.extend(key.referenced_names());
                out.extend(value.referenced_names());
            }
            _ => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Builtin;

    fn point() -> TypeDescriptor {
        TypeDescriptor::new(
            "::Demo::Point",
            TypeShape::Struct {
                members: vec![
                    Member {
                        name: "x".into(),
                        ty: TypeRef::Builtin(Builtin::Int),
                        ordinal: 0,
                    },
                    Member {
                        name: "next".into(),
                        ty: TypeRef::Optional(Box::new(TypeRef::Named("::Demo::Point".into()))),
                        ordinal: 1,
                    },
                ],
            },
        )
    }

    #[test]
    fn test_kind_and_members() {
        let desc = point();
        assert_eq!(desc.kind(), TypeKind::Struct);
        assert_eq!(desc.members().len(), 2);
        assert!(desc.operations().is_empty());
        assert!(desc.base().is_none());
    }

    #[test]
    fn test_class_supertypes() {
        let desc = TypeDescriptor::new(
            "::Demo::Impl",
            TypeShape::Class {
                base: Some("::Demo::Base".into()),
                interfaces: vec!["::Demo::I".into(), "::Demo::J".into()],
                members: vec![],
                operations: vec![],
            },
        );
        assert_eq!(desc.supertypes(), vec!["::Demo::Base", "::Demo::I", "::Demo::J"]);
        assert_eq!(desc.base(), Some("::Demo::Base"));
    }

    #[test]
    fn test_referenced_names_include_self_reference() {
        assert_eq!(point().referenced_names(), vec!["::Demo::Point"]);
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(point().with_origin("demo.json")).unwrap();
        assert_eq!(json["name"], "::Demo::Point");
        assert_eq!(json["kind"], "struct");
        assert_eq!(json["members"][1]["type"], "optional<::Demo::Point>");
        assert_eq!(json["origin"], "demo.json");
    }

    #[test]
    fn test_data_type_kinds() {
        assert!(TypeKind::Struct.is_data_type());
        assert!(TypeKind::Class.is_data_type());
        assert!(!TypeKind::Exception.is_data_type());
        assert!(!TypeKind::Interface.is_data_type());
        assert!(TypeKind::Interface.is_proxy_target());
        assert!(!TypeKind::Struct.is_proxy_target());
    }
}
