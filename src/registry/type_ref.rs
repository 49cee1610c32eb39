//! Resolved type references
//!
//! A reference is always a fully-qualified name looked up in the registry,
//! never an owning pointer, so self- and mutually-referencing types need no
//! ownership cycles.

use std::fmt;

use serde::{Serialize, Serializer};

/// Built-in types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    /// Root of all classes
    Object,
    /// Untyped proxy (`Object*`)
    ObjectProxy,
}

impl Builtin {
    /// Returns the schema keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Builtin::Bool => "bool",
            Builtin::Byte => "byte",
            Builtin::Short => "short",
            Builtin::Int => "int",
            Builtin::Long => "long",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::String => "string",
            Builtin::Object => "Object",
            Builtin::ObjectProxy => "Object*",
        }
    }

    /// Maps a keyword to a builtin. `Object*` is handled by the type
    /// expression parser.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "bool" => Some(Builtin::Bool),
            "byte" => Some(Builtin::Byte),
            "short" => Some(Builtin::Short),
            "int" => Some(Builtin::Int),
            "long" => Some(Builtin::Long),
            "float" => Some(Builtin::Float),
            "double" => Some(Builtin::Double),
            "string" => Some(Builtin::String),
            "Object" => Some(Builtin::Object),
            _ => None,
        }
    }

    /// Whether values of this type may key a dictionary
    pub fn is_legal_key(&self) -> bool {
        matches!(
            self,
            Builtin::Bool
                | Builtin::Byte
                | Builtin::Short
                | Builtin::Int
                | Builtin::Long
                | Builtin::String
        )
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved type reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Builtin(Builtin),
    /// A schema-defined type. Structs, enums, sequences and dictionaries are
    /// held by value; classes by reference.
    Named(String),
    /// Proxy to an interface or class
    Proxy(String),
    Sequence(Box<TypeRef>),
    Dictionary(Box<TypeRef>, Box<TypeRef>),
    Optional(Box<TypeRef>),
}

impl TypeRef {
    /// Every registry name this reference mentions, in order of appearance
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeRef::Builtin(_) => {}
            TypeRef::Named(name) | TypeRef::Proxy(name) => out.push(name),
            TypeRef::Sequence(inner) | TypeRef::Optional(inner) => inner.collect_names(out),
            TypeRef::Dictionary(key, value) => {
                key.collect_names(out);
                value.collect_names(out);
            }
        }
    }

    /// The name held inline by this reference, if any.
    ///
    /// Sequences, dictionaries, optionals and proxies are indirections and
    /// never contain their target inline.
    pub fn inline_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Builtin(b) => write!(f, "{}", b),
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Proxy(name) => write!(f, "{}*", name),
            TypeRef::Sequence(inner) => write!(f, "sequence<{}>", inner),
            TypeRef::Dictionary(key, value) => write!(f, "dictionary<{}, {}>", key, value),
            TypeRef::Optional(inner) => write!(f, "optional<{}>", inner),
        }
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
