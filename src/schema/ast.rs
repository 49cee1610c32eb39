//! Compiled schema artifact
//!
//! This is the form an external IDL compiler hands to the loader: modules
//! of definitions with type expressions still written symbolically, exactly
//! as they appear in the source. Resolution into registry names happens in
//! the descriptor factory.
//!
//! Type expression grammar:
//!
//! ```text
//! type    := "sequence" "<" type ">"
//!          | "dictionary" "<" type "," type ">"
//!          | "optional" "<" type ">"
//!          | scoped [ "*" ]
//! scoped  := [ "::" ] ident { "::" ident }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::registry::Builtin;

const RESERVED: &[&str] = &[
    "bool",
    "byte",
    "short",
    "int",
    "long",
    "float",
    "double",
    "string",
    "Object",
    "sequence",
    "dictionary",
    "optional",
    "module",
];

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

fn check_identifier(s: &str) -> Result<(), String> {
    if !identifier_pattern().is_match(s) {
        return Err(format!("'{}' is not a valid identifier", s));
    }
    if RESERVED.contains(&s) {
        return Err(format!("'{}' is a reserved word", s));
    }
    Ok(())
}

/// A validated, unqualified identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identifier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        check_identifier(&value)?;
        Ok(Self(value))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A possibly-relative scoped name as written in a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ScopedName {
    absolute: bool,
    parts: Vec<String>,
}

impl ScopedName {
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Fully-qualified candidates in lookup order when the name is used
    /// inside `scope` (a module name such as `::A::B`, or `""` for the
    /// global scope): innermost enclosing scope first.
    pub fn candidates(&self, scope: &str) -> Vec<String> {
        let tail = self.parts.join("::");
        if self.absolute {
            return vec![format!("::{}", tail)];
        }

        let segments: Vec<&str> = scope.split("::").filter(|s| !s.is_empty()).collect();
        (0..=segments.len())
            .rev()
            .map(|depth| {
                let mut name = String::new();
                for segment in &segments[..depth] {
                    name.push_str("::");
                    name.push_str(segment);
                }
                name.push_str("::");
                name.push_str(&tail);
                name
            })
            .collect()
    }
}

impl FromStr for ScopedName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (absolute, body) = match s.strip_prefix("::") {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err("empty type name".into());
        }
        let mut parts = Vec::new();
        for part in body.split("::") {
            check_identifier(part)?;
            parts.push(part.to_string());
        }
        Ok(Self { absolute, parts })
    }
}

impl TryFrom<String> for ScopedName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("::")?;
        }
        f.write_str(&self.parts.join("::"))
    }
}

/// A symbolic type expression
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TypeExpr {
    Builtin(Builtin),
    Named(ScopedName),
    Proxy(ScopedName),
    Sequence(Box<TypeExpr>),
    Dictionary(Box<TypeExpr>, Box<TypeExpr>),
    Optional(Box<TypeExpr>),
}

impl FromStr for TypeExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeExprParser { input: s, pos: 0 };
        let expr = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(format!(
                "unexpected '{}' in type '{}'",
                &s[parser.pos..],
                s
            ));
        }
        Ok(expr)
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Builtin(b) => write!(f, "{}", b),
            TypeExpr::Named(name) => write!(f, "{}", name),
            TypeExpr::Proxy(name) => write!(f, "{}*", name),
            TypeExpr::Sequence(inner) => write!(f, "sequence<{}>", inner),
            TypeExpr::Dictionary(key, value) => write!(f, "dictionary<{}, {}>", key, value),
            TypeExpr::Optional(inner) => write!(f, "optional<{}>", inner),
        }
    }
}

struct TypeExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeExprParser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), String> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(format!("expected '{}' in type '{}'", token, self.input))
        }
    }

    /// Raw text of a scoped name. Separators are checked by `ScopedName`.
    fn scoped_text(&mut self) -> &'a str {
        self.skip_ws();
        let start = self.pos;
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        &self.input[start..start + len]
    }

    fn parse_type(&mut self) -> Result<TypeExpr, String> {
        let text = self.scoped_text();
        match text {
            "" => Err(format!("expected a type in '{}'", self.input)),
            "sequence" => {
                self.expect("<")?;
                let element = self.parse_type()?;
                self.expect(">")?;
                Ok(TypeExpr::Sequence(Box::new(element)))
            }
            "optional" => {
                self.expect("<")?;
                let inner = self.parse_type()?;
                self.expect(">")?;
                Ok(TypeExpr::Optional(Box::new(inner)))
            }
            "dictionary" => {
                self.expect("<")?;
                let key = self.parse_type()?;
                self.expect(",")?;
                let value = self.parse_type()?;
                self.expect(">")?;
                Ok(TypeExpr::Dictionary(Box::new(key), Box::new(value)))
            }
            _ => {
                let proxy = self.eat("*");
                if let Some(builtin) = Builtin::from_keyword(text) {
                    return match (builtin, proxy) {
                        (Builtin::Object, true) => Ok(TypeExpr::Builtin(Builtin::ObjectProxy)),
                        (b, false) => Ok(TypeExpr::Builtin(b)),
                        (b, true) => Err(format!("'{}' cannot be used as a proxy", b)),
                    };
                }
                let name: ScopedName = text.parse()?;
                Ok(if proxy {
                    TypeExpr::Proxy(name)
                } else {
                    TypeExpr::Named(name)
                })
            }
        }
    }
}

/// One compiled schema file
///
/// Every definition struct rejects fields it does not know, so a misspelled
/// key fails the parse instead of silently defaulting.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompiledSchema {
    /// Other compiled schemas this one depends on, as written
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub modules: Vec<ModuleDef>,
}

impl CompiledSchema {
    /// Fully-qualified names of every type this schema defines, in
    /// declaration order
    pub fn declared_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        for module in &self.modules {
            module.collect_names("", &mut out);
        }
        out
    }
}

/// A module; modules may be reopened across files
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDef {
    pub name: Identifier,
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

impl ModuleDef {
    /// Fully-qualified module name when nested in `parent`
    pub fn scope_name(&self, parent: &str) -> String {
        format!("{}::{}", parent, self.name)
    }

    fn collect_names(&self, parent: &str, out: &mut Vec<String>) {
        let scope = self.scope_name(parent);
        for def in &self.definitions {
            match def {
                Definition::Module(inner) => inner.collect_names(&scope, out),
                other => {
                    if let Some(name) = other.name() {
                        out.push(format!("{}::{}", scope, name));
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberDef {
    pub name: Identifier,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDef {
    pub name: Identifier,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub out: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationDef {
    pub name: Identifier,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    #[serde(default)]
    pub returns: Option<TypeExpr>,
    #[serde(default)]
    pub throws: Vec<ScopedName>,
    #[serde(default)]
    pub idempotent: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructDef {
    pub name: Identifier,
    #[serde(default)]
    pub members: Vec<MemberDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDef {
    pub name: Identifier,
    #[serde(default)]
    pub base: Option<ScopedName>,
    #[serde(default)]
    pub implements: Vec<ScopedName>,
    #[serde(default)]
    pub members: Vec<MemberDef>,
    #[serde(default)]
    pub operations: Vec<OperationDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceDef {
    pub name: Identifier,
    #[serde(default)]
    pub bases: Vec<ScopedName>,
    #[serde(default)]
    pub operations: Vec<OperationDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExceptionDef {
    pub name: Identifier,
    #[serde(default)]
    pub base: Option<ScopedName>,
    #[serde(default)]
    pub members: Vec<MemberDef>,
}

/// An enumerator, either bare (`"Red"`) or with an explicit value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum EnumeratorDef {
    Plain(Identifier),
    Valued { name: Identifier, value: i64 },
}

impl EnumeratorDef {
    pub fn name(&self) -> &Identifier {
        match self {
            EnumeratorDef::Plain(name) | EnumeratorDef::Valued { name, .. } => name,
        }
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            EnumeratorDef::Plain(_) => None,
            EnumeratorDef::Valued { value, .. } => Some(*value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    pub name: Identifier,
    pub enumerators: Vec<EnumeratorDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDef {
    pub name: Identifier,
    pub element: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DictionaryDef {
    pub name: Identifier,
    pub key: TypeExpr,
    pub value: TypeExpr,
}

/// A definition inside a module
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Definition {
    Module(ModuleDef),
    Struct(StructDef),
    Class(ClassDef),
    Interface(InterfaceDef),
    Exception(ExceptionDef),
    Enum(EnumDef),
    Sequence(SequenceDef),
    Dictionary(DictionaryDef),
}

impl Definition {
    /// Unqualified name of a type definition; `None` for modules
    pub fn name(&self) -> Option<&Identifier> {
        match self {
            Definition::Module(_) => None,
            Definition::Struct(d) => Some(&d.name),
            Definition::Class(d) => Some(&d.name),
            Definition::Interface(d) => Some(&d.name),
            Definition::Exception(d) => Some(&d.name),
            Definition::Enum(d) => Some(&d.name),
            Definition::Sequence(d) => Some(&d.name),
            Definition::Dictionary(d) => Some(&d.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ty(s: &str) -> TypeExpr {
        s.parse().unwrap()
    }

    fn named(s: &str) -> TypeExpr {
        TypeExpr::Named(s.parse().unwrap())
    }

    #[test]
    fn test_builtin_types() {
        assert_eq!(ty("int"), TypeExpr::Builtin(Builtin::Int));
        assert_eq!(ty(" string "), TypeExpr::Builtin(Builtin::String));
        assert_eq!(ty("Object"), TypeExpr::Builtin(Builtin::Object));
        assert_eq!(ty("Object*"), TypeExpr::Builtin(Builtin::ObjectProxy));
    }

    #[test]
    fn test_named_and_proxy() {
        assert_eq!(ty("Point"), named("Point"));
        assert_eq!(ty("::Demo::Point"), named("::Demo::Point"));
        assert_eq!(ty("Hello*"), TypeExpr::Proxy("Hello".parse().unwrap()));
    }

    #[test]
    fn test_constructed_types() {
        assert_eq!(
            ty("dictionary<string, sequence<Demo::Point>>"),
            TypeExpr::Dictionary(
                Box::new(TypeExpr::Builtin(Builtin::String)),
                Box::new(TypeExpr::Sequence(Box::new(named("Demo::Point")))),
            )
        );
        assert_eq!(
            ty("optional<Node>"),
            TypeExpr::Optional(Box::new(named("Node")))
        );
    }

    #[test]
    fn test_malformed_types_rejected() {
        assert!("".parse::<TypeExpr>().is_err());
        assert!("sequence<int".parse::<TypeExpr>().is_err());
        assert!("dictionary<int>".parse::<TypeExpr>().is_err());
        assert!("int*".parse::<TypeExpr>().is_err());
        assert!("9lives".parse::<TypeExpr>().is_err());
        assert!("Point extra".parse::<TypeExpr>().is_err());
        assert!("A:::B".parse::<TypeExpr>().is_err());
    }

    #[test]
    fn test_display_round_trips_shape() {
        let expr = ty("dictionary<long,optional<::A::S>>");
        assert_eq!(expr.to_string(), "dictionary<long, optional<::A::S>>");
    }

    #[test]
    fn test_relative_candidates_innermost_first() {
        let name: ScopedName = "Inner::T".parse().unwrap();
        assert_eq!(
            name.candidates("::A::B"),
            vec!["::A::B::Inner::T", "::A::Inner::T", "::Inner::T"]
        );
    }

    #[test]
    fn test_absolute_candidates() {
        let name: ScopedName = "::X::T".parse().unwrap();
        assert_eq!(name.candidates("::A::B"), vec!["::X::T"]);
    }

    #[test]
    fn test_reserved_identifier_rejected() {
        assert!(Identifier::try_from("int".to_string()).is_err());
        assert!(Identifier::try_from("module".to_string()).is_err());
        assert!(Identifier::try_from("Point_2".to_string()).is_ok());
    }

    #[test]
    fn test_deserialize_schema() {
        let schema: CompiledSchema = serde_json::from_value(json!({
            "includes": ["Common.json"],
            "modules": [{
                "name": "Demo",
                "definitions": [
                    { "kind": "struct", "name": "Point",
                      "members": [{ "name": "x", "type": "int" }] },
                    { "kind": "module", "name": "Inner", "definitions": [
                        { "kind": "enum", "name": "Color",
                          "enumerators": ["Red", { "name": "Blue", "value": 7 }] }
                    ]},
                    { "kind": "interface", "name": "Hello",
                      "operations": [{ "name": "say", "returns": "Point",
                                       "params": [{ "name": "p", "type": "Point", "out": true }] }] }
                ]
            }]
        }))
        .unwrap();

        assert_eq!(schema.includes, vec!["Common.json"]);
        assert_eq!(
            schema.declared_names(),
            vec!["::Demo::Point", "::Demo::Inner::Color", "::Demo::Hello"]
        );

        match &schema.modules[0].definitions[2] {
            Definition::Interface(iface) => {
                assert!(iface.operations[0].params[0].out);
                assert_eq!(iface.operations[0].returns, Some(named("Point")));
            }
            other => panic!("unexpected definition {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_rejected_at_every_level() {
        let tagged = serde_json::from_value::<Definition>(json!({
            "kind": "struct", "name": "Point", "memebrs": []
        }));
        assert!(tagged.is_err());

        let nested = serde_json::from_value::<OperationDef>(json!({
            "name": "say", "params": [{ "name": "p", "type": "int", "outt": true }]
        }));
        assert!(nested.is_err());

        let enumerator = serde_json::from_value::<EnumeratorDef>(json!({
            "name": "Blue", "value": 7, "color": "blue"
        }));
        assert!(enumerator.is_err());

        let top = serde_json::from_value::<CompiledSchema>(json!({ "modulez": [] }));
        assert!(top.is_err());
    }

    #[test]
    fn test_enumerator_forms() {
        let e: EnumDef = serde_json::from_value(json!({
            "name": "Color",
            "enumerators": ["Red", { "name": "Blue", "value": 7 }]
        }))
        .unwrap();
        assert_eq!(e.enumerators[0].value(), None);
        assert_eq!(e.enumerators[1].name().as_str(), "Blue");
        assert_eq!(e.enumerators[1].value(), Some(7));
    }

    #[test]
    fn test_bad_type_expression_fails_deserialization() {
        let result: Result<MemberDef, _> =
            serde_json::from_value(json!({ "name": "x", "type": "sequence<" }));
        assert!(result.is_err());
    }
}
