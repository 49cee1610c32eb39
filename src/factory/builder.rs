//! Descriptor factory
//!
//! Turns one declaration into an immutable [`TypeDescriptor`], resolving
//! every symbolic reference against a [`ResolutionView`]. The factory never
//! touches the registry.

use std::collections::{HashMap, HashSet};

use crate::registry::{
    Enumerator, Member, Operation, Parameter, TypeDescriptor, TypeKind, TypeRef, TypeShape,
};
use crate::schema::{
    ClassDef, Definition, DictionaryDef, EnumDef, ExceptionDef, InterfaceDef, LoadError,
    LoadResult, MemberDef, OperationDef, ScopedName, TypeExpr,
};

use super::view::{Declaration, ResolutionView};

/// Builds descriptors for the declarations of one load unit
#[derive(Debug, Clone, Copy)]
pub struct DescriptorFactory<'v> {
    view: ResolutionView<'v>,
}

impl<'v> DescriptorFactory<'v> {
    pub fn new(view: ResolutionView<'v>) -> Self {
        Self { view }
    }

    /// Builds the descriptor for `decl`.
    ///
    /// Forward references to other declarations in the same unit resolve;
    /// anything not visible in the view is `UnresolvedReference`.
    pub fn build(&self, decl: &Declaration<'_>) -> LoadResult<TypeDescriptor> {
        if self.view.snapshot().contains(&decl.name) {
            return Err(LoadError::name_collision(decl.name.clone()));
        }

        let shape = match decl.definition {
            Definition::Struct(def) => TypeShape::Struct {
                members: self.members(decl, &def.members)?,
            },
            Definition::Class(def) => self.class(decl, def)?,
            Definition::Interface(def) => self.interface(decl, def)?,
            Definition::Exception(def) => self.exception(decl, def)?,
            Definition::Enum(def) => self.enumeration(decl, def)?,
            Definition::Sequence(def) => TypeShape::Sequence {
                element: self.type_ref(&def.element, decl)?,
            },
            Definition::Dictionary(def) => self.dictionary(decl, def)?,
            Definition::Module(_) => {
                return Err(LoadError::invalid(
                    decl.name.clone(),
                    "a module is not a type",
                ))
            }
        };

        Ok(TypeDescriptor::new(decl.name.clone(), shape).with_origin(decl.origin))
    }

    fn class(&self, decl: &Declaration<'_>, def: &ClassDef) -> LoadResult<TypeShape> {
        let base = match &def.base {
            Some(written) => Some(self.expect_kind(written, decl, TypeKind::Class, "base")?),
            None => None,
        };
        let interfaces = def
            .implements
            .iter()
            .map(|written| self.expect_kind(written, decl, TypeKind::Interface, "implemented"))
            .collect::<LoadResult<Vec<_>>>()?;

        self.check_acyclic(&decl.name)?;

        Ok(TypeShape::Class {
            base,
            interfaces,
            members: self.members(decl, &def.members)?,
            operations: self.operations(decl, &def.operations)?,
        })
    }

    fn interface(&self, decl: &Declaration<'_>, def: &InterfaceDef) -> LoadResult<TypeShape> {
        let bases = def
            .bases
            .iter()
            .map(|written| self.expect_kind(written, decl, TypeKind::Interface, "base"))
            .collect::<LoadResult<Vec<_>>>()?;

        self.check_acyclic(&decl.name)?;

        Ok(TypeShape::Interface {
            bases,
            operations: self.operations(decl, &def.operations)?,
        })
    }

    fn exception(&self, decl: &Declaration<'_>, def: &ExceptionDef) -> LoadResult<TypeShape> {
        let base = match &def.base {
            Some(written) => Some(self.expect_kind(written, decl, TypeKind::Exception, "base")?),
            None => None,
        };

        self.check_acyclic(&decl.name)?;

        Ok(TypeShape::Exception {
            base,
            members: self.members(decl, &def.members)?,
        })
    }

    fn enumeration(&self, decl: &Declaration<'_>, def: &EnumDef) -> LoadResult<TypeShape> {
        if def.enumerators.is_empty() {
            return Err(LoadError::invalid(
                decl.name.clone(),
                "enum must declare at least one enumerator",
            ));
        }

        let mut enumerators = Vec::with_capacity(def.enumerators.len());
        let mut names = HashSet::new();
        let mut values: HashMap<i64, &str> = HashMap::new();
        let mut next = 0i64;

        for item in &def.enumerators {
            let name = item.name().as_str();
            if !names.insert(name) {
                return Err(LoadError::name_collision(format!("{}::{}", decl.name, name)));
            }

            let value = item.value().unwrap_or(next);
            if value < 0 {
                return Err(LoadError::invalid(
                    format!("{}::{}", decl.name, name),
                    format!("enumerator value {} is negative", value),
                ));
            }
            if let Some(previous) = values.insert(value, name) {
                return Err(LoadError::invalid(
                    format!("{}::{}", decl.name, name),
                    format!("enumerator value {} is already used by '{}'", value, previous),
                ));
            }

            enumerators.push(Enumerator {
                name: name.to_string(),
                value,
            });
            next = value.saturating_add(1);
        }

        Ok(TypeShape::Enum { enumerators })
    }

    fn dictionary(&self, decl: &Declaration<'_>, def: &DictionaryDef) -> LoadResult<TypeShape> {
        Ok(TypeShape::Dictionary {
            key: self.key_ref(&def.key, decl)?,
            value: self.type_ref(&def.value, decl)?,
        })
    }

    fn members(&self, decl: &Declaration<'_>, defs: &[MemberDef]) -> LoadResult<Vec<Member>> {
        let mut seen = HashSet::new();
        defs.iter()
            .enumerate()
            .map(|(ordinal, def)| {
                if !seen.insert(def.name.as_str()) {
                    return Err(LoadError::name_collision(format!(
                        "{}::{}",
                        decl.name, def.name
                    )));
                }
                Ok(Member {
                    name: def.name.to_string(),
                    ty: self.type_ref(&def.ty, decl)?,
                    ordinal,
                })
            })
            .collect()
    }

    fn operations(
        &self,
        decl: &Declaration<'_>,
        defs: &[OperationDef],
    ) -> LoadResult<Vec<Operation>> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(defs.len());

        for def in defs {
            let qualified = format!("{}::{}", decl.name, def.name);
            if !seen.insert(def.name.as_str()) {
                return Err(LoadError::name_collision(qualified));
            }

            let mut param_names = HashSet::new();
            let mut params = Vec::with_capacity(def.params.len());
            for param in &def.params {
                if !param_names.insert(param.name.as_str()) {
                    return Err(LoadError::name_collision(format!(
                        "{}::{}",
                        qualified, param.name
                    )));
                }
                params.push(Parameter {
                    name: param.name.to_string(),
                    ty: self.type_ref(&param.ty, decl)?,
                    out: param.out,
                });
            }

            let returns = match &def.returns {
                Some(expr) => Some(self.type_ref(expr, decl)?),
                None => None,
            };
            let throws = def
                .throws
                .iter()
                .map(|written| self.expect_kind(written, decl, TypeKind::Exception, "thrown"))
                .collect::<LoadResult<Vec<_>>>()?;

            out.push(Operation {
                name: def.name.to_string(),
                params,
                returns,
                throws,
                idempotent: def.idempotent,
            });
        }

        Ok(out)
    }

    fn lookup(&self, written: &ScopedName, decl: &Declaration<'_>) -> LoadResult<(String, TypeKind)> {
        self.view
            .resolve(written, &decl.scope)
            .ok_or_else(|| LoadError::unresolved(written.to_string(), decl.name.clone()))
    }

    fn expect_kind(
        &self,
        written: &ScopedName,
        decl: &Declaration<'_>,
        expected: TypeKind,
        role: &str,
    ) -> LoadResult<String> {
        let (name, kind) = self.lookup(written, decl)?;
        if kind != expected {
            return Err(LoadError::invalid(
                decl.name.clone(),
                format!("{} type '{}' is a {}, expected {}", role, name, kind, expected),
            ));
        }
        Ok(name)
    }

    fn type_ref(&self, expr: &TypeExpr, decl: &Declaration<'_>) -> LoadResult<TypeRef> {
        Ok(match expr {
            TypeExpr::Builtin(builtin) => TypeRef::Builtin(*builtin),
            TypeExpr::Named(written) => {
                let (name, kind) = self.lookup(written, decl)?;
                if !kind.is_data_type() {
                    return Err(LoadError::invalid(
                        decl.name.clone(),
                        format!("{} '{}' cannot be used as a data type", kind, name),
                    ));
                }
                TypeRef::Named(name)
            }
            TypeExpr::Proxy(written) => {
                let (name, kind) = self.lookup(written, decl)?;
                if !kind.is_proxy_target() {
                    return Err(LoadError::invalid(
                        decl.name.clone(),
                        format!("{} '{}' cannot be the target of a proxy", kind, name),
                    ));
                }
                TypeRef::Proxy(name)
            }
            TypeExpr::Sequence(element) => TypeRef::Sequence(Box::new(self.type_ref(element, decl)?)),
            TypeExpr::Dictionary(key, value) => TypeRef::Dictionary(
                Box::new(self.key_ref(key, decl)?),
                Box::new(self.type_ref(value, decl)?),
            ),
            TypeExpr::Optional(inner) => TypeRef::Optional(Box::new(self.type_ref(inner, decl)?)),
        })
    }

    fn key_ref(&self, expr: &TypeExpr, decl: &Declaration<'_>) -> LoadResult<TypeRef> {
        let key = self.type_ref(expr, decl)?;
        let legal = match &key {
            TypeRef::Builtin(builtin) => builtin.is_legal_key(),
            TypeRef::Named(name) => matches!(
                self.view.kind_of(name),
                Some(TypeKind::Enum | TypeKind::Struct)
            ),
            _ => false,
        };
        if !legal {
            return Err(LoadError::invalid(
                decl.name.clone(),
                format!("'{}' is not a legal dictionary key type", key),
            ));
        }
        Ok(key)
    }

    /// Walks the supertype graph from `start` with an explicit stack and
    /// reports the first cycle found.
    fn check_acyclic(&self, start: &str) -> LoadResult<()> {
        let mut path: Vec<(String, Vec<String>, usize)> =
            vec![(start.to_string(), self.view.supertypes_of(start), 0)];
        let mut finished: HashSet<String> = HashSet::new();

        loop {
            let Some(top) = path.last_mut() else {
                return Ok(());
            };
            let next = top.1.get(top.2).cloned();
            top.2 += 1;

            match next {
                Some(next) => {
                    if let Some(pos) = path.iter().position(|(name, _, _)| *name == next) {
                        let mut cycle: Vec<String> =
                            path[pos..].iter().map(|(name, _, _)| name.clone()).collect();
                        cycle.push(next);
                        return Err(LoadError::cycle(cycle));
                    }
                    if finished.contains(&next) {
                        continue;
                    }
                    let supertypes = self.view.supertypes_of(&next);
                    path.push((next, supertypes, 0));
                }
                None => {
                    if let Some((name, _, _)) = path.pop() {
                        finished.insert(name);
                    }
                }
            }
        }
    }
}
