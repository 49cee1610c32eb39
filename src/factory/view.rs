//! Resolution view: committed registry state plus the in-progress batch
//!
//! Every type a load unit declares is entered here before any descriptor is
//! built, so definitions may refer to each other in any order.

use std::collections::HashMap;

use crate::registry::{RegistrySnapshot, TypeKind};
use crate::schema::{Definition, LoadError, LoadResult, ParsedUnit, ScopedName};

/// A type declared by the load unit, not yet built
#[derive(Debug, Clone)]
pub struct Declaration<'a> {
    /// Fully-qualified name
    pub name: String,
    /// Fully-qualified name of the enclosing module
    pub scope: String,
    pub kind: TypeKind,
    pub definition: &'a Definition,
    /// Source the definition came from
    pub origin: &'a str,
}

impl Declaration<'_> {
    /// Direct supertypes as written
    fn supertype_names(&self) -> Vec<&ScopedName> {
        match self.definition {
            Definition::Class(def) => def.base.iter().chain(def.implements.iter()).collect(),
            Definition::Interface(def) => def.bases.iter().collect(),
            Definition::Exception(def) => def.base.iter().collect(),
            _ => Vec::new(),
        }
    }
}

fn definition_kind(def: &Definition) -> Option<TypeKind> {
    match def {
        Definition::Module(_) => None,
        Definition::Struct(_) => Some(TypeKind::Struct),
        Definition::Class(_) => Some(TypeKind::Class),
        Definition::Interface(_) => Some(TypeKind::Interface),
        Definition::Exception(_) => Some(TypeKind::Exception),
        Definition::Enum(_) => Some(TypeKind::Enum),
        Definition::Sequence(_) => Some(TypeKind::Sequence),
        Definition::Dictionary(_) => Some(TypeKind::Dictionary),
    }
}

/// All declarations of one load unit, in declaration order
#[derive(Debug, Default)]
pub struct Declarations<'a> {
    entries: Vec<Declaration<'a>>,
    index: HashMap<String, usize>,
}

impl<'a> Declarations<'a> {
    /// Collects every type definition in `units`.
    ///
    /// Fails with `NameCollision` when a name is already committed or is
    /// declared twice in the unit.
    pub fn collect(units: &'a [ParsedUnit], snapshot: &RegistrySnapshot) -> LoadResult<Self> {
        let mut decls = Self::default();
        for unit in units {
            for module in &unit.schema.modules {
                let scope = module.scope_name("");
                decls.collect_module(&scope, &module.definitions, &unit.origin, snapshot)?;
            }
        }
        Ok(decls)
    }

    fn collect_module(
        &mut self,
        scope: &str,
        definitions: &'a [Definition],
        origin: &'a str,
        snapshot: &RegistrySnapshot,
    ) -> LoadResult<()> {
        for def in definitions {
            if let Definition::Module(inner) = def {
                let inner_scope = inner.scope_name(scope);
                self.collect_module(&inner_scope, &inner.definitions, origin, snapshot)?;
                continue;
            }

            let (Some(kind), Some(ident)) = (definition_kind(def), def.name()) else {
                continue;
            };
            let name = format!("{}::{}", scope, ident);
            if snapshot.contains(&name) || self.index.contains_key(&name) {
                return Err(LoadError::name_collision(name));
            }

            self.index.insert(name.clone(), self.entries.len());
            self.entries.push(Declaration {
                name,
                scope: scope.to_string(),
                kind,
                definition: def,
                origin,
            });
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Declaration<'a>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration<'a>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only lookup across the committed snapshot and the batch
#[derive(Debug, Clone, Copy)]
pub struct ResolutionView<'v> {
    snapshot: &'v RegistrySnapshot,
    batch: &'v Declarations<'v>,
}

impl<'v> ResolutionView<'v> {
    pub fn new(snapshot: &'v RegistrySnapshot, batch: &'v Declarations<'v>) -> Self {
        Self { snapshot, batch }
    }

    pub fn snapshot(&self) -> &'v RegistrySnapshot {
        self.snapshot
    }

    /// Kind of a fully-qualified name, batch first
    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        if let Some(decl) = self.batch.get(name) {
            return Some(decl.kind);
        }
        self.snapshot.lookup(name).map(|desc| desc.kind())
    }

    /// Resolves a name as written inside `scope` to the first visible
    /// fully-qualified name
    pub fn resolve(&self, name: &ScopedName, scope: &str) -> Option<(String, TypeKind)> {
        name.candidates(scope)
            .into_iter()
            .find_map(|candidate| self.kind_of(&candidate).map(|kind| (candidate, kind)))
    }

    /// Direct supertypes of a fully-qualified name. References in the batch
    /// that do not resolve are skipped; building that declaration reports
    /// them.
    pub fn supertypes_of(&self, name: &str) -> Vec<String> {
        if let Some(decl) = self.batch.get(name) {
            return decl
                .supertype_names()
                .into_iter()
                .filter_map(|written| self.resolve(written, &decl.scope).map(|(fq, _)| fq))
                .collect();
        }
        self.snapshot
            .lookup(name)
            .map(|desc| desc.supertypes().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
