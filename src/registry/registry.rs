//! Process-scoped type registry
//!
//! Descriptors live in an append-only arena indexed by fully-qualified name.
//! The whole arena + index pair is published as one immutable snapshot:
//! - Readers load the current snapshot without locking and never see a
//!   half-installed batch.
//! - Writers are serialized by the commit gate, build the next snapshot
//!   off to the side and publish it with one pointer swap.
//! - A name is bound at most once for the registry's lifetime.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;

use super::descriptor::TypeDescriptor;
use crate::schema::{LoadError, LoadResult};

/// Stable handle to an installed descriptor. Valid for the registry's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// An immutable view of the registry at one commit
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    arena: Vec<Arc<TypeDescriptor>>,
    index: HashMap<String, TypeId>,
    generation: u64,
}

impl RegistrySnapshot {
    /// Number of successful commits that produced this snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn resolve(&self, name: &str) -> Option<TypeId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: TypeId) -> Option<&Arc<TypeDescriptor>> {
        self.arena.get(id.index())
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.resolve(name).and_then(|id| self.get(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Descriptors in installation order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.arena.iter()
    }

    /// All installed names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort();
        names
    }
}

/// The registry service object. Share it by `Arc`; every loader that
/// should see the same types must hold the same registry.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    snap: ArcSwap<RegistrySnapshot>,
    commit_gate: Mutex<()>,
}

impl TypeRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry behind an `Arc`
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Current snapshot. Holding it pins that state; later commits are not
    /// visible through it.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snap.load_full()
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.snap.load().lookup(name).cloned()
    }

    pub fn resolve(&self, name: &str) -> Option<TypeId> {
        self.snap.load().resolve(name)
    }

    pub fn get(&self, id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.snap.load().get(id).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snap.load().contains(name)
    }

    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snap.load().is_empty()
    }

    /// All installed names, sorted
    pub fn names(&self) -> Vec<String> {
        self.snap.load().names()
    }

    /// Installs the whole batch or nothing.
    ///
    /// Fails with `NameCollision` if any name is already bound or appears
    /// twice in the batch, and with `UnresolvedReference` if a descriptor
    /// names a type that is neither installed nor part of the batch. On
    /// failure the registry is exactly as it was.
    pub fn try_commit(&self, batch: Vec<TypeDescriptor>) -> LoadResult<Vec<TypeId>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let _gate = self.commit_gate.lock();
        let current = self.snap.load_full();

        let mut batch_names: HashSet<&str> = HashSet::with_capacity(batch.len());
        for desc in &batch {
            if current.contains(desc.name()) || !batch_names.insert(desc.name()) {
                return Err(LoadError::name_collision(desc.name()));
            }
        }

        for desc in &batch {
            for referenced in desc.referenced_names() {
                if !current.contains(referenced) && !batch_names.contains(referenced) {
                    return Err(LoadError::unresolved(referenced, desc.name()));
                }
            }
        }

        let mut next = RegistrySnapshot::clone(&current);
        let mut ids = Vec::with_capacity(batch.len());
        for desc in batch {
            let id = TypeId(next.arena.len() as u32);
            next.index.insert(desc.name().to_string(), id);
            next.arena.push(Arc::new(desc));
            ids.push(id);
        }
        next.generation += 1;

        self.snap.store(Arc::new(next));
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Builtin, Member, TypeKind, TypeRef, TypeShape};

    fn structure(name: &str, field_ty: TypeRef) -> TypeDescriptor {
        TypeDescriptor::new(
            name,
            TypeShape::Struct {
                members: vec![Member {
                    name: "value".into(),
                    ty: field_ty,
                    ordinal: 0,
                }],
            },
        )
    }

    fn int_struct(name: &str) -> TypeDescriptor {
        structure(name, TypeRef::Builtin(Builtin::Int))
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.snapshot().generation(), 0);
        assert!(registry.lookup("::A::S").is_none());
    }

    #[test]
    fn test_commit_installs_whole_batch() {
        let registry = TypeRegistry::new();
        let ids = registry
            .try_commit(vec![int_struct("::A::S"), int_struct("::A::T")])
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("::A::T"), Some(ids[1]));
        assert_eq!(registry.get(ids[0]).unwrap().name(), "::A::S");
        assert_eq!(registry.lookup("::A::S").unwrap().kind(), TypeKind::Struct);
        assert_eq!(registry.snapshot().generation(), 1);
    }

    #[test]
    fn test_collision_with_installed_name_changes_nothing() {
        let registry = TypeRegistry::new();
        registry.try_commit(vec![int_struct("::A::S")]).unwrap();
        let before = registry.snapshot();

        let err = registry
            .try_commit(vec![int_struct("::A::New"), int_struct("::A::S")])
            .unwrap_err();

        assert_eq!(err, LoadError::name_collision("::A::S"));
        assert_eq!(registry.names(), before.names());
        assert!(!registry.contains("::A::New"));
        assert_eq!(registry.snapshot().generation(), before.generation());
    }

    #[test]
    fn test_duplicate_within_batch_rejected() {
        let registry = TypeRegistry::new();
        let err = registry
            .try_commit(vec![int_struct("::A::S"), int_struct("::A::S")])
            .unwrap_err();
        assert!(matches!(err, LoadError::NameCollision { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let registry = TypeRegistry::new();
        let err = registry
            .try_commit(vec![structure("::A::S", TypeRef::Named("::A::Missing".into()))])
            .unwrap_err();
        assert_eq!(err, LoadError::unresolved("::A::Missing", "::A::S"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_batch_may_reference_itself_and_installed_types() {
        let registry = TypeRegistry::new();
        registry.try_commit(vec![int_struct("::A::Base")]).unwrap();

        registry
            .try_commit(vec![
                structure("::A::Uses", TypeRef::Named("::A::Later".into())),
                structure("::A::Later", TypeRef::Named("::A::Base".into())),
            ])
            .unwrap();

        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_old_snapshot_is_stable() {
        let registry = TypeRegistry::new();
        registry.try_commit(vec![int_struct("::A::S")]).unwrap();
        let pinned = registry.snapshot();

        registry.try_commit(vec![int_struct("::A::T")]).unwrap();

        assert_eq!(pinned.len(), 1);
        assert!(!pinned.contains("::A::T"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_type_ids_survive_later_commits() {
        let registry = TypeRegistry::new();
        let first = registry.try_commit(vec![int_struct("::A::S")]).unwrap()[0];
        registry.try_commit(vec![int_struct("::A::T")]).unwrap();

        assert_eq!(registry.get(first).unwrap().name(), "::A::S");
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let registry = TypeRegistry::new();
        assert!(registry.try_commit(Vec::new()).unwrap().is_empty());
        assert_eq!(registry.snapshot().generation(), 0);
    }
}
