//! Whole-batch structural validation
//!
//! Runs after every descriptor of a load unit is built and before anything
//! is committed. Checks here need the complete batch:
//! - No struct contains itself by value, directly or transitively
//! - No class or exception member shadows an inherited member
//! - No operation redeclares or ambiguously inherits an operation name
//!
//! Optional, sequence, dictionary and proxy references are indirections and
//! never form containment cycles. Class-typed members are references too.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::registry::{RegistrySnapshot, TypeDescriptor, TypeKind, TypeRef};

use super::errors::{LoadError, LoadResult};

/// Validates a built batch against the snapshot it was resolved with.
pub struct StructuralValidator<'a> {
    snapshot: &'a RegistrySnapshot,
    batch: &'a [TypeDescriptor],
    index: HashMap<&'a str, &'a TypeDescriptor>,
}

impl<'a> StructuralValidator<'a> {
    pub fn new(snapshot: &'a RegistrySnapshot, batch: &'a [TypeDescriptor]) -> Self {
        let index = batch.iter().map(|desc| (desc.name(), desc)).collect();
        Self {
            snapshot,
            batch,
            index,
        }
    }

    /// Validates the whole batch.
    ///
    /// # Errors
    ///
    /// - `NameCollision` for a shadowed member or operation
    /// - `StructuralCycle` for by-value self-containment
    pub fn validate(&self) -> LoadResult<()> {
        for desc in self.batch {
            self.check_inherited_members(desc)?;
            self.check_inherited_operations(desc)?;
        }
        self.check_containment()
    }

    fn lookup(&self, name: &str) -> Option<&'a TypeDescriptor> {
        match self.index.get(name) {
            Some(desc) => Some(*desc),
            None => self.snapshot.lookup(name).map(|desc| desc.as_ref()),
        }
    }

    /// Base chain of a class or exception, nearest first
    fn base_chain(&self, desc: &TypeDescriptor) -> Vec<&'a TypeDescriptor> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = desc.base().map(str::to_string);
        while let Some(name) = current {
            if !seen.insert(name.clone()) {
                break;
            }
            let Some(base) = self.lookup(&name) else {
                break;
            };
            chain.push(base);
            current = base.base().map(str::to_string);
        }
        chain
    }

    fn check_inherited_members(&self, desc: &TypeDescriptor) -> LoadResult<()> {
        if !matches!(desc.kind(), TypeKind::Class | TypeKind::Exception) {
            return Ok(());
        }
        let own: HashSet<&str> = desc.members().iter().map(|m| m.name.as_str()).collect();
        for base in self.base_chain(desc) {
            if let Some(member) = base.members().iter().find(|m| own.contains(m.name.as_str())) {
                return Err(LoadError::name_collision(format!(
                    "{}::{}",
                    desc.name(),
                    member.name
                )));
            }
        }
        Ok(())
    }

    /// Every operation reachable through supertypes, by name, with the type
    /// that declares it. Two different declaring types for one name is an
    /// ambiguity.
    fn check_inherited_operations(&self, desc: &TypeDescriptor) -> LoadResult<()> {
        if !matches!(desc.kind(), TypeKind::Class | TypeKind::Interface) {
            return Ok(());
        }

        let mut inherited: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = desc.supertypes().into_iter().collect();

        while let Some(name) = queue.pop_front() {
            if !visited.insert(name) {
                continue;
            }
            let Some(ancestor) = self.lookup(name) else {
                continue;
            };
            for op in ancestor.operations() {
                match inherited.get(op.name.as_str()) {
                    Some(owner) if *owner != ancestor.name() => {
                        return Err(LoadError::name_collision(format!(
                            "{}::{}",
                            desc.name(),
                            op.name
                        )));
                    }
                    _ => {
                        inherited.insert(op.name.as_str(), ancestor.name());
                    }
                }
            }
            queue.extend(ancestor.supertypes());
        }

        match desc
            .operations()
            .iter()
            .find(|op| inherited.contains_key(op.name.as_str()))
        {
            Some(op) => Err(LoadError::name_collision(format!(
                "{}::{}",
                desc.name(),
                op.name
            ))),
            None => Ok(()),
        }
    }

    /// By-value edges from a struct to the batch structs it embeds
    fn containment_edges(&self, desc: &TypeDescriptor) -> Vec<&'a str> {
        desc.members()
            .iter()
            .filter_map(|member| member.ty.inline_name())
            .filter_map(|name| self.index.get(name).copied())
            .filter(|target| target.kind() == TypeKind::Struct)
            .map(|target| target.name())
            .collect()
    }

    /// Depth-first search over by-value struct containment. Committed
    /// structs cannot reach batch structs, so only batch structs are
    /// walked.
    fn check_containment(&self) -> LoadResult<()> {
        let mut finished: HashSet<&str> = HashSet::new();

        for root in self.batch.iter().filter(|d| d.kind() == TypeKind::Struct) {
            if finished.contains(root.name()) {
                continue;
            }

            let mut path: Vec<(&str, Vec<&str>, usize)> =
                vec![(root.name(), self.containment_edges(root), 0)];

            loop {
                let Some(top) = path.last_mut() else {
                    break;
                };
                let next = top.1.get(top.2).copied();
                top.2 += 1;

                match next {
                    Some(next) => {
                        if let Some(pos) = path.iter().position(|(name, _, _)| *name == next) {
                            let mut cycle: Vec<String> =
                                path[pos..].iter().map(|(name, _, _)| name.to_string()).collect();
                            cycle.push(next.to_string());
                            return Err(LoadError::cycle(cycle));
                        }
                        if finished.contains(next) {
                            continue;
                        }
                        let edges = self
                            .index
                            .get(next)
                            .map(|desc| self.containment_edges(desc))
                            .unwrap_or_default();
                        path.push((next, edges, 0));
                    }
                    None => {
                        if let Some((name, _, _)) = path.pop() {
                            finished.insert(name);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
