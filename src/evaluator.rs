use std::collections::HashSet;

use crate::{
    ast::{Axis, CompiledPath, LabelMatcher, Operand, Predicate, Step},
    tree::{NodeId, NodeStore},
};

/// Where a single-target path points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The path resolves to exactly this node
    Found(NodeId),

    /// Nothing matches yet; `steps[from..]` can be created below `anchor`
    Missing { anchor: NodeId, from: usize },
}

/// Why a path could not be narrowed to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    /// The path (or the prefix the missing part hangs off) is ambiguous
    MultipleMatches(usize),

    /// Step `step` cannot be created
    CannotCreate { step: usize, reason: String },
}

/// Resolves compiled paths against a [`NodeStore`].
///
/// Resolution runs step by step over a node-set. Each step maps every node
/// of the set to its candidates (children with a matching label, the node
/// itself, or its parent) and narrows them with the step's predicates in
/// order. Positional predicates count within the candidates of one context
/// node, so `user[2]` is the second `user` child of each context node.
pub struct Evaluator<'a> {
    store: &'a NodeStore,
}

impl<'a> Evaluator<'a> {
    pub fn new(store: &'a NodeStore) -> Self {
        Evaluator { store }
    }

    /// Resolve a path to its node-set, in document order and without
    /// duplicates.
    ///
    /// Relative paths start at `context`. An append step never matches
    /// existing nodes, so a path ending in one resolves to nothing.
    pub fn resolve(&self, path: &CompiledPath, context: NodeId) -> Vec<NodeId> {
        let mut current = vec![self.start(path, context)];
        for step in path.steps() {
            current = self.apply_step(step, &current);
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// Narrow a path to a single existing node, or to the point where the
    /// missing remainder of the path would be created.
    ///
    /// The remainder is only reported when every missing step is creatable:
    /// a literal label with no predicate, an append marker, or a position
    /// one past the current number of same-label siblings.
    pub fn locate(&self, path: &CompiledPath, context: NodeId) -> Result<Target, LocateError> {
        let mut current = vec![self.start(path, context)];

        for (i, step) in path.steps().iter().enumerate() {
            let next = self.apply_step(step, &current);
            if next.is_empty() {
                if current.len() > 1 {
                    return Err(LocateError::MultipleMatches(current.len()));
                }
                let anchor = current[0];
                self.check_creatable(path, anchor, i)?;
                return Ok(Target::Missing { anchor, from: i });
            }
            current = next;
        }

        match current.as_slice() {
            [single] => Ok(Target::Found(*single)),
            many => Err(LocateError::MultipleMatches(many.len())),
        }
    }

    fn start(&self, path: &CompiledPath, context: NodeId) -> NodeId {
        if path.is_absolute() {
            self.store.root()
        } else {
            context
        }
    }

    fn check_creatable(
        &self,
        path: &CompiledPath,
        anchor: NodeId,
        from: usize,
    ) -> Result<(), LocateError> {
        for (i, step) in path.steps().iter().enumerate().skip(from) {
            let fail = |reason: &str| LocateError::CannotCreate {
                step: i,
                reason: reason.to_string(),
            };
            let (label, predicates) = match step {
                Step::Append { .. } => continue,
                Step::Select {
                    axis: Axis::Child(LabelMatcher::Exact(label)),
                    predicates,
                } => (label, predicates),
                Step::Select {
                    axis: Axis::Child(LabelMatcher::Any),
                    ..
                } => return Err(fail("a wildcard step does not name a label")),
                Step::Select { .. } => {
                    return Err(fail("'.' and '..' steps cannot be created"));
                }
            };

            // Only the first missing step can have existing siblings
            let existing = if i == from {
                self.store.count_children_labelled(anchor, label)
            } else {
                0
            };
            match predicates.as_slice() {
                [] => {}
                [Predicate::Position(n)] if *n == existing as u64 + 1 => {}
                [Predicate::Position(n)] => {
                    return Err(fail(&format!(
                        "position {} is not one past the {} existing '{}' nodes",
                        n, existing, label
                    )));
                }
                _ => return Err(fail("only plain, positional or last()+1 steps can be created")),
            }
        }
        Ok(())
    }

    fn apply_step(&self, step: &Step, contexts: &[NodeId]) -> Vec<NodeId> {
        let (axis, predicates) = match step {
            Step::Select { axis, predicates } => (axis, predicates),
            Step::Append { .. } => return vec![],
        };

        let mut out = vec![];
        for &ctx in contexts {
            let mut candidates: Vec<NodeId> = match axis {
                Axis::Child(matcher) => self
                    .store
                    .children(ctx)
                    .iter()
                    .copied()
                    .filter(|&c| self.store.label(c).is_some_and(|l| matcher.matches(l)))
                    .collect(),
                Axis::SelfNode => vec![ctx],
                Axis::Parent => self.store.parent(ctx).into_iter().collect(),
            };
            for predicate in predicates {
                candidates = self.apply_predicate(predicate, candidates);
            }
            out.extend(candidates);
        }

        // Every node of a set sits at the same depth and the set is in
        // document order, so only '..' can yield a node twice.
        if matches!(axis, Axis::Parent) {
            let mut seen = HashSet::new();
            out.retain(|id| seen.insert(*id));
        }
        out
    }

    fn apply_predicate(&self, predicate: &Predicate, candidates: Vec<NodeId>) -> Vec<NodeId> {
        match predicate {
            Predicate::Position(n) => {
                let n = *n as usize;
                if n == 0 {
                    return vec![];
                }
                candidates.get(n - 1).copied().into_iter().collect()
            }
            Predicate::Last { back } => {
                let back = *back as usize;
                if back >= candidates.len() {
                    return vec![];
                }
                vec![candidates[candidates.len() - 1 - back]]
            }
            Predicate::Compare {
                operand,
                literal,
                negated,
            } => candidates
                .into_iter()
                .filter(|&id| self.compare(id, operand, literal) != *negated)
                .collect(),
            Predicate::HasChild(name) => candidates
                .into_iter()
                .filter(|&id| {
                    self.store
                        .children(id)
                        .iter()
                        .any(|&c| self.store.label(c) == Some(name.as_str()))
                })
                .collect(),
        }
    }

    fn compare(&self, id: NodeId, operand: &Operand, literal: &str) -> bool {
        match operand {
            Operand::SelfValue => self.store.value(id) == Some(literal),
            Operand::Child(name) => self.store.children(id).iter().any(|&c| {
                self.store.label(c) == Some(name.as_str()) && self.store.value(c) == Some(literal)
            }),
        }
    }
}
