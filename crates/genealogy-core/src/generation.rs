//! Generation calculation
//!
//! Longest path from a root template, computed by depth-first recursion
//! with three-colour marking. The graph is expected to be acyclic but is
//! not trusted to be: reaching a node that is still on the recursion path
//! records the cycle and returns the current depth instead of recursing.
//!
//! All traversal state lives in a [`Walk`] owned by one
//! [`GenerationCalculator::compute`] call.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// Generation of every root template
pub const TEMPLATE_GENERATION: u32 = 0;

/// Generation of a variant with no resolvable parent
pub const ORPHAN_GENERATION: u32 = 1;

/// A detected cycle, first node repeated at the end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CyclePath(pub Vec<String>);

impl CyclePath {
    /// Nodes along the cycle, closing node included
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" → "))
    }
}

/// A declared parent that is not a known document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedParent {
    /// Variant that declared it
    pub variant: String,
    /// The missing name
    pub parent: String,
}

/// Output of one calculation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generation per filename
    pub generations: BTreeMap<String, u32>,
    /// Cycles in discovery order
    pub cycles: Vec<CyclePath>,
    /// Parent references that could not be followed
    pub unresolved: Vec<UnresolvedParent>,
}

impl GenerationReport {
    /// Computed generation of one node
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u32> {
        self.generations.get(name).copied()
    }

    /// Whether any cycle was found
    #[inline]
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Per-call traversal state
#[derive(Default)]
struct Walk<'a> {
    in_progress: HashSet<&'a str>,
    done: HashMap<&'a str, u32>,
    cycles: Vec<CyclePath>,
    unresolved: Vec<UnresolvedParent>,
}

/// Parent graph to compute generations over
#[derive(Debug, Clone, Default)]
pub struct GenerationCalculator<'a> {
    templates: BTreeSet<&'a str>,
    variants: BTreeMap<&'a str, &'a [String]>,
}

impl<'a> GenerationCalculator<'a> {
    /// Create empty calculator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root template
    pub fn add_template(&mut self, name: &'a str) {
        self.variants.remove(name);
        self.templates.insert(name);
    }

    /// Add a variant with its resolved parents in declaration order
    pub fn add_variant(&mut self, name: &'a str, parents: &'a [String]) {
        if !self.templates.contains(name) {
            self.variants.insert(name, parents);
        }
    }

    fn is_known(&self, name: &str) -> bool {
        self.templates.contains(name) || self.variants.contains_key(name)
    }

    /// Compute every node's generation.
    ///
    /// Nodes are visited in filename order, so cycle reports and the
    /// depth-based values assigned inside a cycle are deterministic.
    #[must_use]
    pub fn compute(&self) -> GenerationReport {
        let mut walk = Walk::default();
        let mut path = Vec::new();

        for &name in &self.templates {
            walk.done.insert(name, TEMPLATE_GENERATION);
        }
        for &name in self.variants.keys() {
            if !walk.done.contains_key(name) {
                self.visit(name, &mut path, &mut walk);
            }
        }

        GenerationReport {
            generations: walk
                .done
                .into_iter()
                .map(|(name, generation)| (name.to_string(), generation))
                .collect(),
            cycles: walk.cycles,
            unresolved: walk.unresolved,
        }
    }

    fn visit(&self, name: &'a str, path: &mut Vec<&'a str>, walk: &mut Walk<'a>) -> u32 {
        if walk.in_progress.contains(name) {
            let mut nodes: Vec<String> = path.iter().map(ToString::to_string).collect();
            nodes.push(name.to_string());
            let cycle = CyclePath(nodes);
            tracing::warn!("cycle detected: {cycle}");
            walk.cycles.push(cycle);
            // Depth stands in for the unknown value; not memoized.
            return u32::try_from(path.len()).unwrap_or(u32::MAX);
        }
        if let Some(&generation) = walk.done.get(name) {
            return generation;
        }
        let Some(&parents) = self.variants.get(name) else {
            return TEMPLATE_GENERATION;
        };

        walk.in_progress.insert(name);
        path.push(name);

        let mut max_parent: Option<u32> = None;
        for parent in parents {
            if !self.is_known(parent) {
                tracing::warn!("{name}: unknown parent '{parent}'");
                walk.unresolved.push(UnresolvedParent {
                    variant: name.to_string(),
                    parent: parent.clone(),
                });
                continue;
            }
            let generation = self.visit(parent.as_str(), path, walk);
            max_parent = Some(max_parent.map_or(generation, |m| m.max(generation)));
        }

        path.pop();
        walk.in_progress.remove(name);

        let generation = max_parent.map_or(ORPHAN_GENERATION, |m| m.saturating_add(1));
        walk.done.insert(name, generation);
        generation
    }
}
