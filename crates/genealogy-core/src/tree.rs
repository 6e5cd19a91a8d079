//! Genealogy tree
//!
//! A forest rooted at the base templates. Hybrids have more than one
//! in-edge, so the structure is really a DAG; "tree" is the name the
//! reporting side uses for it. Rebuilt from scratch on every analysis.

use crate::corpus::Corpus;
use crate::generation::GenerationReport;
use crate::resolver::Resolution;
use chrono::{DateTime, Utc};
use genealogy_store::DisplayInfo;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Display metadata for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub filename: String,
    #[serde(flatten)]
    pub display: DisplayInfo,
    pub created: Option<DateTime<Utc>>,
    pub is_template: bool,
    pub is_hybrid: bool,
    /// Resolved parents, dangling ones included
    pub parents: Vec<String>,
    pub generation: u32,
}

/// Node plus its child list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub info: NodeInfo,
    /// Children in filename order
    pub children: Vec<String>,
}

/// Every document as a node, with edges from each resolved parent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenealogyTree {
    nodes: BTreeMap<String, TreeNode>,
    roots: Vec<String>,
}

impl GenealogyTree {
    /// Assemble the forest.
    ///
    /// `primary` and `secondary` are listed first among the roots when
    /// present. Parents that are not nodes are skipped.
    #[must_use]
    pub fn build(
        corpus: &Corpus,
        resolutions: &BTreeMap<String, Resolution>,
        report: &GenerationReport,
        primary: &str,
        secondary: &str,
    ) -> Self {
        let mut nodes = BTreeMap::new();
        for (name, entry) in corpus.iter() {
            let resolution = resolutions.get(name);
            let info = NodeInfo {
                filename: name.to_string(),
                display: entry.record.display.clone(),
                created: entry.created,
                is_template: entry.is_template,
                is_hybrid: resolution.is_some_and(Resolution::is_hybrid),
                parents: resolution.map(|r| r.parents().to_vec()).unwrap_or_default(),
                generation: report.get(name).unwrap_or_default(),
            };
            nodes.insert(
                name.to_string(),
                TreeNode {
                    info,
                    children: Vec::new(),
                },
            );
        }

        let edges: Vec<(String, String)> = nodes
            .values()
            .flat_map(|node| {
                node.info
                    .parents
                    .iter()
                    .map(|parent| (parent.clone(), node.info.filename.clone()))
            })
            .collect();
        for (parent, child) in edges {
            match nodes.get_mut(&parent) {
                Some(node) if !node.children.contains(&child) => node.children.push(child),
                Some(_) => {}
                None => tracing::debug!("{child}: parent {parent} is not a node, edge skipped"),
            }
        }

        let mut roots: Vec<String> = [primary, secondary]
            .into_iter()
            .filter(|name| nodes.get(*name).is_some_and(|n| n.info.is_template))
            .map(str::to_string)
            .collect();
        roots.dedup();
        for node in nodes.values() {
            if node.info.is_template && !roots.contains(&node.info.filename) {
                roots.push(node.info.filename.clone());
            }
        }

        Self { nodes, roots }
    }

    /// Node by filename
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.nodes.get(name)
    }

    /// All nodes keyed by filename
    #[must_use]
    pub fn nodes(&self) -> &BTreeMap<String, TreeNode> {
        &self.nodes
    }

    /// Template roots, well-known templates first
    #[must_use]
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Child filenames of a node
    #[must_use]
    pub fn children(&self, name: &str) -> &[String] {
        self.nodes.get(name).map_or(&[], |n| n.children.as_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Graph view with an edge from each parent to each child
    #[must_use]
    pub fn graph(&self) -> DiGraphMap<&str, ()> {
        let mut graph = DiGraphMap::new();
        for (name, node) in &self.nodes {
            graph.add_node(name.as_str());
            for child in &node.children {
                graph.add_edge(name.as_str(), child.as_str(), ());
            }
        }
        graph
    }

    /// Everything reachable from `name` along child edges, excluding
    /// `name` itself, in breadth-first order.
    ///
    /// These are the variants that lose a resolvable ancestor if `name` is
    /// deleted.
    #[must_use]
    pub fn descendants(&self, name: &str) -> Vec<String> {
        let graph = self.graph();
        if !graph.contains_node(name) {
            return Vec::new();
        }
        let mut bfs = Bfs::new(&graph, name);
        let mut out = Vec::new();
        while let Some(node) = bfs.next(&graph) {
            if node != name {
                out.push(node.to_string());
            }
        }
        out
    }

    /// Whether the parent graph has no cycles
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph())
    }

    /// Nodes not reachable from any root, in filename order
    #[must_use]
    pub fn detached(&self) -> Vec<&TreeNode> {
        let graph = self.graph();
        let mut reached: HashSet<&str> = HashSet::new();
        for root in &self.roots {
            let mut bfs = Bfs::new(&graph, root.as_str());
            while let Some(node) = bfs.next(&graph) {
                reached.insert(node);
            }
        }
        self.nodes
            .values()
            .filter(|n| !reached.contains(n.info.filename.as_str()))
            .collect()
    }
}
