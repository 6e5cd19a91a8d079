//! Lineage trace: the chain from a root down to one variant

use crate::error::{GenealogyError, Result};
use crate::tree::GenealogyTree;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One node on a lineage chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageStep {
    pub filename: String,
    pub parents: Vec<String>,
    pub is_hybrid: bool,
    pub generation: u32,
}

/// Follow the first resolvable parent from `name` upward, then return the
/// chain root-first.
///
/// Stops at a template, at a node with no parent in the tree, or when a
/// node would repeat.
///
/// # Errors
/// [`GenealogyError::UnknownVariant`] if `name` is not in the tree
pub fn trace(tree: &GenealogyTree, name: &str) -> Result<Vec<LineageStep>> {
    let mut node = tree
        .get(name)
        .ok_or_else(|| GenealogyError::UnknownVariant(name.to_string()))?;

    let mut seen = HashSet::new();
    let mut chain = Vec::new();
    loop {
        seen.insert(node.info.filename.as_str());
        chain.push(LineageStep {
            filename: node.info.filename.clone(),
            parents: node.info.parents.clone(),
            is_hybrid: node.info.is_hybrid,
            generation: node.info.generation,
        });
        let next = node
            .info
            .parents
            .iter()
            .filter(|p| !seen.contains(p.as_str()))
            .find_map(|p| tree.get(p));
        match next {
            Some(parent) => node = parent,
            None => break,
        }
    }
    chain.reverse();
    Ok(chain)
}
