//! Text printers for each command

use genealogy_core::{
    Analysis, GenealogyTree, LineageStep, RepairOutcome, RepairReport, RowKind, TreeNode,
};
use std::collections::HashSet;
use std::fmt::Write;

const RULE: &str = "============================================================";

/// Issues shown before truncating
const MAX_ISSUES: usize = 10;

pub(crate) fn summary(analysis: &Analysis) -> String {
    let s = analysis.summary();
    let mut out = String::new();
    let _ = writeln!(out, "Genealogy Analysis");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "  Variants:   {}", s.variants);
    let _ = writeln!(out, "  Templates:  {}", s.templates);
    let _ = writeln!(out, "  Hybrids:    {}", s.hybrids);
    let _ = writeln!(out, "  Issues:     {}", s.issues);
    let _ = writeln!(out, "  Cycles:     {}", s.cycles);

    let issues = analysis.issues();
    if !issues.is_empty() {
        let _ = writeln!(out, "\nIssues:");
        for issue in issues.iter().take(MAX_ISSUES) {
            let _ = writeln!(out, "  - {issue}");
        }
        if issues.len() > MAX_ISSUES {
            let _ = writeln!(out, "  ... and {} more", issues.len() - MAX_ISSUES);
        }
    }
    if !analysis.cycles().is_empty() {
        let _ = writeln!(out, "\nCycles:");
        for cycle in analysis.cycles() {
            let _ = writeln!(out, "  - {cycle}");
        }
    }
    out
}

pub(crate) fn tree(tree: &GenealogyTree) -> String {
    let mut out = String::new();
    let mut path = HashSet::new();
    for root in tree.roots() {
        node_line(tree, root, 0, &mut path, &mut out);
    }
    let detached = tree.detached();
    if !detached.is_empty() {
        let _ = writeln!(out, "\nNot reachable from a template:");
        for node in detached {
            let _ = writeln!(out, "  {}", label(node));
        }
    }
    out
}

fn node_line<'a>(
    tree: &'a GenealogyTree,
    name: &'a str,
    depth: usize,
    path: &mut HashSet<&'a str>,
    out: &mut String,
) {
    let Some(node) = tree.get(name) else {
        return;
    };
    let _ = writeln!(out, "{}{}", "  ".repeat(depth), label(node));
    if !path.insert(name) {
        return;
    }
    for child in &node.children {
        node_line(tree, child, depth + 1, path, out);
    }
    path.remove(name);
}

fn label(node: &TreeNode) -> String {
    let info = &node.info;
    let mut s = format!("{} [Gen {}] {}", info.filename, info.generation, info.display.name);
    if info.is_template {
        s.push_str(" (template)");
    } else if info.is_hybrid {
        let _ = write!(s, " (hybrid of {})", info.parents.join(", "));
    }
    s
}

pub(crate) fn generations(analysis: &Analysis) -> String {
    let mut out = String::new();
    for (generation, rows) in analysis.by_generation() {
        let _ = writeln!(out, "Generation {generation} ({} variants):", rows.len());
        for row in rows {
            let marker = match row.kind {
                RowKind::Template => "*",
                RowKind::Hybrid => "+",
                RowKind::Linear => "-",
            };
            let _ = write!(out, "  {marker} {}", row.filename);
            if !row.parents.is_empty() {
                let _ = write!(out, " <- {}", row.parents.join(", "));
            }
            if let Some(was) = row.was {
                let _ = write!(out, " (was Gen {was})");
            }
            out.push('\n');
        }
    }
    out
}

pub(crate) fn repair(report: &RepairReport, dry_run: bool) -> String {
    let mut out = String::new();
    if report.is_clean() {
        let _ = writeln!(out, "No variants need repair.");
        return out;
    }
    for (name, outcome) in &report.outcomes {
        let mark = match outcome {
            RepairOutcome::Failed { .. } => "x",
            _ => "ok",
        };
        let _ = writeln!(out, "  [{mark}] {name}: {outcome}");
    }
    if dry_run {
        let _ = writeln!(out, "\n{} variant(s) would be fixed (dry run)", report.would_fix());
    } else {
        let _ = writeln!(
            out,
            "\nFixed {} variant(s), {} failed",
            report.fixed(),
            report.failed()
        );
    }
    out
}

pub(crate) fn lineage(steps: &[LineageStep]) -> String {
    let mut out = String::new();
    for (i, step) in steps.iter().enumerate() {
        let arrow = if i == 0 { "" } else { "-> " };
        let _ = write!(out, "{}{arrow}{} [Gen {}]", "  ".repeat(i), step.filename, step.generation);
        if step.is_hybrid {
            let _ = write!(out, " (hybrid of {})", step.parents.join(", "));
        }
        out.push('\n');
    }
    out
}

pub(crate) fn hybrids(nodes: &[TreeNode]) -> String {
    if nodes.is_empty() {
        return "No hybrid variants.\n".to_string();
    }
    let mut out = String::new();
    for node in nodes {
        let info = &node.info;
        let _ = writeln!(out, "{} [Gen {}]", info.filename, info.generation);
        let _ = writeln!(out, "  parents:  {}", info.parents.join(", "));
        if let Some(features) = &info.display.hybrid_features {
            let _ = writeln!(out, "  features: {features}");
        }
    }
    out
}

pub(crate) fn descendants(name: &str, names: &[String]) -> String {
    if names.is_empty() {
        return format!("Nothing derives from {name}.\n");
    }
    let mut out = format!("Deleting {name} would orphan {} variant(s):\n", names.len());
    for n in names {
        let _ = writeln!(out, "  {n}");
    }
    out
}
