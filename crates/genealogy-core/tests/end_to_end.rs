//! End-to-end genealogy scenarios over a whole corpus

use genealogy_core::prelude::*;
use genealogy_core::{IssueKind, ORPHAN_GENERATION};
use genealogy_store::VariantRecord;
use genealogy_test_utils::{variant_path, CorpusBuilder, Doc};
use pretty_assertions::assert_eq;

fn engine(corpus: &CorpusBuilder) -> GenealogyEngine<MemoryStore> {
    GenealogyEngine::new(corpus.memory(), GenealogyConfig::default())
}

/// Tenet: T (template) → A → B, H = {A, B} gives 1, 2, 3
#[test]
fn linear_and_hybrid_generations() {
    let corpus = CorpusBuilder::new()
        .template("t.html")
        .variant("a.html", Doc::new("A").parent("t.html"))
        .variant("b.html", Doc::new("B").parent("a.html"))
        .variant("h.html", Doc::new("H").parents(&["a.html", "b.html"]));
    let analysis = engine(&corpus).analyze().unwrap();

    assert_eq!(analysis.generation("t.html"), Some(0));
    assert_eq!(analysis.generation("a.html"), Some(1));
    assert_eq!(analysis.generation("b.html"), Some(2));
    assert_eq!(analysis.generation("h.html"), Some(3));

    let tree = analysis.tree();
    assert_eq!(tree.roots(), ["t.html".to_string()]);
    assert_eq!(tree.children("t.html"), ["a.html".to_string()]);
    assert!(tree.get("h.html").unwrap().info.is_hybrid);
    assert!(tree.is_acyclic());
    assert!(tree.detached().is_empty());
}

/// Tenet: hybrid generation is one past its deepest parent
#[test]
fn hybrid_takes_deepest_parent() {
    let corpus = CorpusBuilder::new()
        .template("t.html")
        .variant("p1a.html", Doc::new("P1a").parent("t.html"))
        .variant("p1.html", Doc::new("P1").parent("p1a.html"))
        .variant("p2a.html", Doc::new("P2a").parent("t.html"))
        .variant("p2b.html", Doc::new("P2b").parent("p2a.html"))
        .variant("p2c.html", Doc::new("P2c").parent("p2b.html"))
        .variant("p2.html", Doc::new("P2").parent("p2c.html"))
        .variant("h.html", Doc::new("H").parents(&["p1.html", "p2.html"]));
    let analysis = engine(&corpus).analyze().unwrap();

    assert_eq!(analysis.generation("p1.html"), Some(2));
    assert_eq!(analysis.generation("p2.html"), Some(4));
    assert_eq!(analysis.generation("h.html"), Some(5));
}

/// Tenet: templates are generation 0 whatever they claim
#[test]
fn templates_ignore_embedded_annotations() {
    let corpus = CorpusBuilder::new()
        .raw(
            Collection::Templates,
            "base_resume.html",
            &Doc::new("Base").parent("x.html").generation(5).build(),
        )
        .variant("a.html", Doc::new("A").parent("base_resume.html"));
    let analysis = engine(&corpus).analyze().unwrap();

    assert_eq!(analysis.generation("base_resume.html"), Some(0));
    assert_eq!(analysis.generation("a.html"), Some(1));
    assert!(analysis.tree().get("base_resume.html").unwrap().info.parents.is_empty());
}

/// Tenet: a variant with no resolvable parent is generation 1
#[test]
fn orphans_are_generation_one() {
    let corpus = CorpusBuilder::new()
        .template("base_resume.html")
        .variant("lost.html", Doc::new("Lost").parent("deleted.html").generation(6));
    let analysis = engine(&corpus).analyze().unwrap();

    assert_eq!(analysis.generation("lost.html"), Some(ORPHAN_GENERATION));
    let kinds: Vec<_> = analysis.issues().iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![IssueKind::UnknownParent]);
}

/// Tenet: undeclared variants fall back to a base template
#[test]
fn undeclared_variants_use_fallback_templates() {
    let corpus = CorpusBuilder::with_default_templates()
        .variant("plain.html", Doc::new("Plain"))
        .variant("gen3_optimal_ml.html", Doc::new("Optimal ML"));
    let analysis = engine(&corpus).analyze().unwrap();

    let tree = analysis.tree();
    assert_eq!(tree.children("base_resume.html"), ["plain.html".to_string()]);
    assert_eq!(
        tree.children("base_resume_v2.html"),
        ["gen3_optimal_ml.html".to_string()]
    );
    assert_eq!(analysis.generation("gen3_optimal_ml.html"), Some(1));
}

/// Tenet: absent default templates leave undeclared variants as clean orphans
#[test]
fn fallback_without_configured_templates() {
    let corpus = CorpusBuilder::new()
        .template("t.html")
        .variant("plain.html", Doc::new("Plain"))
        .variant("gen3_optimal_ml.html", Doc::new("Optimal ML"))
        .variant("a.html", Doc::new("A").parent("t.html"));
    let engine = engine(&corpus);
    let analysis = engine.analyze().unwrap();

    assert!(analysis.issues().is_empty());
    assert_eq!(analysis.generation("plain.html"), Some(ORPHAN_GENERATION));
    assert_eq!(analysis.generation("gen3_optimal_ml.html"), Some(ORPHAN_GENERATION));
    assert!(analysis.tree().get("plain.html").unwrap().info.parents.is_empty());
    let detached: Vec<&str> = analysis
        .tree()
        .detached()
        .iter()
        .map(|n| n.info.filename.as_str())
        .collect();
    assert_eq!(detached, vec!["gen3_optimal_ml.html", "plain.html"]);

    let report = engine.repair(RepairOptions::new()).unwrap();
    assert_eq!(report.fixed(), 3);
    assert!(engine.analyze().unwrap().issues().is_empty());
}

/// Tenet: deleting a parent turns children into orphans, not errors
#[test]
fn deleting_a_parent_orphans_its_children() {
    let corpus = CorpusBuilder::new()
        .template("base_resume.html")
        .variant("a.html", Doc::new("A").parent("base_resume.html"))
        .variant("b.html", Doc::new("B").parent("a.html"))
        .variant("c.html", Doc::new("C").parent("b.html"));
    let engine = engine(&corpus);

    let mut impact = engine.descendants("a.html").unwrap();
    impact.sort();
    assert_eq!(impact, vec!["b.html".to_string(), "c.html".to_string()]);

    assert!(engine.store().remove(Collection::Variants, "a.html"));
    let analysis = engine.analyze().unwrap();
    assert_eq!(analysis.generation("b.html"), Some(1));
    assert_eq!(analysis.generation("c.html"), Some(2));
    assert_eq!(analysis.summary().issues, 1);
}

/// Tenet: one unreadable document does not stop analysis
#[test]
fn unreadable_document_is_a_diagnostic() {
    let corpus = CorpusBuilder::new()
        .template("base_resume.html")
        .variant("a.html", Doc::new("A").parent("base_resume.html"));
    let engine = engine(&corpus);
    engine
        .store()
        .insert_bytes(Collection::Variants, "broken.html", vec![0xff, 0xfe, 0x00]);

    let analysis = engine.analyze().unwrap();
    let summary = analysis.summary();
    assert_eq!(summary.variants, 2);
    assert_eq!(summary.issues, 1);
    assert_eq!(analysis.issues()[0].kind, IssueKind::Unreadable);
    assert_eq!(analysis.generation("a.html"), Some(1));
}

/// Tenet: lineage runs root-first along first parents
#[test]
fn lineage_is_root_first() {
    let corpus = CorpusBuilder::new()
        .template("t.html")
        .variant("a.html", Doc::new("A").parent("t.html"))
        .variant("b.html", Doc::new("B").parent("a.html"))
        .variant("h.html", Doc::new("H").parents(&["b.html", "a.html"]));
    let chain: Vec<String> = engine(&corpus)
        .lineage("h.html")
        .unwrap()
        .into_iter()
        .map(|s| s.filename)
        .collect();
    assert_eq!(chain, ["t.html", "a.html", "b.html", "h.html"].map(String::from));
}

/// Tenet: the on-disk store behaves like the in-memory one
#[test]
fn filesystem_corpus_matches_memory_corpus() {
    let corpus = CorpusBuilder::new()
        .template("t.html")
        .variant("a.html", Doc::new("A").parent("t.html"))
        .variant("h.html", Doc::new("H").parents(&["a.html", "t.html"]));
    let (_dir, store) = corpus.on_disk();
    let on_disk = GenealogyEngine::new(store, GenealogyConfig::default())
        .analyze()
        .unwrap();
    let in_memory = engine(&corpus).analyze().unwrap();

    assert_eq!(
        on_disk.generations().generations,
        in_memory.generations().generations
    );
    assert!(on_disk
        .tree()
        .nodes()
        .values()
        .all(|n| n.info.created.is_some()));
}

/// Tenet: repair on disk rewrites the variant file in place
#[test]
fn filesystem_repair_rewrites_file() {
    let corpus = CorpusBuilder::new()
        .template("t.html")
        .variant("a.html", Doc::new("A").parent("t.html").generation(7));
    let (dir, store) = corpus.on_disk();
    let engine = GenealogyEngine::new(store, GenealogyConfig::default());

    assert_eq!(engine.repair(RepairOptions::new()).unwrap().fixed(), 1);
    let text = std::fs::read_to_string(variant_path(&dir, "a.html")).unwrap();
    let record = VariantRecord::parse("a.html", &text);
    assert_eq!(record.stored_generation, Some(1));
    assert_eq!(record.parents, vec!["t.html".to_string()]);
}

/// Tenet: a new hybrid keeps the copied body but not the parent's target job
#[test]
fn hybrid_does_not_inherit_job_annotations() {
    let corpus = CorpusBuilder::new()
        .template("t.html")
        .variant(
            "sre.html",
            Doc::new("SRE")
                .parent("t.html")
                .generation(1)
                .annotation("JOB_TITLE", "Site Reliability Engineer")
                .annotation("JOB_COMPANY", "Acme")
                .body("<p>Kubernetes at scale</p>"),
        )
        .variant("ml.html", Doc::new("ML").parent("t.html").generation(1));
    let engine = engine(&corpus);

    let parents = vec!["sre.html".to_string(), "ml.html".to_string()];
    engine.create_hybrid(&parents, "sre_ml.html", None).unwrap();

    let text = engine
        .store()
        .contents(Collection::Variants, "sre_ml.html")
        .unwrap();
    assert!(text.contains("<p>Kubernetes at scale</p>"));
    assert!(!text.contains("JOB_TITLE"));
    assert!(!text.contains("JOB_COMPANY"));
    let record = VariantRecord::parse("sre_ml.html", &text);
    assert_eq!(record.display.job_title, None);
    assert_eq!(record.parents, parents);
    assert_eq!(record.stored_generation, Some(2));
}
