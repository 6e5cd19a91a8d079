//! Generation invariants over randomly generated acyclic corpora

use genealogy_core::prelude::*;
use genealogy_test_utils::{CorpusBuilder, Doc};
use proptest::prelude::*;
use proptest::sample::Index;

const TEMPLATE: &str = "t.html";

fn variant_name(i: usize) -> String {
    format!("v{i:02}.html")
}

/// Variant `i` may only point at the template or an earlier variant, so
/// the declared graph is always acyclic. `ghost` adds a dangling parent.
fn build_corpus(shape: &[(Vec<Index>, bool)]) -> CorpusBuilder {
    let mut corpus = CorpusBuilder::new().template(TEMPLATE);
    for (i, (picks, ghost)) in shape.iter().enumerate() {
        let mut parents: Vec<String> = picks
            .iter()
            .map(|pick| match pick.index(i + 1) {
                0 => TEMPLATE.to_string(),
                k => variant_name(k - 1),
            })
            .collect();
        if *ghost {
            parents.push("ghost.html".to_string());
        }
        let refs: Vec<&str> = parents.iter().map(String::as_str).collect();
        let doc = match refs.len() {
            0 => Doc::new("V"),
            1 => Doc::new("V").parent(refs[0]),
            _ => Doc::new("V").parents(&refs),
        };
        corpus = corpus.variant(&variant_name(i), doc);
    }
    corpus
}

fn shape() -> impl Strategy<Value = Vec<(Vec<Index>, bool)>> {
    prop::collection::vec(
        (prop::collection::vec(any::<Index>(), 0..4), any::<bool>()),
        1..12,
    )
}

fn engine(corpus: &CorpusBuilder) -> GenealogyEngine<MemoryStore> {
    GenealogyEngine::new(corpus.memory(), GenealogyConfig::default().without_fallback())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generations_follow_parents(shape in shape()) {
        let analysis = engine(&build_corpus(&shape)).analyze().unwrap();

        prop_assert_eq!(analysis.generation(TEMPLATE), Some(0));
        prop_assert!(analysis.cycles().is_empty());
        prop_assert!(analysis.tree().is_acyclic());

        for (name, resolution) in analysis.resolutions() {
            if name == TEMPLATE {
                continue;
            }
            let generation = analysis.generation(name).unwrap();
            let parent_gens: Vec<u32> = resolution
                .parents()
                .iter()
                .filter_map(|p| analysis.generation(p))
                .collect();
            match parent_gens.iter().max() {
                None => prop_assert_eq!(generation, 1),
                Some(max) => {
                    prop_assert_eq!(generation, max + 1);
                    for g in &parent_gens {
                        prop_assert!(generation > *g);
                    }
                }
            }
        }
    }

    #[test]
    fn repair_reaches_a_fixed_point(shape in shape()) {
        let engine = engine(&build_corpus(&shape));
        let first = engine.repair(RepairOptions::new()).unwrap();
        prop_assert_eq!(first.failed(), 0);

        let second = engine.repair(RepairOptions::new()).unwrap();
        prop_assert!(second.is_clean());

        let analysis = engine.analyze().unwrap();
        for entry in analysis.corpus().variants() {
            prop_assert!(entry.record.conflicts().is_empty());
            prop_assert_eq!(
                entry.record.stored_generation,
                analysis.generation(&entry.record.filename)
            );
        }
    }
}
