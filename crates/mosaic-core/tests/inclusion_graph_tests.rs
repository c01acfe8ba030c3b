#![allow(clippy::unwrap_used, clippy::expect_used)]

// Inclusion graph: edges are recorded by document name and any edge back
// to an ancestor is refused without touching the graph.

use mosaic_core::errors::MosaicError;
use mosaic_core::inclusion::InclusionGraph;
use proptest::prelude::*;

fn chain(names: &[String]) -> InclusionGraph {
    let mut graph = InclusionGraph::new();
    for pair in names.windows(2) {
        graph.link(&pair[0], &pair[1]).unwrap();
    }
    graph
}

#[test]
fn test_link_creates_root_for_unknown_parent() {
    let mut graph = InclusionGraph::new();

    graph.link("index", "nav.html").unwrap();

    assert_eq!(graph.roots().len(), 1);
    assert!(graph.has_node("index"));
    assert!(graph.has_node("nav.html"));
}

#[test]
fn test_sibling_reuse_and_shared_children() {
    let mut graph = InclusionGraph::new();

    let first = graph.link("index", "card.html").unwrap();
    let again = graph.link("index", "card.html").unwrap();
    graph.link("index", "footer.html").unwrap();

    assert_eq!(first, again);
    assert_eq!(graph.len(), 3);
}

#[test]
fn test_two_step_cycle_rejected() {
    let mut graph = InclusionGraph::new();
    graph.link("index", "a.html").unwrap();
    graph.link("a.html", "b.html").unwrap();

    let err = graph.link("b.html", "a.html").unwrap_err();

    assert_eq!(
        err,
        MosaicError::CyclicInclusion {
            include_in: "b.html".to_string(),
            src: "a.html".to_string(),
        }
    );
}

#[test]
fn test_display_indents_children() {
    let mut graph = InclusionGraph::new();
    graph.link("index", "a.html").unwrap();
    graph.link("a.html", "b.html").unwrap();

    let rendered = graph.to_string();

    assert_eq!(
        rendered,
        "index (parent: -)\n\ta.html (parent: index)\n\t\tb.html (parent: a.html)\n"
    );
}

fn distinct_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{1,6}\\.html", 2..8)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn prop_back_edge_to_any_ancestor_is_refused(names in distinct_names(), pick in any::<prop::sample::Index>()) {
        let mut graph = chain(&names);
        let before = graph.clone();
        let leaf = names.last().unwrap();
        let ancestor = &names[pick.index(names.len())];

        let result = graph.link(leaf, ancestor);

        let is_cycle = matches!(result, Err(MosaicError::CyclicInclusion { .. }));
        prop_assert!(is_cycle);
        prop_assert_eq!(graph, before);
    }

    #[test]
    fn prop_fresh_leaf_always_links(names in distinct_names()) {
        let mut graph = chain(&names);
        let leaf = names.last().unwrap();

        prop_assert!(graph.link(leaf, "fresh-leaf").is_ok());
        prop_assert_eq!(graph.len(), names.len() + 1);
    }
}
