use mosaic_core::config::EngineConfig;
use mosaic_core::dom::{Document, Fragment, NodeId};
use mosaic_core::fragment::{compile, register_fragment};
use mosaic_core::page::Page;

/// Page over `<body>{body}</body>`
#[allow(dead_code)]
pub fn page(body: &str) -> Page {
    let html = format!("<html><head></head><body>{}</body></html>", body);
    Page::from_document(Document::parse(&html).unwrap())
}

/// Page with `text` registered under `class_name` using default config
#[allow(dead_code)]
pub fn page_with_fragment(body: &str, class_name: &str, text: &str) -> Page {
    let mut page = page(body);
    register_fragment(&mut page, class_name, compile(text).unwrap(), &EngineConfig::default())
        .unwrap();
    page
}

/// Top-level nodes of a parsed fragment together with the fragment itself
#[allow(dead_code)]
pub fn fragment_roots(text: &str) -> (Fragment, Vec<NodeId>) {
    let fragment = Fragment::parse(text).unwrap();
    let roots = fragment.tree.children(fragment.root()).to_vec();
    (fragment, roots)
}

/// Element with `id` anywhere under the body
#[allow(dead_code)]
pub fn by_id(page: &Page, id: &str) -> NodeId {
    page.document
        .tree
        .element_by_id(page.document.body, id)
        .unwrap()
}
