#![allow(clippy::unwrap_used, clippy::expect_used)]

// Component lifecycle across the core registries: hook order, independent
// instances of one template and marker reuse.

mod common;

use std::sync::{Arc, Mutex};

use common::{by_id, page_with_fragment};
use mosaic_core::component::{
    create_instance, mount, register_instance, set_var, unmount, unregister_instance, Behavior,
    BehaviorRegistry, HookContext, InstanceRequest,
};
use mosaic_core::config::Vocabulary;
use mosaic_core::include_tag::StateMap;
use mosaic_core::page::Page;
use serde_json::json;

const BADGE: &str = "<script>class Badge {}</script>\
    <component-markup><b>{text}</b></component-markup>";

struct Badge {
    log: Arc<Mutex<Vec<String>>>,
}

impl Badge {
    fn record(&self, ctx: &HookContext<'_>, hook: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", ctx.instance_id(), hook));
    }
}

impl Behavior for Badge {
    fn class_name(&self) -> &str {
        "Badge"
    }

    fn initialize(&mut self, ctx: &mut HookContext<'_>) {
        self.record(ctx, "initialize");
        if ctx.var("text").is_none() {
            ctx.set_var("text", "new");
        }
    }

    fn before_mount(&mut self, ctx: &mut HookContext<'_>) {
        self.record(ctx, "before_mount");
    }

    fn after_mount(&mut self, ctx: &mut HookContext<'_>) {
        self.record(ctx, "after_mount");
    }

    fn before_unmount(&mut self, ctx: &mut HookContext<'_>) {
        self.record(ctx, "before_unmount");
    }

    fn after_unmount(&mut self, ctx: &mut HookContext<'_>) {
        self.record(ctx, "after_unmount");
    }
}

fn behaviors(log: &Arc<Mutex<Vec<String>>>) -> BehaviorRegistry {
    let mut registry = BehaviorRegistry::new();
    let log = Arc::clone(log);
    registry.register("Badge", move || {
        Box::new(Badge {
            log: Arc::clone(&log),
        })
    });
    registry
}

fn place(page: &mut Page, behaviors: &BehaviorRegistry, slot: &str, id: &str, vars: StateMap) {
    let source = by_id(page, slot);
    let request = InstanceRequest {
        class_name: "Badge",
        instance_id: id,
        source,
        props: StateMap::new(),
        vars,
        keep_source: false,
    };
    let instance = create_instance(page, behaviors, request, &Vocabulary::default()).unwrap();
    register_instance(page, instance).unwrap();
    mount(page, id).unwrap();
}

#[test]
fn test_hooks_run_in_lifecycle_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = behaviors(&log);
    let mut page = page_with_fragment(r#"<div id="one"></div>"#, "Badge", BADGE);

    place(&mut page, &registry, "one", "b1", StateMap::new());
    unmount(&mut page, "b1").unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "b1:initialize",
            "b1:before_mount",
            "b1:after_mount",
            "b1:before_unmount",
            "b1:after_unmount",
        ]
    );
}

#[test]
fn test_initialize_may_introduce_vars() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = behaviors(&log);
    let mut page = page_with_fragment(r#"<div id="one"></div>"#, "Badge", BADGE);

    place(&mut page, &registry, "one", "b1", StateMap::new());

    assert_eq!(page.document.body_html(), "<b>new</b>");
    set_var(&mut page, "b1", "text", json!("changed")).unwrap();
    assert_eq!(page.document.body_html(), "<b>changed</b>");
}

#[test]
fn test_instances_of_one_template_are_independent() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = behaviors(&log);
    let mut page = page_with_fragment(
        r#"<div id="one"></div><hr><div id="two"></div>"#,
        "Badge",
        BADGE,
    );
    let mut vars = StateMap::new();
    vars.insert("text".to_string(), json!("first"));

    place(&mut page, &registry, "one", "b1", vars);
    place(&mut page, &registry, "two", "b2", StateMap::new());
    set_var(&mut page, "b2", "text", json!("second")).unwrap();

    assert_eq!(page.document.body_html(), "<b>first</b><hr><b>second</b>");
    let template = page.fragments.get("Badge").unwrap();
    assert_eq!(template.tree.text_content(template.markup), "{text}");
}

#[test]
fn test_marker_reused_after_unregister() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = behaviors(&log);
    let mut page = page_with_fragment(r#"<p>a</p><div id="one"></div><p>z</p>"#, "Badge", BADGE);
    place(&mut page, &registry, "one", "b1", StateMap::new());
    unmount(&mut page, "b1").unwrap();
    unregister_instance(&mut page, "b1").unwrap();

    assert!(page.document.tree.find_marker("b1").is_some());

    // The original source is gone; the marker alone anchors the new instance.
    let anchor = page.document.tree.find_marker("b1").unwrap();
    let request = InstanceRequest {
        class_name: "Badge",
        instance_id: "b1",
        source: anchor,
        props: StateMap::new(),
        vars: StateMap::new(),
        keep_source: true,
    };
    let instance = create_instance(&mut page, &registry, request, &Vocabulary::default()).unwrap();
    register_instance(&mut page, instance).unwrap();
    mount(&mut page, "b1").unwrap();

    assert_eq!(page.document.body_html(), "<p>a</p><b>new</b><p>z</p>");
}
