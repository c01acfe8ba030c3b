//! Include resolution loop
//!
//! A pass scans the host document for include tags in document order and
//! resolves them one at a time. Content inserted by a pass may carry new
//! include tags; the next pass picks those up. Resolution ends when a scan
//! finds nothing, when a tag fails under `FailurePolicy::HaltPass`, or with
//! `PassLimitExceeded` once `max_passes` scans still found work.
//!
//! Per tag the order is fixed: validate, record the inclusion edge (cycle
//! check), fetch, then insert. A cyclic tag is never fetched.

use mosaic_core::component::{self, BehaviorRegistry, InstanceRequest};
use mosaic_core::config::{EngineConfig, FailurePolicy};
use mosaic_core::dom::{Fragment, NodeId};
use mosaic_core::errors::{ExError, MosaicError, Result};
use mosaic_core::fragment::{self, RegisterOutcome};
use mosaic_core::include_tag::{ComponentTarget, IncludeDirective};
use mosaic_core::inclusion::InclusionGraph;
use mosaic_core::logging_facility::pass_span;
use mosaic_core::page::Page;
use mosaic_core_types::PassId;
use tracing::Instrument;

use crate::loader::FragmentLoader;

/// A tag that could not be resolved
#[derive(Debug, Clone)]
pub struct TagFailure {
    pub src: String,
    pub include_in: String,
    pub error: ExError,
}

/// Outcome of one `resolve_includes` run
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Scans that found at least one include tag
    pub passes: usize,
    pub plain_includes: usize,
    pub component_includes: usize,
    /// Component instances created and mounted
    pub instances_mounted: usize,
    pub failures: Vec<TagFailure>,
    /// A failure stopped resolution under `FailurePolicy::HaltPass`
    pub halted: bool,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.halted
    }
}

enum Resolved {
    Plain,
    Component { instances: usize },
}

/// Mutable engine state the resolver works on
pub(crate) struct ResolveState<'a> {
    pub page: &'a mut Page,
    pub graph: &'a mut InclusionGraph,
    pub behaviors: &'a BehaviorRegistry,
    pub config: &'a EngineConfig,
}

/// Include tags currently attached to the document, in document order
fn scan(page: &Page, config: &EngineConfig) -> Vec<NodeId> {
    let tree = &page.document.tree;
    tree.descendants(tree.root())
        .into_iter()
        .filter(|node| {
            tree.element(*node)
                .is_some_and(|e| config.vocabulary.is_include_tag(&e.name))
        })
        .collect()
}

pub(crate) async fn resolve<L>(mut state: ResolveState<'_>, loader: &L) -> Result<ResolutionReport>
where
    L: FragmentLoader + ?Sized,
{
    let config = state.config;
    let mut report = ResolutionReport::default();

    loop {
        let tags = scan(state.page, config);
        if tags.is_empty() {
            return Ok(report);
        }
        if report.passes >= config.max_passes {
            tracing::warn!(
                max_passes = config.max_passes,
                pending = tags.len(),
                "include tags still pending at pass limit"
            );
            return Err(MosaicError::PassLimitExceeded {
                max_passes: config.max_passes,
            });
        }
        report.passes += 1;

        let pass_id = PassId::new();
        let halted = run_pass(&mut state, loader, &tags, &pass_id, &mut report)
            .instrument(pass_span(&pass_id))
            .await;
        if halted {
            report.halted = true;
            return Ok(report);
        }
    }
}

/// Resolve every tag found by one scan; returns true when the pass halted.
async fn run_pass<L>(
    state: &mut ResolveState<'_>,
    loader: &L,
    tags: &[NodeId],
    pass_id: &PassId,
    report: &mut ResolutionReport,
) -> bool
where
    L: FragmentLoader + ?Sized,
{
    tracing::debug!(pass = report.passes, tags = tags.len(), "resolution pass started");
    let config = state.config;
    // Tags taken out during this pass. Their slots are freed only once the
    // pass is over, so ids still queued in `tags` cannot be recycled.
    let mut spent = Vec::new();
    let halted = 'tags: {
        for &tag in tags {
            // Earlier tags in this pass may have replaced an ancestor.
            if !state.page.document.tree.is_attached(tag) {
                continue;
            }

            match resolve_tag(state, loader, tag).await {
                Ok(Resolved::Plain) => {
                    report.plain_includes += 1;
                    spent.push(tag);
                }
                Ok(Resolved::Component { instances }) => {
                    report.component_includes += 1;
                    report.instances_mounted += instances;
                    spent.push(tag);
                }
                Err(err) => {
                    let src = tag_attr(state.page, tag, &config.vocabulary.src_attr);
                    let include_in = tag_attr(state.page, tag, &config.vocabulary.include_in_attr);
                    let error = ExError::from(err).with_pass_id(pass_id.clone());
                    tracing::warn!(
                        src = %src,
                        include_in = %include_in,
                        err_code = error.code(),
                        policy = ?config.failure_policy,
                        "include tag failed"
                    );
                    report.failures.push(TagFailure {
                        src,
                        include_in,
                        error,
                    });

                    match config.failure_policy {
                        FailurePolicy::SkipTag => {
                            if let Err(e) = state.page.document.tree.detach(tag) {
                                tracing::warn!(error = %e, "failed include tag could not be removed");
                            }
                            spent.push(tag);
                        }
                        FailurePolicy::HaltPass => break 'tags true,
                    }
                }
            }
        }
        false
    };

    for tag in spent {
        if let Err(e) = state.page.document.tree.release(tag) {
            tracing::warn!(error = %e, "spent include tag could not be released");
        }
    }
    halted
}

fn tag_attr(page: &Page, tag: NodeId, name: &str) -> String {
    page.document
        .tree
        .get_attribute(tag, name)
        .unwrap_or_default()
        .to_string()
}

async fn resolve_tag<L>(
    state: &mut ResolveState<'_>,
    loader: &L,
    tag: NodeId,
) -> Result<Resolved>
where
    L: FragmentLoader + ?Sized,
{
    let config = state.config;
    let directive =
        IncludeDirective::from_element(&state.page.document.tree, tag, &config.vocabulary)?;
    state.graph.link(&directive.include_in, &directive.src)?;

    let text = loader.load(&directive.src).await?;

    match &directive.component {
        None => {
            insert_plain(state.page, &directive, &text)?;
            Ok(Resolved::Plain)
        }
        Some(target) => {
            let instances =
                insert_component(state.page, state.behaviors, config, &directive, target, &text)?;
            Ok(Resolved::Component { instances })
        }
    }
}

/// Parse `text` once and place `repeat` copies before the tag, then drop
/// the tag.
fn insert_plain(page: &mut Page, directive: &IncludeDirective, text: &str) -> Result<()> {
    let fragment = Fragment::parse(text)?;
    let top: Vec<NodeId> = fragment.tree.children(fragment.root()).to_vec();
    let tree = &mut page.document.tree;

    for _ in 0..directive.repeat {
        for node in &top {
            let copy = tree.import_subtree(&fragment.tree, *node)?;
            tree.insert_before(directive.node, copy)?;
        }
    }
    tree.detach(directive.node)?;

    tracing::debug!(
        src = %directive.src,
        include_in = %directive.include_in,
        repeat = directive.repeat,
        nodes = top.len() * directive.repeat,
        "plain include inserted"
    );
    Ok(())
}

/// Register the fragment (once per class), then create, register and mount
/// one instance per id. Markers go in before the tag, which is removed only
/// once every instance is mounted. If any instance fails, the instances of
/// this tag are rolled back and the tag stays where it was.
fn insert_component(
    page: &mut Page,
    behaviors: &BehaviorRegistry,
    config: &EngineConfig,
    directive: &IncludeDirective,
    target: &ComponentTarget,
    text: &str,
) -> Result<usize> {
    let compiled = fragment::compile(text)?;
    let outcome = fragment::register_fragment(page, &target.class_name, compiled, config)?;
    if outcome == RegisterOutcome::AlreadyPresent {
        tracing::debug!(class_name = %target.class_name, "fragment class already registered");
    }

    let ids = directive.instance_ids();
    let mut placed: Vec<Placed<'_>> = Vec::with_capacity(ids.len());
    for instance_id in &ids {
        let result = place_instance(page, behaviors, config, directive, target, instance_id, &mut placed);
        if let Err(e) = result {
            rollback(page, &placed);
            return Err(e);
        }
    }
    page.document.tree.detach(directive.node)?;

    tracing::debug!(
        src = %directive.src,
        class_name = %target.class_name,
        instances = ids.len(),
        "component include mounted"
    );
    Ok(ids.len())
}

/// An instance placed by the current tag
struct Placed<'i> {
    instance_id: &'i str,
    registered: bool,
    fresh_marker: bool,
}

fn place_instance<'i>(
    page: &mut Page,
    behaviors: &BehaviorRegistry,
    config: &EngineConfig,
    directive: &IncludeDirective,
    target: &ComponentTarget,
    instance_id: &'i str,
    placed: &mut Vec<Placed<'i>>,
) -> Result<()> {
    let fresh_marker = page.document.tree.find_marker(instance_id).is_none();
    let request = InstanceRequest {
        class_name: &target.class_name,
        instance_id,
        source: directive.node,
        props: target.props.clone(),
        vars: target.vars.clone(),
        keep_source: true,
    };
    let instance = match component::create_instance(page, behaviors, request, &config.vocabulary) {
        Ok(instance) => instance,
        Err(e) => {
            if fresh_marker {
                remove_marker(page, instance_id);
            }
            return Err(e);
        }
    };
    placed.push(Placed {
        instance_id,
        registered: false,
        fresh_marker,
    });
    component::register_instance(page, instance)?;
    if let Some(last) = placed.last_mut() {
        last.registered = true;
    }
    component::mount(page, instance_id)
}

/// Undo the instances of a failed component tag, newest first.
fn rollback(page: &mut Page, placed: &[Placed<'_>]) {
    for p in placed.iter().rev() {
        if p.registered {
            if page.components.is_mounted(p.instance_id) {
                if let Err(e) = component::unmount(page, p.instance_id) {
                    tracing::warn!(instance_id = p.instance_id, error = %e, "rollback unmount failed");
                }
            }
            if let Err(e) = component::unregister_instance(page, p.instance_id) {
                tracing::warn!(instance_id = p.instance_id, error = %e, "rollback unregister failed");
            }
        }
        if p.fresh_marker {
            remove_marker(page, p.instance_id);
        }
    }
    tracing::debug!(instances = placed.len(), "component include rolled back");
}

fn remove_marker(page: &mut Page, instance_id: &str) {
    if let Some(marker) = page.document.tree.find_marker(instance_id) {
        if let Err(e) = page.document.tree.remove(marker) {
            tracing::warn!(instance_id, error = %e, "marker removal failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::StaticLoader;
    use mosaic_core::dom::Document;

    fn state<'a>(
        page: &'a mut Page,
        graph: &'a mut InclusionGraph,
        behaviors: &'a BehaviorRegistry,
        config: &'a EngineConfig,
    ) -> ResolveState<'a> {
        ResolveState {
            page,
            graph,
            behaviors,
            config,
        }
    }

    #[tokio::test]
    async fn test_scan_order_and_plain_insert() {
        let document = Document::parse(
            r#"<body><include src="a.html" include-in="index"></include><p>mid</p><include src="b.html" include-in="index"></include></body>"#,
        )
        .unwrap();
        let mut page = Page::from_document(document);
        let mut graph = InclusionGraph::new();
        let behaviors = BehaviorRegistry::new();
        let config = EngineConfig::default();
        let loader = StaticLoader::new()
            .with("a.html", "<i>a</i>")
            .with("b.html", "<b>b</b>");

        let report = resolve(state(&mut page, &mut graph, &behaviors, &config), &loader)
            .await
            .unwrap();

        assert_eq!(report.passes, 1);
        assert_eq!(report.plain_includes, 2);
        assert!(report.is_clean());
        assert_eq!(loader.requests(), vec!["a.html", "b.html"]);
        assert_eq!(page.document.body_html(), "<i>a</i><p>mid</p><b>b</b>");
    }

    #[tokio::test]
    async fn test_cycle_is_not_fetched() {
        let document = Document::parse(
            r#"<body><include src="index" include-in="index"></include></body>"#,
        )
        .unwrap();
        let mut page = Page::from_document(document);
        let mut graph = InclusionGraph::new();
        let behaviors = BehaviorRegistry::new();
        let config = EngineConfig::default();
        let loader = StaticLoader::new();

        let report = resolve(state(&mut page, &mut graph, &behaviors, &config), &loader)
            .await
            .unwrap();

        assert_eq!(loader.request_count(), 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error.code(), "ERR_CYCLIC_INCLUSION");
        assert_eq!(page.document.body_html(), "");
    }
}
