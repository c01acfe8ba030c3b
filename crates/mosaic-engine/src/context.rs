//! Engine context
//!
//! Owns everything one composed page needs: the page (document plus
//! registries), the inclusion graph, the behavior classes and the
//! configuration. Created when the host starts the engine and dropped at
//! teardown.
//!
//! ## Logging Ownership
//!
//! This module owns boundary logging for every public operation:
//! `log_op_start!` at entry, `log_op_end!` with `duration_ms` on success and
//! `log_op_error!` on failure. `mosaic-core` only emits `debug!`/`warn!`.

use mosaic_core::component::{self, Behavior, BehaviorRegistry, ComponentInstance, InstanceRequest};
use mosaic_core::config::EngineConfig;
use mosaic_core::dom::{Document, NodeId};
use mosaic_core::errors::Result;
use mosaic_core::events::EventBinding;
use mosaic_core::fragment::{self, FragmentTemplate, RegisterOutcome};
use mosaic_core::include_tag::StateMap;
use mosaic_core::inclusion::InclusionGraph;
use mosaic_core::page::Page;
use mosaic_core::{log_op_end, log_op_error, log_op_start};
use serde_json::Value;

use crate::loader::FragmentLoader;
use crate::resolver::{self, ResolutionReport, ResolveState};

#[derive(Debug)]
pub struct EngineContext {
    page: Page,
    graph: InclusionGraph,
    behaviors: BehaviorRegistry,
    config: EngineConfig,
}

impl EngineContext {
    pub fn new(document: Document, config: EngineConfig) -> Self {
        Self {
            page: Page::from_document(document),
            graph: InclusionGraph::new(),
            behaviors: BehaviorRegistry::new(),
            config,
        }
    }

    /// Parse `html` as the host document.
    ///
    /// # Errors
    ///
    /// `Config` when the configuration is invalid, `Parse` when the document
    /// cannot be read.
    pub fn from_html(html: &str, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let document = Document::parse(html)?;
        Ok(Self::new(document, config))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn document(&self) -> &Document {
        &self.page.document
    }

    pub fn graph(&self) -> &InclusionGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    pub fn fragment(&self, class_name: &str) -> Option<&FragmentTemplate> {
        self.page.fragments.get(class_name)
    }

    pub fn instance(&self, instance_id: &str) -> Option<&ComponentInstance> {
        self.page.components.get(instance_id)
    }

    pub fn is_mounted(&self, instance_id: &str) -> bool {
        self.page.components.is_mounted(instance_id)
    }

    /// Serialized host document
    pub fn render(&self) -> String {
        self.page.document.to_html()
    }

    pub fn render_body(&self) -> String {
        self.page.document.body_html()
    }

    /// Make a behavior class available to component includes.
    pub fn register_behavior<F>(&mut self, class_name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Behavior> + Send + Sync + 'static,
    {
        log_op_start!("register_behavior", class_name = class_name);
        let start = std::time::Instant::now();
        self.behaviors.register(class_name, factory);
        log_op_end!(
            "register_behavior",
            duration_ms = start.elapsed().as_millis() as u64,
            class_name = class_name
        );
    }

    /// Compile `text` and register it under `class_name`.
    ///
    /// # Errors
    ///
    /// See [`fragment::register_fragment`].
    pub fn register_fragment(&mut self, class_name: &str, text: &str) -> Result<RegisterOutcome> {
        log_op_start!("register_fragment", class_name = class_name);
        let start = std::time::Instant::now();

        let outcome = fragment::compile(text)
            .and_then(|compiled| {
                fragment::register_fragment(&mut self.page, class_name, compiled, &self.config)
            })
            .map_err(|e| {
                log_op_error!(
                    "register_fragment",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        log_op_end!(
            "register_fragment",
            duration_ms = start.elapsed().as_millis() as u64,
            class_name = class_name,
            outcome = ?outcome
        );
        Ok(outcome)
    }

    /// # Errors
    ///
    /// `FragmentNotInRegistry` when `class_name` was never registered.
    pub fn unregister_fragment(&mut self, class_name: &str) -> Result<FragmentTemplate> {
        log_op_start!("unregister_fragment", class_name = class_name);
        let start = std::time::Instant::now();

        let template = fragment::unregister_fragment(&mut self.page, class_name).map_err(|e| {
            log_op_error!(
                "unregister_fragment",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "unregister_fragment",
            duration_ms = start.elapsed().as_millis() as u64,
            class_name = class_name
        );
        Ok(template)
    }

    /// Create an instance of `class_name` at `source`. The instance is
    /// returned unregistered; pass it to [`Self::register_instance`].
    ///
    /// # Errors
    ///
    /// See [`component::create_instance`]. A taken `instance_id` fails
    /// before the tree is touched.
    pub fn create_instance(
        &mut self,
        class_name: &str,
        instance_id: &str,
        source: NodeId,
        props: StateMap,
        vars: StateMap,
    ) -> Result<ComponentInstance> {
        log_op_start!(
            "create_instance",
            class_name = class_name,
            instance_id = instance_id
        );
        let start = std::time::Instant::now();

        let request = InstanceRequest {
            class_name,
            instance_id,
            source,
            props,
            vars,
            keep_source: false,
        };
        let instance = component::create_instance(
            &mut self.page,
            &self.behaviors,
            request,
            &self.config.vocabulary,
        )
        .map_err(|e| {
            log_op_error!(
                "create_instance",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "create_instance",
            duration_ms = start.elapsed().as_millis() as u64,
            instance_id = instance_id,
            nodes = instance.cloned_nodes.len()
        );
        Ok(instance)
    }

    /// # Errors
    ///
    /// `InstanceAlreadyRegistered` when the id is taken.
    pub fn register_instance(&mut self, instance: ComponentInstance) -> Result<()> {
        let instance_id = instance.instance_id.clone();
        log_op_start!("register_instance", instance_id = %instance_id);
        let start = std::time::Instant::now();

        component::register_instance(&mut self.page, instance).map_err(|e| {
            log_op_error!(
                "register_instance",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "register_instance",
            duration_ms = start.elapsed().as_millis() as u64,
            instance_id = %instance_id
        );
        Ok(())
    }

    /// Insert a registered instance after its marker.
    ///
    /// # Errors
    ///
    /// See [`component::mount`]. A failed mount leaves the instance
    /// unmounted.
    pub fn mount(&mut self, instance_id: &str) -> Result<()> {
        log_op_start!("mount", instance_id = instance_id);
        let start = std::time::Instant::now();

        component::mount(&mut self.page, instance_id).map_err(|e| {
            log_op_error!(
                "mount",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "mount",
            duration_ms = start.elapsed().as_millis() as u64,
            instance_id = instance_id
        );
        Ok(())
    }

    /// # Errors
    ///
    /// See [`component::unmount`]. A failed unmount leaves the instance
    /// mounted.
    pub fn unmount(&mut self, instance_id: &str) -> Result<()> {
        log_op_start!("unmount", instance_id = instance_id);
        let start = std::time::Instant::now();

        component::unmount(&mut self.page, instance_id).map_err(|e| {
            log_op_error!(
                "unmount",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "unmount",
            duration_ms = start.elapsed().as_millis() as u64,
            instance_id = instance_id
        );
        Ok(())
    }

    /// Drop an unmounted instance and free its cloned nodes.
    ///
    /// # Errors
    ///
    /// `InstanceNotRegistered`, or `StillMounted` while it is mounted.
    pub fn unregister_instance(&mut self, instance_id: &str) -> Result<ComponentInstance> {
        log_op_start!("unregister_instance", instance_id = instance_id);
        let start = std::time::Instant::now();

        let instance = component::unregister_instance(&mut self.page, instance_id).map_err(|e| {
            log_op_error!(
                "unregister_instance",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "unregister_instance",
            duration_ms = start.elapsed().as_millis() as u64,
            instance_id = instance_id
        );
        Ok(instance)
    }

    /// Write a var and re-render the placeholders that use it; returns the
    /// number of nodes re-rendered.
    ///
    /// # Errors
    ///
    /// `InstanceNotRegistered`, or `UnknownField` when `field` is not a var.
    pub fn set_var(
        &mut self,
        instance_id: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<usize> {
        log_op_start!("set_var", instance_id = instance_id, field = field);
        let start = std::time::Instant::now();

        let rendered = component::set_var(&mut self.page, instance_id, field, value.into())
            .map_err(|e| {
                log_op_error!(
                    "set_var",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        log_op_end!(
            "set_var",
            duration_ms = start.elapsed().as_millis() as u64,
            instance_id = instance_id,
            field = field,
            rendered = rendered
        );
        Ok(rendered)
    }

    /// Props are read-only after creation; a write to a known prop is
    /// ignored.
    ///
    /// # Errors
    ///
    /// `InstanceNotRegistered`, or `UnknownField` when `field` is not a prop.
    pub fn set_prop(&self, instance_id: &str, field: &str, value: impl Into<Value>) -> Result<()> {
        log_op_start!("set_prop", instance_id = instance_id, field = field);
        let start = std::time::Instant::now();

        component::set_prop(&self.page, instance_id, field, value.into()).map_err(|e| {
            log_op_error!(
                "set_prop",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "set_prop",
            duration_ms = start.elapsed().as_millis() as u64,
            instance_id = instance_id,
            field = field
        );
        Ok(())
    }

    /// # Errors
    ///
    /// `InstanceNotRegistered` or `UnknownField`.
    pub fn get_var(&self, instance_id: &str, field: &str) -> Result<Value> {
        component::get_var(&self.page, instance_id, field).cloned()
    }

    /// # Errors
    ///
    /// `InstanceNotRegistered` or `UnknownField`.
    pub fn get_prop(&self, instance_id: &str, field: &str) -> Result<Value> {
        component::get_prop(&self.page, instance_id, field).cloned()
    }

    /// Deliver `event` on `node` to the handler bound there.
    ///
    /// # Errors
    ///
    /// `NoEventBinding` when nothing is bound to `event` on `node`. Hook
    /// writes to unknown vars fail with `UnknownField`.
    pub fn dispatch_event(&mut self, node: NodeId, event: &str) -> Result<EventBinding> {
        log_op_start!("dispatch_event", node = %node, event = event);
        let start = std::time::Instant::now();

        let binding = component::dispatch_event(&mut self.page, node, event).map_err(|e| {
            log_op_error!(
                "dispatch_event",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "dispatch_event",
            duration_ms = start.elapsed().as_millis() as u64,
            instance_id = %binding.instance_id,
            handler = %binding.handler
        );
        Ok(binding)
    }

    /// Resolve every include tag in the document, fetching through
    /// `loader`.
    ///
    /// Per-tag failures are collected in the report according to the
    /// configured `FailurePolicy`.
    ///
    /// # Errors
    ///
    /// `PassLimitExceeded` when tags keep appearing after `max_passes`
    /// passes.
    pub async fn resolve_includes<L>(&mut self, loader: &L) -> Result<ResolutionReport>
    where
        L: FragmentLoader + ?Sized,
    {
        log_op_start!("resolve_includes", max_passes = self.config.max_passes);
        let start = std::time::Instant::now();

        let state = ResolveState {
            page: &mut self.page,
            graph: &mut self.graph,
            behaviors: &self.behaviors,
            config: &self.config,
        };
        let report = resolver::resolve(state, loader).await.map_err(|e| {
            log_op_error!(
                "resolve_includes",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "resolve_includes",
            duration_ms = start.elapsed().as_millis() as u64,
            passes = report.passes,
            plain_includes = report.plain_includes,
            component_includes = report.component_includes,
            failures = report.failures.len(),
            halted = report.halted
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::component::InertBehavior;
    use mosaic_core::errors::MosaicError;
    use serde_json::json;

    const GREETING: &str = "<script>class Greeting {}</script>\
        <component-markup><p>Hello {name}</p></component-markup>";

    #[test]
    fn test_manual_lifecycle_through_context() {
        let mut ctx = EngineContext::from_html(
            r#"<body><div id="slot"></div></body>"#,
            EngineConfig::default(),
        )
        .unwrap();
        ctx.register_behavior("Greeting", || Box::new(InertBehavior::new("Greeting")));
        ctx.register_fragment("Greeting", GREETING).unwrap();
        let body = ctx.document().body;
        let slot = ctx.document().tree.element_by_id(body, "slot").unwrap();

        let mut vars = StateMap::new();
        vars.insert("name".to_string(), json!("Ann"));
        let instance = ctx
            .create_instance("Greeting", "g1", slot, StateMap::new(), vars)
            .unwrap();
        ctx.register_instance(instance).unwrap();
        ctx.mount("g1").unwrap();
        assert_eq!(ctx.render_body(), "<p>Hello Ann</p>");

        ctx.set_var("g1", "name", "Bea").unwrap();
        assert_eq!(ctx.render_body(), "<p>Hello Bea</p>");
        assert_eq!(ctx.get_var("g1", "name").unwrap(), json!("Bea"));

        ctx.unmount("g1").unwrap();
        assert_eq!(ctx.render_body(), "");
        ctx.unregister_instance("g1").unwrap();
        assert!(ctx.instance("g1").is_none());
    }

    #[test]
    fn test_resolve_then_update_without_refetch() {
        let mut ctx = EngineContext::from_html(
            r#"<body><include src="greeting.html" include-in="index" component-class="Greeting" component-id="g1" vars='{"name":"Ann"}'></include></body>"#,
            EngineConfig::default(),
        )
        .unwrap();
        ctx.register_behavior("Greeting", || Box::new(InertBehavior::new("Greeting")));
        let loader = crate::loader::StaticLoader::new().with("greeting.html", GREETING);

        let report = tokio_test::block_on(ctx.resolve_includes(&loader)).unwrap();
        ctx.set_var("g1", "name", "Bea").unwrap();

        assert_eq!(report.component_includes, 1);
        assert_eq!(ctx.render_body(), "<p>Hello Bea</p>");
        assert_eq!(loader.request_count(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            max_passes: 0,
            ..EngineConfig::default()
        };
        let result = EngineContext::from_html("<p></p>", config);
        assert!(matches!(result, Err(MosaicError::Config { .. })));
    }
}
