use mosaic_core::component::{Behavior, HookContext};
use mosaic_core::config::EngineConfig;
use mosaic_core::include_tag::StateMap;
use mosaic_engine::EngineContext;
use serde_json::json;

/// Counter fragment: one span showing `{label}: {count}` and an increment
/// button bound through `$self`.
#[allow(dead_code)]
pub const COUNTER_FRAGMENT: &str = r#"<script>class Counter {}</script>
<style>.counter { color: red }</style>
<component-markup><span class="counter">{label}: {count}</span><button onclick="$self.increment()">+</button></component-markup>"#;

pub struct Counter;

impl Behavior for Counter {
    fn class_name(&self) -> &str {
        "Counter"
    }

    fn default_props(&self) -> StateMap {
        let mut props = StateMap::new();
        props.insert("label".to_string(), json!("Count"));
        props
    }

    fn default_vars(&self) -> StateMap {
        let mut vars = StateMap::new();
        vars.insert("count".to_string(), json!(0));
        vars
    }

    fn on_event(&mut self, handler: &str, ctx: &mut HookContext<'_>) {
        if handler == "increment" {
            let next = ctx.var("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
            ctx.set_var("count", next);
        }
    }
}

/// Engine over `body` with the Counter behavior registered
#[allow(dead_code)]
pub fn engine(body: &str) -> EngineContext {
    engine_with(body, EngineConfig::default())
}

#[allow(dead_code)]
pub fn engine_with(body: &str, config: EngineConfig) -> EngineContext {
    let html = format!("<html><head></head><body>{}</body></html>", body);
    let mut ctx = EngineContext::from_html(&html, config).unwrap();
    ctx.register_behavior("Counter", || Box::new(Counter));
    ctx
}

/// `<include>` tag markup for a plain include
#[allow(dead_code)]
pub fn include(src: &str, include_in: &str) -> String {
    format!(r#"<include src="{}" include-in="{}"></include>"#, src, include_in)
}
