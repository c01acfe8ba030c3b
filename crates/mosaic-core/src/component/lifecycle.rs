use serde_json::Value;

use super::behavior::{BehaviorRegistry, HookContext};
use super::instance::ComponentInstance;
use crate::binder::Bindings;
use crate::config::Vocabulary;
use crate::dom::{NodeId, NodeKind, NodeTree};
use crate::errors::{MosaicError, Result};
use crate::events::{extract_bindings, EventBinding};
use crate::include_tag::StateMap;
use crate::page::Page;

/// Arguments of [`create_instance`]
#[derive(Debug, Clone)]
pub struct InstanceRequest<'a> {
    pub class_name: &'a str,
    pub instance_id: &'a str,
    /// Element the instance replaces; its position receives the marker
    pub source: NodeId,
    pub props: StateMap,
    pub vars: StateMap,
    /// Leave `source` in the tree (more instances will be placed before it)
    pub keep_source: bool,
}

enum Hook<'h> {
    BeforeMount,
    AfterMount,
    BeforeUnmount,
    AfterUnmount,
    Event(&'h str),
}

/// Run one hook and push its buffered var writes through the binder.
fn run_hook(instance: &mut ComponentInstance, tree: &mut NodeTree, hook: Hook<'_>) -> Result<()> {
    let writes = {
        let mut ctx = HookContext::new(&instance.instance_id, &instance.bindings);
        let behavior = &mut instance.behavior;
        match hook {
            Hook::BeforeMount => behavior.before_mount(&mut ctx),
            Hook::AfterMount => behavior.after_mount(&mut ctx),
            Hook::BeforeUnmount => behavior.before_unmount(&mut ctx),
            Hook::AfterUnmount => behavior.after_unmount(&mut ctx),
            Hook::Event(handler) => behavior.on_event(handler, &mut ctx),
        }
        ctx.into_writes()
    };
    for (field, value) in writes {
        instance.bindings.set_var(
            tree,
            &instance.cloned_nodes,
            &instance.instance_id,
            &field,
            value,
        )?;
    }
    Ok(())
}

fn already_registered(instance_id: &str) -> MosaicError {
    tracing::warn!(instance_id, "component instance already registered");
    MosaicError::InstanceAlreadyRegistered {
        instance_id: instance_id.to_string(),
    }
}

fn not_registered(instance_id: &str) -> MosaicError {
    tracing::warn!(instance_id, "component instance is not registered");
    MosaicError::InstanceNotRegistered {
        instance_id: instance_id.to_string(),
    }
}

/// Build a detached instance of `request.class_name`.
///
/// Places the marker at `request.source` (reusing an existing marker for
/// the id), runs `initialize`, clones the template markup into the host
/// tree, extracts event bindings and performs the first substitution. The
/// source is removed last, unless `keep_source` is set.
///
/// # Errors
///
/// - `InstanceAlreadyRegistered` when the id is taken; the tree is untouched
/// - `FragmentNotRegistered` when the class has no template
/// - `UnknownBehaviorClass` when no behavior factory exists
/// - `MarkerMissing` when there is no marker and `source` is detached
pub fn create_instance(
    page: &mut Page,
    behaviors: &BehaviorRegistry,
    request: InstanceRequest<'_>,
    vocabulary: &Vocabulary,
) -> Result<ComponentInstance> {
    let InstanceRequest {
        class_name,
        instance_id,
        source,
        props,
        vars,
        keep_source,
    } = request;

    if page.components.contains(instance_id) {
        return Err(already_registered(instance_id));
    }
    let template = page.fragments.get(class_name).ok_or_else(|| {
        tracing::warn!(class_name, instance_id, "fragment is not registered");
        MosaicError::FragmentNotRegistered {
            class_name: class_name.to_string(),
            instance_id: instance_id.to_string(),
        }
    })?;
    let mut behavior = behaviors.instantiate(class_name)?;

    let mut merged_props = behavior.default_props();
    merged_props.extend(props);
    let mut merged_vars = behavior.default_vars();
    merged_vars.extend(vars);

    let tree = &mut page.document.tree;
    if tree.find_marker(instance_id).is_none() {
        if tree.parent(source).is_none() {
            tracing::warn!(instance_id, "source element is not in the host tree");
            return Err(MosaicError::MarkerMissing {
                instance_id: instance_id.to_string(),
            });
        }
        let marker = tree.create_marker(instance_id);
        tree.insert_before(source, marker)?;
    }

    let mut bindings = Bindings::new(merged_props, merged_vars);
    let seeded = {
        let mut ctx = HookContext::new(instance_id, &bindings);
        behavior.initialize(&mut ctx);
        ctx.into_writes()
    };
    for (field, value) in seeded {
        bindings.seed_var(field, value);
    }

    let mut cloned_nodes = Vec::new();
    for child in template.markup_children() {
        let whitespace = matches!(
            template.tree.kind(*child),
            Some(NodeKind::Text(t)) if t.value.trim().is_empty()
        );
        if whitespace {
            continue;
        }
        cloned_nodes.push(tree.import_subtree(&template.tree, *child)?);
    }

    let event_bindings = extract_bindings(tree, &cloned_nodes, instance_id, &vocabulary.self_token);
    bindings.wrap(tree, &cloned_nodes);
    if !keep_source {
        tree.detach(source)?;
    }

    tracing::debug!(
        class_name,
        instance_id,
        nodes = cloned_nodes.len(),
        "component instance created"
    );
    Ok(ComponentInstance {
        instance_id: instance_id.to_string(),
        fragment_class: class_name.to_string(),
        behavior,
        bindings,
        cloned_nodes,
        event_bindings,
        mounted: false,
    })
}

/// # Errors
///
/// Returns `InstanceAlreadyRegistered` when the id is taken.
pub fn register_instance(page: &mut Page, instance: ComponentInstance) -> Result<()> {
    if page.components.contains(&instance.instance_id) {
        return Err(already_registered(&instance.instance_id));
    }
    for binding in &instance.event_bindings {
        page.events.insert(binding.clone());
    }
    tracing::debug!(instance_id = %instance.instance_id, "component instance registered");
    page.components
        .instances
        .insert(instance.instance_id.clone(), instance);
    Ok(())
}

/// Insert the instance's cloned nodes right after its marker.
///
/// On error the instance stays unmounted and its nodes stay out of the
/// tree. Var writes made by `before_mount` are kept.
///
/// # Errors
///
/// `InstanceNotRegistered`, `FragmentNotRegistered`, `AlreadyMounted` or
/// `MarkerMissing`, checked in that order. Hook writes to unknown vars fail
/// with `UnknownField`.
pub fn mount(page: &mut Page, instance_id: &str) -> Result<()> {
    let Page {
        document,
        fragments,
        components,
        ..
    } = page;
    let instance = components
        .get_mut(instance_id)
        .ok_or_else(|| not_registered(instance_id))?;
    if !fragments.contains(&instance.fragment_class) {
        tracing::warn!(instance_id, class_name = %instance.fragment_class, "fragment is not registered");
        return Err(MosaicError::FragmentNotRegistered {
            class_name: instance.fragment_class.clone(),
            instance_id: instance_id.to_string(),
        });
    }
    if instance.mounted {
        tracing::warn!(instance_id, "component instance already mounted");
        return Err(MosaicError::AlreadyMounted {
            instance_id: instance_id.to_string(),
        });
    }
    let marker = document.tree.find_marker(instance_id).ok_or_else(|| {
        tracing::warn!(instance_id, "marker is not in the host tree");
        MosaicError::MarkerMissing {
            instance_id: instance_id.to_string(),
        }
    })?;

    run_hook(instance, &mut document.tree, Hook::BeforeMount)?;
    if let Err(e) = attach_nodes(instance, &mut document.tree, marker)
        .and_then(|()| run_hook(instance, &mut document.tree, Hook::AfterMount))
    {
        tracing::warn!(instance_id, error = %e, "mount rolled back");
        detach_nodes(instance, &mut document.tree)?;
        return Err(e);
    }

    tracing::debug!(instance_id, "component instance mounted");
    Ok(())
}

fn attach_nodes(instance: &mut ComponentInstance, tree: &mut NodeTree, marker: NodeId) -> Result<()> {
    let mut anchor = marker;
    for node in instance.cloned_nodes.iter().copied() {
        tree.insert_after(anchor, node)?;
        anchor = node;
    }
    instance.mounted = true;
    Ok(())
}

fn detach_nodes(instance: &mut ComponentInstance, tree: &mut NodeTree) -> Result<()> {
    for node in instance.cloned_nodes.iter().copied() {
        tree.detach(node)?;
    }
    instance.mounted = false;
    Ok(())
}

/// Detach the instance's cloned nodes from the host tree.
///
/// On error the instance stays mounted with its nodes back after the
/// marker. Var writes made by `before_unmount` are kept.
///
/// # Errors
///
/// `InstanceNotRegistered`, `NotMounted`, `FragmentNotRegistered` or
/// `MarkerMissing`, checked in that order.
pub fn unmount(page: &mut Page, instance_id: &str) -> Result<()> {
    let Page {
        document,
        fragments,
        components,
        ..
    } = page;
    let instance = components
        .get_mut(instance_id)
        .ok_or_else(|| not_registered(instance_id))?;
    if !instance.mounted {
        tracing::warn!(instance_id, "component instance is not mounted");
        return Err(MosaicError::NotMounted {
            instance_id: instance_id.to_string(),
        });
    }
    if !fragments.contains(&instance.fragment_class) {
        tracing::warn!(instance_id, class_name = %instance.fragment_class, "fragment is not registered");
        return Err(MosaicError::FragmentNotRegistered {
            class_name: instance.fragment_class.clone(),
            instance_id: instance_id.to_string(),
        });
    }
    let marker = document.tree.find_marker(instance_id).ok_or_else(|| {
        tracing::warn!(instance_id, "marker is not in the host tree");
        MosaicError::MarkerMissing {
            instance_id: instance_id.to_string(),
        }
    })?;

    run_hook(instance, &mut document.tree, Hook::BeforeUnmount)?;
    if let Err(e) = detach_nodes(instance, &mut document.tree)
        .and_then(|()| run_hook(instance, &mut document.tree, Hook::AfterUnmount))
    {
        tracing::warn!(instance_id, error = %e, "unmount rolled back");
        attach_nodes(instance, &mut document.tree, marker)?;
        return Err(e);
    }

    tracing::debug!(instance_id, "component instance unmounted");
    Ok(())
}

/// Drop an unmounted instance and its event bindings. The marker stays.
///
/// The cloned nodes are released back to the arena, so the returned
/// instance has an empty `cloned_nodes`.
///
/// # Errors
///
/// `InstanceNotRegistered` for unknown ids, `StillMounted` while mounted.
pub fn unregister_instance(page: &mut Page, instance_id: &str) -> Result<ComponentInstance> {
    if page.components.is_mounted(instance_id) {
        tracing::warn!(instance_id, "component instance is still mounted");
        return Err(MosaicError::StillMounted {
            instance_id: instance_id.to_string(),
        });
    }
    let mut instance = page
        .components
        .instances
        .remove(instance_id)
        .ok_or_else(|| not_registered(instance_id))?;
    page.events.remove_instance(instance_id);
    let mut released = 0;
    for node in std::mem::take(&mut instance.cloned_nodes) {
        released += page.document.tree.remove(node)?;
    }
    tracing::debug!(instance_id, released, "component instance unregistered");
    Ok(instance)
}

/// # Errors
///
/// `InstanceNotRegistered`, or `UnknownField` when `field` is not a var.
pub fn set_var(page: &mut Page, instance_id: &str, field: &str, value: Value) -> Result<usize> {
    let instance = page
        .components
        .get_mut(instance_id)
        .ok_or_else(|| not_registered(instance_id))?;
    instance.bindings.set_var(
        &mut page.document.tree,
        &instance.cloned_nodes,
        instance_id,
        field,
        value,
    )
}

/// Props are read-only; the write is accepted and dropped.
///
/// # Errors
///
/// `InstanceNotRegistered`, or `UnknownField` when `field` is not a prop.
pub fn set_prop(page: &Page, instance_id: &str, field: &str, value: Value) -> Result<()> {
    let instance = page
        .components
        .get(instance_id)
        .ok_or_else(|| not_registered(instance_id))?;
    instance.bindings.set_prop(instance_id, field, value)
}

/// # Errors
///
/// `InstanceNotRegistered`, or `UnknownField` when `field` is not a var.
pub fn get_var<'p>(page: &'p Page, instance_id: &str, field: &str) -> Result<&'p Value> {
    let instance = page
        .components
        .get(instance_id)
        .ok_or_else(|| not_registered(instance_id))?;
    instance
        .bindings
        .var(field)
        .ok_or_else(|| MosaicError::UnknownField {
            instance_id: instance_id.to_string(),
            field: field.to_string(),
        })
}

/// # Errors
///
/// `InstanceNotRegistered`, or `UnknownField` when `field` is not a prop.
pub fn get_prop<'p>(page: &'p Page, instance_id: &str, field: &str) -> Result<&'p Value> {
    let instance = page
        .components
        .get(instance_id)
        .ok_or_else(|| not_registered(instance_id))?;
    instance
        .bindings
        .prop(field)
        .ok_or_else(|| MosaicError::UnknownField {
            instance_id: instance_id.to_string(),
            field: field.to_string(),
        })
}

/// Route `event` on `node` to the owning instance's `on_event` hook.
///
/// # Errors
///
/// `NoEventBinding` when nothing is bound, `InstanceNotRegistered` when the
/// owner is gone.
pub fn dispatch_event(page: &mut Page, node: NodeId, event: &str) -> Result<EventBinding> {
    let binding = page.events.get(node, event).cloned().ok_or_else(|| {
        tracing::warn!(node = node.index(), event, "no event binding");
        MosaicError::NoEventBinding {
            node: node.index(),
            event: event.to_string(),
        }
    })?;
    let instance = page
        .components
        .get_mut(&binding.instance_id)
        .ok_or_else(|| not_registered(&binding.instance_id))?;
    run_hook(
        instance,
        &mut page.document.tree,
        Hook::Event(&binding.handler),
    )?;
    Ok(binding)
}
