use std::collections::HashMap;

use super::compiler::Sections;
use crate::binder::capture_originals;
use crate::config::{EngineConfig, ReregistrationPolicy, Vocabulary};
use crate::dom::{Fragment, NodeId, NodeTree};
use crate::errors::{MosaicError, Result};
use crate::page::Page;

/// Page-global section kinds relocated out of a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Behavior,
    Style,
    Test,
}

impl SectionKind {
    /// `id` of the relocated element in the page head
    pub fn head_id(self, class_name: &str) -> String {
        let prefix = match self {
            SectionKind::Behavior => "ScriptTag",
            SectionKind::Style => "StyleTag",
            SectionKind::Test => "TestTag",
        };
        format!("{}{}", prefix, class_name)
    }
}

/// A validated fragment with its relocated sections stripped
///
/// Never mutated after registration; instances clone `markup`'s children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTemplate {
    pub class_name: String,
    pub tree: NodeTree,
    pub markup: NodeId,
}

impl FragmentTemplate {
    pub fn markup_children(&self) -> &[NodeId] {
        self.tree.children(self.markup)
    }
}

/// Outcome of a successful `register_fragment`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    /// Class already present and the policy is `NoOp`
    AlreadyPresent,
}

/// Name-keyed store of fragment templates
#[derive(Debug, Clone, Default)]
pub struct FragmentRegistry {
    pub(crate) templates: HashMap<String, FragmentTemplate>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.templates.contains_key(class_name)
    }

    pub fn get(&self, class_name: &str) -> Option<&FragmentTemplate> {
        self.templates.get(class_name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Validate `fragment` and store it under `class_name`.
///
/// On success the behavior script, style and (when
/// `config.include_test_sections` is set) test sections move into the page
/// head as `ScriptTag{class}`, `StyleTag{class}` and `TestTag{class}`. Test
/// sections are otherwise dropped. The original text of every remaining text
/// node and attribute is captured.
///
/// Nothing is mutated when validation fails.
///
/// # Errors
///
/// - `FragmentAlreadyRegistered` when the class exists and the policy is
///   `Reject`
/// - the section-count errors of [`Sections::validate`]
pub fn register_fragment(
    page: &mut Page,
    class_name: &str,
    mut fragment: Fragment,
    config: &EngineConfig,
) -> Result<RegisterOutcome> {
    if page.fragments.contains(class_name) {
        return match config.reregistration {
            ReregistrationPolicy::NoOp => {
                tracing::debug!(class_name, "fragment already registered, keeping first");
                Ok(RegisterOutcome::AlreadyPresent)
            }
            ReregistrationPolicy::Reject => {
                tracing::warn!(class_name, "fragment already registered");
                Err(MosaicError::FragmentAlreadyRegistered {
                    class_name: class_name.to_string(),
                })
            }
        };
    }

    let root = fragment.root();
    let sections = Sections::scan(&fragment.tree, root, &config.vocabulary);
    sections.validate(class_name, config.include_test_sections)?;

    let (Some(markup), Some(behavior)) = (
        sections.markup.first().copied(),
        sections.behavior.first().copied(),
    ) else {
        return Err(MosaicError::Internal {
            message: format!("validated fragment {} lost a required section", class_name),
        });
    };
    let vocabulary = &config.vocabulary;

    relocate(page, &mut fragment.tree, behavior, SectionKind::Behavior, class_name, vocabulary)?;
    if let Some(style) = sections.style.first().copied() {
        relocate(page, &mut fragment.tree, style, SectionKind::Style, class_name, vocabulary)?;
    }
    for (n, test) in sections.test.iter().copied().enumerate() {
        if config.include_test_sections && n == 0 {
            relocate(page, &mut fragment.tree, test, SectionKind::Test, class_name, vocabulary)?;
        } else {
            fragment.tree.detach(test)?;
        }
    }

    let template_roots = fragment.tree.children(root).to_vec();
    capture_originals(&mut fragment.tree, &template_roots);

    page.fragments.templates.insert(
        class_name.to_string(),
        FragmentTemplate {
            class_name: class_name.to_string(),
            tree: fragment.tree,
            markup,
        },
    );
    tracing::debug!(class_name, "fragment registered");
    Ok(RegisterOutcome::Registered)
}

/// Copy a section's text into a fresh head element and strip it from the
/// fragment.
fn relocate(
    page: &mut Page,
    tree: &mut NodeTree,
    section: NodeId,
    kind: SectionKind,
    class_name: &str,
    vocabulary: &Vocabulary,
) -> Result<()> {
    let text = tree.text_content(section);
    let id = kind.head_id(class_name);
    let head_tree = &mut page.document.tree;
    let element = match kind {
        SectionKind::Behavior => head_tree.create_element_with(
            &vocabulary.behavior_tag,
            &[("type", "text/javascript"), ("id", id.as_str())],
        ),
        SectionKind::Style => head_tree.create_element_with(&vocabulary.style_tag, &[("id", id.as_str())]),
        SectionKind::Test => head_tree.create_element_with(
            &vocabulary.test_tag,
            &[("type", "text/javascript"), ("id", id.as_str())],
        ),
    };
    let body = head_tree.create_text(&text);
    head_tree.append_child(element, body)?;
    head_tree.append_child(page.document.head, element)?;
    tree.detach(section)?;
    Ok(())
}

/// Remove `class_name` and its relocated head sections.
///
/// # Errors
///
/// Returns `FragmentNotInRegistry` when the class is not registered.
pub fn unregister_fragment(page: &mut Page, class_name: &str) -> Result<FragmentTemplate> {
    let Some(template) = page.fragments.templates.remove(class_name) else {
        tracing::warn!(class_name, "fragment was not in the registry");
        return Err(MosaicError::FragmentNotInRegistry {
            class_name: class_name.to_string(),
        });
    };

    let head = page.document.head;
    for kind in [SectionKind::Behavior, SectionKind::Style, SectionKind::Test] {
        let id = kind.head_id(class_name);
        if let Some(node) = page.document.tree.element_by_id(head, &id) {
            page.document.tree.detach(node)?;
        }
    }
    tracing::debug!(class_name, "fragment unregistered");
    Ok(template)
}
