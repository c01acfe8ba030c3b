use crate::config::Vocabulary;
use crate::dom::{Fragment, NodeId, NodeTree};
use crate::errors::{MosaicError, Result};

/// Parse fetched text into a detached fragment. No registry side effects.
///
/// # Errors
///
/// Only internal arena inconsistencies can fail.
pub fn compile(text: &str) -> Result<Fragment> {
    Fragment::parse(text)
}

/// Sub-section nodes of a fragment, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub behavior: Vec<NodeId>,
    pub markup: Vec<NodeId>,
    pub style: Vec<NodeId>,
    pub test: Vec<NodeId>,
}

impl Sections {
    /// Locate every section anywhere in `tree` below `root`.
    pub fn scan(tree: &NodeTree, root: NodeId, vocabulary: &Vocabulary) -> Self {
        let mut sections = Self::default();
        for id in tree.descendants(root) {
            let Some(element) = tree.element(id) else {
                continue;
            };
            if element.is(&vocabulary.behavior_tag) {
                sections.behavior.push(id);
            } else if vocabulary.is_markup_tag(&element.name) {
                sections.markup.push(id);
            } else if element.is(&vocabulary.style_tag) {
                sections.style.push(id);
            } else if element.is(&vocabulary.test_tag) {
                sections.test.push(id);
            }
        }
        sections
    }

    /// Check the section counts a registrable fragment must have.
    ///
    /// # Errors
    ///
    /// - `MissingBehaviorSection` unless exactly one behavior script exists
    /// - `MissingMarkupSection` unless exactly one markup section exists
    /// - `TooManyStyleSections` for more than one style section
    /// - `TooManyTestSections` for more than one test section when
    ///   `include_test` is set
    pub fn validate(&self, class_name: &str, include_test: bool) -> Result<()> {
        let class_name = class_name.to_string();
        let result = if self.behavior.len() != 1 {
            Err(MosaicError::MissingBehaviorSection {
                class_name,
                found: self.behavior.len(),
            })
        } else if self.markup.len() != 1 {
            Err(MosaicError::MissingMarkupSection {
                class_name,
                found: self.markup.len(),
            })
        } else if self.style.len() > 1 {
            Err(MosaicError::TooManyStyleSections {
                class_name,
                found: self.style.len(),
            })
        } else if include_test && self.test.len() > 1 {
            Err(MosaicError::TooManyTestSections {
                class_name,
                found: self.test.len(),
            })
        } else {
            Ok(())
        };

        if let Err(err) = &result {
            tracing::warn!(error = %err, "fragment failed validation");
        }
        result
    }
}
