use std::fmt;

/// Index of a node inside its owning [`NodeTree`](super::NodeTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Text node content
///
/// `original` holds the pristine template text once it has been captured;
/// placeholder substitution always renders from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextValue {
    pub value: String,
    pub original: Option<String>,
}

impl TextValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            original: None,
        }
    }

    /// Freeze the current value as the template, once.
    pub fn capture_original(&mut self) {
        if self.original.is_none() {
            self.original = Some(self.value.clone());
        }
    }

    /// Template text: the captured original, else the live value
    pub fn template(&self) -> &str {
        self.original.as_deref().unwrap_or(&self.value)
    }
}

/// Element attribute, with the same original-text slot as [`TextValue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub original: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            original: None,
        }
    }

    pub fn capture_original(&mut self) {
        if self.original.is_none() {
            self.original = Some(self.value.clone());
        }
    }

    pub fn template(&self) -> &str {
        self.original.as_deref().unwrap_or(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute value, keeping any captured original.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute::new(name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Attribute> {
        let pos = self
            .attributes
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attributes.remove(pos))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Fragment,
    Element(ElementData),
    Text(TextValue),
    Comment(String),
    /// Zero-rendering anchor for a component instance
    Marker(String),
}

impl NodeKind {
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextValue> {
        match self {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_element_named(&self, name: &str) -> bool {
        self.as_element().is_some_and(|e| e.is(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_original_is_sticky() {
        let mut text = TextValue::new("Hello {name}");
        text.capture_original();
        text.value = "Hello Ann".to_string();
        text.capture_original();

        assert_eq!(text.template(), "Hello {name}");
        assert_eq!(text.value, "Hello Ann");
    }

    #[test]
    fn test_template_falls_back_to_value() {
        let attr = Attribute::new("title", "{label}");
        assert_eq!(attr.template(), "{label}");
    }

    #[test]
    fn test_element_attributes_case_insensitive() {
        let mut el = ElementData::new("DIV");
        el.set_attr("Class", "a");
        el.set_attr("class", "b");

        assert!(el.is("div"));
        assert_eq!(el.attr("CLASS"), Some("b"));
        assert_eq!(el.attributes.len(), 1);
        assert!(el.remove_attr("class").is_some());
        assert!(!el.has_attr("class"));
    }
}
