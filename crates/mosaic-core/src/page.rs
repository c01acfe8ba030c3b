use crate::component::ComponentRegistry;
use crate::dom::Document;
use crate::events::EventBindings;
use crate::fragment::FragmentRegistry;

/// Everything the engine mutates: the host document and the three
/// registries hanging off it
///
/// Single-threaded by construction. All lifecycle operations take
/// `&mut Page`.
#[derive(Debug, Default)]
pub struct Page {
    pub document: Document,
    pub fragments: FragmentRegistry,
    pub components: ComponentRegistry,
    pub events: EventBindings,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }
}
