use std::collections::HashMap;

use crate::dom::dom_tree::{Document, NodeId};

/// Indexes for fast candidate lookup during selector matching.
///
/// Every list is in document order. Attributes are not re-indexed after
/// the indices are built, so they must be rebuilt if `id`/`class` change.
#[derive(Debug, Default)]
pub struct DomIndices {
    /// Maps an element's "id" attribute to the elements carrying it.
    pub id_map: HashMap<String, Vec<NodeId>>,
    /// Maps a class name to all elements that have that class.
    pub class_map: HashMap<String, Vec<NodeId>>,
    /// Maps a lowercase tag name (e.g., "div") to all elements with that tag.
    pub tag_map: HashMap<String, Vec<NodeId>>,
    /// Every element, for selectors without an indexable part.
    pub all: Vec<NodeId>,
}

impl DomIndices {
    /// Build the indices for the entire document.
    pub fn build(document: &Document) -> Self {
        let mut indices = DomIndices::default();
        for id in document.elements() {
            let Some(elem) = document.element(id) else {
                continue;
            };
            indices
                .tag_map
                .entry(elem.tag.to_ascii_lowercase())
                .or_default()
                .push(id);

            if let Some(id_value) = elem.attribute("id") {
                indices
                    .id_map
                    .entry(id_value.to_string())
                    .or_default()
                    .push(id);
            }
            if let Some(class_attr) = elem.attribute("class") {
                for class in class_attr.split_whitespace() {
                    let entry = indices.class_map.entry(class.to_string()).or_default();
                    // `class="a a"` must not list the element twice.
                    if entry.last() != Some(&id) {
                        entry.push(id);
                    }
                }
            }
            indices.all.push(id);
        }
        indices
    }

    pub fn by_id(&self, id: &str) -> &[NodeId] {
        self.id_map.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn by_class(&self, class: &str) -> &[NodeId] {
        self.class_map.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn by_tag(&self, tag: &str) -> &[NodeId] {
        self.tag_map
            .get(&tag.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
