//! Folding matched rules into each element's `style` attribute.

use std::collections::HashMap;

use crate::dom::dom_tree::Document;
use crate::inline::element_matcher::ElementBinding;
use crate::inline::specificity::StyleRule;
use crate::style::inline_style::{parse_style_attribute, serialize_style_attribute};
use log::trace;

/// An insertion-ordered property -> value map.
///
/// Overwriting a property keeps the position where it was first inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, property: &str, value: &str) {
        match self.positions.get(property) {
            Some(&position) => self.entries[position].1 = value.to_string(),
            None => {
                self.positions.insert(property.to_string(), self.entries.len());
                self.entries.push((property.to_string(), value.to_string()));
            }
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.positions
            .get(property)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn contains(&self, property: &str) -> bool {
        self.positions.contains_key(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(property, value)| (property.as_str(), value.as_str()))
    }
}

/// Fold rules in ranked order; the last write of a property wins.
pub fn fold_rules<'r, I>(rules: I) -> StyleMap
where
    I: IntoIterator<Item = &'r StyleRule>,
{
    let mut folded = StyleMap::new();
    for rule in rules {
        for (property, value) in &rule.declarations {
            folded.insert(property, value);
        }
    }
    folded
}

/// Combine computed declarations with the element's own inline style.
///
/// Inline values always win. The result keeps the computed order, followed
/// by the properties only the inline style sets.
pub fn reconcile(computed: &StyleMap, inline: &StyleMap) -> StyleMap {
    let mut merged = StyleMap::new();
    for (property, value) in computed.iter() {
        merged.insert(property, inline.get(property).unwrap_or(value));
    }
    for (property, value) in inline.iter() {
        if !computed.contains(property) {
            merged.insert(property, value);
        }
    }
    merged
}

/// Write the merged style of every binding into the document.
///
/// Bindings are consumed, so no identity outlives this call.
pub fn apply_bindings(document: &mut Document, bindings: Vec<ElementBinding<'_>>) {
    for binding in bindings {
        let computed = fold_rules(binding.rules.iter().copied());

        let mut inline = StyleMap::new();
        if let Some(style) = document.get_attribute(binding.element, "style") {
            for declaration in parse_style_attribute(style) {
                inline.insert(&declaration.property, &declaration.value);
            }
        }

        let merged = reconcile(&computed, &inline);
        let style = serialize_style_attribute(merged.iter());
        trace!("element #{}: style=\"{}\"", binding.identity, style);
        document.set_attribute(binding.element, "style", &style);
    }
}
