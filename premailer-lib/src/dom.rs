use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};

pub mod dom_tree {
    use super::*;

    /// Opaque handle of a node inside a [`Document`] arena.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct NodeId(usize);

    impl NodeId {
        pub fn index(self) -> usize {
            self.0
        }
    }

    #[derive(Debug, Clone)]
    pub enum NodeData {
        DocumentRoot,
        /// Holds the children of a `<template>` element.
        DocumentFragment,
        Doctype(Doctype),
        Element(ElementNode),
        Text(String),
        Comment(String),
        ProcessingInstruction { target: String, data: String },
    }

    #[derive(Debug, Clone)]
    pub struct Node {
        pub parent: Option<NodeId>,
        pub children: Vec<NodeId>,
        pub data: NodeData,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: Vec<Attribute>,
        pub template_contents: Option<NodeId>,
    }

    #[derive(Debug, Clone)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    /// An HTML document stored as an arena of nodes.
    ///
    /// Nodes are never freed; detaching a node only unlinks it from its parent.
    #[derive(Debug, Clone)]
    pub struct Document {
        nodes: Vec<Node>,
    }

    impl ElementNode {
        pub fn new(qual_name: QualName, attributes: Vec<Attribute>) -> Self {
            ElementNode {
                tag: qual_name.local.to_string(),
                qual_name,
                attributes,
                template_contents: None,
            }
        }

        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|attr| &*attr.name.local == name)
                .map(|attr| &*attr.value)
        }

        pub fn set_attribute(&mut self, name: &str, value: &str) {
            if let Some(attr) = self
                .attributes
                .iter_mut()
                .find(|attr| &*attr.name.local == name)
            {
                attr.value = StrTendril::from_slice(value);
                return;
            }
            self.attributes.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: StrTendril::from_slice(value),
            });
        }

        pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
            let position = self
                .attributes
                .iter()
                .position(|attr| &*attr.name.local == name)?;
            Some(self.attributes.remove(position).value.to_string())
        }

        pub fn has_class(&self, class_name: &str) -> bool {
            self.attribute("class")
                .map(|classes| classes.split_whitespace().any(|class| class == class_name))
                .unwrap_or(false)
        }
    }

    impl Default for Document {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Document {
        /// Creates a document holding only its root node.
        pub fn new() -> Self {
            Document {
                nodes: vec![Node {
                    parent: None,
                    children: Vec::new(),
                    data: NodeData::DocumentRoot,
                }],
            }
        }

        pub fn root(&self) -> NodeId {
            NodeId(0)
        }

        pub fn node(&self, id: NodeId) -> &Node {
            &self.nodes[id.0]
        }

        pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
            &mut self.nodes[id.0]
        }

        pub fn element(&self, id: NodeId) -> Option<&ElementNode> {
            match &self.nodes[id.0].data {
                NodeData::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementNode> {
            match &mut self.nodes[id.0].data {
                NodeData::Element(elem) => Some(elem),
                _ => None,
            }
        }

        /// Allocates a detached node.
        pub fn create(&mut self, data: NodeData) -> NodeId {
            let id = NodeId(self.nodes.len());
            self.nodes.push(Node {
                parent: None,
                children: Vec::new(),
                data,
            });
            id
        }

        /// Appends `child` as the last child of `parent`, detaching it first.
        pub fn append(&mut self, parent: NodeId, child: NodeId) {
            self.detach(child);
            self.nodes[child.0].parent = Some(parent);
            self.nodes[parent.0].children.push(child);
        }

        /// Inserts `child` right before `sibling` under the sibling's parent.
        pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
            let Some(parent) = self.nodes[sibling.0].parent else {
                return;
            };
            self.detach(child);
            let position = self.child_position(parent, sibling).unwrap_or(0);
            self.nodes[child.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(position, child);
        }

        /// Unlinks `child` from its parent. The node stays in the arena.
        pub fn detach(&mut self, child: NodeId) {
            if let Some(parent) = self.nodes[child.0].parent.take() {
                self.nodes[parent.0].children.retain(|&id| id != child);
            }
        }

        /// Appends text to `parent`, merging with a trailing text node.
        pub fn append_text(&mut self, parent: NodeId, text: &str) {
            if let Some(&last) = self.nodes[parent.0].children.last() {
                if let NodeData::Text(existing) = &mut self.nodes[last.0].data {
                    existing.push_str(text);
                    return;
                }
            }
            let node = self.create(NodeData::Text(text.to_string()));
            self.append(parent, node);
        }

        /// Inserts text before `sibling`, merging with a preceding text node.
        pub fn insert_text_before(&mut self, sibling: NodeId, text: &str) {
            if let Some(previous) = self.previous_sibling(sibling) {
                if let NodeData::Text(existing) = &mut self.nodes[previous.0].data {
                    existing.push_str(text);
                    return;
                }
            }
            let node = self.create(NodeData::Text(text.to_string()));
            self.insert_before(sibling, node);
        }

        pub fn parent(&self, id: NodeId) -> Option<NodeId> {
            self.nodes[id.0].parent
        }

        pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
            self.parent(id).filter(|&parent| self.element(parent).is_some())
        }

        pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
            let parent = self.nodes[id.0].parent?;
            let position = self.child_position(parent, id)?;
            position
                .checked_sub(1)
                .map(|previous| self.nodes[parent.0].children[previous])
        }

        pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
            let mut current = self.previous_sibling(id);
            while let Some(sibling) = current {
                if self.element(sibling).is_some() {
                    return Some(sibling);
                }
                current = self.previous_sibling(sibling);
            }
            None
        }

        fn child_position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
            self.nodes[parent.0]
                .children
                .iter()
                .position(|&id| id == child)
        }

        /// All element nodes below the root, in document (pre-)order.
        ///
        /// Template contents are not part of the document tree and are skipped.
        pub fn elements(&self) -> Vec<NodeId> {
            let mut found = Vec::new();
            let mut stack = vec![self.root()];
            while let Some(id) = stack.pop() {
                if self.element(id).is_some() {
                    found.push(id);
                }
                stack.extend(self.nodes[id.0].children.iter().rev().copied());
            }
            found
        }

        /// Elements with the given local name, in document order.
        pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
            self.elements()
                .into_iter()
                .filter(|&id| {
                    self.element(id)
                        .map(|elem| elem.tag.eq_ignore_ascii_case(tag))
                        .unwrap_or(false)
                })
                .collect()
        }

        /// Concatenated text of the direct text children of `id`.
        pub fn text_content(&self, id: NodeId) -> String {
            self.nodes[id.0]
                .children
                .iter()
                .filter_map(|&child| match &self.nodes[child.0].data {
                    NodeData::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        /// Replaces every child of `id` with a single text node (none when empty).
        pub fn set_text_content(&mut self, id: NodeId, text: &str) {
            for child in std::mem::take(&mut self.nodes[id.0].children) {
                self.nodes[child.0].parent = None;
            }
            if !text.is_empty() {
                self.append_text(id, text);
            }
        }

        pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
            self.element(id).and_then(|elem| elem.attribute(name))
        }

        pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
            if let Some(elem) = self.element_mut(id) {
                elem.set_attribute(name, value);
            }
        }

        pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
            self.element_mut(id).and_then(|elem| elem.remove_attribute(name))
        }
    }
}
