//! This module contains functions and types for parsing HTML into the arena DOM.
//!
//! It uses html5ever as the HTML parser and builds a DOM tree defined in the
//! `crate::dom::dom_tree` module.

use crate::dom::dom_tree::{self, Document, ElementNode, NodeData, NodeId};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    Attribute, LocalName, Namespace, QualName,
};
use log::trace;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};

/// Creates a DOM tree from the provided HTML content.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
///
/// # Returns
///
/// A `dom_tree::Document` representing the parsed HTML. html5ever recovers
/// from every syntax error, so parsing itself cannot fail.
pub fn create_dom_tree(html_content: &str) -> Document {
    let tree_sink = PremailerTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// A custom TreeSink for building the arena DOM used by the inliner.
///
/// Handles are plain `NodeId`s; the arena lives behind a `RefCell` because
/// html5ever drives the sink through shared references.
pub struct PremailerTreeSink {
    document: RefCell<Document>,
    quirks_mode: Cell<QuirksMode>,
}

impl Default for PremailerTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PremailerTreeSink {
    /// Creates a new `PremailerTreeSink` with an empty document.
    pub fn new() -> Self {
        Self {
            document: RefCell::new(Document::new()),
            quirks_mode: Cell::new(QuirksMode::NoQuirks),
        }
    }

    fn append_child(&self, parent: NodeId, child: NodeOrText<NodeId>) {
        let mut document = self.document.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => document.append(parent, node),
            NodeOrText::AppendText(text) => document.append_text(parent, &text),
        }
    }
}

/// A simple implementation of the `ElemName` trait for our elements.
#[derive(Debug)]
pub struct PremailerElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for PremailerElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for PremailerTreeSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = PremailerElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document.into_inner()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        trace!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.borrow().root()
    }

    /// Returns the element name for the given element handle.
    ///
    /// html5ever only asks for names of handles it created as elements; any
    /// other node reports an empty HTML name so the tree builder keeps going.
    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        let document = self.document.borrow();
        match document.element(*target) {
            Some(elem) => PremailerElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            None => PremailerElemName {
                ns: Namespace::from("http://www.w3.org/1999/xhtml"),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        let mut document = self.document.borrow_mut();
        let mut element = ElementNode::new(name, attrs);
        if flags.template {
            element.template_contents = Some(document.create(NodeData::DocumentFragment));
        }
        document.create(NodeData::Element(element))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.document
            .borrow_mut()
            .create(NodeData::Comment(text.to_string()))
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        self.document
            .borrow_mut()
            .create(NodeData::ProcessingInstruction {
                target: target.to_string(),
                data: data.to_string(),
            })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.append_child(*parent, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.document.borrow().parent(*element).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append_child(*prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let mut document = self.document.borrow_mut();
        let doctype = document.create(NodeData::Doctype(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }));
        let root = document.root();
        document.append(root, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        self.document
            .borrow()
            .element(*target)
            .and_then(|elem| elem.template_contents)
            .unwrap_or(*target)
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut document = self.document.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => document.insert_before(*sibling, node),
            NodeOrText::AppendText(text) => document.insert_text_before(*sibling, &text),
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut document = self.document.borrow_mut();
        if let Some(elem) = document.element_mut(*target) {
            for attr in attrs {
                if !elem
                    .attributes
                    .iter()
                    .any(|existing| existing.name == attr.name)
                {
                    elem.attributes.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.document.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut document = self.document.borrow_mut();
        let children = document.node(*node).children.clone();
        for child in children {
            document.append(*new_parent, child);
        }
    }
}
