//! HTML serialization of the arena DOM through html5ever's serializer.

use crate::dom::dom_tree::{Document, NodeData, NodeId};
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use std::io;

/// A node of a document, borrowed for serialization.
pub struct SerializableNode<'a> {
    document: &'a Document,
    node: NodeId,
}

impl<'a> SerializableNode<'a> {
    pub fn new(document: &'a Document, node: NodeId) -> Self {
        SerializableNode { document, node }
    }

    fn child(&self, node: NodeId) -> Self {
        SerializableNode {
            document: self.document,
            node,
        }
    }

    fn serialize_children<S: Serializer>(
        &self,
        serializer: &mut S,
        children: &[NodeId],
    ) -> io::Result<()> {
        for &child in children {
            self.child(child)
                .serialize(serializer, TraversalScope::IncludeNode)?;
        }
        Ok(())
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let node = self.document.node(self.node);
        let include_node = matches!(traversal_scope, TraversalScope::IncludeNode);

        match &node.data {
            NodeData::Element(elem) => {
                if include_node {
                    serializer.start_elem(
                        elem.qual_name.clone(),
                        elem.attributes
                            .iter()
                            .map(|attr| (&attr.name, &*attr.value)),
                    )?;
                }
                let children = match elem.template_contents {
                    Some(contents) => &self.document.node(contents).children,
                    None => &node.children,
                };
                self.serialize_children(serializer, children)?;
                if include_node {
                    serializer.end_elem(elem.qual_name.clone())?;
                }
                Ok(())
            }
            NodeData::DocumentRoot | NodeData::DocumentFragment => {
                self.serialize_children(serializer, &node.children)
            }
            _ if !include_node => Ok(()),
            NodeData::Doctype(doctype) => serializer.write_doctype(&doctype.name),
            NodeData::Text(text) => serializer.write_text(text),
            NodeData::Comment(text) => serializer.write_comment(text),
            NodeData::ProcessingInstruction { target, data } => {
                serializer.write_processing_instruction(target, data)
            }
        }
    }
}

/// Serializes the whole document to an HTML string.
pub fn to_html(document: &Document) -> io::Result<String> {
    let mut bytes = Vec::new();
    let node = SerializableNode::new(document, document.root());
    serialize(&mut bytes, &node, SerializeOpts::default())?;
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_keeps_style_text_raw() {
        let html = "<!DOCTYPE html><html><head><style>.a > .b { color: red }</style></head>\
                    <body><p class=\"a\" style=\"color:red;\">x &amp; y</p></body></html>";
        let document = create_dom_tree(html);

        assert_eq!(to_html(&document).unwrap(), html);
    }

    #[test]
    fn test_template_contents_are_serialized() {
        let html = "<html><head></head><body><template><p>t</p></template></body></html>";
        let document = create_dom_tree(html);

        assert_eq!(to_html(&document).unwrap(), html);
    }
}
