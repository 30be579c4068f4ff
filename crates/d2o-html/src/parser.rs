//! HTML parsing
//!
//! html5ever builds an `RcDom`, which is then copied into the arena tree.

use d2o_dom::{Document, DomResult, DomTree, ElementData, Node, NodeId};
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, QualName, ns, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML5 parser
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a full document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse a full document served from `url`
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!(url, bytes = html.len(), "parsing document");

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut document = Document::empty(url);
        let root = document.tree().root();
        let tree = document.tree_mut();
        for child in dom.document.children.borrow().iter() {
            if let Some(id) = self.convert_node(child, tree) {
                let _ = tree.append_child(root, id);
            }
        }

        tracing::debug!(nodes = document.tree().len(), "parsed document");
        document
    }

    /// Parse `html` with `parent` as context and append the result to it.
    ///
    /// Returns the IDs of the top-level nodes that were inserted.
    pub fn parse_into(&self, html: &str, tree: &mut DomTree, parent: NodeId) -> DomResult<Vec<NodeId>> {
        let context = tree
            .element(parent)
            .map_or_else(|| "body".to_string(), |elem| elem.tag.clone());
        let nodes = self.parse_fragment(html, tree, &context);
        for &node in &nodes {
            tree.append_child(parent, node)?;
        }
        Ok(nodes)
    }

    /// Parse `html` as the content of a `context` element into detached
    /// nodes of `tree`.
    ///
    /// The context decides the insertion mode, so `<tr>` survives under
    /// `tbody` and `<td>` under `tr`.
    pub fn parse_fragment(&self, html: &str, tree: &mut DomTree, context: &str) -> Vec<NodeId> {
        let context = QualName::new(None, ns!(html), LocalName::from(context));
        let dom = parse_fragment(RcDom::default(), Default::default(), context, vec![], false).one(html);

        // Fragment content lands under a synthetic <html> root
        let Some(root) = find_element(&dom.document, "html") else {
            return Vec::new();
        };
        let nodes: Vec<NodeId> = root
            .children
            .borrow()
            .iter()
            .filter_map(|child| self.convert_node(child, tree))
            .collect();
        tracing::debug!(top_level = nodes.len(), "parsed fragment");
        nodes
    }

    /// Copy `handle` and its subtree into `tree` as a detached node
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree) -> Option<NodeId> {
        let id = match &handle.data {
            RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => return None,
            RcNodeData::Doctype { name, .. } => tree.push(Node::doctype(name.to_string())),
            RcNodeData::Text { contents } => tree.create_text(&contents.borrow()),
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, attrs, .. } => {
                let mut elem = ElementData::new(&name.local);
                for attr in attrs.borrow().iter() {
                    elem.set_attr(&attr.name.local, attr.value.to_string());
                }
                tree.push(Node::from_element(elem))
            }
        };

        for child in handle.children.borrow().iter() {
            if let Some(child) = self.convert_node(child, tree) {
                // Freshly converted nodes are detached, so linking cannot fail
                let _ = tree.append_child(id, child);
            }
        }
        Some(id)
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let RcNodeData::Element { name, .. } = &handle.data {
        if &*name.local == tag {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}
