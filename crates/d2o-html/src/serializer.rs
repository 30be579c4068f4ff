//! HTML Serialization (innerHTML/outerHTML)

use d2o_dom::{DomTree, ElementData, NodeData, NodeId};

/// Elements written without an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text is written unescaped
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// HTML serializer
#[derive(Debug, Clone)]
pub struct HtmlSerializer {
    /// Put each element on its own indented line
    pub pretty_print: bool,
    /// One level of indentation
    pub indent: String,
}

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent: "  ".to_string(),
        }
    }
}

impl HtmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self {
            pretty_print: true,
            ..Self::default()
        }
    }

    /// Markup of the children of `node`
    pub fn serialize_inner(&self, tree: &DomTree, node: NodeId) -> String {
        let mut out = Output::new(self, tree);
        out.children(node, 0);
        out.buf
    }

    /// Markup of `node` itself
    pub fn serialize_outer(&self, tree: &DomTree, node: NodeId) -> String {
        let mut out = Output::new(self, tree);
        out.node(node, 0);
        out.buf
    }
}

/// One serialization pass
struct Output<'a> {
    options: &'a HtmlSerializer,
    tree: &'a DomTree,
    buf: String,
}

impl<'a> Output<'a> {
    fn new(options: &'a HtmlSerializer, tree: &'a DomTree) -> Self {
        Self {
            options,
            tree,
            buf: String::new(),
        }
    }

    fn node(&mut self, id: NodeId, depth: usize) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Document => self.children(id, depth),
            NodeData::Element(elem) => self.element(id, elem, depth),
            NodeData::Text(text) => escape_into(&mut self.buf, text, false),
            NodeData::Comment(text) => {
                self.buf.push_str("<!--");
                self.buf.push_str(text);
                self.buf.push_str("-->");
            }
            NodeData::Doctype { name } => {
                self.buf.push_str("<!DOCTYPE ");
                self.buf.push_str(name);
                self.buf.push('>');
            }
        }
    }

    fn children(&mut self, id: NodeId, depth: usize) {
        let tree = self.tree;
        for (child, _) in tree.children(id) {
            self.node(child, depth);
        }
    }

    fn element(&mut self, id: NodeId, elem: &ElementData, depth: usize) {
        if depth > 0 {
            self.line_break(depth);
        }
        self.start_tag(elem);

        let tag = elem.tag.as_str();
        if VOID_ELEMENTS.contains(&tag) {
            return;
        }
        if RAW_TEXT_ELEMENTS.contains(&tag) {
            self.buf.push_str(&self.tree.text_content(id));
        } else {
            self.children(id, depth + 1);
            if self.tree.has_element_children(id) {
                self.line_break(depth);
            }
        }

        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
    }

    fn start_tag(&mut self, elem: &ElementData) {
        self.buf.push('<');
        self.buf.push_str(&elem.tag);
        for attr in &elem.attrs {
            self.buf.push(' ');
            self.buf.push_str(&attr.name);
            if attr.value.is_empty() {
                continue;
            }
            self.buf.push_str("=\"");
            escape_into(&mut self.buf, &attr.value, true);
            self.buf.push('"');
        }
        self.buf.push('>');
    }

    /// Newline plus indentation, in pretty mode only
    fn line_break(&mut self, depth: usize) {
        if !self.options.pretty_print {
            return;
        }
        self.buf.push('\n');
        for _ in 0..depth {
            self.buf.push_str(&self.options.indent);
        }
    }
}

/// Escape `&` always, `"` inside attributes and `<`/`>` in text
fn escape_into(buf: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '"' if attribute => buf.push_str("&quot;"),
            '<' if !attribute => buf.push_str("&lt;"),
            '>' if !attribute => buf.push_str("&gt;"),
            _ => buf.push(c),
        }
    }
}

/// innerHTML of a node
pub fn inner_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(tree, node)
}

/// outerHTML of a node
pub fn outer_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(tree, node)
}
