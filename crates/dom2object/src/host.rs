//! Host seam
//!
//! A wrapper never touches a tree directly; it goes through [`Host`], which
//! supplies child enumeration, naming, selector queries and property
//! reflection. [`SharedDocument`] is the implementation over a parsed
//! [`Document`].

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use d2o_dom::{Document, DomResult, NodeId, Value};
use d2o_html::reflect::{self, NativeMethod, Reflected};

/// Tree, query and property-access contract a wrapper delegates to
pub trait Host {
    /// First element in the document matching `selector`
    fn query_selector(&self, selector: &str) -> DomResult<Option<NodeId>>;

    /// All elements in the document matching `selector`, in document order
    fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeId>>;

    /// Element children in document order, or `None` for nodes that are
    /// not elements (text, comments, unknown IDs)
    fn element_children(&self, node: NodeId) -> Option<Vec<NodeId>>;

    /// Non-empty `id` attribute
    fn id(&self, node: NodeId) -> Option<String>;

    /// Non-empty `name` attribute
    fn name(&self, node: NodeId) -> Option<String>;

    /// Read a property from the element
    fn get_property(&self, node: NodeId, name: &str) -> Reflected;

    /// Write a property on the element
    fn set_property(&self, node: NodeId, name: &str, value: Value) -> DomResult<()>;

    /// Whether `name` is an own (non-native) property of the element
    fn has_own_property(&self, node: NodeId, name: &str) -> bool;

    /// Invoke a native method with the element as receiver
    fn call_method(&self, node: NodeId, method: NativeMethod, args: &[Value]) -> DomResult<Value>;
}

/// Single-threaded shared handle to a [`Document`]
///
/// Cloning is cheap and every clone sees the same tree. Do not hold a
/// [`borrow`](Self::borrow) across calls into a wrapper.
#[derive(Debug, Clone, Default)]
pub struct SharedDocument(Rc<RefCell<Document>>);

impl SharedDocument {
    pub fn new(document: Document) -> Self {
        Self(Rc::new(RefCell::new(document)))
    }

    /// Parse `html` into a fresh shared document
    pub fn parse(html: &str) -> Self {
        Self::new(d2o_html::parse(html))
    }

    pub fn borrow(&self) -> Ref<'_, Document> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Document> {
        self.0.borrow_mut()
    }

    /// Convenience lookup through the document
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.borrow().get_element_by_id(id)
    }
}

impl From<Document> for SharedDocument {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}

impl Host for SharedDocument {
    fn query_selector(&self, selector: &str) -> DomResult<Option<NodeId>> {
        self.borrow().query_selector(selector)
    }

    fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeId>> {
        self.borrow().query_selector_all(selector)
    }

    fn element_children(&self, node: NodeId) -> Option<Vec<NodeId>> {
        let doc = self.borrow();
        doc.tree().element(node)?;
        Some(doc.tree().element_children(node).collect())
    }

    fn id(&self, node: NodeId) -> Option<String> {
        self.borrow()
            .tree()
            .element(node)
            .and_then(|e| e.id())
            .map(str::to_string)
    }

    fn name(&self, node: NodeId) -> Option<String> {
        self.borrow()
            .tree()
            .element(node)
            .and_then(|e| e.name())
            .map(str::to_string)
    }

    fn get_property(&self, node: NodeId, name: &str) -> Reflected {
        reflect::get_property(self.borrow().tree(), node, name)
    }

    fn set_property(&self, node: NodeId, name: &str, value: Value) -> DomResult<()> {
        reflect::set_property(self.borrow_mut().tree_mut(), node, name, value)
    }

    fn has_own_property(&self, node: NodeId, name: &str) -> bool {
        reflect::has_own_property(self.borrow().tree(), node, name)
    }

    fn call_method(&self, node: NodeId, method: NativeMethod, args: &[Value]) -> DomResult<Value> {
        reflect::call_method(self.borrow_mut().tree_mut(), node, method, args)
    }
}
