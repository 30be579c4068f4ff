//! Element Wrapper
//!
//! A [`Wrapper`] stands in for an element that has element children. Its
//! named-child table maps every `id`/`name` found on direct children (and,
//! with flattening, on descendants of anonymous children) to a
//! [`Binding`]. Reads hit the table first and fall through to the element;
//! writes to unknown names go to the element and rebuild the table.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use d2o_dom::{NodeId, Value};
use d2o_html::reflect::{NativeMethod, Reflected};

use crate::{Host, Target, WrapError, WrapOptions};

/// Result of wrapping a node: a wrapper, or the node itself for leaves
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapped {
    Wrapper(Wrapper),
    Element(NodeId),
}

impl Wrapped {
    /// Underlying node
    pub fn node(&self) -> NodeId {
        match self {
            Self::Wrapper(wrapper) => wrapper.element(),
            Self::Element(node) => *node,
        }
    }

    pub fn as_wrapper(&self) -> Option<&Wrapper> {
        match self {
            Self::Wrapper(wrapper) => Some(wrapper),
            Self::Element(_) => None,
        }
    }

    pub fn into_wrapper(self) -> Option<Wrapper> {
        match self {
            Self::Wrapper(wrapper) => Some(wrapper),
            Self::Element(_) => None,
        }
    }
}

/// Value bound to a name in a wrapper's table
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A named child that has children of its own
    Wrapper(Wrapper),
    /// A childless named child
    Element(NodeId),
    /// Anything assigned over a name with [`Wrapper::set`]
    Value(Value),
}

impl Binding {
    /// Underlying node, if the binding refers to one
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Wrapper(wrapper) => Some(wrapper.element()),
            Self::Element(node) => Some(*node),
            Self::Value(value) => value.as_node(),
        }
    }

    pub fn as_wrapper(&self) -> Option<&Wrapper> {
        match self {
            Self::Wrapper(wrapper) => Some(wrapper),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Form written to the element when the binding is assigned natively
    fn into_value(self) -> Value {
        match self {
            Self::Wrapper(wrapper) => Value::Node(wrapper.element()),
            Self::Element(node) => Value::Node(node),
            Self::Value(value) => value,
        }
    }
}

impl From<Wrapped> for Binding {
    fn from(wrapped: Wrapped) -> Self {
        match wrapped {
            Wrapped::Wrapper(wrapper) => Self::Wrapper(wrapper),
            Wrapped::Element(node) => Self::Element(node),
        }
    }
}

impl From<Wrapper> for Binding {
    fn from(wrapper: Wrapper) -> Self {
        Self::Wrapper(wrapper)
    }
}

impl From<NodeId> for Binding {
    fn from(node: NodeId) -> Self {
        Self::Element(node)
    }
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<bool> for Binding {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl From<f64> for Binding {
    fn from(value: f64) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for Binding {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

/// Result of [`Wrapper::get`]
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Entry of the named-child table
    Binding(Binding),
    /// Native or expando property of the element
    Value(Value),
    /// Native method bound to the element
    Method(BoundMethod),
}

impl Property {
    pub fn binding(&self) -> Option<&Binding> {
        match self {
            Self::Binding(binding) => Some(binding),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) | Self::Binding(Binding::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn method(&self) -> Option<&BoundMethod> {
        match self {
            Self::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_wrapper(&self) -> Option<&Wrapper> {
        self.binding().and_then(Binding::as_wrapper)
    }

    /// Underlying node of a table entry
    pub fn node(&self) -> Option<NodeId> {
        self.binding().and_then(Binding::node)
    }

    /// Nothing under this name: not in the table and `undefined` natively
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Value(Value::Undefined))
    }
}

/// Native method with its receiver fixed to one element
#[derive(Clone)]
pub struct BoundMethod {
    host: Rc<dyn Host>,
    element: NodeId,
    method: NativeMethod,
}

impl BoundMethod {
    /// Invoke the method on the bound element
    pub fn call(&self, args: &[Value]) -> Result<Value, WrapError> {
        Ok(self.host.call_method(self.element, self.method, args)?)
    }

    pub fn method(&self) -> NativeMethod {
        self.method
    }

    pub fn receiver(&self) -> NodeId {
        self.element
    }
}

impl PartialEq for BoundMethod {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element && self.method == other.method
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("element", &self.element)
            .field("method", &self.method.name())
            .finish()
    }
}

/// A name that was claimed twice while building a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Contested name
    pub name: String,
    /// Element whose claim was dropped
    pub dropped: NodeId,
    /// The dropped claim came from an anonymous child's descendants
    pub hoisted: bool,
}

/// Named-child table plus the housekeeping derived from it
#[derive(Debug, Default)]
struct Table {
    names: Vec<String>,
    entries: HashMap<String, Binding>,
    snapshot: HashMap<String, NodeId>,
    collisions: Vec<Collision>,
}

impl Table {
    /// First-wins registration; a later claim is logged and dropped
    fn register(
        &mut self,
        element: NodeId,
        name: &str,
        binding: impl FnOnce() -> Binding,
        dropped: NodeId,
        hoisted: bool,
    ) {
        if self.entries.contains_key(name) {
            tracing::warn!(
                element = %element,
                dropped = %dropped,
                "element already has a property named {}",
                name
            );
            self.collisions.push(Collision {
                name: name.to_string(),
                dropped,
                hoisted,
            });
            return;
        }
        let binding = binding();
        if let Some(node) = binding.node() {
            self.snapshot.insert(name.to_string(), node);
        }
        self.names.push(name.to_string());
        self.entries.insert(name.to_string(), binding);
    }
}

struct Inner {
    host: Rc<dyn Host>,
    element: NodeId,
    options: WrapOptions,
    table: RefCell<Table>,
}

/// Accessor for an element with children
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone)]
pub struct Wrapper {
    inner: Rc<Inner>,
}

impl Wrapper {
    fn build(host: Rc<dyn Host>, element: NodeId, options: WrapOptions) -> Self {
        let table = compute_table(&host, element, options);
        Self {
            inner: Rc::new(Inner {
                host,
                element,
                options,
                table: RefCell::new(table),
            }),
        }
    }

    /// The wrapped element
    pub fn element(&self) -> NodeId {
        self.inner.element
    }

    /// Options this wrapper (and its descendants) were built with
    pub fn options(&self) -> WrapOptions {
        self.inner.options
    }

    /// Current names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.inner.table.borrow().names.clone()
    }

    /// Name to underlying element, as of the last recompute
    pub fn snapshot(&self) -> HashMap<String, NodeId> {
        self.inner.table.borrow().snapshot.clone()
    }

    /// Collisions resolved by the last recompute
    pub fn collisions(&self) -> Vec<Collision> {
        self.inner.table.borrow().collisions.clone()
    }

    /// Check for a name in the table
    pub fn contains(&self, name: &str) -> bool {
        self.inner.table.borrow().entries.contains_key(name)
    }

    /// Table entry for `name`, without falling through to the element
    pub fn child(&self, name: &str) -> Option<Binding> {
        self.inner.table.borrow().entries.get(name).cloned()
    }

    /// Table entries in name order
    pub fn entries(&self) -> Vec<(String, Binding)> {
        let table = self.inner.table.borrow();
        table
            .names
            .iter()
            .filter_map(|name| Some((name.clone(), table.entries.get(name)?.clone())))
            .collect()
    }

    /// Read `name`: table entry first, then the element
    pub fn get(&self, name: &str) -> Property {
        if let Some(binding) = self.child(name) {
            return Property::Binding(binding);
        }
        match self.inner.host.get_property(self.inner.element, name) {
            Reflected::Value(value) => Property::Value(value),
            Reflected::Method(method) => Property::Method(BoundMethod {
                host: Rc::clone(&self.inner.host),
                element: self.inner.element,
                method,
            }),
        }
    }

    /// Write `name`.
    ///
    /// A name in the table is rebound in place without touching the
    /// element. Any other name is written to the element, and unless it
    /// ends up as an own property of the element the table is rebuilt.
    pub fn set(&self, name: &str, value: impl Into<Binding>) -> Result<(), WrapError> {
        let value = value.into();
        if let Some(slot) = self.inner.table.borrow_mut().entries.get_mut(name) {
            *slot = value;
            return Ok(());
        }

        let Inner { host, element, .. } = &*self.inner;
        host.set_property(*element, name, value.into_value())?;
        if !host.has_own_property(*element, name) {
            self.refresh();
        }
        Ok(())
    }

    /// Rebuild the table from the current state of the tree
    pub fn refresh(&self) {
        let table = compute_table(&self.inner.host, self.inner.element, self.inner.options);
        *self.inner.table.borrow_mut() = table;
    }
}

impl PartialEq for Wrapper {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("element", &self.inner.element)
            .field("names", &self.inner.table.borrow().names)
            .finish()
    }
}

/// Wrap a node, or return it unwrapped when it has no element children
pub(crate) fn wrap_node(host: &Rc<dyn Host>, node: NodeId, options: WrapOptions) -> Wrapped {
    match host.element_children(node) {
        Some(children) if !children.is_empty() => {
            Wrapped::Wrapper(Wrapper::build(Rc::clone(host), node, options))
        }
        _ => Wrapped::Element(node),
    }
}

fn compute_table(host: &Rc<dyn Host>, element: NodeId, options: WrapOptions) -> Table {
    let mut table = Table::default();
    let mut anonymous = Vec::new();

    for child in host.element_children(element).unwrap_or_default() {
        let id = host.id(child);
        let name = host.name(child).filter(|name| Some(name) != id.as_ref());
        if id.is_none() && name.is_none() {
            if options.flatten_anonymous {
                anonymous.push(child);
            }
            continue;
        }

        // Both keys share one wrapper, built only if some key is free
        let mut wrapped: Option<Binding> = None;
        for key in id.iter().chain(name.iter()) {
            let binding = || {
                wrapped
                    .get_or_insert_with(|| wrap_node(host, child, options).into())
                    .clone()
            };
            table.register(element, key, binding, child, false);
        }
    }

    // Hoisting runs after every direct name is in, so direct children win
    for child in anonymous {
        let Wrapped::Wrapper(nested) = wrap_node(host, child, options.flatten_anonymous(true)) else {
            continue;
        };
        for (name, binding) in nested.entries() {
            let dropped = binding.node().unwrap_or(child);
            table.register(element, &name, || binding, dropped, true);
        }
    }

    tracing::debug!(
        element = %element,
        names = table.names.len(),
        collisions = table.collisions.len(),
        "computed named-child table"
    );
    table
}

/// Wrap an element (or the first match of a selector) as a named-child accessor.
///
/// Elements without element children, and nodes that are not elements, are
/// returned as [`Wrapped::Element`].
pub fn wrap<H>(
    host: &H,
    target: impl Into<Target>,
    flatten_anonymous: bool,
) -> Result<Wrapped, WrapError>
where
    H: Host + Clone + 'static,
{
    wrap_with(host, target, WrapOptions::from(flatten_anonymous))
}

/// [`wrap`] with explicit options
pub fn wrap_with<H>(
    host: &H,
    target: impl Into<Target>,
    options: WrapOptions,
) -> Result<Wrapped, WrapError>
where
    H: Host + Clone + 'static,
{
    let host: Rc<dyn Host> = Rc::new(host.clone());
    wrap_target(&host, target.into(), options)
}

pub(crate) fn wrap_target(
    host: &Rc<dyn Host>,
    target: Target,
    options: WrapOptions,
) -> Result<Wrapped, WrapError> {
    let node = match target {
        Target::Element(node) => node,
        Target::Selector(selector) => host
            .query_selector(&selector)?
            .ok_or(WrapError::NoMatch(selector))?,
    };
    Ok(wrap_node(host, node, options))
}
