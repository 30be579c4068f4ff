//! Batch wrapping

use std::rc::Rc;

use d2o_dom::NodeId;

use crate::wrapper::{Wrapped, wrap_node};
use crate::{Host, WrapError, WrapOptions};

/// A single thing to wrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Element(NodeId),
    /// Resolved to its first match
    Selector(String),
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Self::Element(node)
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// Input to [`wrap_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// Resolved to every match, in document order
    Selector(String),
    /// Each element is wrapped as is; each selector expands to all of its
    /// matches
    List(Vec<Target>),
}

impl From<&str> for Targets {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for Targets {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<Vec<Target>> for Targets {
    fn from(targets: Vec<Target>) -> Self {
        Self::List(targets)
    }
}

impl From<Vec<NodeId>> for Targets {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self::List(nodes.into_iter().map(Target::Element).collect())
    }
}

impl From<Vec<&str>> for Targets {
    fn from(selectors: Vec<&str>) -> Self {
        Self::List(selectors.into_iter().map(Target::from).collect())
    }
}

/// Wrap every element a selector or list resolves to.
///
/// Output follows input and document order. Nothing is deduplicated, and
/// a selector that matches nothing contributes nothing.
pub fn wrap_all<H>(
    host: &H,
    targets: impl Into<Targets>,
    flatten_anonymous: bool,
) -> Result<Vec<Wrapped>, WrapError>
where
    H: Host + Clone + 'static,
{
    wrap_all_with(host, targets, WrapOptions::from(flatten_anonymous))
}

/// [`wrap_all`] with explicit options
pub fn wrap_all_with<H>(
    host: &H,
    targets: impl Into<Targets>,
    options: WrapOptions,
) -> Result<Vec<Wrapped>, WrapError>
where
    H: Host + Clone + 'static,
{
    let host: Rc<dyn Host> = Rc::new(host.clone());
    let mut out = Vec::new();
    expand(&host, targets.into(), options, &mut out)?;
    tracing::debug!(count = out.len(), "wrapped batch");
    Ok(out)
}

fn expand(
    host: &Rc<dyn Host>,
    targets: Targets,
    options: WrapOptions,
    out: &mut Vec<Wrapped>,
) -> Result<(), WrapError> {
    match targets {
        Targets::Selector(selector) => {
            for node in host.query_selector_all(&selector)? {
                out.push(wrap_node(host, node, options));
            }
        }
        Targets::List(items) => {
            for item in items {
                match item {
                    Target::Element(node) => out.push(wrap_node(host, node, options)),
                    Target::Selector(selector) => {
                        expand(host, Targets::Selector(selector), options, out)?
                    }
                }
            }
        }
    }
    Ok(())
}
