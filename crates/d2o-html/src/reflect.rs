//! Element property reflection
//!
//! Script-style `el.prop` / `el.prop = v` / `el.method(args)` access over
//! the arena tree. Native properties are computed from attributes and tree
//! structure; every other name is an expando stored on the element, which
//! also shadows a native method of the same name.

use d2o_dom::{DomError, DomResult, DomTree, ElementData, NodeData, NodeId, Selector, Value};

use crate::parser::HtmlParser;
use crate::serializer::{inner_html, outer_html};

/// Native element methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeMethod {
    GetAttribute,
    SetAttribute,
    RemoveAttribute,
    HasAttribute,
    AppendChild,
    RemoveChild,
    Remove,
    QuerySelector,
    QuerySelectorAll,
    Matches,
    Closest,
}

impl NativeMethod {
    /// Look up a method by its script name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "getAttribute" => Self::GetAttribute,
            "setAttribute" => Self::SetAttribute,
            "removeAttribute" => Self::RemoveAttribute,
            "hasAttribute" => Self::HasAttribute,
            "appendChild" => Self::AppendChild,
            "removeChild" => Self::RemoveChild,
            "remove" => Self::Remove,
            "querySelector" => Self::QuerySelector,
            "querySelectorAll" => Self::QuerySelectorAll,
            "matches" => Self::Matches,
            "closest" => Self::Closest,
            _ => return None,
        })
    }

    /// Script name of the method
    pub fn name(self) -> &'static str {
        match self {
            Self::GetAttribute => "getAttribute",
            Self::SetAttribute => "setAttribute",
            Self::RemoveAttribute => "removeAttribute",
            Self::HasAttribute => "hasAttribute",
            Self::AppendChild => "appendChild",
            Self::RemoveChild => "removeChild",
            Self::Remove => "remove",
            Self::QuerySelector => "querySelector",
            Self::QuerySelectorAll => "querySelectorAll",
            Self::Matches => "matches",
            Self::Closest => "closest",
        }
    }
}

/// Result of reading a property
#[derive(Debug, Clone, PartialEq)]
pub enum Reflected {
    /// Plain value (`Undefined` for unknown names)
    Value(Value),
    /// Native method, to be invoked with [`call_method`]
    Method(NativeMethod),
}

/// String properties reflected straight from an attribute of the same meaning
const STRING_ATTRS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("className", "class"),
    ("title", "title"),
    ("placeholder", "placeholder"),
    ("href", "href"),
    ("src", "src"),
];

/// Boolean properties reflected from attribute presence
const BOOL_ATTRS: &[&str] = &["disabled", "hidden"];

/// Getter-only properties
const READ_ONLY: &[&str] = &[
    "tagName",
    "nodeName",
    "localName",
    "outerHTML",
    "children",
    "childElementCount",
    "parentElement",
    "firstElementChild",
    "lastElementChild",
    "nextElementSibling",
    "previousElementSibling",
];

/// Tags that carry a native `value`
const VALUE_TAGS: &[&str] = &["input", "textarea", "select", "option", "button", "output"];

fn string_attr(name: &str) -> Option<&'static str> {
    STRING_ATTRS
        .iter()
        .find(|(prop, _)| *prop == name)
        .map(|(_, attr)| *attr)
}

/// Whether `name` is a native accessor on this element
fn is_native(elem: &ElementData, name: &str) -> bool {
    string_attr(name).is_some()
        || BOOL_ATTRS.contains(&name)
        || READ_ONLY.contains(&name)
        || matches!(name, "innerHTML" | "textContent" | "innerText" | "type")
        || (name == "value" && VALUE_TAGS.contains(&elem.tag.as_str()))
        || (name == "checked" && elem.tag == "input")
}

/// Read `name` from `node`
pub fn get_property(tree: &DomTree, node: NodeId, name: &str) -> Reflected {
    let Some(elem) = tree.element(node) else {
        return Reflected::Value(get_non_element(tree, node, name));
    };

    if let Some(value) = elem.expandos.get(name) {
        return Reflected::Value(value.clone());
    }
    if let Some(method) = NativeMethod::from_name(name) {
        return Reflected::Method(method);
    }
    if !is_native(elem, name) {
        return Reflected::Value(Value::Undefined);
    }

    if let Some(attr) = string_attr(name) {
        return Reflected::Value(elem.get_attr(attr).unwrap_or("").into());
    }
    if BOOL_ATTRS.contains(&name) {
        return Reflected::Value(elem.has_attr(name).into());
    }

    let value: Value = match name {
        "tagName" | "nodeName" => elem.tag.to_ascii_uppercase().into(),
        "localName" => elem.tag.clone().into(),
        "type" => element_type(elem).into(),
        "value" => element_value(tree, node, elem).into(),
        "checked" => elem
            .dirty_checked
            .unwrap_or_else(|| elem.has_attr("checked"))
            .into(),
        "innerHTML" => inner_html(tree, node).into(),
        "outerHTML" => outer_html(tree, node).into(),
        "textContent" | "innerText" => tree.text_content(node).into(),
        "children" => Value::List(tree.element_children(node).map(Value::Node).collect()),
        "childElementCount" => Value::Number(tree.element_children(node).count() as f64),
        "parentElement" => tree.parent_element(node).into(),
        "firstElementChild" => tree.element_children(node).next().into(),
        "lastElementChild" => tree.element_children(node).last().into(),
        "nextElementSibling" => tree.next_element_sibling(node).into(),
        "previousElementSibling" => tree.previous_element_sibling(node).into(),
        _ => Value::Undefined,
    };
    Reflected::Value(value)
}

fn get_non_element(tree: &DomTree, node: NodeId, name: &str) -> Value {
    let Some(data) = tree.get(node) else {
        return Value::Undefined;
    };
    match name {
        "textContent" => data
            .as_text()
            .map_or_else(|| tree.text_content(node), str::to_string)
            .into(),
        "nodeName" if data.is_text() => "#text".into(),
        "parentElement" => tree.parent_element(node).into(),
        _ => Value::Undefined,
    }
}

fn element_type(elem: &ElementData) -> String {
    let declared = elem.get_attr("type").map(str::to_ascii_lowercase);
    match elem.tag.as_str() {
        "input" => declared.filter(|t| !t.is_empty()).unwrap_or_else(|| "text".into()),
        "button" => declared.filter(|t| !t.is_empty()).unwrap_or_else(|| "submit".into()),
        _ => declared.unwrap_or_default(),
    }
}

fn element_value(tree: &DomTree, node: NodeId, elem: &ElementData) -> String {
    if let Some(dirty) = &elem.dirty_value {
        return dirty.clone();
    }
    match elem.tag.as_str() {
        "textarea" => tree.text_content(node),
        "select" => selected_option(tree, node)
            .map(|option| option_value(tree, option))
            .unwrap_or_default(),
        "option" => option_value(tree, node),
        "input" => {
            let checkable = matches!(element_type(elem).as_str(), "checkbox" | "radio");
            match elem.get_attr("value") {
                Some(value) => value.to_string(),
                None if checkable => "on".to_string(),
                None => String::new(),
            }
        }
        _ => elem.get_attr("value").unwrap_or("").to_string(),
    }
}

fn options(tree: &DomTree, select: NodeId) -> Vec<NodeId> {
    tree.descendant_elements(select)
        .into_iter()
        .filter(|&id| tree.element(id).is_some_and(|e| e.tag == "option"))
        .collect()
}

fn selected_option(tree: &DomTree, select: NodeId) -> Option<NodeId> {
    let options = options(tree, select);
    options
        .iter()
        .copied()
        .find(|&id| tree.element(id).is_some_and(|e| e.has_attr("selected")))
        .or_else(|| options.first().copied())
}

fn option_value(tree: &DomTree, option: NodeId) -> String {
    match tree.element(option).and_then(|e| e.get_attr("value")) {
        Some(value) => value.to_string(),
        None => tree.text_content(option).trim().to_string(),
    }
}

/// Write `name` on `node`
pub fn set_property(tree: &mut DomTree, node: NodeId, name: &str, value: Value) -> DomResult<()> {
    let Some(elem) = tree.element_mut(node) else {
        return set_non_element(tree, node, name, value);
    };

    if !is_native(elem, name) {
        elem.expandos.insert(name.to_string(), value);
        return Ok(());
    }
    if READ_ONLY.contains(&name) {
        return Err(DomError::ReadOnly(name.to_string()));
    }

    if let Some(attr) = string_attr(name) {
        elem.set_attr(attr, value.to_display_string());
        return Ok(());
    }
    if BOOL_ATTRS.contains(&name) {
        if value.truthy() {
            elem.set_attr(name, "");
        } else {
            elem.remove_attr(name);
        }
        return Ok(());
    }

    match name {
        "type" => elem.set_attr("type", value.to_display_string()),
        "checked" => elem.dirty_checked = Some(value.truthy()),
        "value" => {
            let text = value.to_display_string();
            match elem.tag.clone().as_str() {
                "input" | "textarea" => elem.dirty_value = Some(text),
                "select" => select_by_value(tree, node, &text),
                _ => elem.set_attr("value", text),
            }
        }
        "innerHTML" => {
            tree.remove_children(node)?;
            HtmlParser::new().parse_into(&value.to_display_string(), tree, node)?;
        }
        "textContent" | "innerText" => replace_with_text(tree, node, &value.to_display_string())?,
        _ => {}
    }
    Ok(())
}

fn set_non_element(tree: &mut DomTree, node: NodeId, name: &str, value: Value) -> DomResult<()> {
    let Some(data) = tree.get_mut(node) else {
        return Err(DomError::NotFound(node));
    };
    match (&mut data.data, name) {
        (NodeData::Text(text), "textContent") => {
            *text = value.to_display_string();
            Ok(())
        }
        _ => Err(DomError::InvalidNodeType(node)),
    }
}

fn replace_with_text(tree: &mut DomTree, node: NodeId, text: &str) -> DomResult<()> {
    tree.remove_children(node)?;
    if !text.is_empty() {
        let child = tree.create_text(text);
        tree.append_child(node, child)?;
    }
    Ok(())
}

fn select_by_value(tree: &mut DomTree, select: NodeId, value: &str) {
    let options = options(tree, select);
    let target = options
        .iter()
        .copied()
        .find(|&option| option_value(tree, option) == value);
    for option in options {
        if let Some(elem) = tree.element_mut(option) {
            if Some(option) == target {
                elem.set_attr("selected", "");
            } else {
                elem.remove_attr("selected");
            }
        }
    }
}

/// Check for an own (expando) property
pub fn has_own_property(tree: &DomTree, node: NodeId, name: &str) -> bool {
    tree.element(node)
        .is_some_and(|elem| elem.expandos.contains_key(name))
}

/// Invoke a native method with `node` as receiver
pub fn call_method(
    tree: &mut DomTree,
    node: NodeId,
    method: NativeMethod,
    args: &[Value],
) -> DomResult<Value> {
    if tree.element(node).is_none() {
        return Err(DomError::InvalidNodeType(node));
    }
    let args = Args { method, args };

    let result = match method {
        NativeMethod::GetAttribute => {
            let name = args.string(0)?;
            tree.element(node)
                .and_then(|e| e.get_attr(&name))
                .map_or(Value::Null, Value::from)
        }
        NativeMethod::SetAttribute => {
            let (name, value) = (args.string(0)?, args.string(1)?);
            if let Some(elem) = tree.element_mut(node) {
                elem.set_attr(&name, value);
            }
            Value::Undefined
        }
        NativeMethod::RemoveAttribute => {
            let name = args.string(0)?;
            if let Some(elem) = tree.element_mut(node) {
                elem.remove_attr(&name);
            }
            Value::Undefined
        }
        NativeMethod::HasAttribute => {
            let name = args.string(0)?;
            tree.element(node).is_some_and(|e| e.has_attr(&name)).into()
        }
        NativeMethod::AppendChild => Value::Node(tree.append_child(node, args.node(0)?)?),
        NativeMethod::RemoveChild => Value::Node(tree.remove_child(node, args.node(0)?)?),
        NativeMethod::Remove => {
            tree.detach(node);
            Value::Undefined
        }
        NativeMethod::QuerySelector => {
            let selector = Selector::parse(&args.string(0)?)?;
            selector.query_first(tree, node).into()
        }
        NativeMethod::QuerySelectorAll => {
            let selector = Selector::parse(&args.string(0)?)?;
            Value::List(selector.query_all(tree, node).into_iter().map(Value::Node).collect())
        }
        NativeMethod::Matches => {
            let selector = Selector::parse(&args.string(0)?)?;
            selector.matches(tree, node).into()
        }
        NativeMethod::Closest => {
            let selector = Selector::parse(&args.string(0)?)?;
            let mut cur = Some(node);
            while let Some(id) = cur {
                if selector.matches(tree, id) {
                    break;
                }
                cur = tree.parent_element(id);
            }
            cur.into()
        }
    };
    Ok(result)
}

struct Args<'a> {
    method: NativeMethod,
    args: &'a [Value],
}

impl Args<'_> {
    fn error(&self, reason: String) -> DomError {
        DomError::InvalidArgument {
            method: self.method.name().to_string(),
            reason,
        }
    }

    fn get(&self, index: usize) -> DomResult<&Value> {
        self.args
            .get(index)
            .ok_or_else(|| self.error(format!("missing argument {}", index + 1)))
    }

    fn string(&self, index: usize) -> DomResult<String> {
        self.get(index).map(Value::to_display_string)
    }

    fn node(&self, index: usize) -> DomResult<NodeId> {
        self.get(index)?
            .as_node()
            .ok_or_else(|| self.error(format!("argument {} is not a node", index + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(tree: &mut DomTree, attrs: &[(&str, &str)]) -> NodeId {
        let id = tree.create_element("input");
        for (name, value) in attrs {
            tree.element_mut(id).unwrap().set_attr(name, *value);
        }
        id
    }

    fn value(tree: &DomTree, node: NodeId, name: &str) -> Value {
        match get_property(tree, node, name) {
            Reflected::Value(value) => value,
            Reflected::Method(m) => panic!("{name} resolved to method {m:?}"),
        }
    }

    #[test]
    fn test_method_lookup() {
        assert_eq!(NativeMethod::from_name("appendChild"), Some(NativeMethod::AppendChild));
        assert_eq!(NativeMethod::from_name("nope"), None);
        assert_eq!(NativeMethod::QuerySelectorAll.name(), "querySelectorAll");
    }

    #[test]
    fn test_value_dirty_flag() {
        let mut tree = DomTree::new();
        let node = input(&mut tree, &[("value", "initial")]);

        assert_eq!(value(&tree, node, "value"), Value::from("initial"));
        set_property(&mut tree, node, "value", "typed".into()).unwrap();
        assert_eq!(value(&tree, node, "value"), Value::from("typed"));
        assert_eq!(tree.element(node).unwrap().get_attr("value"), Some("initial"));
    }

    #[test]
    fn test_checkbox_defaults() {
        let mut tree = DomTree::new();
        let node = input(&mut tree, &[("type", "CHECKBOX"), ("checked", "")]);

        assert_eq!(value(&tree, node, "type"), Value::from("checkbox"));
        assert_eq!(value(&tree, node, "value"), Value::from("on"));
        assert_eq!(value(&tree, node, "checked"), Value::Bool(true));
        set_property(&mut tree, node, "checked", false.into()).unwrap();
        assert_eq!(value(&tree, node, "checked"), Value::Bool(false));
    }

    #[test]
    fn test_read_only() {
        let mut tree = DomTree::new();
        let node = input(&mut tree, &[]);
        assert_eq!(
            set_property(&mut tree, node, "tagName", "DIV".into()),
            Err(DomError::ReadOnly("tagName".into()))
        );
    }

    #[test]
    fn test_expando_shadows_method() {
        let mut tree = DomTree::new();
        let node = input(&mut tree, &[]);
        assert!(matches!(
            get_property(&tree, node, "remove"),
            Reflected::Method(NativeMethod::Remove)
        ));
        set_property(&mut tree, node, "remove", Value::Number(1.0)).unwrap();
        assert!(has_own_property(&tree, node, "remove"));
        assert_eq!(value(&tree, node, "remove"), Value::Number(1.0));
    }

    #[test]
    fn test_value_on_div_is_expando() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        assert_eq!(value(&tree, div, "value"), Value::Undefined);
        set_property(&mut tree, div, "value", "x".into()).unwrap();
        assert!(has_own_property(&tree, div, "value"));
    }

    #[test]
    fn test_missing_argument() {
        let mut tree = DomTree::new();
        let node = input(&mut tree, &[]);
        assert!(matches!(
            call_method(&mut tree, node, NativeMethod::GetAttribute, &[]),
            Err(DomError::InvalidArgument { .. })
        ));
    }
}
