//! Wrapper behaviour against parsed documents
//!
//! Construction, named-child resolution, flattening, live recompute and
//! batch wrapping.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dom2object::dom::DomError;
use dom2object::html::outer_html;
use dom2object::html::Reflected;
use dom2object::{
    Binding, Host, NativeMethod, NodeId, Property, SharedDocument, Value, WrapError, WrapOptions,
    Wrapped, Wrapper, wrap, wrap_all, wrap_with,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

/// Counts WARN events
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `f` and return its result with the number of warnings it logged
fn count_warnings<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = Registry::default().with(WarnCounter(Arc::clone(&count)));
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, count.load(Ordering::SeqCst))
}

fn wrapper(doc: &SharedDocument, selector: &str, flatten: bool) -> Wrapper {
    wrap(doc, selector, flatten)
        .unwrap()
        .into_wrapper()
        .expect("target has element children")
}

fn id(doc: &SharedDocument, id: &str) -> NodeId {
    doc.get_element_by_id(id).unwrap()
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_leaf_is_returned_unwrapped() {
    let doc = SharedDocument::parse("<p id='leaf'>just text</p><br id='br'>");
    let leaf = id(&doc, "leaf");
    assert_eq!(wrap(&doc, leaf, false).unwrap(), Wrapped::Element(leaf));
    assert_eq!(wrap(&doc, "#br", true).unwrap(), Wrapped::Element(id(&doc, "br")));
}

#[test]
fn test_text_node_is_returned_unwrapped() {
    let doc = SharedDocument::parse("<p id='leaf'>just text</p>");
    let text = doc.borrow().tree().children(id(&doc, "leaf")).next().unwrap().0;
    assert_eq!(wrap(&doc, text, false).unwrap(), Wrapped::Element(text));
}

#[test]
fn test_selector_without_match() {
    let doc = SharedDocument::parse("<div></div>");
    assert_eq!(
        wrap(&doc, ".nothing", false),
        Err(WrapError::NoMatch(".nothing".into()))
    );
    assert!(matches!(
        wrap(&doc, "div >", false),
        Err(WrapError::Dom(DomError::InvalidSelector { .. }))
    ));
}

#[test]
fn test_single_named_child() {
    let doc = SharedDocument::parse("<div id='root'><span id='a'>A</span></div>");
    let root = wrapper(&doc, "#root", false);
    assert_eq!(root.element(), id(&doc, "root"));
    assert_eq!(root.get("a").node(), Some(id(&doc, "a")));
    assert_eq!(root.names(), ["a"]);
}

#[test]
fn test_named_children_are_wrapped_recursively() {
    let doc = SharedDocument::parse(
        r#"<form id="root">
            <fieldset id="account"><input name="user"><input name="pass"></fieldset>
            <button id="go">Go</button>
        </form>"#,
    );
    let root = wrapper(&doc, "#root", false);
    let account = root.get("account");
    let account = account.as_wrapper().unwrap();
    assert_eq!(account.names(), ["user", "pass"]);
    assert_eq!(root.get("go").binding(), Some(&Binding::Element(id(&doc, "go"))));
}

#[test]
fn test_collision_first_wins() {
    let doc = SharedDocument::parse(
        "<div id='root'><p id='x' class='first'></p><p id='x' class='second'></p></div>",
    );
    let (root, warnings) = count_warnings(|| wrapper(&doc, "#root", false));
    assert_eq!(warnings, 1);

    let first = doc.query_selector(".first").unwrap().unwrap();
    let second = doc.query_selector(".second").unwrap().unwrap();
    assert_eq!(root.get("x").node(), Some(first));
    assert_eq!(root.names(), ["x"]);

    let collisions = root.collisions();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].name, "x");
    assert_eq!(collisions[0].dropped, second);
    assert!(!collisions[0].hoisted);
}

#[test]
fn test_id_and_name_keys() {
    let doc = SharedDocument::parse(
        "<div id='root'><span id='a' name='a'></span><span id='c' name='b'></span></div>",
    );
    let (root, warnings) = count_warnings(|| wrapper(&doc, "#root", false));
    assert_eq!(warnings, 0);
    assert_eq!(root.names(), ["a", "c", "b"]);
    assert_eq!(root.get("b").node(), Some(id(&doc, "c")));
    assert_eq!(root.get("c").node(), root.get("b").node());
}

#[test]
fn test_id_and_name_share_one_wrapper() {
    let doc = SharedDocument::parse(
        "<div id='root'><fieldset id='f' name='g'><input name='q'></fieldset></div>",
    );
    let root = wrapper(&doc, "#root", false);
    let by_id = root.get("f").as_wrapper().cloned().unwrap();
    let by_name = root.get("g").as_wrapper().cloned().unwrap();
    assert_eq!(by_id, by_name);
}

#[test]
fn test_empty_attributes_are_anonymous() {
    let doc = SharedDocument::parse("<div id='root'><span id='' name=''></span><i id='i'></i></div>");
    let root = wrapper(&doc, "#root", false);
    assert_eq!(root.names(), ["i"]);
}

#[test]
fn test_snapshot_maps_to_elements() {
    let doc = SharedDocument::parse(
        "<div id='root'><section id='s'><p id='p'></p></section><em name='e'></em></div>",
    );
    let root = wrapper(&doc, "#root", false);
    let snapshot = root.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot["s"], id(&doc, "s"));
    assert_eq!(snapshot["e"], doc.query_selector("em").unwrap().unwrap());
}

// ============================================================================
// FLATTENING
// ============================================================================

#[test]
fn test_flattening_hoists_nested_names() {
    let doc = SharedDocument::parse("<div id='root'><div><input id='inner'></div></div>");

    let plain = wrapper(&doc, "#root", false);
    assert!(plain.get("inner").is_undefined());
    assert!(plain.names().is_empty());

    let flat = wrapper(&doc, "#root", true);
    assert_eq!(flat.get("inner").node(), Some(id(&doc, "inner")));
    assert!(flat.options().flatten_anonymous);
}

#[test]
fn test_flattening_through_several_anonymous_levels() {
    let doc = SharedDocument::parse(
        "<div id='root'><div><p><span><b id='deep'></b></span></p></div></div>",
    );
    let flat = wrapper(&doc, "#root", true);
    assert_eq!(flat.names(), ["deep"]);
}

#[test]
fn test_flattening_applies_to_named_children() {
    let doc = SharedDocument::parse(
        "<form id='root'><fieldset id='fs'><div><input id='deep'></div></fieldset></form>",
    );
    let flat = wrap_with(&doc, "#root", WrapOptions::new().flatten_anonymous(true))
        .unwrap()
        .into_wrapper()
        .unwrap();
    let fieldset = flat.get("fs");
    assert!(fieldset.as_wrapper().unwrap().contains("deep"));
    assert!(!flat.contains("deep"));
}

#[test]
fn test_direct_child_beats_hoisted_name() {
    let doc = SharedDocument::parse(
        "<div id='root'><div><input id='x' class='nested'></div><input id='x' class='direct'></div>",
    );
    let (flat, warnings) = count_warnings(|| wrapper(&doc, "#root", true));
    assert_eq!(warnings, 1);

    let direct = doc.query_selector(".direct").unwrap().unwrap();
    let nested = doc.query_selector(".nested").unwrap().unwrap();
    assert_eq!(flat.get("x").node(), Some(direct));

    let collisions = flat.collisions();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].dropped, nested);
    assert!(collisions[0].hoisted);
}

// ============================================================================
// PROPERTY ACCESS
// ============================================================================

#[test]
fn test_pass_through_reads() {
    let doc = SharedDocument::parse("<div id='root' class='card' title='t'><p id='p'></p></div>");
    let root = wrapper(&doc, "#root", false);
    assert_eq!(root.get("tagName"), Property::Value("DIV".into()));
    assert_eq!(root.get("className").value(), Some(&Value::from("card")));
    assert_eq!(root.get("childElementCount").value(), Some(&Value::Number(1.0)));
    assert!(root.get("noSuchThing").is_undefined());
}

#[test]
fn test_child_name_shadows_native_property() {
    let doc = SharedDocument::parse("<div id='root' title='tooltip'><input name='title'></div>");
    let root = wrapper(&doc, "#root", false);
    assert!(root.get("title").binding().is_some());
}

#[test]
fn test_bound_method_keeps_receiver() {
    let doc = SharedDocument::parse("<div id='root' data-x='1'><p id='p'></p></div>");
    let root = wrapper(&doc, "#root", false);

    let get_attribute = root.get("getAttribute");
    let method = get_attribute.method().unwrap();
    assert_eq!(method.method(), NativeMethod::GetAttribute);
    assert_eq!(method.receiver(), root.element());
    assert_eq!(method.call(&["data-x".into()]).unwrap(), Value::from("1"));
    assert_eq!(method.call(&["missing".into()]).unwrap(), Value::Null);
}

#[test]
fn test_bound_method_errors() {
    let doc = SharedDocument::parse("<div id='root'><p id='p'></p></div>");
    let root = wrapper(&doc, "#root", false);
    let get_attribute = root.get("getAttribute");
    let err = get_attribute.method().unwrap().call(&[]).unwrap_err();
    assert!(matches!(err, WrapError::Dom(DomError::InvalidArgument { .. })));
}

#[test]
fn test_rebind_leaves_dom_untouched() {
    let doc = SharedDocument::parse("<div id='root'><span id='a'>A</span></div>");
    let root = wrapper(&doc, "#root", false);
    let before = outer_html(doc.borrow().tree(), root.element());

    root.set("a", 5).unwrap();

    assert_eq!(root.get("a"), Property::Binding(Binding::Value(Value::Number(5.0))));
    assert_eq!(outer_html(doc.borrow().tree(), root.element()), before);
    assert!(doc.get_element_by_id("a").is_some());
}

#[test]
fn test_inner_html_write_recomputes() {
    let doc = SharedDocument::parse("<div id='root'><span id='old'></span></div>");
    let root = wrapper(&doc, "#root", false);

    root.set("innerHTML", r#"<input id="new">"#).unwrap();

    assert!(root.contains("new"));
    assert!(!root.contains("old"));
    assert_eq!(root.get("new").node(), Some(id(&doc, "new")));
    assert_eq!(root.names(), ["new"]);
}

#[test]
fn test_inner_html_write_parses_in_element_context() {
    let doc = SharedDocument::parse(
        "<table><tbody id='root'><tr id='r0'><td>old</td></tr></tbody></table>",
    );
    let root = wrapper(&doc, "#root", false);

    root.set("innerHTML", "<tr id='r1'><td>a</td></tr>").unwrap();

    assert_eq!(root.names(), ["r1"]);
    let r1 = root.get("r1");
    assert_eq!(r1.node(), Some(id(&doc, "r1")));
    assert!(r1.as_wrapper().is_some());
}

#[test]
fn test_recompute_reapplies_flattening() {
    let doc = SharedDocument::parse("<div id='root'><span id='old'></span></div>");
    let root = wrapper(&doc, "#root", true);
    root.set("innerHTML", "<div><div><input name='deep'></div></div>").unwrap();
    assert_eq!(root.names(), ["deep"]);
}

#[test]
fn test_expando_write_skips_recompute() {
    let doc = SharedDocument::parse("<form id='root'><input name='user'></form>");
    let root = wrapper(&doc, "#root", false);

    {
        let mut document = doc.borrow_mut();
        let tree = document.tree_mut();
        let late = tree.create_element("input");
        tree.element_mut(late).unwrap().set_attr("name", "late");
        tree.append_child(root.element(), late).unwrap();
    }

    root.set("flag", true).unwrap();
    assert_eq!(root.get("flag"), Property::Value(Value::Bool(true)));
    assert!(!root.contains("late"));

    root.set("className", "card").unwrap();
    assert!(root.contains("late"));
    assert_eq!(root.names(), ["user", "late"]);
}

#[test]
fn test_value_write_recomputes() {
    let doc = SharedDocument::parse(
        "<select id='root'><option id='free' value='free'>Free</option></select>",
    );
    let root = wrapper(&doc, "#root", false);

    {
        let mut document = doc.borrow_mut();
        let tree = document.tree_mut();
        let pro = tree.create_element("option");
        let element = tree.element_mut(pro).unwrap();
        element.set_attr("id", "pro");
        element.set_attr("value", "pro");
        tree.append_child(root.element(), pro).unwrap();
    }
    assert_eq!(root.names(), ["free"]);

    root.set("value", "pro").unwrap();
    assert_eq!(root.names(), ["free", "pro"]);
    assert_eq!(root.get("value"), Property::Value(Value::from("pro")));
}

#[test]
fn test_refresh_picks_up_direct_edits() {
    let doc = SharedDocument::parse("<ul id='root'><li id='one'></li><li id='two'></li></ul>");
    let root = wrapper(&doc, "#root", false);
    let two = id(&doc, "two");

    doc.borrow_mut()
        .tree_mut()
        .remove_child(root.element(), two)
        .unwrap();
    assert!(root.contains("two"));

    root.refresh();
    assert_eq!(root.names(), ["one"]);
}

#[test]
fn test_read_only_write_fails() {
    let doc = SharedDocument::parse("<div id='root'><p id='p'></p></div>");
    let root = wrapper(&doc, "#root", false);
    assert_eq!(
        root.set("tagName", "span"),
        Err(WrapError::Dom(DomError::ReadOnly("tagName".into())))
    );
    assert_eq!(root.names(), ["p"]);
}

#[test]
fn test_leaf_children_go_through_the_host() {
    let doc = SharedDocument::parse("<form id='root'><div id='row'><input name='user'></div></form>");
    let root = wrapper(&doc, "#root", false);
    let row = root.get("row");
    let user = row.as_wrapper().unwrap().get("user").node().unwrap();

    doc.set_property(user, "value", "ada".into()).unwrap();
    assert_eq!(doc.get_property(user, "value"), Reflected::Value("ada".into()));
    assert_eq!(root.names(), ["row"]);
}

// ============================================================================
// BATCH
// ============================================================================

#[test]
fn test_wrap_all_document_order() {
    let doc = SharedDocument::parse(
        r#"<div class="item" id="i1"><b id="b1"></b></div>
           <p><span class="item" id="i2"><i name="n"></i></span></p>
           <div class="item" id="i3"><b id="b3"></b></div>"#,
    );
    let all = wrap_all(&doc, ".item", false).unwrap();
    let nodes: Vec<_> = all.iter().map(Wrapped::node).collect();
    assert_eq!(nodes, [id(&doc, "i1"), id(&doc, "i2"), id(&doc, "i3")]);

    let names: Vec<_> = all
        .iter()
        .map(|w| w.as_wrapper().unwrap().names())
        .collect();
    assert_eq!(names, [vec!["b1"], vec!["n"], vec!["b3"]]);
}

#[test]
fn test_wrap_all_does_not_deduplicate() {
    let doc = SharedDocument::parse("<div class='item' id='i'><b id='b'></b></div>");
    let all = wrap_all(&doc, vec![".item", "#i"], false).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].node(), all[1].node());
    assert_ne!(all[0], all[1]);
}
