//! Example: wrap a sign-up form and drive it through its named children
//!
//! Run with `RUST_LOG=dom2object=debug` to see table rebuilds and
//! collision warnings.

use anyhow::{Context, Result};
use dom2object::html::{Reflected, inner_html};
use dom2object::{Host, NodeId, SharedDocument, Value, wrap, wrap_all};
use tracing_subscriber::EnvFilter;

const PAGE: &str = r#"
<form id="signup">
    <fieldset id="account">
        <input name="user" value="">
        <input name="email" type="email">
    </fieldset>
    <div class="row">
        <select name="plan">
            <option value="free">Free</option>
            <option value="pro">Pro</option>
        </select>
        <input type="checkbox" id="terms">
    </div>
    <button id="submit">Sign up</button>
</form>
<ul id="log"></ul>
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("dom2object v{}", dom2object::VERSION);

    let doc = SharedDocument::parse(PAGE);
    let form = wrap(&doc, "#signup", true)?
        .into_wrapper()
        .context("form has no children")?;
    println!("form names: {:?}", form.names());

    let account = form.get("account");
    let account = account.as_wrapper().context("account is a fieldset")?;
    let user = account.get("user").node().context("user input")?;
    doc.set_property(user, "value", "ada".into())?;

    let plan = form.get("plan").node().context("hoisted plan select")?;
    doc.set_property(plan, "value", "pro".into())?;

    let terms = form.get("terms").node().context("hoisted terms checkbox")?;
    doc.set_property(terms, "checked", true.into())?;

    for name in ["user", "email"] {
        let node = account.get(name).node().context("account field")?;
        println!("{name} = {}", value(&doc, node));
    }
    println!("plan = {}", value(&doc, plan));

    // Writing innerHTML rebuilds the table
    let log = wrap(&doc, "#log", false)?;
    println!("log wrapped: {}", log.as_wrapper().is_some());
    let summary = r#"<li id="first">submitted</li><li id="second">pending</li>"#;
    let list = doc.get_element_by_id("log").context("log list")?;
    doc.set_property(list, "innerHTML", summary.into())?;
    let log = wrap(&doc, list, false)?.into_wrapper().context("log has entries")?;
    println!("log names: {:?}", log.names());

    log.set("innerHTML", r#"<li id="done">done</li>"#)?;
    println!("log names after write: {:?}", log.names());
    println!("log html: {}", inner_html(doc.borrow().tree(), list));

    let inputs = wrap_all(&doc, "input", false)?;
    println!("{} inputs", inputs.len());

    let closest = form
        .get("closest")
        .method()
        .context("closest is a method")?
        .call(&[Value::from("body")])?;
    println!("form sits in body: {}", closest.as_node().is_some());

    Ok(())
}

fn value(doc: &SharedDocument, node: NodeId) -> String {
    match doc.get_property(node, "value") {
        Reflected::Value(value) => value.to_display_string(),
        Reflected::Method(method) => format!("<{}>", method.name()),
    }
}
