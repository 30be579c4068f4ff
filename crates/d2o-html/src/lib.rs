//! d2o HTML
//!
//! HTML5 parsing built on html5ever, innerHTML/outerHTML serialization and
//! script-style property reflection over the d2o arena tree.

mod parser;
pub mod reflect;
mod serializer;

pub use d2o_dom::Document;
pub use parser::HtmlParser;
pub use reflect::{NativeMethod, Reflected};
pub use serializer::{HtmlSerializer, inner_html, outer_html};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}
