//! DOM2Object
//!
//! Turns an element into an accessor whose properties are its named
//! children. A child with an `id` or `name` attribute becomes a property of
//! its parent's [`Wrapper`]; children that have children of their own are
//! wrapped in turn, and everything else reads and writes through to the
//! element.
//!
//! ```
//! use dom2object::{wrap, SharedDocument};
//!
//! let doc = SharedDocument::parse(
//!     r#"<form id="signup"><input name="user" value="ada"><button id="go">Go</button></form>"#,
//! );
//! let form = wrap(&doc, "#signup", false).unwrap().into_wrapper().unwrap();
//!
//! let user = form.get("user").node().unwrap();
//! assert_eq!(doc.borrow().tree().element(user).unwrap().tag, "input");
//! assert_eq!(form.names(), ["user", "go"]);
//! ```

mod batch;
mod error;
mod host;
mod options;
mod wrapper;

pub use batch::{Target, Targets, wrap_all, wrap_all_with};
pub use error::WrapError;
pub use host::{Host, SharedDocument};
pub use options::WrapOptions;
pub use wrapper::{Binding, BoundMethod, Collision, Property, Wrapped, Wrapper, wrap, wrap_with};

pub use d2o_dom as dom;
pub use d2o_dom::{NodeId, Value};
pub use d2o_html as html;
pub use d2o_html::reflect::NativeMethod;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
