//! Wrapper errors

use d2o_dom::DomError;

/// Errors surfaced by `wrap`, `wrap_all` and wrapper writes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WrapError {
    /// A selector target resolved to nothing
    #[error("selector '{0}' did not match any element")]
    NoMatch(String),

    /// The host rejected a query, property write or method call
    #[error(transparent)]
    Dom(#[from] DomError),
}
