//! Wrap configuration

/// Options applied to a wrap and, recursively, to every wrapper under it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WrapOptions {
    /// Hoist named descendants of anonymous children into the parent
    pub flatten_anonymous: bool,
}

impl WrapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable anonymous-child flattening
    pub fn flatten_anonymous(mut self, flatten: bool) -> Self {
        self.flatten_anonymous = flatten;
        self
    }
}

impl From<bool> for WrapOptions {
    fn from(flatten_anonymous: bool) -> Self {
        Self { flatten_anonymous }
    }
}
