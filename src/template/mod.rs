//! Template selection and loading
//!
//! A template is either one of the bundled built-ins, fetched asynchronously
//! from a [`TemplateCatalog`], or custom text supplied by the user. The
//! [`TemplateResolver`] owns the observable [`TemplateLoadState`] and makes
//! sure only the most recent selection can ever write to it.
//!
//! # Example
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::sync::Arc;
//! use mailsmith::template::{BuiltinCatalog, TemplateLoadState, TemplateResolver, TemplateSelection};
//!
//! let resolver = TemplateResolver::new(Arc::new(BuiltinCatalog::new()));
//! resolver.select(TemplateSelection::builtin("template1")).run().await;
//! assert!(matches!(resolver.state(), TemplateLoadState::Ready(_)));
//! # }
//! ```

mod catalog;
mod resolver;

use std::fmt;
use std::str::FromStr;

pub use catalog::{
    read_file_as_text, BuiltinCatalog, DirectoryCatalog, TemplateCatalog, TemplateError,
    TemplateInfo,
};
pub use resolver::{Load, TemplateResolver, ABANDONED};

/// Selection value that switches to user-supplied text
pub const CUSTOM_SELECTION: &str = "custom";

/// What the user picked in the template chooser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSelection {
    /// A catalog template, by id
    BuiltIn(String),
    /// User-supplied text, not yet provided
    Custom,
}

impl TemplateSelection {
    pub fn builtin(id: impl Into<String>) -> Self {
        Self::BuiltIn(id.into())
    }
}

impl FromStr for TemplateSelection {
    type Err = std::convert::Infallible;

    /// `"custom"` selects custom text; anything else is a built-in id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == CUSTOM_SELECTION {
            Self::Custom
        } else {
            Self::BuiltIn(s.to_string())
        })
    }
}

impl fmt::Display for TemplateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuiltIn(id) => f.write_str(id),
            Self::Custom => f.write_str(CUSTOM_SELECTION),
        }
    }
}

/// The template that is currently in effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    BuiltIn(String),
    Custom(String),
}

/// Monotonically increasing id of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(pub(crate) u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observable progress of the current template load
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TemplateLoadState {
    /// No template text available
    #[default]
    Idle,
    /// A catalog fetch is in flight
    Loading(RequestToken),
    /// Raw template text, ready for substitution
    Ready(String),
    /// The most recent load failed
    Failed(String),
}

impl TemplateLoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Ready(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_parsing() {
        assert_eq!("custom".parse::<TemplateSelection>().unwrap(), TemplateSelection::Custom);
        assert_eq!(
            "template2".parse::<TemplateSelection>().unwrap(),
            TemplateSelection::builtin("template2")
        );
        assert_eq!(TemplateSelection::Custom.to_string(), "custom");
    }

    #[test]
    fn test_tokens_increase() {
        let first = RequestToken::default().next();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.value(), 2);
    }
}
