//! The runtime `Error` hierarchy (§7) and its call-site breadcrumb chain.
//!
//! Every function-call boundary that re-raises an error through
//! [`Error::with_breadcrumb`] gets one [`Breadcrumb`] appended, so a failure
//! three calls deep renders as `unknown_fn not found — called from inner —
//! called from outer`: a general-purpose context-wrapper adapted into a
//! typed error enum's own cause chain.

use dana_core::Span;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Breadcrumb {
    pub function_name: String,
    pub span: Option<Span>,
}

#[derive(Debug, Error, Clone)]
pub enum Error {
    #[error("name '{name}' is not defined")]
    Name { name: String, neighbours: Vec<String> },

    #[error("type error: {message}")]
    Type { message: String },

    #[error("value error: {message}")]
    Value { message: String },

    #[error("index {index} out of range (length {length})")]
    Index { index: String, length: usize },

    #[error("key {key} not found (have: {sample})")]
    Key { key: String, sample: String },

    #[error("'{type_name}' has no attribute '{attr}' (available: {available})")]
    Attribute {
        type_name: String,
        attr: String,
        available: String,
    },

    #[error("import error: {message}")]
    Import { message: String },

    #[error("module '{path}' not found (searched: {searched})")]
    ModuleNotFound { path: String, searched: String },

    #[error("circular import: {cycle}")]
    CircularImport { cycle: String },

    #[error("{message}")]
    Runtime { message: String },

    #[error("assertion failed{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    Assertion { message: Option<String> },

    #[error("struct '{name}' is missing required fields: {fields}")]
    StructMissingFields { name: String, fields: String },

    #[error("struct '{name}' was given unknown fields: {fields}")]
    StructUnknownFields { name: String, fields: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    pub fn name(name: impl Into<String>, neighbours: Vec<String>) -> Self {
        Error::Name {
            name: name.into(),
            neighbours,
        }
    }

    pub fn type_err(message: impl Into<String>) -> Self {
        Error::Type {
            message: message.into(),
        }
    }

    pub fn value(message: impl Into<String>) -> Self {
        Error::Value {
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime {
            message: message.into(),
        }
    }

    /// The name an `except NAME:` clause matches against (§4.I).
    pub fn dana_type_name(&self) -> &'static str {
        match self {
            Error::Name { .. } => "NameError",
            Error::Type { .. } => "TypeError",
            Error::Value { .. } => "ValueError",
            Error::Index { .. } => "IndexError",
            Error::Key { .. } => "KeyError",
            Error::Attribute { .. } => "AttributeError",
            Error::Import { .. } | Error::ModuleNotFound { .. } | Error::CircularImport { .. } => "ImportError",
            Error::Runtime { .. } => "RuntimeError",
            Error::Assertion { .. } => "AssertionError",
            Error::StructMissingFields { .. } | Error::StructUnknownFields { .. } => "ValueError",
            Error::Parse(_) => "SyntaxError",
        }
    }
}

/// An `Error` plus the call-site breadcrumbs accumulated as it propagated up
/// through nested function calls. The breadcrumb list is outermost-last: the
/// deepest call (closest to the root cause) is pushed first.
#[derive(Debug, Clone)]
pub struct ErrorChain {
    pub error: Error,
    pub breadcrumbs: Vec<Breadcrumb>,
}

impl ErrorChain {
    pub fn new(error: Error) -> Self {
        Self {
            error,
            breadcrumbs: Vec::new(),
        }
    }

    pub fn with_breadcrumb(mut self, function_name: impl Into<String>, span: Option<Span>) -> Self {
        self.breadcrumbs.push(Breadcrumb {
            function_name: function_name.into(),
            span,
        });
        self
    }

    /// `"unknown_fn not found — called from inner — called from outer"`.
    pub fn display_chain(&self) -> String {
        let mut parts = vec![self.error.to_string()];
        parts.extend(
            self.breadcrumbs
                .iter()
                .map(|b| format!("called from {}", b.function_name)),
        );
        parts.join(" — ")
    }

    pub fn root_cause(&self) -> &Error {
        &self.error
    }
}

impl std::fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_chain())
    }
}

impl std::error::Error for ErrorChain {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<Error> for ErrorChain {
    fn from(error: Error) -> Self {
        ErrorChain::new(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_with_no_breadcrumbs_is_just_the_message() {
        let chain = ErrorChain::new(Error::name("unknown_fn", vec![]));
        assert_eq!(chain.display_chain(), "name 'unknown_fn' is not defined");
    }

    #[test]
    fn breadcrumbs_append_in_call_order() {
        let chain = ErrorChain::new(Error::name("unknown_fn", vec![]))
            .with_breadcrumb("inner", None)
            .with_breadcrumb("outer", None);
        assert_eq!(
            chain.display_chain(),
            "name 'unknown_fn' is not defined — called from inner — called from outer"
        );
    }

    #[test]
    fn root_cause_is_preserved_through_breadcrumbs() {
        let chain = ErrorChain::new(Error::runtime("boom")).with_breadcrumb("f", None);
        assert!(matches!(chain.root_cause(), Error::Runtime { .. }));
    }
}
