//! Error formatting for CLI diagnostics.
//!
//! Two different chains meet at the CLI boundary: a [`dana_compiler::Diagnostic`]
//! for a failure before the program ever ran, and a [`dana_rt::ErrorChain`]
//! for one that failed mid-execution, breadcrumbed by call frame. Both need
//! to come out on `stderr` looking like the same family of error. `ErrorChain`
//! here additionally collects plain host-side failures (bad CLI args, I/O)
//! that never touch the compiler or runtime at all.

use std::fmt;

/// A primary message plus an ordered chain of causes, for host-side errors
/// that are not a [`dana_rt::ErrorChain`] or [`dana_compiler::Diagnostic`]
/// (a missing file, an unreadable path, a bad `.na` extension).
#[derive(Debug, Clone)]
pub struct ErrorChain {
    pub primary: String,
    pub causes: Vec<String>,
}

impl ErrorChain {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            causes: Vec::new(),
        }
    }

    pub fn caused_by(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn add_cause(&mut self, cause: impl Into<String>) {
        self.causes.push(cause.into());
    }

    pub fn len(&self) -> usize {
        1 + self.causes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    pub fn format_for_display(&self) -> String {
        let mut out = format!("error: {}", self.primary);
        for cause in &self.causes {
            out.push_str(&format!("\n  caused by: {cause}"));
        }
        out
    }
}

impl fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorChain {}

impl From<std::io::Error> for ErrorChain {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Render a runtime [`dana_rt::ErrorChain`] for `stderr`: root error first,
/// dana type name, then one "called from" line per breadcrumb, deepest
/// frame last.
pub fn format_runtime_error(chain: &dana_rt::ErrorChain, color: bool) -> String {
    let heading = if color {
        format!("\x1b[1;31merror ({})\x1b[0m", chain.root_cause().dana_type_name())
    } else {
        format!("error ({})", chain.root_cause().dana_type_name())
    };
    let mut out = format!("{heading}: {}\n", chain.root_cause());
    for crumb in &chain.breadcrumbs {
        out.push_str(&format!("  called from `{}`\n", crumb.function_name));
    }
    out
}

/// Render a compile-time [`dana_compiler::Diagnostic`] for `stderr`.
pub fn format_compile_error(diagnostic: &dana_compiler::Diagnostic, color: bool) -> String {
    if color {
        diagnostic.render_ansi()
    } else {
        diagnostic.render_plain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_for_display_lists_causes_in_order() {
        let chain = ErrorChain::new("could not run 'missing.na'").caused_by("No such file or directory");
        assert_eq!(
            chain.format_for_display(),
            "error: could not run 'missing.na'\n  caused by: No such file or directory"
        );
    }

    #[test]
    fn runtime_error_rendering_names_every_frame() {
        let chain = dana_rt::ErrorChain::new(dana_rt::Error::name("unknown_fn", vec![]))
            .with_breadcrumb("inner", None)
            .with_breadcrumb("outer", None);
        let rendered = format_runtime_error(&chain, false);
        assert!(rendered.contains("NameError"));
        assert!(rendered.contains("called from `inner`"));
        assert!(rendered.contains("called from `outer`"));
    }
}
