//! Rich error diagnostics with source snippets and suggestions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A rendered diagnostic with source context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub col: Option<usize>,
    pub source_line: Option<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: Some(code.to_string()),
            message: message.into(),
            file: None,
            line: None,
            col: None,
            source_line: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_col(mut self, col: usize) -> Self {
        self.col = Some(col);
        self
    }

    pub fn with_source_line(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Render with ANSI colors, Elm-style: category, location, snippet,
    /// underline, suggestions.
    pub fn render_ansi(&self) -> String {
        self.render(true)
    }

    pub fn render_plain(&self) -> String {
        self.render(false)
    }

    fn render(&self, color: bool) -> String {
        let category = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        };
        let mut out = String::new();
        let title = match &self.code {
            Some(code) => format!("{category} [{code}]"),
            None => category.to_string(),
        };
        if color {
            out.push_str(&format!("\x1b[1;31m{title}\x1b[0m: {}\n", self.message));
        } else {
            out.push_str(&format!("{title}: {}\n", self.message));
        }

        if let (Some(line), Some(col)) = (self.line, self.col) {
            let loc = match &self.file {
                Some(f) => format!("  --> {f}:{line}:{col}"),
                None => format!("  --> line {line}, column {col}"),
            };
            out.push_str(&loc);
            out.push('\n');
        } else if let Some(line) = self.line {
            out.push_str(&format!("  --> line {line}\n"));
        }

        if let Some(src) = &self.source_line {
            out.push_str(&format!("    | {src}\n"));
            if let Some(col) = self.col {
                let pad = " ".repeat(col.saturating_sub(1));
                out.push_str(&format!("    | {pad}^\n"));
            }
        }

        for suggestion in &self.suggestions {
            out.push_str(&format!("  suggestion: {suggestion}\n"));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_location_and_suggestion() {
        let d = Diagnostic::error("E0200", "unexpected token ':'")
            .with_line(3)
            .with_col(5)
            .with_source_line("if x :")
            .with_suggestion("remove the stray ':'");
        let rendered = d.render_plain();
        assert!(rendered.contains("line 3, column 5") || rendered.contains(":3:5"));
        assert!(rendered.contains("stray"));
    }
}
