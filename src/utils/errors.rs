use std::path::PathBuf;
use thiserror::Error;

/// Where in a source file an error was detected. Attached to parse and
/// build errors so the CLI can point at the offending line.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub code_snippet: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_snippet(mut self, snippet: String) -> Self {
        self.code_snippet = Some(snippet);
        self
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(path) = &self.file_path {
            out.push_str(&format!("\n📁 File: {}", path.display()));
        }
        if let (Some(line), Some(column)) = (self.line, self.column) {
            out.push_str(&format!("\n📍 Location: line {}, column {}", line, column));
        }
        if let Some(snippet) = &self.code_snippet {
            out.push_str("\n📝 Code:\n");
            out.push_str(&render_snippet(snippet, self.line));
        }
        out
    }
}

fn render_snippet(snippet: &str, error_line: Option<usize>) -> String {
    let mut out = String::new();
    for (index, line) in snippet.lines().enumerate() {
        let number = index + 1;
        if error_line == Some(number) {
            out.push_str(&format!("→ {:3} │ {}\n", number, line));
            let width = line.trim_end().len().clamp(1, 60);
            out.push_str(&format!("      │ {}\n", "^".repeat(width)));
        } else {
            out.push_str(&format!("  {:3} │ {}\n", number, line));
        }
    }
    out
}

#[derive(Error, Debug)]
pub enum MusubiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        context: Option<ErrorContext>,
    },

    #[error("Build error: {message}")]
    Build {
        message: String,
        context: Option<ErrorContext>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot resolve '{specifier}' imported from {}", importer.display())]
    Resolve {
        specifier: String,
        importer: PathBuf,
    },

    #[error("wasm-pack failed: {0}")]
    WasmBuild(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, MusubiError>;

impl MusubiError {
    pub fn parse(message: String) -> Self {
        Self::Parse {
            message,
            context: None,
        }
    }

    pub fn parse_with_context(message: String, context: ErrorContext) -> Self {
        Self::Parse {
            message,
            context: Some(context),
        }
    }

    pub fn build(message: String) -> Self {
        Self::Build {
            message,
            context: None,
        }
    }

    pub fn config(message: String) -> Self {
        Self::Config(message)
    }

    pub fn resolve(specifier: String, importer: PathBuf) -> Self {
        Self::Resolve {
            specifier,
            importer,
        }
    }

    pub fn wasm(message: String) -> Self {
        Self::WasmBuild(message)
    }

    /// Multi-line rendering for the CLI. Parse and build errors carry an
    /// optional [`ErrorContext`]; everything else prints its one-liner.
    pub fn format_detailed(&self) -> String {
        let context = match self {
            MusubiError::Parse { context, .. } | MusubiError::Build { context, .. } => {
                context.as_ref()
            }
            _ => None,
        };

        let mut out = format!("❌ {}", self);
        if let Some(ctx) = context {
            out.push_str(&ctx.render());
        }
        out
    }
}

impl From<regex::Error> for MusubiError {
    fn from(err: regex::Error) -> Self {
        MusubiError::parse(format!("Regex error: {}", err))
    }
}

impl From<anyhow::Error> for MusubiError {
    fn from(err: anyhow::Error) -> Self {
        MusubiError::build(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detailed_includes_location() {
        let err = MusubiError::parse_with_context(
            "Unexpected token".to_string(),
            ErrorContext::new()
                .with_file(PathBuf::from("src/index.js"))
                .with_location(2, 7)
                .with_snippet("const a = 1;\nconst = 2;".to_string()),
        );

        let detailed = err.format_detailed();
        assert!(detailed.contains("Parse error: Unexpected token"));
        assert!(detailed.contains("src/index.js"));
        assert!(detailed.contains("line 2, column 7"));
        assert!(detailed.contains("→   2 │ const = 2;"));
    }

    #[test]
    fn test_format_detailed_without_context() {
        let err = MusubiError::config("missing entry".to_string());
        assert_eq!(
            err.format_detailed(),
            "❌ Configuration error: missing entry"
        );
    }

    #[test]
    fn test_resolve_error_names_both_sides() {
        let err = MusubiError::resolve(
            "./missing.js".to_string(),
            PathBuf::from("/app/src/index.js"),
        );
        let message = err.to_string();
        assert!(message.contains("./missing.js"));
        assert!(message.contains("/app/src/index.js"));
    }
}
