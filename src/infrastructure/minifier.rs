use crate::utils::{MusubiError, Result};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::fmt;

/// Whole-bundle minification. Compresses and mangles the finished IIFE
/// with oxc, off the async runtime because the work is CPU-bound.
pub struct MinificationService;

impl MinificationService {
    pub fn new() -> Self {
        Self
    }

    pub async fn minify_bundle(&self, bundle: String, file_name: &str) -> Result<String> {
        let file_name = file_name.to_string();
        tokio::task::spawn_blocking(move || minify(&bundle, &file_name))
            .await
            .map_err(|e| MusubiError::build(format!("Minification task failed: {}", e)))?
    }
}

impl Default for MinificationService {
    fn default() -> Self {
        Self::new()
    }
}

fn minify(source: &str, file_name: &str) -> Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(file_name).unwrap_or_else(|_| SourceType::default());

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        // The input is a bundle this tool emitted, so a parse failure
        // here points at the bundler, not at user code.
        let details: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
        return Err(MusubiError::build(format!(
            "minifier rejected the generated bundle:\n{}",
            details.join("\n")
        )));
    }

    let mut program = parsed.program;
    Minifier::new(MinifierOptions {
        mangle: true,
        compress: CompressOptions::default(),
    })
    .build(&allocator, &mut program);

    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            ..Default::default()
        })
        .build(&program)
        .code;

    Ok(code)
}

/// Before/after sizes for one minified bundle.
#[derive(Debug, Clone, Copy)]
pub struct MinificationStats {
    pub original_size: usize,
    pub minified_size: usize,
}

impl MinificationStats {
    pub fn compare(original: &str, minified: &str) -> Self {
        Self {
            original_size: original.len(),
            minified_size: minified.len(),
        }
    }

    pub fn saved_bytes(&self) -> usize {
        self.original_size.saturating_sub(self.minified_size)
    }

    pub fn reduction_percentage(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (self.saved_bytes() as f64 / self.original_size as f64) * 100.0
    }
}

impl fmt::Display for MinificationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Minified {} → {} bytes ({:.1}% smaller)",
            self.original_size,
            self.minified_size,
            self.reduction_percentage()
        )
    }
}
