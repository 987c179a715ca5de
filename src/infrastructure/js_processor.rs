use crate::core::{interfaces::JsProcessor, models::*};
use crate::utils::{
    ErrorContext, Logger, MusubiCache, MusubiError, Result, SourceMap, SourceMapBuilder, Timer,
};
use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use std::path::Path;

static SIDE_EFFECT_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^import\s+['"]([^'"]+)['"]"#).unwrap());

static DEFAULT_DECLARATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^export\s+default\s+(?:async\s+)?(?:function|class)\s+\w").unwrap());

pub struct OxcJsProcessor {
    cache: MusubiCache,
}

impl OxcJsProcessor {
    pub fn new() -> Self {
        Self {
            cache: MusubiCache::new(),
        }
    }

    /// Parse with oxc to reject syntactically invalid modules early.
    fn validate_syntax(&self, module: &ModuleInfo) -> Result<()> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(&module.path).unwrap_or_default();

        let parser = Parser::new(&allocator, &module.content, source_type);
        let result = parser.parse();

        if let Some(error) = result.errors.first() {
            let context = ErrorContext::new().with_file(module.path.clone());
            return Err(MusubiError::parse_with_context(
                format!("{}", error),
                context,
            ));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl JsProcessor for OxcJsProcessor {
    async fn extract_imports(&self, module: &ModuleInfo) -> Result<Vec<String>> {
        match module.module_type {
            ModuleType::JavaScript => {
                self.validate_syntax(module)?;
                Ok(extract_import_specifiers(&module.content))
            }
            // Binary modules import nothing
            _ => Ok(Vec::new()),
        }
    }

    async fn transform_module(&self, module: &ModuleInfo) -> Result<String> {
        let _timer = Timer::start(&format!(
            "Transforming {}",
            module
                .path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
        ));

        match module.module_type {
            ModuleType::JavaScript => {
                let path_str = module.path.to_string_lossy();
                if let Some(cached) = self.cache.get_transform(&path_str, &module.content) {
                    return Ok(cached);
                }

                Logger::processing_file(&path_str, "transform");
                let transformed = transform_source(&module.content);
                self.cache
                    .cache_transform(&path_str, &module.content, transformed.clone());
                Ok(transformed)
            }
            // A .wasm import becomes a lazy loader; the binary itself is
            // emitted next to the bundle.
            ModuleType::Wasm => Ok(transform_source(&generate_wasm_loader(&module.path))),
            ModuleType::Other => Err(MusubiError::build(format!(
                "Unsupported module type for {}",
                module.path.display()
            ))),
        }
    }

    fn supports_module_type(&self, module_type: ModuleType) -> bool {
        matches!(module_type, ModuleType::JavaScript | ModuleType::Wasm)
    }
}

impl Default for OxcJsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Static import specifiers in source order, both bound
/// (`import x from 's'`) and side-effect (`import 's'`) forms.
fn extract_import_specifiers(content: &str) -> Vec<String> {
    let mut specifiers = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with("import ") && !trimmed.starts_with("import{") {
            continue;
        }

        if let Some(from_index) = trimmed.rfind(" from ") {
            let raw = trimmed[from_index + 6..].trim();
            let specifier = raw.trim_matches(|c| c == '"' || c == '\'' || c == ';');
            if !specifier.is_empty() {
                specifiers.push(specifier.to_string());
            }
        } else if let Some(captures) = SIDE_EFFECT_IMPORT_RE.captures(trimmed) {
            specifiers.push(captures[1].to_string());
        }
    }

    specifiers
}

/// Rewrite a module for inclusion in the flat bundle scope. Imports become
/// comments, export keywords are stripped from declarations and other export
/// forms are commented out. Every input line maps to exactly one output line
/// so bundles stay mappable line for line.
fn transform_source(content: &str) -> String {
    let mut processed_lines = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("import ") || trimmed.starts_with("import{") {
            processed_lines.push(format!("// {}", line));
        } else if trimmed.starts_with("export default") {
            if DEFAULT_DECLARATION_RE.is_match(trimmed) {
                // Named declaration stays valid without the prefix
                processed_lines.push(line.replacen("export default ", "", 1));
            } else {
                processed_lines.push(format!("// {}", line));
            }
        } else if trimmed.starts_with("export ") {
            let declaration = &trimmed["export ".len()..];
            if declaration.starts_with("const ")
                || declaration.starts_with("let ")
                || declaration.starts_with("var ")
                || declaration.starts_with("function ")
                || declaration.starts_with("async function ")
                || declaration.starts_with("class ")
            {
                processed_lines.push(line.replacen("export ", "", 1));
            } else {
                processed_lines.push(format!("// {}", line));
            }
        } else {
            processed_lines.push(line.to_string());
        }
    }

    processed_lines.join("\n")
}

/// Module name for the JS export, derived from the file stem.
fn wasm_module_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.replace('-', "_").replace('.', "_"))
        .unwrap_or_else(|| "wasmModule".to_string())
}

/// JavaScript that fetches and instantiates a WebAssembly binary on first
/// use and exposes its exports behind a lazy handle.
fn generate_wasm_loader(wasm_path: &Path) -> String {
    let file = wasm_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("module.wasm");
    let name = wasm_module_name(wasm_path);

    format!(
        r#"// WebAssembly Module: {file}
let _wasmInstance_{name} = null;
let _wasmExports_{name} = null;

async function _loadWasm_{name}() {{
  if (_wasmInstance_{name}) return _wasmExports_{name};

  try {{
    const response = await fetch('./{file}');
    const bytes = await response.arrayBuffer();
    const {{ instance }} = await WebAssembly.instantiate(bytes, {{}});

    _wasmInstance_{name} = instance;
    _wasmExports_{name} = instance.exports;

    return _wasmExports_{name};
  }} catch (error) {{
    console.error('Failed to load WASM module {file}:', error);
    throw error;
  }}
}}

export const {name} = {{
  load: _loadWasm_{name},
  get exports() {{
    if (!_wasmExports_{name}) {{
      throw new Error('WASM module {file} not loaded yet. Call await {name}.load() first.');
    }}
    return _wasmExports_{name};
  }}
}};
"#
    )
}

/// One module ready for bundle assembly.
#[derive(Debug, Clone)]
pub struct TransformedModule {
    /// Name recorded in the source map `sources` array, root-relative.
    pub source_name: String,
    /// On-disk content for `sourcesContent`; None for generated modules
    /// such as native loaders.
    pub original: Option<String>,
    pub transformed: String,
}

#[derive(Debug, Clone)]
pub struct EmittedBundle {
    pub code: String,
    pub source_map: Option<SourceMap>,
}

/// Assembles transformed modules into one IIFE bundle, tracking generated
/// line numbers so the source map stays line-accurate.
pub struct BundleEmitter {
    file_name: String,
    source_maps: SourceMapKind,
}

impl BundleEmitter {
    pub fn new(file_name: &str, source_maps: SourceMapKind) -> Self {
        Self {
            file_name: file_name.to_string(),
            source_maps,
        }
    }

    pub fn emit(&self, modules: &[TransformedModule]) -> EmittedBundle {
        let mut code = String::new();
        let mut builder = if self.source_maps.is_enabled() {
            Some(SourceMapBuilder::new(Some(&self.file_name)))
        } else {
            None
        };

        code.push_str("// Musubi - Build Output\n");
        code.push_str("(function() {\n'use strict';\n\n");
        // Generated lines are zero-based; the preamble occupies 0..=3
        let mut line: u32 = 4;

        for module in modules {
            code.push_str(&format!("// Module: {}\n", module.source_name));
            line += 1;

            let source_index = match (&mut builder, &module.original) {
                (Some(b), Some(original)) => Some(b.add_source(&module.source_name, original)),
                _ => None,
            };

            for (original_line, text) in module.transformed.lines().enumerate() {
                code.push_str(text);
                code.push('\n');
                if let (Some(b), Some(index)) = (&mut builder, source_index) {
                    b.add_line_mapping(line, index, original_line as u32);
                }
                line += 1;
            }

            code.push('\n');
            line += 1;
        }

        code.push_str("})();\n");

        EmittedBundle {
            code,
            source_map: builder.map(|b| b.build()),
        }
    }
}
