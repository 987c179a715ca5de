use crate::core::models::*;
use crate::utils::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Async file access used by every pipeline stage
#[async_trait]
pub trait FileSystemService: Send + Sync {
    async fn read_file(&self, path: &Path) -> Result<String>;
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;
    async fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<()>;
    /// Copy one file, creating parent directories; returns bytes copied.
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64>;
    async fn create_directory(&self, path: &Path) -> Result<()>;
    /// All files under `path`, depth-first, sorted for stable ordering.
    async fn list_files_recursive(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn file_exists(&self, path: &Path) -> bool;
}

/// Parsing and rewriting of JavaScript modules
#[async_trait]
pub trait JsProcessor: Send + Sync {
    /// Validate syntax and return static import specifiers in source order.
    async fn extract_imports(&self, module: &ModuleInfo) -> Result<Vec<String>>;
    /// Rewrite one module for inclusion in a flat bundle.
    async fn transform_module(&self, module: &ModuleInfo) -> Result<String>;
    fn supports_module_type(&self, module_type: ModuleType) -> bool;
}

/// Invocation of the external wasm-pack toolchain
#[async_trait]
pub trait WasmBuilder: Send + Sync {
    async fn build(&self, options: &WasmOptions) -> Result<WasmBuildOutput>;
}

/// Whole-pipeline entry point
#[async_trait]
pub trait BuildService: Send + Sync {
    async fn build(&mut self, options: &BuildOptions) -> Result<BuildResult>;
}
