// Build pipeline extension points

use crate::core::models::{BuildOptions, BuildResult, ModuleInfo};
use crate::utils::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only view of the running build that every hook receives.
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Project root the build was invoked with
    pub root: PathBuf,
    /// Resolved options for this build
    pub options: BuildOptions,
}

impl PluginContext {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            root: options.root.clone(),
            options,
        }
    }
}

/// Hooks into the build pipeline.
///
/// A plugin can observe the build lifecycle, rewrite module source before
/// it is bundled, take over import resolution, or inspect an entry's
/// module graph. Every hook has a no-op default, so implementors only
/// override what they need.
pub trait Plugin: Send + Sync {
    /// Identifier used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Runs once before any pipeline stage.
    fn on_build_start(&self, _context: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Runs once after a build finished, with the final result.
    fn on_build_end(&self, _context: &PluginContext, _result: &BuildResult) -> Result<()> {
        Ok(())
    }

    /// Rewrite module source before bundling. Return `None` to pass the
    /// code through untouched.
    fn transform(
        &self,
        _code: &str,
        _file_path: &Path,
        _context: &PluginContext,
    ) -> Result<Option<String>> {
        Ok(None)
    }

    /// Map an import specifier to a file, bypassing the built-in
    /// resolver. Return `None` to fall back to default resolution.
    fn resolve(
        &self,
        _import: &str,
        _importer: &Path,
        _context: &PluginContext,
    ) -> Result<Option<PathBuf>> {
        Ok(None)
    }

    /// Runs after an entry's import graph is fully walked, before any of
    /// its modules are bundled.
    fn on_modules_resolved(&self, _modules: &[ModuleInfo], _context: &PluginContext) -> Result<()> {
        Ok(())
    }
}

/// Holds registered plugins and drives their hooks in registration order.
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn on_build_start(&self, context: &PluginContext) -> Result<()> {
        self.plugins
            .iter()
            .try_for_each(|plugin| plugin.on_build_start(context))
    }

    pub fn on_build_end(&self, context: &PluginContext, result: &BuildResult) -> Result<()> {
        self.plugins
            .iter()
            .try_for_each(|plugin| plugin.on_build_end(context, result))
    }

    /// Chains every plugin's transform over the code. Later plugins see
    /// the output of earlier ones.
    pub fn transform(
        &self,
        code: String,
        file_path: &Path,
        context: &PluginContext,
    ) -> Result<String> {
        self.plugins.iter().try_fold(code, |code, plugin| {
            Ok(plugin
                .transform(&code, file_path, context)?
                .unwrap_or(code))
        })
    }

    /// First plugin to return a path wins; later plugins are not asked.
    pub fn resolve(
        &self,
        import: &str,
        importer: &Path,
        context: &PluginContext,
    ) -> Result<Option<PathBuf>> {
        for plugin in &self.plugins {
            match plugin.resolve(import, importer, context)? {
                Some(path) => return Ok(Some(path)),
                None => continue,
            }
        }
        Ok(None)
    }

    pub fn on_modules_resolved(
        &self,
        modules: &[ModuleInfo],
        context: &PluginContext,
    ) -> Result<()> {
        self.plugins
            .iter()
            .try_for_each(|plugin| plugin.on_modules_resolved(modules, context))
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
