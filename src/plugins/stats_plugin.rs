// Logs a per-build summary through the standard logger

use crate::core::models::{BuildResult, ModuleInfo, ModuleType};
use crate::core::plugin::{Plugin, PluginContext};
use crate::utils::{Logger, Result};

/// Reports what a build did: settings up front, totals at the end, and
/// with `verbose` a line per output file and per resolved graph.
///
/// # Example
/// ```
/// use musubi::plugins::StatsPlugin;
/// use std::sync::Arc;
///
/// let plugin = Arc::new(StatsPlugin::new(false));
/// ```
pub struct StatsPlugin {
    verbose: bool,
}

impl StatsPlugin {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Plugin for StatsPlugin {
    fn name(&self) -> &str {
        "stats-plugin"
    }

    fn on_build_start(&self, context: &PluginContext) -> Result<()> {
        if self.verbose {
            Logger::info("📊 [stats] Build starting");
            Logger::info(&format!("  project: {}", context.root.display()));
            Logger::info(&format!("  outdir: {}", context.options.outdir.display()));
            Logger::info(&format!("  mode: {}", context.options.mode));
            Logger::info(&format!("  entries: {}", context.options.entries.len()));
            Logger::info(&format!("  minify: {}", context.options.minify));
        }
        Ok(())
    }

    fn on_build_end(&self, _context: &PluginContext, result: &BuildResult) -> Result<()> {
        Logger::info("📊 [stats] Build finished");
        Logger::info(&format!("  ⚡ time: {:?}", result.build_time));
        Logger::info(&format!("  📦 modules: {}", result.modules_processed));
        Logger::info(&format!("  🧩 bundles: {}", result.bundle_count()));
        Logger::info(&format!(
            "  📂 assets: {} copied, {} unchanged",
            result.assets_copied, result.assets_skipped
        ));
        if !result.budget_violations.is_empty() {
            Logger::info(&format!(
                "  ⚠️ over budget: {}",
                result.budget_violations.len()
            ));
        }

        if self.verbose {
            Logger::info("  📄 outputs:");
            for file in &result.output_files {
                Logger::info(&format!(
                    "    - {} ({} bytes)",
                    file.path.file_name().unwrap_or_default().to_string_lossy(),
                    file.size
                ));
            }
        }

        Ok(())
    }

    fn on_modules_resolved(&self, modules: &[ModuleInfo], _context: &PluginContext) -> Result<()> {
        if self.verbose {
            let js = modules
                .iter()
                .filter(|m| m.module_type == ModuleType::JavaScript)
                .count();
            let wasm = modules
                .iter()
                .filter(|m| m.module_type == ModuleType::Wasm)
                .count();
            Logger::debug(&format!(
                "📊 [stats] graph holds {} modules ({} js, {} wasm)",
                modules.len(),
                js,
                wasm
            ));
        }
        Ok(())
    }
}
