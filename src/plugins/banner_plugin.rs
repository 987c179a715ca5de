// Prepends a fixed comment to every bundled JavaScript module

use crate::core::models::BuildResult;
use crate::core::plugin::{Plugin, PluginContext};
use crate::utils::{Logger, Result};
use std::path::Path;

/// Puts a license or version header at the top of each JavaScript
/// module as it enters the bundle.
///
/// # Example
/// ```
/// use musubi::plugins::BannerPlugin;
/// use std::sync::Arc;
///
/// let plugin = Arc::new(BannerPlugin::new("/*! demo v2.1 */"));
/// ```
pub struct BannerPlugin {
    banner: String,
}

impl BannerPlugin {
    pub fn new(banner: impl Into<String>) -> Self {
        Self {
            banner: banner.into(),
        }
    }

    fn is_script(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("js") | Some("mjs") | Some("cjs")
        )
    }
}

impl Plugin for BannerPlugin {
    fn name(&self) -> &str {
        "banner-plugin"
    }

    fn on_build_start(&self, _context: &PluginContext) -> Result<()> {
        Logger::debug(&format!("Banner set to: {}", self.banner));
        Ok(())
    }

    fn on_build_end(&self, _context: &PluginContext, result: &BuildResult) -> Result<()> {
        Logger::info(&format!(
            "✨ Banner plugin: {} files emitted",
            result.output_files.len()
        ));
        Ok(())
    }

    fn transform(
        &self,
        code: &str,
        file_path: &Path,
        _context: &PluginContext,
    ) -> Result<Option<String>> {
        if !Self::is_script(file_path) {
            return Ok(None);
        }
        Ok(Some(format!("{}\n{}", self.banner, code)))
    }
}
