use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Emoji-tagged logging facade over `tracing`. Keeps call sites short
/// and the output style in one place.
pub struct Logger;

impl Logger {
    /// Installs the global subscriber. `RUST_LOG` overrides the default
    /// `musubi=info` filter.
    pub fn init() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("musubi=info")),
            )
            .with_target(false)
            .init();
    }

    pub fn build_start(root: &str, outdir: &str) {
        info!("🔨 Musubi build");
        info!("═══════════════════════════════════");
        info!("📁 Project: {}", root);
        info!("📦 Emitting to: {}", outdir);
    }

    pub fn wasm_build_start(crate_dir: &str) {
        info!("🦀 Building native module: {}", crate_dir);
    }

    pub fn wasm_build_complete(artifacts: usize, duration: std::time::Duration) {
        info!(
            "🦀 Native module ready ({} artifacts, {:.2?})",
            artifacts, duration
        );
    }

    pub fn copying_assets(from: &str, to: &str) {
        info!("📂 Copying static assets: {} → {}", from, to);
    }

    pub fn assets_copied(copied: usize, skipped: usize) {
        info!("📂 Assets: {} copied, {} unchanged", copied, skipped);
    }

    pub fn bundling_entry(name: &str, module_count: usize) {
        info!("📦 Bundling entry '{}' ({} modules)", name, module_count);
    }

    pub fn processing_file(name: &str, mode: &str) {
        debug!("⚡ Transforming: {} ({})", name, mode);
    }

    pub fn serving(addr: &str, dir: &str) {
        info!("🌐 Serving {} at http://{}", dir, addr);
    }

    pub fn build_complete(
        entry_count: usize,
        asset_count: usize,
        build_time: std::time::Duration,
        outdir: &str,
    ) {
        info!("");
        info!("📊 Build summary:");
        info!("  • Entries bundled: {}", entry_count);
        info!("  • Assets emitted: {}", asset_count);
        info!("  • Time: {:.2?}", build_time);
        info!("  • Output: {}", outdir);
        info!("");
        info!("✅ Build finished");
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }

    pub fn error(msg: &str) {
        error!("❌ {}", msg);
    }

    pub fn warn(msg: &str) {
        warn!("⚠️  {}", msg);
    }
}

/// Scope timer that logs its lifetime on drop, at debug level.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  {} started", name);
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  {} took {:.2?}", self.name, self.start.elapsed());
    }
}
