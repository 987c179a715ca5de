// Watch mode: rebuilds the project whenever a source file changes

use crate::core::interfaces::BuildService;
use crate::core::models::BuildOptions;
use crate::utils::{Logger, MusubiError, Result, CACHE_DIR_NAME};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Quiet period after the last change before a rebuild starts
    pub debounce_ms: u64,
    /// Clear the terminal before each rebuild
    pub clear_console: bool,
    /// Log every changed path
    pub verbose: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            clear_console: false,
            verbose: false,
        }
    }
}

/// Watches the project root and reruns the build when sources change.
/// After each successful rebuild it notifies live reload subscribers.
pub struct MusubiWatcher {
    config: WatchConfig,
    build_options: BuildOptions,
    /// Directories the build itself writes into. Changes there must not
    /// retrigger a build or watch mode would loop forever.
    ignored_dirs: Vec<PathBuf>,
    reload_tx: Option<broadcast::Sender<String>>,
}

impl MusubiWatcher {
    pub fn new(config: WatchConfig, build_options: BuildOptions) -> Self {
        let mut ignored_dirs = vec![
            build_options.outdir.clone(),
            build_options.root.join(CACHE_DIR_NAME),
        ];
        if let Some(ref wasm) = build_options.wasm {
            ignored_dirs.push(wasm.out_dir.clone());
            ignored_dirs.push(wasm.crate_dir.join("target"));
        }

        Self {
            config,
            build_options,
            ignored_dirs,
            reload_tx: None,
        }
    }

    /// Send "reload" on this channel after every successful rebuild.
    pub fn with_reload_channel(mut self, tx: broadcast::Sender<String>) -> Self {
        self.reload_tx = Some(tx);
        self
    }

    pub async fn watch<B: BuildService>(&self, build_service: &mut B) -> Result<()> {
        Logger::info(&format!(
            "👀 Watching {} for changes",
            self.build_options.root.display()
        ));
        Logger::info("   Ctrl+C stops the watcher");

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            notify::Config::default(),
        )
        .map_err(|e| MusubiError::build(format!("Cannot start file watcher: {}", e)))?;

        watcher
            .watch(&self.build_options.root, RecursiveMode::Recursive)
            .map_err(|e| {
                MusubiError::build(format!(
                    "Cannot watch {}: {}",
                    self.build_options.root.display(),
                    e
                ))
            })?;

        self.run_loop(rx, build_service).await
    }

    async fn run_loop<B: BuildService>(
        &self,
        rx: Receiver<Event>,
        build_service: &mut B,
    ) -> Result<()> {
        let debounce = Duration::from_millis(self.config.debounce_ms);
        let mut pending: HashSet<PathBuf> = HashSet::new();

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            let _ = shutdown_tx.send(()).await;
        });

        loop {
            if shutdown_rx.try_recv().is_ok() {
                Logger::info("\n👋 Watch mode stopped");
                break;
            }

            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(event) => {
                    self.collect(&event, &mut pending);
                    if pending.is_empty() {
                        continue;
                    }

                    // Let the burst settle: keep draining until a full
                    // debounce window passes with no further events.
                    loop {
                        match rx.recv_timeout(debounce) {
                            Ok(event) => self.collect(&event, &mut pending),
                            Err(RecvTimeoutError::Timeout) => break,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }

                    self.rebuild(&pending, build_service).await;
                    pending.clear();
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    Logger::warn("File watcher channel closed");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Adds the event's rebuild-worthy paths to the pending set.
    fn collect(&self, event: &Event, pending: &mut HashSet<PathBuf>) {
        if matches!(event.kind, EventKind::Access(_) | EventKind::Other) {
            return;
        }

        for path in &event.paths {
            if self.is_ignored_path(path) || !self.rebuild_worthy(path) {
                continue;
            }
            if self.config.verbose {
                Logger::debug(&format!("Changed: {}", path.display()));
            }
            pending.insert(path.clone());
        }
    }

    async fn rebuild<B: BuildService>(
        &self,
        changed_files: &HashSet<PathBuf>,
        build_service: &mut B,
    ) {
        if self.config.clear_console {
            print!("\x1B[2J\x1B[1;1H");
        }

        Logger::info(&format!(
            "\n🔄 {} file(s) changed, rebuilding",
            changed_files.len()
        ));
        if self.config.verbose {
            for path in changed_files {
                Logger::debug(&format!("  • {}", path.display()));
            }
        }

        let start = Instant::now();
        match build_service.build(&self.build_options).await {
            Ok(result) => {
                Logger::info(&format!(
                    "✅ Rebuilt in {:.0}ms ({} modules, {} assets)\n",
                    start.elapsed().as_millis(),
                    result.modules_processed,
                    result.assets_copied + result.assets_skipped
                ));

                if let Some(ref tx) = self.reload_tx {
                    let _ = tx.send("reload".to_string());
                }
            }
            Err(e) => {
                Logger::error(&format!("Rebuild failed: {}\n", e));
            }
        }
    }

    fn is_ignored_path(&self, path: &Path) -> bool {
        if self.ignored_dirs.iter().any(|dir| path.starts_with(dir)) {
            return true;
        }

        let text = path.to_string_lossy();
        text.contains(".git")
            || text.contains("node_modules")
            || text.contains(".tmp")
            || text.ends_with('~')
            || text.ends_with(".swp")
    }

    /// Extensions that feed the build: bundle inputs, static assets and
    /// the wasm crate's sources.
    fn rebuild_worthy(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                matches!(
                    ext,
                    "js" | "mjs" | "cjs" | "json" | "html" | "css" | "rs" | "toml"
                )
            })
    }
}
