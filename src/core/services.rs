use crate::core::{
    interfaces::*,
    models::*,
    plugin::{PluginContext, PluginManager},
};
use crate::infrastructure::{
    AssetCopier, BundleEmitter, MinificationService, MinificationStats, ModuleResolver,
    TransformedModule,
};
use crate::utils::{
    budget, hash_file, BuildProfiler, CompletionStats, ContentHash, Logger, MusubiCache,
    MusubiError, MusubiUI, OutputFileInfo, Result, SourceMapUtils, Timer, CACHE_DIR_NAME,
};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main build service implementation. Runs the three stage pipeline:
/// native module build, static asset copy and bundling.
pub struct MusubiBuildService {
    fs: Arc<dyn FileSystemService>,
    js_processor: Arc<dyn JsProcessor>,
    wasm_builder: Arc<dyn WasmBuilder>,
    resolver: ModuleResolver,
    profiler: Arc<BuildProfiler>,
    /// Bundle cache, opened lazily against the project root's cache
    /// directory on first build.
    cache: Option<(PathBuf, MusubiCache)>,
    plugin_manager: PluginManager,
}

struct BundleStage {
    outputs: Vec<OutputFile>,
    modules_processed: usize,
}

impl MusubiBuildService {
    pub fn new(
        fs: Arc<dyn FileSystemService>,
        js_processor: Arc<dyn JsProcessor>,
        wasm_builder: Arc<dyn WasmBuilder>,
    ) -> Self {
        Self {
            fs,
            js_processor,
            wasm_builder,
            resolver: ModuleResolver::new(),
            profiler: Arc::new(BuildProfiler::new()),
            cache: None,
            plugin_manager: PluginManager::new(),
        }
    }

    /// Register a plugin with the build service
    pub fn with_plugin(mut self, plugin: Arc<dyn crate::core::plugin::Plugin>) -> Self {
        self.plugin_manager.register(plugin);
        self
    }

    pub fn plugin_manager_mut(&mut self) -> &mut PluginManager {
        &mut self.plugin_manager
    }

    fn ensure_cache(&mut self, options: &BuildOptions) {
        let cache_dir = options.root.join(CACHE_DIR_NAME);
        let reopen = match &self.cache {
            Some((dir, _)) => dir != &cache_dir,
            None => true,
        };

        if reopen {
            let cache = MusubiCache::with_persistent_cache(&cache_dir);
            if !cache.has_persistent_store() {
                Logger::debug("Persistent cache unavailable, using in-memory cache");
            }
            self.cache = Some((cache_dir, cache));
        }
    }

    fn bundle_cache(&self) -> Option<&MusubiCache> {
        self.cache.as_ref().map(|(_, cache)| cache)
    }

    /// Native build, then every entry graph, then the pending binaries.
    /// Binaries land after the bundles so a failed bundle leaves none behind.
    async fn build_bundles(
        &self,
        options: &BuildOptions,
        context: &PluginContext,
    ) -> Result<BundleStage> {
        let wasm_output = match &options.wasm {
            Some(wasm) => {
                self.profiler.start_timer("native_build");
                let output = self.wasm_builder.build(wasm).await?;
                self.profiler.end_timer("native_build");
                Some(output)
            }
            None => None,
        };

        let mut wasm_binaries: BTreeSet<PathBuf> = wasm_output
            .iter()
            .flat_map(|output| output.pending_assets.iter().cloned())
            .collect();

        let mut outputs = Vec::new();
        let mut modules_processed = 0;

        for (entry_name, entry_path) in &options.entries {
            self.profiler.start_timer("graph_resolution");
            let graph = self
                .resolve_entry_graph(entry_name, entry_path, options, context)
                .await?;
            self.profiler.end_timer("graph_resolution");

            if self.plugin_manager.plugin_count() > 0 {
                self.plugin_manager.on_modules_resolved(&graph, context)?;
            }

            for module in &graph {
                if module.module_type == ModuleType::Wasm {
                    wasm_binaries.insert(module.path.clone());
                }
            }

            modules_processed += graph.len();

            self.profiler.start_timer("bundling");
            let entry_outputs = self
                .bundle_entry(entry_name, &graph, options, context)
                .await?;
            self.profiler.end_timer("bundling");
            outputs.extend(entry_outputs);
        }

        for binary in &wasm_binaries {
            let file_name = binary.file_name().ok_or_else(|| {
                MusubiError::build(format!("binary {} has no file name", binary.display()))
            })?;
            let target = options.outdir.join(file_name);
            let size = self.fs.copy_file(binary, &target).await?;
            outputs.push(OutputFile {
                path: target,
                size,
                kind: OutputKind::NativeArtifact,
            });
        }

        Ok(BundleStage {
            outputs,
            modules_processed,
        })
    }

    /// Depth first, dependencies before importers, each module once. The
    /// resulting order is stable across builds because imports are walked
    /// in source order.
    async fn resolve_entry_graph(
        &self,
        entry_name: &str,
        entry_path: &Path,
        options: &BuildOptions,
        context: &PluginContext,
    ) -> Result<Vec<ModuleInfo>> {
        if !self.fs.file_exists(entry_path) {
            return Err(MusubiError::FileNotFound(format!(
                "entry '{}' at {}",
                entry_name,
                entry_path.display()
            )));
        }

        struct Frame {
            module: ModuleInfo,
            next_dependency: usize,
        }

        let mut ordered = Vec::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();

        let entry = self.load_module(entry_path, options, context).await?;
        visited.insert(entry.path.clone());
        let mut stack = vec![Frame {
            module: entry,
            next_dependency: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.next_dependency < frame.module.dependencies.len() {
                let dependency = frame.module.dependencies[frame.next_dependency].clone();
                frame.next_dependency += 1;

                let key = canonical(&dependency);
                if visited.insert(key.clone()) {
                    let module = self.load_module(&key, options, context).await?;
                    stack.push(Frame {
                        module,
                        next_dependency: 0,
                    });
                }
            } else {
                let frame = stack.pop().unwrap();
                ordered.push(frame.module);
            }
        }

        Ok(ordered)
    }

    /// Read one module, validate it and resolve its imports to paths.
    async fn load_module(
        &self,
        path: &Path,
        options: &BuildOptions,
        context: &PluginContext,
    ) -> Result<ModuleInfo> {
        let path = canonical(path);
        Logger::debug(&format!("Processing module: {}", path.display()));

        let module_type = ModuleType::from_path(&path);
        let content = match module_type {
            // Binary content never enters the bundle as text
            ModuleType::Wasm => String::new(),
            _ => self.fs.read_file(&path).await?,
        };

        let probe = ModuleInfo {
            path: path.clone(),
            content,
            module_type,
            dependencies: Vec::new(),
        };
        let imports = self.js_processor.extract_imports(&probe).await?;

        let mut dependencies = Vec::new();
        for specifier in &imports {
            let resolved = match self.plugin_manager.resolve(specifier, &path, context)? {
                Some(resolved) => resolved,
                None => self.resolver.resolve(specifier, &path, &options.root).await?,
            };
            Logger::debug(&format!("Resolved '{}' to {}", specifier, resolved.display()));
            dependencies.push(resolved);
        }

        Ok(ModuleInfo {
            dependencies,
            ..probe
        })
    }

    async fn bundle_entry(
        &self,
        entry_name: &str,
        modules: &[ModuleInfo],
        options: &BuildOptions,
        context: &PluginContext,
    ) -> Result<Vec<OutputFile>> {
        let _timer = Timer::start(&format!("Bundling entry '{}'", entry_name));
        Logger::bundling_entry(entry_name, modules.len());

        let output_name = options.output_filename(entry_name);
        let fingerprint = graph_fingerprint(entry_name, modules, options);
        let map_fingerprint = format!("{}#map", fingerprint);

        let cached = self.bundle_cache().and_then(|cache| {
            let code = cache.get_bundle(&fingerprint, &fingerprint)?;
            if options.source_maps.is_enabled() {
                let map = cache.get_bundle(&map_fingerprint, &map_fingerprint)?;
                Some((code, Some(map)))
            } else {
                Some((code, None))
            }
        });

        let (code, map_json) = match cached {
            Some(pair) => {
                Logger::debug(&format!("Using cached bundle for '{}'", entry_name));
                pair
            }
            None => {
                let pair = self
                    .assemble_bundle(&output_name, modules, options, context)
                    .await?;

                if let Some(cache) = self.bundle_cache() {
                    cache.cache_bundle(&fingerprint, &fingerprint, pair.0.clone());
                    if let Some(map_json) = &pair.1 {
                        cache.cache_bundle(&map_fingerprint, &map_fingerprint, map_json.clone());
                    }
                }
                pair
            }
        };

        let bundle_path = options.output_path(entry_name);
        let mut final_code = code;
        match (options.source_maps, &map_json) {
            (SourceMapKind::External, Some(_)) => {
                final_code.push_str(&SourceMapUtils::external_comment(&format!(
                    "{}.map",
                    output_name
                )));
            }
            (SourceMapKind::Inline, Some(json)) => {
                final_code.push_str(&SourceMapUtils::inline_comment_from_json(json));
            }
            _ => {}
        }

        self.fs.write_file(&bundle_path, &final_code).await?;
        let mut outputs = vec![OutputFile {
            path: bundle_path,
            size: final_code.len() as u64,
            kind: OutputKind::Bundle,
        }];

        if let (SourceMapKind::External, Some(json)) = (options.source_maps, &map_json) {
            let map_path = options.outdir.join(format!("{}.map", output_name));
            self.fs.write_file(&map_path, json).await?;
            outputs.push(OutputFile {
                path: map_path,
                size: json.len() as u64,
                kind: OutputKind::SourceMap,
            });
        }

        Ok(outputs)
    }

    /// Transform every module, emit the IIFE and optionally minify.
    async fn assemble_bundle(
        &self,
        output_name: &str,
        modules: &[ModuleInfo],
        options: &BuildOptions,
        context: &PluginContext,
    ) -> Result<(String, Option<String>)> {
        let mut transformed_modules = Vec::with_capacity(modules.len());

        for module in modules {
            let source_name = module
                .path
                .strip_prefix(&options.root)
                .unwrap_or(&module.path)
                .display()
                .to_string();

            let to_process = if module.module_type == ModuleType::JavaScript
                && self.plugin_manager.plugin_count() > 0
            {
                let plugged =
                    self.plugin_manager
                        .transform(module.content.clone(), &module.path, context)?;
                ModuleInfo {
                    content: plugged,
                    ..module.clone()
                }
            } else {
                module.clone()
            };

            let transformed = self.js_processor.transform_module(&to_process).await?;
            // The map has to describe the code as it entered the bundle,
            // including plugin edits, or the line mappings drift.
            transformed_modules.push(TransformedModule {
                source_name,
                original: match to_process.module_type {
                    ModuleType::JavaScript => Some(to_process.content.clone()),
                    _ => None,
                },
                transformed,
            });
        }

        let emitter = BundleEmitter::new(output_name, options.source_maps);
        let bundle = emitter.emit(&transformed_modules);
        let mut code = bundle.code;

        if options.minify {
            if options.source_maps.is_enabled() {
                Logger::warn("Minification rewrites the bundle; the source map describes the unminified output");
            }
            let minifier = MinificationService::new();
            let original = code.clone();
            code = minifier.minify_bundle(code, output_name).await?;
            Logger::debug(&format!("{}", MinificationStats::compare(&original, &code)));
        }

        let map_json = match bundle.source_map {
            Some(map) => Some(SourceMapUtils::to_json(&map)?),
            None => None,
        };

        Ok((code, map_json))
    }
}

#[async_trait::async_trait]
impl BuildService for MusubiBuildService {
    async fn build(&mut self, options: &BuildOptions) -> Result<BuildResult> {
        let ui = MusubiUI::new();
        ui.show_banner();

        let build_start = std::time::Instant::now();
        self.profiler.start_timer("total_build");

        Logger::build_start(
            &options.root.display().to_string(),
            &options.outdir.display().to_string(),
        );

        let plugin_context = PluginContext::new(options.clone());
        if self.plugin_manager.plugin_count() > 0 {
            Logger::debug(&format!(
                "Running on_build_start hook for {} plugins",
                self.plugin_manager.plugin_count()
            ));
            self.plugin_manager.on_build_start(&plugin_context)?;
        }

        self.fs.create_directory(&options.outdir).await?;
        self.ensure_cache(options);

        // Bundling and the asset copy are independent until the final
        // result merge; run them concurrently.
        let copier = AssetCopier::new(self.fs.clone());
        let service = &*self;
        let (bundle_stage, copy_stats) = tokio::try_join!(
            service.build_bundles(options, &plugin_context),
            copier.copy_all(&options.copy_rules),
        )?;

        let mut output_files = bundle_stage.outputs;
        output_files.extend(copy_stats.outputs);
        output_files.sort_by(|a, b| a.path.cmp(&b.path));

        let budget_violations = budget::check_budgets(&options.performance, &output_files);
        budget::report_violations(&budget_violations);

        self.profiler.end_timer("total_build");
        let build_time = build_start.elapsed();

        let result = BuildResult {
            modules_processed: bundle_stage.modules_processed,
            assets_copied: copy_stats.copied,
            assets_skipped: copy_stats.skipped,
            output_files,
            build_time,
            budget_violations,
        };

        if self.plugin_manager.plugin_count() > 0 {
            Logger::debug(&format!(
                "Running on_build_end hook for {} plugins",
                self.plugin_manager.plugin_count()
            ));
            self.plugin_manager.on_build_end(&plugin_context, &result)?;
        }

        let outdir_label = options
            .outdir
            .strip_prefix(&options.root)
            .unwrap_or(&options.outdir)
            .display()
            .to_string();
        ui.show_completion(CompletionStats {
            outdir_label,
            output_files: result
                .output_files
                .iter()
                .filter(|file| file.kind != OutputKind::Asset)
                .map(|file| OutputFileInfo {
                    name: file
                        .path
                        .strip_prefix(&options.outdir)
                        .unwrap_or(&file.path)
                        .display()
                        .to_string(),
                    size: file.size as usize,
                })
                .collect(),
            assets_copied: result.assets_copied,
            assets_skipped: result.assets_skipped,
        });

        Logger::build_complete(
            result.bundle_count(),
            result.assets_copied + result.assets_skipped,
            build_time,
            &options.outdir.display().to_string(),
        );

        if std::env::var("RUST_LOG").unwrap_or_default().contains("debug") {
            self.profiler.report_bottlenecks();
        }

        Ok(result)
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Cache key covering everything that affects one entry's final bundle.
fn graph_fingerprint(entry_name: &str, modules: &[ModuleInfo], options: &BuildOptions) -> String {
    let mut summary = format!(
        "{}|{}|{}|{:?}",
        entry_name, options.mode, options.minify, options.source_maps
    );

    for module in modules {
        let hash = match module.module_type {
            ModuleType::Wasm => hash_file(&module.path)
                .map(|h| h.to_hex())
                .unwrap_or_else(|_| "missing".to_string()),
            _ => ContentHash::of_bytes(module.content.as_bytes()).to_hex(),
        };
        summary.push_str(&format!("|{}:{}", module.path.display(), hash));
    }

    format!(
        "bundle:{}:{}",
        entry_name,
        ContentHash::of_bytes(summary.as_bytes()).to_hex()
    )
}
