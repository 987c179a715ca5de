use musubi::core::interfaces::BuildService;
use musubi::core::models::{BuildMode, OutputKind, SourceMapKind};
use musubi::core::services::MusubiBuildService;
use musubi::infrastructure::{OxcJsProcessor, TokioFileSystemService, WasmPackBuilder};
use musubi::utils::{ConfigLoader, MusubiError};
use std::path::Path;
use std::sync::Arc;

fn build_service() -> MusubiBuildService {
    MusubiBuildService::new(
        Arc::new(TokioFileSystemService),
        Arc::new(OxcJsProcessor::new()),
        Arc::new(WasmPackBuilder::new()),
    )
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Lay down a small web project: two JS modules, an index.html and a logo.
fn scaffold_project(root: &Path) {
    write(
        &root.join("js/index.js"),
        "import { add } from './util.js';\nconsole.log(add(1, 2));\n",
    );
    write(
        &root.join("js/util.js"),
        "export function add(a, b) {\n  return a + b;\n}\n",
    );
    write(
        &root.join("static/index.html"),
        "<html><head></head><body><script src=\"index.js\"></script></body></html>\n",
    );
    write(&root.join("static/logo.svg"), "<svg viewBox=\"0 0 16 16\"></svg>\n");
}

const PROJECT_CONFIG: &str = r#"{
    "entry": { "index": "./js/index.js" },
    "copy": [{ "from": "static" }]
}"#;

async fn build_project(root: &Path) -> musubi::core::models::BuildResult {
    let file_config = ConfigLoader::load_from_file(root).unwrap();
    let options =
        ConfigLoader::resolve(file_config, root.to_path_buf(), None, None, None, None).unwrap();
    build_service().build(&options).await.unwrap()
}

#[tokio::test]
async fn test_simple_project_build() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    scaffold_project(&root);
    write(&root.join("musubi.config.json"), PROJECT_CONFIG);

    let result = build_project(&root).await;

    assert_eq!(result.bundle_count(), 1);
    assert_eq!(result.modules_processed, 2);
    assert_eq!(result.assets_copied, 2);
    assert_eq!(result.assets_skipped, 0);

    let bundle = std::fs::read_to_string(root.join("dist/index.js")).unwrap();
    assert!(bundle.starts_with("// Musubi - Build Output\n"));
    assert!(bundle.contains("(function() {"));
    assert!(bundle.contains("'use strict';"));
    assert!(bundle.ends_with("//# sourceMappingURL=index.js.map\n"));

    // Dependencies come before their importers
    let util_pos = bundle.find("// Module: js/util.js").unwrap();
    let index_pos = bundle.find("// Module: js/index.js").unwrap();
    assert!(util_pos < index_pos);

    // Imports and exports are rewritten for the shared scope
    assert!(bundle.contains("function add(a, b)"));
    assert!(!bundle.contains("\nimport "));
    assert!(!bundle.contains("\nexport "));

    // Copied assets are byte for byte identical
    let original = std::fs::read(root.join("static/logo.svg")).unwrap();
    let copied = std::fs::read(root.join("dist/logo.svg")).unwrap();
    assert_eq!(original, copied);
    assert!(root.join("dist/index.html").exists());
}

#[tokio::test]
async fn test_build_without_assets_emits_only_bundle_and_map() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root.join("js/index.js"), "console.log('solo');\n");
    write(
        &root.join("musubi.config.json"),
        r#"{ "entry": { "index": "./js/index.js" } }"#,
    );

    let result = build_project(&root).await;
    assert_eq!(result.bundle_count(), 1);
    assert_eq!(result.assets_copied, 0);

    let mut emitted: Vec<String> = std::fs::read_dir(root.join("dist"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    emitted.sort();
    assert_eq!(emitted, vec!["index.js", "index.js.map"]);
}

#[tokio::test]
async fn test_external_source_map_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    scaffold_project(&root);
    write(&root.join("musubi.config.json"), PROJECT_CONFIG);

    let result = build_project(&root).await;
    assert!(result
        .output_files
        .iter()
        .any(|f| f.kind == OutputKind::SourceMap));

    let map_json = std::fs::read_to_string(root.join("dist/index.js.map")).unwrap();
    let map: serde_json::Value = serde_json::from_str(&map_json).unwrap();

    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "index.js");
    let sources: Vec<&str> = map["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(sources, vec!["js/util.js", "js/index.js"]);
    assert!(map["sourcesContent"].as_array().unwrap().len() == 2);
    assert!(!map["mappings"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_rebuild_skips_unchanged_assets_and_reproduces_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    scaffold_project(&root);
    write(&root.join("musubi.config.json"), PROJECT_CONFIG);

    let first = build_project(&root).await;
    let first_bundle = std::fs::read(root.join("dist/index.js")).unwrap();
    assert_eq!(first.assets_copied, 2);

    let second = build_project(&root).await;
    let second_bundle = std::fs::read(root.join("dist/index.js")).unwrap();

    assert_eq!(second.assets_copied, 0);
    assert_eq!(second.assets_skipped, 2);
    assert_eq!(first_bundle, second_bundle);
}

#[tokio::test]
async fn test_multi_entry_project() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(
        &root.join("js/app.js"),
        "import { greet } from './shared.js';\ngreet('app');\n",
    );
    write(
        &root.join("js/admin.js"),
        "import { greet } from './shared.js';\ngreet('admin');\n",
    );
    write(
        &root.join("js/shared.js"),
        "export function greet(name) {\n  console.log('hello ' + name);\n}\n",
    );
    write(
        &root.join("musubi.config.json"),
        r#"{ "entry": { "app": "./js/app.js", "admin": "./js/admin.js" } }"#,
    );

    let result = build_project(&root).await;

    assert_eq!(result.bundle_count(), 2);
    // The shared module is bundled into each entry
    assert_eq!(result.modules_processed, 4);

    let app = std::fs::read_to_string(root.join("dist/app.js")).unwrap();
    let admin = std::fs::read_to_string(root.join("dist/admin.js")).unwrap();
    assert!(app.contains("function greet(name)"));
    assert!(admin.contains("function greet(name)"));
    assert!(app.contains("greet('app');"));
    assert!(admin.contains("greet('admin');"));
}

#[tokio::test]
async fn test_node_modules_import_is_bundled() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(
        &root.join("js/index.js"),
        "import { clamp } from 'tiny-math';\nconsole.log(clamp(5, 0, 3));\n",
    );
    write(
        &root.join("node_modules/tiny-math/package.json"),
        r#"{ "name": "tiny-math", "version": "1.0.0", "main": "lib/index.js" }"#,
    );
    write(
        &root.join("node_modules/tiny-math/lib/index.js"),
        "export function clamp(v, lo, hi) {\n  return Math.min(hi, Math.max(lo, v));\n}\n",
    );
    write(
        &root.join("musubi.config.json"),
        r#"{ "entry": { "index": "./js/index.js" } }"#,
    );

    let result = build_project(&root).await;

    assert_eq!(result.modules_processed, 2);
    let bundle = std::fs::read_to_string(root.join("dist/index.js")).unwrap();
    assert!(bundle.contains("function clamp(v, lo, hi)"));
    let dep_pos = bundle.find("function clamp").unwrap();
    let entry_pos = bundle.find("console.log(clamp(5, 0, 3));").unwrap();
    assert!(dep_pos < entry_pos);
}

#[tokio::test]
async fn test_unresolved_import_fails_without_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(
        &root.join("js/index.js"),
        "import { gone } from './missing.js';\nconsole.log(gone);\n",
    );
    write(
        &root.join("musubi.config.json"),
        r#"{ "entry": { "index": "./js/index.js" } }"#,
    );

    let file_config = ConfigLoader::load_from_file(&root).unwrap();
    let options =
        ConfigLoader::resolve(file_config, root.clone(), None, None, None, None).unwrap();

    let err = build_service().build(&options).await.unwrap_err();
    assert!(matches!(err, MusubiError::Resolve { .. }));
    assert!(err.to_string().contains("./missing.js"));
    assert!(!root.join("dist/index.js").exists());
}

#[tokio::test]
async fn test_syntax_error_reports_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root.join("js/index.js"), "const = broken;\n");
    write(
        &root.join("musubi.config.json"),
        r#"{ "entry": { "index": "./js/index.js" } }"#,
    );

    let file_config = ConfigLoader::load_from_file(&root).unwrap();
    let options =
        ConfigLoader::resolve(file_config, root.clone(), None, None, None, None).unwrap();

    let err = build_service().build(&options).await.unwrap_err();
    assert!(matches!(err, MusubiError::Parse { .. }));
    assert!(err.format_detailed().contains("index.js"));
}

#[tokio::test]
async fn test_budget_overrun_warns_but_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    scaffold_project(&root);
    write(
        &root.join("musubi.config.json"),
        r#"{
            "entry": { "index": "./js/index.js" },
            "performance": { "hints": "warning", "maxEntrypointSize": 10, "maxAssetSize": 10 }
        }"#,
    );

    let result = build_project(&root).await;

    assert!(!result.budget_violations.is_empty());
    assert!(root.join("dist/index.js").exists());
}

#[tokio::test]
async fn test_inline_source_map_embeds_footer() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    scaffold_project(&root);
    write(
        &root.join("musubi.config.json"),
        r#"{ "entry": { "index": "./js/index.js" }, "devtool": "inline-source-map" }"#,
    );

    let result = build_project(&root).await;

    assert!(result
        .output_files
        .iter()
        .all(|f| f.kind != OutputKind::SourceMap));
    let bundle = std::fs::read_to_string(root.join("dist/index.js")).unwrap();
    assert!(bundle.contains("sourceMappingURL=data:application/json;charset=utf-8;base64,"));
    assert!(!root.join("dist/index.js.map").exists());
}

#[tokio::test]
async fn test_minified_production_build() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    scaffold_project(&root);
    write(
        &root.join("musubi.config.json"),
        r#"{ "entry": { "index": "./js/index.js" }, "minify": true, "devtool": false }"#,
    );

    let file_config = ConfigLoader::load_from_file(&root).unwrap();
    let plain_options = ConfigLoader::resolve(
        file_config,
        root.clone(),
        None,
        Some("dist-plain"),
        Some(false),
        None,
    )
    .unwrap();
    build_service().build(&plain_options).await.unwrap();

    let result = build_project(&root).await;
    assert_eq!(result.bundle_count(), 1);

    let minified = std::fs::read_to_string(root.join("dist/index.js")).unwrap();
    let plain = std::fs::read_to_string(root.join("dist-plain/index.js")).unwrap();

    assert!(minified.len() < plain.len());
    assert!(!minified.contains("// Module:"));
}

#[tokio::test]
async fn test_development_mode_disables_hints() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    scaffold_project(&root);
    write(
        &root.join("musubi.config.json"),
        r#"{
            "entry": { "index": "./js/index.js" },
            "performance": { "maxEntrypointSize": 10 }
        }"#,
    );

    let file_config = ConfigLoader::load_from_file(&root).unwrap();
    let options = ConfigLoader::resolve(
        file_config,
        root.clone(),
        Some(BuildMode::Development),
        None,
        None,
        None,
    )
    .unwrap();
    assert_eq!(options.source_maps, SourceMapKind::External);

    let result = build_service().build(&options).await.unwrap();
    assert!(result.budget_violations.is_empty());
}
