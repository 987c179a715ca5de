use crate::core::models::{
    BudgetHints, BudgetOptions, BuildMode, BuildOptions, CopyRule, DevServerOptions,
    SourceMapKind, WasmOptions,
};
use crate::utils::{Logger, MusubiError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "musubi.config.json";

static FILENAME_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\w+)\]").unwrap());

/// Entry section: either a single path or a map of entry name to path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Single(String),
    Map(BTreeMap<String, String>),
}

/// Devtool section: a named source map style, or `false` to disable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DevtoolConfig {
    Named(String),
    Toggle(bool),
}

/// Performance hints: `"warning"`, or `false` to disable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintsConfig {
    Named(String),
    Toggle(bool),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputConfig {
    /// Output directory, relative to the config file (default: "dist")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Bundle filename template with a `[name]` placeholder (default: "[name].js")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CopyRuleConfig {
    /// Source file or directory, relative to the config file
    pub from: String,

    /// Destination inside the output directory (default: the output root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WasmConfig {
    /// Directory containing the crate's Cargo.toml (default: ".")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crate_directory: Option<String>,

    /// Toolchain output directory, relative to the crate (default: "pkg")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Artifact base name override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_name: Option<String>,

    /// Build profile: "dev", "profiling" or "release" (default: "release")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Toolchain target (default: "web")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Executable to invoke (default: "wasm-pack")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DevServerConfig {
    /// Directory served at `/` (default: the output directory)
    #[serde(rename = "static", skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,

    /// Serve responses gzip-compressed (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<bool>,

    /// Port to listen on (default: 8080)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PerformanceConfig {
    /// "warning" to report overruns, false to silence them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<HintsConfig>,

    /// Budget for an entry bundle in bytes (default: 250000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entrypoint_size: Option<u64>,

    /// Budget for any emitted file in bytes (default: 250000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_asset_size: Option<u64>,
}

/// Configuration file format (musubi.config.json)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MusubiConfig {
    /// "production" or "development" (default: "production")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Source map style: "source-map", "inline-source-map", or false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devtool: Option<DevtoolConfig>,

    /// Entry points (default: {"main": "./src/index.js"})
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,

    /// Enable/disable bundle minification (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    /// Static assets copied verbatim into the output directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<Vec<CopyRuleConfig>>,

    /// Native module build stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasm: Option<WasmConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceConfig>,
}

/// Join a config-relative path onto the project root, dropping `.` segments
/// so equal settings resolve to equal paths.
fn resolve_path(root: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let mut resolved = root.to_path_buf();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

/// Config loader that supports config files with CLI override
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file if it exists
    /// Searches for musubi.config.json in the project root
    pub fn load_from_file(root: &Path) -> Result<Option<MusubiConfig>> {
        let config_path = root.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            Logger::debug(&format!("No {} found, using defaults", CONFIG_FILE_NAME));
            return Ok(None);
        }

        Logger::debug(&format!("Loading config from {}", config_path.display()));

        let content = std::fs::read_to_string(&config_path).map_err(MusubiError::Io)?;

        let config: MusubiConfig = serde_json::from_str(&content).map_err(|e| {
            MusubiError::config(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))
        })?;

        Ok(Some(config))
    }

    /// Merge file config with CLI arguments (CLI takes precedence) and
    /// resolve every path against the project root.
    pub fn resolve(
        file_config: Option<MusubiConfig>,
        root: PathBuf,
        mode: Option<BuildMode>,
        outdir: Option<&str>,
        minify: Option<bool>,
        port: Option<u16>,
    ) -> Result<BuildOptions> {
        let base = file_config.unwrap_or_default();

        let mode = match mode {
            Some(m) => m,
            None => match base.mode.as_deref() {
                None => BuildMode::Production,
                Some(s) => BuildMode::from_str(s).map_err(MusubiError::Config)?,
            },
        };

        let output = base.output.unwrap_or_default();
        let outdir_str = outdir
            .or(output.path.as_deref())
            .unwrap_or("dist");
        let outdir = resolve_path(&root, outdir_str);

        let filename_template = output.filename.unwrap_or_else(|| "[name].js".to_string());
        for token in FILENAME_TOKEN_RE.captures_iter(&filename_template) {
            if &token[1] != "name" {
                return Err(MusubiError::config(format!(
                    "output.filename '{}' uses unsupported token [{}]; only [name] is available",
                    filename_template, &token[1]
                )));
            }
        }

        let entries = Self::resolve_entries(base.entry, &root)?;
        if entries.len() > 1 && !filename_template.contains("[name]") {
            return Err(MusubiError::config(format!(
                "output.filename '{}' needs a [name] placeholder when there are multiple entries",
                filename_template
            )));
        }

        let source_maps = Self::resolve_devtool(base.devtool)?;
        let minify = minify.or(base.minify).unwrap_or(false);

        let copy_rules = base
            .copy
            .unwrap_or_default()
            .into_iter()
            .map(|rule| CopyRule {
                from: resolve_path(&root, &rule.from),
                to: resolve_path(&outdir, rule.to.as_deref().unwrap_or("")),
            })
            .collect();

        let wasm = match base.wasm {
            None => None,
            Some(w) => Some(Self::resolve_wasm(w, &root)?),
        };

        let dev_server = base.dev_server.unwrap_or_default();
        let dev_server = DevServerOptions {
            static_dir: dev_server
                .static_dir
                .map(|s| resolve_path(&root, &s))
                .unwrap_or_else(|| outdir.clone()),
            compress: dev_server.compress.unwrap_or(true),
            port: port.or(dev_server.port).unwrap_or(8080),
        };

        let performance = Self::resolve_performance(base.performance, mode)?;

        Ok(BuildOptions {
            root,
            mode,
            entries,
            outdir,
            filename_template,
            minify,
            source_maps,
            copy_rules,
            wasm,
            dev_server,
            performance,
        })
    }

    /// Fail fast on a missing entry file, before any stage starts.
    pub fn validate_entries(options: &BuildOptions) -> Result<()> {
        for (name, path) in &options.entries {
            if !path.is_file() {
                return Err(MusubiError::config(format!(
                    "entry '{}' points at {}, which does not exist",
                    name,
                    path.display()
                )));
            }
        }
        Ok(())
    }

    fn resolve_entries(
        entry: Option<EntryConfig>,
        root: &Path,
    ) -> Result<BTreeMap<String, PathBuf>> {
        let mut entries = BTreeMap::new();
        match entry {
            None => {
                entries.insert("main".to_string(), resolve_path(root, "./src/index.js"));
            }
            Some(EntryConfig::Single(path)) => {
                entries.insert("main".to_string(), resolve_path(root, &path));
            }
            Some(EntryConfig::Map(map)) => {
                if map.is_empty() {
                    return Err(MusubiError::config(
                        "entry map must contain at least one entry".to_string(),
                    ));
                }
                for (name, path) in map {
                    entries.insert(name, resolve_path(root, &path));
                }
            }
        }
        Ok(entries)
    }

    fn resolve_devtool(devtool: Option<DevtoolConfig>) -> Result<SourceMapKind> {
        match devtool {
            None => Ok(SourceMapKind::External),
            Some(DevtoolConfig::Toggle(false)) => Ok(SourceMapKind::None),
            Some(DevtoolConfig::Toggle(true)) => Err(MusubiError::config(
                "devtool: true is not a source map style; use \"source-map\" or \"inline-source-map\"".to_string(),
            )),
            Some(DevtoolConfig::Named(name)) => match name.as_str() {
                "source-map" => Ok(SourceMapKind::External),
                "inline-source-map" => Ok(SourceMapKind::Inline),
                other => Err(MusubiError::config(format!(
                    "unsupported devtool '{}' (expected \"source-map\", \"inline-source-map\" or false)",
                    other
                ))),
            },
        }
    }

    fn resolve_wasm(config: WasmConfig, root: &Path) -> Result<WasmOptions> {
        let crate_dir = resolve_path(root, config.crate_directory.as_deref().unwrap_or("."));
        let out_dir = resolve_path(&crate_dir, config.out_dir.as_deref().unwrap_or("pkg"));

        let profile = config.profile.unwrap_or_else(|| "release".to_string());
        if !matches!(profile.as_str(), "dev" | "profiling" | "release") {
            return Err(MusubiError::config(format!(
                "wasm.profile '{}' is not one of dev, profiling, release",
                profile
            )));
        }

        Ok(WasmOptions {
            crate_dir,
            out_dir,
            out_name: config.out_name,
            profile,
            target: config.target.unwrap_or_else(|| "web".to_string()),
            command: config.command.unwrap_or_else(|| "wasm-pack".to_string()),
        })
    }

    fn resolve_performance(
        config: Option<PerformanceConfig>,
        mode: BuildMode,
    ) -> Result<BudgetOptions> {
        let config = config.unwrap_or_default();

        let hints = match config.hints {
            // Hints are on by default only for production builds
            None => {
                if mode.is_production() {
                    BudgetHints::Warning
                } else {
                    BudgetHints::Off
                }
            }
            Some(HintsConfig::Toggle(false)) => BudgetHints::Off,
            Some(HintsConfig::Toggle(true)) => {
                return Err(MusubiError::config(
                    "performance.hints: true is not a hint level; use \"warning\" or false".to_string(),
                ))
            }
            Some(HintsConfig::Named(name)) => match name.as_str() {
                "warning" => BudgetHints::Warning,
                other => {
                    return Err(MusubiError::config(format!(
                        "performance.hints '{}' is not supported; budgets are advisory, use \"warning\" or false",
                        other
                    )))
                }
            },
        };

        Ok(BudgetOptions {
            hints,
            max_entrypoint_size: config.max_entrypoint_size.unwrap_or(250_000),
            max_asset_size: config.max_asset_size.unwrap_or(250_000),
        })
    }

    /// Generate example config file
    pub fn generate_example() -> String {
        let mut entries = BTreeMap::new();
        entries.insert("index".to_string(), "./js/index.js".to_string());

        let example = MusubiConfig {
            mode: Some("production".to_string()),
            devtool: Some(DevtoolConfig::Named("source-map".to_string())),
            entry: Some(EntryConfig::Map(entries)),
            output: Some(OutputConfig {
                path: Some("dist".to_string()),
                filename: Some("[name].js".to_string()),
            }),
            minify: Some(false),
            copy: Some(vec![CopyRuleConfig {
                from: "static".to_string(),
                to: None,
            }]),
            wasm: Some(WasmConfig {
                crate_directory: Some(".".to_string()),
                ..Default::default()
            }),
            dev_server: Some(DevServerConfig {
                static_dir: None,
                compress: Some(true),
                port: Some(8080),
            }),
            performance: Some(PerformanceConfig {
                hints: Some(HintsConfig::Named("warning".to_string())),
                max_entrypoint_size: Some(512_000),
                max_asset_size: Some(512_000),
            }),
        };

        serde_json::to_string_pretty(&example).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file_not_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load_from_file(temp_dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_from_file_valid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"{"entry": {"index": "./js/index.js"}, "minify": true, "devServer": {"port": 9000}}"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(temp_dir.path())
            .unwrap()
            .unwrap();
        assert_eq!(config.minify, Some(true));
        assert_eq!(config.dev_server.unwrap().port, Some(9000));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "{not json").unwrap();

        let result = ConfigLoader::load_from_file(temp_dir.path());
        assert!(matches!(result, Err(MusubiError::Config(_))));
    }

    #[test]
    fn test_load_from_file_unknown_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"{"entrypoints": {"index": "./js/index.js"}}"#,
        )
        .unwrap();

        let result = ConfigLoader::load_from_file(temp_dir.path());
        assert!(matches!(result, Err(MusubiError::Config(_))));
    }

    #[test]
    fn test_resolve_defaults() {
        let root = PathBuf::from("/project");
        let options = ConfigLoader::resolve(None, root.clone(), None, None, None, None).unwrap();

        assert_eq!(options.mode, BuildMode::Production);
        assert_eq!(options.outdir, root.join("dist"));
        assert_eq!(options.filename_template, "[name].js");
        assert!(!options.minify);
        assert_eq!(options.source_maps, SourceMapKind::External);
        assert_eq!(options.entries.len(), 1);
        assert_eq!(options.entries["main"], root.join("src/index.js"));
        assert!(options.copy_rules.is_empty());
        assert!(options.wasm.is_none());
        assert_eq!(options.dev_server.port, 8080);
        assert!(options.dev_server.compress);
        assert_eq!(options.dev_server.static_dir, root.join("dist"));
        assert_eq!(options.performance.hints, BudgetHints::Warning);
        assert_eq!(options.performance.max_entrypoint_size, 250_000);
    }

    #[test]
    fn test_resolve_entry_shorthand() {
        let root = PathBuf::from("/project");
        let config = MusubiConfig {
            entry: Some(EntryConfig::Single("./js/app.js".to_string())),
            ..Default::default()
        };
        let options =
            ConfigLoader::resolve(Some(config), root.clone(), None, None, None, None).unwrap();
        assert_eq!(options.entries["main"], root.join("js/app.js"));
    }

    #[test]
    fn test_resolve_empty_entry_map() {
        let config = MusubiConfig {
            entry: Some(EntryConfig::Map(BTreeMap::new())),
            ..Default::default()
        };
        let result =
            ConfigLoader::resolve(Some(config), PathBuf::from("/p"), None, None, None, None);
        assert!(matches!(result, Err(MusubiError::Config(_))));
    }

    #[test]
    fn test_resolve_cli_overrides() {
        let config = MusubiConfig {
            mode: Some("production".to_string()),
            minify: Some(false),
            output: Some(OutputConfig {
                path: Some("build".to_string()),
                filename: None,
            }),
            dev_server: Some(DevServerConfig {
                static_dir: None,
                compress: None,
                port: Some(9000),
            }),
            ..Default::default()
        };

        let root = PathBuf::from("/project");
        let options = ConfigLoader::resolve(
            Some(config),
            root.clone(),
            Some(BuildMode::Development),
            Some("out"),
            Some(true),
            Some(3000),
        )
        .unwrap();

        assert_eq!(options.mode, BuildMode::Development);
        assert_eq!(options.outdir, root.join("out"));
        assert!(options.minify);
        assert_eq!(options.dev_server.port, 3000);
    }

    #[test]
    fn test_resolve_devtool_variants() {
        let disabled = MusubiConfig {
            devtool: Some(DevtoolConfig::Toggle(false)),
            ..Default::default()
        };
        let options =
            ConfigLoader::resolve(Some(disabled), PathBuf::from("/p"), None, None, None, None)
                .unwrap();
        assert_eq!(options.source_maps, SourceMapKind::None);

        let inline = MusubiConfig {
            devtool: Some(DevtoolConfig::Named("inline-source-map".to_string())),
            ..Default::default()
        };
        let options =
            ConfigLoader::resolve(Some(inline), PathBuf::from("/p"), None, None, None, None)
                .unwrap();
        assert_eq!(options.source_maps, SourceMapKind::Inline);

        let bogus = MusubiConfig {
            devtool: Some(DevtoolConfig::Named("eval".to_string())),
            ..Default::default()
        };
        let result =
            ConfigLoader::resolve(Some(bogus), PathBuf::from("/p"), None, None, None, None);
        assert!(matches!(result, Err(MusubiError::Config(_))));
    }

    #[test]
    fn test_resolve_filename_template_collision() {
        let mut entries = BTreeMap::new();
        entries.insert("index".to_string(), "./js/index.js".to_string());
        entries.insert("admin".to_string(), "./js/admin.js".to_string());

        let config = MusubiConfig {
            entry: Some(EntryConfig::Map(entries)),
            output: Some(OutputConfig {
                path: None,
                filename: Some("bundle.js".to_string()),
            }),
            ..Default::default()
        };

        let result =
            ConfigLoader::resolve(Some(config), PathBuf::from("/p"), None, None, None, None);
        assert!(matches!(result, Err(MusubiError::Config(_))));
    }

    #[test]
    fn test_validate_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.js"), "console.log(1);\n").unwrap();

        let present = MusubiConfig {
            entry: Some(EntryConfig::Single("./index.js".to_string())),
            ..Default::default()
        };
        let options = ConfigLoader::resolve(
            Some(present),
            dir.path().to_path_buf(),
            None,
            None,
            None,
            None,
        )
        .unwrap();
        assert!(ConfigLoader::validate_entries(&options).is_ok());

        let absent = MusubiConfig {
            entry: Some(EntryConfig::Single("./missing.js".to_string())),
            ..Default::default()
        };
        let options = ConfigLoader::resolve(
            Some(absent),
            dir.path().to_path_buf(),
            None,
            None,
            None,
            None,
        )
        .unwrap();
        let err = ConfigLoader::validate_entries(&options).unwrap_err();
        assert!(matches!(err, MusubiError::Config(_)));
    }

    #[test]
    fn test_resolve_filename_unknown_token() {
        let config = MusubiConfig {
            output: Some(OutputConfig {
                path: None,
                filename: Some("[name].[contenthash].js".to_string()),
            }),
            ..Default::default()
        };

        let result =
            ConfigLoader::resolve(Some(config), PathBuf::from("/p"), None, None, None, None);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("[contenthash]"));
    }

    #[test]
    fn test_resolve_wasm_defaults() {
        let root = PathBuf::from("/project");
        let config = MusubiConfig {
            wasm: Some(WasmConfig::default()),
            ..Default::default()
        };
        let options =
            ConfigLoader::resolve(Some(config), root.clone(), None, None, None, None).unwrap();

        let wasm = options.wasm.unwrap();
        assert_eq!(wasm.crate_dir, root);
        assert_eq!(wasm.out_dir, root.join("pkg"));
        assert_eq!(wasm.profile, "release");
        assert_eq!(wasm.target, "web");
        assert_eq!(wasm.command, "wasm-pack");
        assert!(wasm.out_name.is_none());
    }

    #[test]
    fn test_resolve_wasm_bad_profile() {
        let config = MusubiConfig {
            wasm: Some(WasmConfig {
                profile: Some("fastest".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result =
            ConfigLoader::resolve(Some(config), PathBuf::from("/p"), None, None, None, None);
        assert!(matches!(result, Err(MusubiError::Config(_))));
    }

    #[test]
    fn test_resolve_copy_rules() {
        let root = PathBuf::from("/project");
        let config = MusubiConfig {
            copy: Some(vec![
                CopyRuleConfig {
                    from: "static".to_string(),
                    to: None,
                },
                CopyRuleConfig {
                    from: "media".to_string(),
                    to: Some("assets".to_string()),
                },
            ]),
            ..Default::default()
        };
        let options =
            ConfigLoader::resolve(Some(config), root.clone(), None, None, None, None).unwrap();

        assert_eq!(options.copy_rules[0].from, root.join("static"));
        assert_eq!(options.copy_rules[0].to, root.join("dist"));
        assert_eq!(options.copy_rules[1].from, root.join("media"));
        assert_eq!(options.copy_rules[1].to, root.join("dist/assets"));
    }

    #[test]
    fn test_resolve_hints_off_in_development() {
        let options = ConfigLoader::resolve(
            None,
            PathBuf::from("/p"),
            Some(BuildMode::Development),
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(options.performance.hints, BudgetHints::Off);
    }

    #[test]
    fn test_resolve_hints_disabled() {
        let config = MusubiConfig {
            performance: Some(PerformanceConfig {
                hints: Some(HintsConfig::Toggle(false)),
                max_entrypoint_size: Some(512_000),
                max_asset_size: Some(512_000),
            }),
            ..Default::default()
        };
        let options =
            ConfigLoader::resolve(Some(config), PathBuf::from("/p"), None, None, None, None)
                .unwrap();
        assert_eq!(options.performance.hints, BudgetHints::Off);
        assert_eq!(options.performance.max_asset_size, 512_000);
    }

    #[test]
    fn test_generate_example_round_trips() {
        let example = ConfigLoader::generate_example();
        let parsed: MusubiConfig = serde_json::from_str(&example).unwrap();
        assert!(parsed.entry.is_some());
        assert!(parsed.wasm.is_some());
        assert!(example.contains("crateDirectory"));
        assert!(example.contains("maxEntrypointSize"));
    }
}
