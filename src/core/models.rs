use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Build mode, mirroring the two webpack-style profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    pub fn is_production(&self) -> bool {
        matches!(self, BuildMode::Production)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Development => write!(f, "development"),
            BuildMode::Production => write!(f, "production"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(format!(
                "invalid mode '{}' (expected 'development' or 'production')",
                other
            )),
        }
    }
}

/// How source maps are emitted for each bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMapKind {
    /// No source map output.
    None,
    /// Separate `.map` file next to the bundle, referenced by a footer comment.
    External,
    /// Base64 data URL embedded in the bundle footer.
    Inline,
}

impl SourceMapKind {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SourceMapKind::None)
    }
}

/// One static copy rule, fully resolved: `from` is absolute, `to` is the
/// absolute destination directory inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRule {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Resolved options for the native module build stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasmOptions {
    /// Directory containing the crate's Cargo.toml.
    pub crate_dir: PathBuf,
    /// Where the toolchain writes its artifacts (absolute).
    pub out_dir: PathBuf,
    /// Override for the artifact base name.
    pub out_name: Option<String>,
    /// Build profile: "dev", "profiling" or "release".
    pub profile: String,
    /// Toolchain target, e.g. "web".
    pub target: String,
    /// Executable to invoke.
    pub command: String,
}

/// Resolved dev server options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevServerOptions {
    /// Directory served at `/` (defaults to the output directory).
    pub static_dir: PathBuf,
    /// Serve responses gzip-compressed.
    pub compress: bool,
    pub port: u16,
}

/// Whether budget overruns are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetHints {
    Off,
    Warning,
}

/// Advisory size budgets. Overruns log warnings and never fail a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetOptions {
    pub hints: BudgetHints,
    pub max_entrypoint_size: u64,
    pub max_asset_size: u64,
}

/// Fully resolved build configuration. All paths are absolute; entries are
/// ordered by name so repeated builds visit them identically.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Project root (the directory containing the config file).
    pub root: PathBuf,
    pub mode: BuildMode,
    pub entries: BTreeMap<String, PathBuf>,
    pub outdir: PathBuf,
    /// Output filename template, e.g. "[name].js".
    pub filename_template: String,
    pub minify: bool,
    pub source_maps: SourceMapKind,
    pub copy_rules: Vec<CopyRule>,
    pub wasm: Option<WasmOptions>,
    pub dev_server: DevServerOptions,
    pub performance: BudgetOptions,
}

impl BuildOptions {
    /// Expand the filename template for one entry.
    pub fn output_filename(&self, entry_name: &str) -> String {
        self.filename_template.replace("[name]", entry_name)
    }

    /// Absolute path of the bundle emitted for one entry.
    pub fn output_path(&self, entry_name: &str) -> PathBuf {
        self.outdir.join(self.output_filename(entry_name))
    }
}

/// Module kind, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    JavaScript,
    Wasm,
    Other,
}

impl ModuleType {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "js" | "mjs" | "cjs" => ModuleType::JavaScript,
            "wasm" => ModuleType::Wasm,
            _ => ModuleType::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(ModuleType::Other)
    }
}

/// One resolved module in an entry's dependency graph.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub path: PathBuf,
    pub content: String,
    pub module_type: ModuleType,
    /// Resolved paths of this module's static imports, in source order.
    pub dependencies: Vec<PathBuf>,
}

/// Result of a native module build: where the toolchain wrote, and which
/// artifacts still have to be placed in the output directory once bundling
/// is done.
#[derive(Debug, Clone)]
pub struct WasmBuildOutput {
    pub out_dir: PathBuf,
    /// Binary artifacts emitted into the output directory after bundling.
    pub pending_assets: Vec<PathBuf>,
    pub duration: Duration,
}

/// What kind of file a build emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Bundle,
    SourceMap,
    Asset,
    NativeArtifact,
}

/// One file written (or verified unchanged) by a build.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub size: u64,
    pub kind: OutputKind,
}

/// Which budget a file exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetKind {
    Entrypoint,
    Asset,
}

/// One advisory budget overrun.
#[derive(Debug, Clone)]
pub struct BudgetViolation {
    pub kind: BudgetKind,
    pub path: PathBuf,
    pub size: u64,
    pub gzip_size: u64,
    pub limit: u64,
}

impl fmt::Display for BudgetViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            BudgetKind::Entrypoint => "entrypoint",
            BudgetKind::Asset => "asset",
        };
        write!(
            f,
            "{} {} is {} bytes ({} gzipped), over the {} byte budget",
            what,
            self.path.display(),
            self.size,
            self.gzip_size,
            self.limit
        )
    }
}

/// Summary of one completed build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub modules_processed: usize,
    pub assets_copied: usize,
    pub assets_skipped: usize,
    pub output_files: Vec<OutputFile>,
    pub build_time: Duration,
    pub budget_violations: Vec<BudgetViolation>,
}

impl BuildResult {
    pub fn bundle_count(&self) -> usize {
        self.output_files
            .iter()
            .filter(|f| f.kind == OutputKind::Bundle)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_type_from_extension() {
        assert_eq!(ModuleType::from_extension("js"), ModuleType::JavaScript);
        assert_eq!(ModuleType::from_extension("mjs"), ModuleType::JavaScript);
        assert_eq!(ModuleType::from_extension("cjs"), ModuleType::JavaScript);
        assert_eq!(ModuleType::from_extension("wasm"), ModuleType::Wasm);
        assert_eq!(ModuleType::from_extension("css"), ModuleType::Other);
        assert_eq!(ModuleType::from_extension("png"), ModuleType::Other);
    }

    #[test]
    fn test_module_type_from_path() {
        assert_eq!(
            ModuleType::from_path(Path::new("src/index.js")),
            ModuleType::JavaScript
        );
        assert_eq!(
            ModuleType::from_path(Path::new("pkg/game_bg.wasm")),
            ModuleType::Wasm
        );
        assert_eq!(ModuleType::from_path(Path::new("Makefile")), ModuleType::Other);
    }

    #[test]
    fn test_build_mode_from_str() {
        assert_eq!(BuildMode::from_str("production"), Ok(BuildMode::Production));
        assert_eq!(BuildMode::from_str("prod"), Ok(BuildMode::Production));
        assert_eq!(BuildMode::from_str("development"), Ok(BuildMode::Development));
        assert!(BuildMode::from_str("staging").is_err());
    }

    #[test]
    fn test_output_filename_template() {
        let options = BuildOptions {
            root: PathBuf::from("/project"),
            mode: BuildMode::Production,
            entries: BTreeMap::new(),
            outdir: PathBuf::from("/project/dist"),
            filename_template: "[name].js".to_string(),
            minify: false,
            source_maps: SourceMapKind::External,
            copy_rules: Vec::new(),
            wasm: None,
            dev_server: DevServerOptions {
                static_dir: PathBuf::from("/project/dist"),
                compress: true,
                port: 8080,
            },
            performance: BudgetOptions {
                hints: BudgetHints::Warning,
                max_entrypoint_size: 250_000,
                max_asset_size: 250_000,
            },
        };

        assert_eq!(options.output_filename("index"), "index.js");
        assert_eq!(
            options.output_path("index"),
            PathBuf::from("/project/dist/index.js")
        );
        assert_eq!(options.output_filename("admin"), "admin.js");
    }

    #[test]
    fn test_budget_violation_display() {
        let violation = BudgetViolation {
            kind: BudgetKind::Entrypoint,
            path: PathBuf::from("dist/index.js"),
            size: 600_000,
            gzip_size: 180_000,
            limit: 512_000,
        };
        let message = violation.to_string();
        assert!(message.contains("entrypoint"));
        assert!(message.contains("600000"));
        assert!(message.contains("512000"));
    }
}
