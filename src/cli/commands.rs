use crate::core::{interfaces::*, models::*, services::MusubiBuildService};
use crate::infrastructure::{DevServer, OxcJsProcessor, TokioFileSystemService, WasmPackBuilder};
use crate::utils::{
    ConfigLoader, Logger, MusubiError, MusubiUI, MusubiWatcher, Result, WatchConfig,
    CONFIG_FILE_NAME,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Parser)]
#[command(name = "musubi")]
#[command(version)]
#[command(about = "Musubi - ties WebAssembly, JavaScript and static assets into one build")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the build pipeline once
    Build {
        /// Root directory (where musubi.config.json lives)
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Build mode: production or development
        #[arg(short, long)]
        mode: Option<BuildMode>,
        /// Output directory
        #[arg(short, long)]
        outdir: Option<String>,
        /// Force minification on
        #[arg(long, conflicts_with = "no_minify")]
        minify: bool,
        /// Force minification off
        #[arg(long)]
        no_minify: bool,
    },
    /// Build, then serve the output with live reload
    Serve {
        /// Root directory (where musubi.config.json lives)
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write an example musubi.config.json
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        directory: String,
    },
    /// Show bundler information
    Info,
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> Result<()> {
        // Initialize logging
        Logger::init();

        let cli = Cli::parse();

        match cli.command {
            Commands::Build {
                root,
                mode,
                outdir,
                minify,
                no_minify,
            } => {
                let minify = if minify {
                    Some(true)
                } else if no_minify {
                    Some(false)
                } else {
                    None
                };
                self.handle_build_command(&root, mode, outdir.as_deref(), minify)
                    .await
            }
            Commands::Serve { root, port } => self.handle_serve_command(&root, port).await,
            Commands::Init { directory } => self.handle_init_command(&directory).await,
            Commands::Info => self.handle_info_command().await,
        }
    }

    async fn handle_build_command(
        &self,
        root: &str,
        mode: Option<BuildMode>,
        outdir: Option<&str>,
        minify: Option<bool>,
    ) -> Result<()> {
        let root = resolve_root(root)?;
        let file_config = ConfigLoader::load_from_file(&root)?;
        let options = ConfigLoader::resolve(file_config, root, mode, outdir, minify, None)?;
        ConfigLoader::validate_entries(&options)?;

        let mut build_service = Self::build_service();
        build_service.build(&options).await?;
        Ok(())
    }

    async fn handle_serve_command(&self, root: &str, port: Option<u16>) -> Result<()> {
        let root = resolve_root(root)?;
        let file_config = ConfigLoader::load_from_file(&root)?;
        let mut options = ConfigLoader::resolve(
            file_config,
            root,
            Some(BuildMode::Development),
            None,
            None,
            port,
        )?;
        // Serving is for iteration: inline maps, readable output
        options.minify = false;
        options.source_maps = SourceMapKind::Inline;
        ConfigLoader::validate_entries(&options)?;

        let mut build_service = Self::build_service();
        build_service.build(&options).await?;

        let (reload_tx, _) = broadcast::channel(16);

        let watcher = MusubiWatcher::new(WatchConfig::default(), options.clone())
            .with_reload_channel(reload_tx.clone());
        tokio::spawn(async move {
            if let Err(e) = watcher.watch(&mut build_service).await {
                Logger::error(&format!("Watcher stopped: {}", e));
            }
        });

        let ui = MusubiUI::new();
        ui.show_serving(
            options.dev_server.port,
            &options.dev_server.static_dir.display().to_string(),
        );

        let server = DevServer::new(options.dev_server.clone(), reload_tx);
        server.serve().await
    }

    async fn handle_init_command(&self, directory: &str) -> Result<()> {
        let dir = PathBuf::from(directory);
        tokio::fs::create_dir_all(&dir).await.map_err(MusubiError::Io)?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(MusubiError::config(format!(
                "{} already exists",
                config_path.display()
            )));
        }

        tokio::fs::write(&config_path, ConfigLoader::generate_example())
            .await
            .map_err(MusubiError::Io)?;

        Logger::info(&format!("📝 Created {}", config_path.display()));
        Logger::info("   Edit the entry points, then run: musubi build");
        Ok(())
    }

    async fn handle_info_command(&self) -> Result<()> {
        tracing::info!("🪢 Musubi v{}", env!("CARGO_PKG_VERSION"));
        tracing::info!("══════════════════════════════════════");
        tracing::info!("Ties WebAssembly, JavaScript and static assets into one build");
        tracing::info!("");
        tracing::info!("🏗️  Pipeline:");
        tracing::info!("  1. wasm-pack compiles the Rust crate to a WebAssembly package");
        tracing::info!("  2. Static assets are copied verbatim into the output directory");
        tracing::info!("  3. Each entry is bundled into a single script with a source map");
        tracing::info!("");
        tracing::info!("🎯 Features:");
        tracing::info!("  • Config file: {}", CONFIG_FILE_NAME);
        tracing::info!("  • oxc-powered syntax checking and minification");
        tracing::info!("  • Content-addressed build cache (memory + disk)");
        tracing::info!("  • Advisory size budgets");
        tracing::info!("  • Dev server with gzip and live reload");
        Ok(())
    }

    fn build_service() -> MusubiBuildService {
        MusubiBuildService::new(
            Arc::new(TokioFileSystemService),
            Arc::new(OxcJsProcessor::new()),
            Arc::new(WasmPackBuilder::new()),
        )
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonicalize the project root so every derived path is absolute.
fn resolve_root(root: &str) -> Result<PathBuf> {
    Path::new(root).canonicalize().map_err(|e| {
        MusubiError::config(format!("project root '{}' is not accessible: {}", root, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_args_parse() {
        let cli = Cli::parse_from(["musubi", "build", "--mode", "development", "-o", "out"]);
        match cli.command {
            Commands::Build {
                mode,
                outdir,
                minify,
                no_minify,
                ..
            } => {
                assert_eq!(mode, Some(BuildMode::Development));
                assert_eq!(outdir.as_deref(), Some("out"));
                assert!(!minify);
                assert!(!no_minify);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_minify_flags_conflict() {
        let result = Cli::try_parse_from(["musubi", "build", "--minify", "--no-minify"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_args_parse() {
        let cli = Cli::parse_from(["musubi", "serve", "-p", "3000"]);
        match cli.command {
            Commands::Serve { port, .. } => assert_eq!(port, Some(3000)),
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_bad_mode_is_rejected() {
        let result = Cli::try_parse_from(["musubi", "build", "--mode", "staging"]);
        assert!(result.is_err());
    }
}
