use crate::core::{interfaces::WasmBuilder, models::*};
use crate::utils::{Logger, MusubiError, Result};
use std::time::Instant;
use tokio::process::Command;

/// Runs the external wasm-pack toolchain to build a Rust crate into a
/// WebAssembly package before bundling starts.
pub struct WasmPackBuilder;

impl WasmPackBuilder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl WasmBuilder for WasmPackBuilder {
    async fn build(&self, options: &WasmOptions) -> Result<WasmBuildOutput> {
        let start = Instant::now();
        Logger::wasm_build_start(&options.crate_dir.display().to_string());

        let args = command_args(options);
        let output = Command::new(&options.command)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                MusubiError::wasm(format!("failed to run '{}': {}", options.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusubiError::wasm(format!(
                "'{}' exited with {}\n{}",
                options.command,
                output.status,
                stderr.trim_end()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            Logger::debug(&format!("{} output:\n{}", options.command, stdout.trim_end()));
        }

        let pending_assets = discover_binaries(&options.out_dir).await?;
        let duration = start.elapsed();
        Logger::wasm_build_complete(pending_assets.len(), duration);

        Ok(WasmBuildOutput {
            out_dir: options.out_dir.clone(),
            pending_assets,
            duration,
        })
    }
}

impl Default for WasmPackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn command_args(options: &WasmOptions) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        options.crate_dir.display().to_string(),
        format!("--{}", options.profile),
        "--target".to_string(),
        options.target.clone(),
        "--out-dir".to_string(),
        options.out_dir.display().to_string(),
    ];

    if let Some(out_name) = &options.out_name {
        args.push("--out-name".to_string());
        args.push(out_name.clone());
    }

    args
}

/// The .wasm binaries the toolchain wrote, sorted for stable output order.
async fn discover_binaries(out_dir: &std::path::Path) -> Result<Vec<std::path::PathBuf>> {
    let mut binaries = Vec::new();
    let mut entries = tokio::fs::read_dir(out_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if ModuleType::from_path(&path) == ModuleType::Wasm {
            binaries.push(path);
        }
    }

    binaries.sort();
    Ok(binaries)
}
