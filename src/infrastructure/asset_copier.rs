use crate::core::{interfaces::FileSystemService, models::*};
use crate::utils::{files_identical, Logger, MusubiError, Result, Timer};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of the static asset stage.
#[derive(Debug, Default, Clone)]
pub struct CopyStats {
    pub copied: usize,
    pub skipped: usize,
    pub outputs: Vec<OutputFile>,
}

/// Copies static assets into the output directory verbatim. Files whose
/// content already matches the destination are left untouched so repeated
/// builds do not rewrite them.
pub struct AssetCopier {
    fs: Arc<dyn FileSystemService>,
}

impl AssetCopier {
    pub fn new(fs: Arc<dyn FileSystemService>) -> Self {
        Self { fs }
    }

    pub async fn copy_all(&self, rules: &[CopyRule]) -> Result<CopyStats> {
        let _timer = Timer::start("Copying static assets");
        let mut stats = CopyStats::default();

        for rule in rules {
            Logger::copying_assets(
                &rule.from.display().to_string(),
                &rule.to.display().to_string(),
            );
            let rule_stats = self.copy_rule(rule).await?;
            stats.copied += rule_stats.copied;
            stats.skipped += rule_stats.skipped;
            stats.outputs.extend(rule_stats.outputs);
        }

        stats.outputs.sort_by(|a, b| a.path.cmp(&b.path));
        Logger::assets_copied(stats.copied, stats.skipped);
        Ok(stats)
    }

    async fn copy_rule(&self, rule: &CopyRule) -> Result<CopyStats> {
        if !self.fs.file_exists(&rule.from) {
            return Err(MusubiError::FileNotFound(format!(
                "copy source {}",
                rule.from.display()
            )));
        }

        let pairs = self.collect_pairs(rule).await?;

        let concurrency = num_cpus::get().max(4);
        let results: Vec<Result<(OutputFile, bool)>> = stream::iter(pairs)
            .map(|(source, target)| {
                let fs = self.fs.clone();
                async move { copy_one(fs, source, target).await }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut stats = CopyStats::default();
        for result in results {
            let (output, was_copied) = result?;
            if was_copied {
                stats.copied += 1;
            } else {
                stats.skipped += 1;
            }
            stats.outputs.push(output);
        }

        Ok(stats)
    }

    /// Expand one rule into (source, target) file pairs. A file source maps
    /// to `to/<file name>`; a directory source is mirrored recursively.
    async fn collect_pairs(&self, rule: &CopyRule) -> Result<Vec<(PathBuf, PathBuf)>> {
        if rule.from.is_file() {
            let file_name = rule.from.file_name().ok_or_else(|| {
                MusubiError::build(format!("copy source {} has no file name", rule.from.display()))
            })?;
            return Ok(vec![(rule.from.clone(), rule.to.join(file_name))]);
        }

        let files = self.fs.list_files_recursive(&rule.from).await?;
        let mut pairs = Vec::with_capacity(files.len());

        for file in files {
            let relative = file.strip_prefix(&rule.from).map_err(|_| {
                MusubiError::build(format!(
                    "listed file {} is outside copy source {}",
                    file.display(),
                    rule.from.display()
                ))
            })?;
            pairs.push((file.clone(), rule.to.join(relative)));
        }

        Ok(pairs)
    }
}

async fn copy_one(
    fs: Arc<dyn FileSystemService>,
    source: PathBuf,
    target: PathBuf,
) -> Result<(OutputFile, bool)> {
    if target.is_file() && files_identical(&source, &target)? {
        let size = std::fs::metadata(&target).map_err(MusubiError::Io)?.len();
        return Ok((
            OutputFile {
                path: target,
                size,
                kind: OutputKind::Asset,
            },
            false,
        ));
    }

    let size = fs.copy_file(&source, &target).await?;
    Ok((
        OutputFile {
            path: target,
            size,
            kind: OutputKind::Asset,
        },
        true,
    ))
}
