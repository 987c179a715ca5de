use crate::utils::{MusubiError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The slice of package.json the resolver cares about.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct PackageManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub browser: Option<BrowserField>,
}

impl PackageManifest {
    /// Browser field as an entry path. Object-form replacement maps are
    /// not applied.
    fn browser_entry(&self) -> Option<&str> {
        match &self.browser {
            Some(BrowserField::String(path)) => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BrowserField {
    String(String),
    Object(HashMap<String, serde_json::Value>),
}

const FILE_EXTENSIONS: &[&str] = &[".js", ".mjs", ".cjs", ".json", ".wasm"];
const INDEX_FILES: &[&str] = &["index.js", "index.mjs", "index.cjs", "index.json"];

/// Node.js-style module resolution
pub struct ModuleResolver {
    manifest_cache: DashMap<PathBuf, PackageManifest>,
}

impl ModuleResolver {
    pub fn new() -> Self {
        Self {
            manifest_cache: DashMap::new(),
        }
    }

    /// Resolve an import specifier to a file on disk.
    ///
    /// Relative and root-absolute specifiers resolve against the importer
    /// and project root; bare specifiers walk up through node_modules.
    pub async fn resolve(
        &self,
        specifier: &str,
        importer: &Path,
        project_root: &Path,
    ) -> Result<PathBuf> {
        let resolved = if specifier.starts_with("./") || specifier.starts_with("../") {
            match importer.parent() {
                Some(dir) => self.try_path(&dir.join(specifier)).await,
                None => None,
            }
        } else if let Some(rooted) = specifier.strip_prefix('/') {
            self.try_path(&project_root.join(rooted)).await
        } else {
            self.search_node_modules(specifier, importer, project_root)
                .await
        };

        resolved.ok_or_else(|| MusubiError::resolve(specifier.to_string(), importer.to_path_buf()))
    }

    /// Looks for `node_modules/<name>` in the importer's directory and
    /// every ancestor, stopping at the project root.
    async fn search_node_modules(
        &self,
        specifier: &str,
        importer: &Path,
        project_root: &Path,
    ) -> Option<PathBuf> {
        let (name, subpath) = split_specifier(specifier);
        let start = importer.parent()?;

        for dir in start.ancestors() {
            let package_dir = dir.join("node_modules").join(&name);
            if package_dir.is_dir() {
                if let Some(entry) = self.package_entry(&package_dir, subpath.as_deref()).await {
                    return Some(entry);
                }
            }
            if dir == project_root {
                break;
            }
        }

        None
    }

    async fn package_entry(&self, package_dir: &Path, subpath: Option<&str>) -> Option<PathBuf> {
        // Subpath imports skip the manifest entry fields
        if let Some(subpath) = subpath {
            return self.try_path(&package_dir.join(subpath)).await;
        }

        if let Some(manifest) = self.load_manifest(&package_dir.join("package.json")).await {
            // Entry fields in browser-bundler preference order
            // TODO: support the "exports" field for modern packages
            let fields = [
                manifest.module.as_deref(),
                manifest.browser_entry(),
                manifest.main.as_deref(),
            ];
            for field in fields.into_iter().flatten() {
                if let Some(found) = self.try_file(&package_dir.join(field)).await {
                    return Some(found);
                }
            }
        }

        self.try_path(&package_dir.join("index")).await
    }

    /// File lookup first, then directory conventions.
    async fn try_path(&self, path: &Path) -> Option<PathBuf> {
        if let Some(file) = self.try_file(path).await {
            return Some(file);
        }
        if path.is_dir() {
            self.directory_entry(path).await
        } else {
            None
        }
    }

    async fn directory_entry(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(manifest) = self.load_manifest(&dir.join("package.json")).await {
            if let Some(main) = &manifest.main {
                // File lookup only: a directory-valued main would recurse
                if let Some(found) = self.try_file(&dir.join(main)).await {
                    return Some(found);
                }
            }
        }

        for index in INDEX_FILES {
            let candidate = dir.join(index);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    }

    /// The exact path, then the path with each known extension appended.
    /// Appending (not replacing) keeps dots in file stems intact.
    async fn try_file(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }

        let base = path.as_os_str().to_owned();
        for ext in FILE_EXTENSIONS {
            let mut candidate = base.clone();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    }

    async fn load_manifest(&self, path: &Path) -> Option<PackageManifest> {
        if let Some(hit) = self.manifest_cache.get(path) {
            return Some(hit.clone());
        }

        let text = tokio::fs::read_to_string(path).await.ok()?;
        let manifest: PackageManifest = serde_json::from_str(&text).ok()?;
        self.manifest_cache
            .insert(path.to_path_buf(), manifest.clone());

        Some(manifest)
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a bare specifier into package name and optional subpath.
/// Scoped names keep their first two segments.
fn split_specifier(specifier: &str) -> (String, Option<String>) {
    if let Some(rest) = specifier.strip_prefix('@') {
        let mut parts = rest.splitn(3, '/');
        let scope = parts.next().unwrap_or_default();
        return match (parts.next(), parts.next()) {
            (Some(name), Some(sub)) => (format!("@{}/{}", scope, name), Some(sub.to_string())),
            _ => (specifier.to_string(), None),
        };
    }

    match specifier.split_once('/') {
        Some((name, sub)) => (name.to_string(), Some(sub.to_string())),
        None => (specifier.to_string(), None),
    }
}
