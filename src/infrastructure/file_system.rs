use crate::core::interfaces::FileSystemService;
use crate::utils::{MusubiError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct TokioFileSystemService;

#[async_trait::async_trait]
impl FileSystemService for TokioFileSystemService {
    async fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).await.map_err(MusubiError::Io)
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).await.map_err(MusubiError::Io)
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.write_bytes(path, content.as_bytes()).await
    }

    async fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            self.create_directory(parent).await?;
        }

        fs::write(path, content).await.map_err(MusubiError::Io)
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        if let Some(parent) = to.parent() {
            self.create_directory(parent).await?;
        }

        fs::copy(from, to).await.map_err(MusubiError::Io)
    }

    async fn create_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await.map_err(MusubiError::Io)
    }

    async fn list_files_recursive(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![path.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(MusubiError::Io)?;

            while let Some(entry) = entries.next_entry().await.map_err(MusubiError::Io)? {
                let entry_path = entry.path();
                let file_type = entry.file_type().await.map_err(MusubiError::Io)?;

                if file_type.is_dir() {
                    pending.push(entry_path);
                } else if file_type.is_file() {
                    files.push(entry_path);
                }
            }
        }

        // Stable ordering regardless of directory iteration order
        files.sort();
        Ok(files)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
