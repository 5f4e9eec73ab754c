use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::TallyError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_missing_dirs() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("public"));

        storage.write_file("counts.xlsx", b"first").await.unwrap();
        storage.write_file("counts.xlsx", b"second").await.unwrap();

        assert_eq!(storage.read_file("counts.xlsx").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.read_file("counts.xlsx").await.unwrap_err();
        assert!(matches!(err, TallyError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
