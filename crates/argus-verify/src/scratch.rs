//! RAII guard for the uuid-named scratch file each verifier run writes its
//! proof artifact to. The file is removed on drop regardless of how the
//! verification attempt ends, mirroring the `finally: path.unlink()`
//! cleanup in the stage this crate implements.

use std::path::{Path, PathBuf};

pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub async fn write(dir: &Path, extension: &str, content: &str) -> std::io::Result<Self> {
        let filename = format!("argus_{}.{extension}", uuid::Uuid::new_v4().simple());
        let path = dir.join(filename);
        tokio::fs::write(&path, content).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to clean up verifier scratch file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path;
        {
            let scratch = ScratchFile::write(dir.path(), "lean", "theorem x : True := by trivial")
                .await
                .expect("write scratch file");
            path = scratch.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
