//! Output artifacts that only appear at their final path once complete
//!
//! Content goes to a temporary file in the destination directory and is
//! renamed over the destination by `commit`. Dropping an uncommitted
//! artifact deletes the temporary file and leaves any previous artifact
//! untouched.

use crate::error::{MemcheckError, Result};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct ArtifactFile {
    path: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl ArtifactFile {
    /// Start writing the artifact that will end up at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir).map_err(|e| MemcheckError::output(&path, e))?;
        tracing::debug!("writing {} via {}", path.display(), temp.path().display());

        Ok(Self {
            path,
            writer: BufWriter::new(temp),
        })
    }

    /// Final destination
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write formatted text, naming the artifact on failure
    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| MemcheckError::output(&self.path, e))
    }

    /// Push buffered content to disk without publishing it
    pub fn sync(&mut self) -> Result<()> {
        self.writer
            .flush()
            .and_then(|_| self.writer.get_ref().as_file().sync_all())
            .map_err(|e| MemcheckError::output(&self.path, e))
    }

    /// Flush and atomically move the content to the final path
    pub fn commit(self) -> Result<PathBuf> {
        let Self { path, writer } = self;
        let temp = writer
            .into_inner()
            .map_err(|e| MemcheckError::output(&path, e.into_error()))?;
        temp.persist(&path)
            .map_err(|e| MemcheckError::output(&path, e.error))?;
        Ok(path)
    }
}

impl Write for ArtifactFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_commit_moves_content_into_place() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("report.txt");

        let mut artifact = ArtifactFile::create(&target).unwrap();
        artifact.write_str("hello\n").unwrap();
        assert!(!target.exists());

        let written = artifact.commit().unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello\n");
    }

    #[test]
    fn test_sync_does_not_publish() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("report.txt");
        fs::write(&target, "old").unwrap();

        let mut artifact = ArtifactFile::create(&target).unwrap();
        artifact.write_str("new").unwrap();
        artifact.sync().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");

        artifact.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_drop_without_commit_keeps_previous_artifact() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("report.txt");
        fs::write(&target, "previous run").unwrap();

        {
            let mut artifact = ArtifactFile::create(&target).unwrap();
            artifact.write_str("partial").unwrap();
        }

        assert_eq!(fs::read_to_string(&target).unwrap(), "previous run");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_commit_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("report.txt");
        fs::write(&target, "old").unwrap();

        let mut artifact = ArtifactFile::create(&target).unwrap();
        artifact.write_str("new").unwrap();
        artifact.commit().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_missing_directory_is_output_error() {
        let err = ArtifactFile::create("/nonexistent-dir/report.csv").err().unwrap();
        assert!(matches!(err, MemcheckError::Output { .. }));
        assert!(err.to_string().contains("/nonexistent-dir/report.csv"));
    }
}
