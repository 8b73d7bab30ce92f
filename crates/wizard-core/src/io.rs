use crate::document;
use crate::error::Result;
use crate::session::Session;
use crate::steps::StepDefinition;
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// A reader never sees a half-written markdown file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Directory the CLI writes step outputs into. Created on first write.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Write one step's output as `{n}-{stepId}.md`.
    pub fn write_step(&self, index: usize, def: &StepDefinition, output: &str) -> Result<PathBuf> {
        let path = self.root.join(def.file_name(index));
        atomic_write(&path, output.as_bytes())?;
        tracing::debug!(path = %path.display(), bytes = output.len(), "step output written");
        Ok(path)
    }

    pub fn write_document(&self, session: &Session) -> Result<PathBuf> {
        let path = self.root.join(document::COMBINED_FILE_NAME);
        let doc = document::render(session, Utc::now());
        atomic_write(&path, doc.as_bytes())?;
        tracing::debug!(path = %path.display(), "combined document written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps;
    use crate::types::OutputKey;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/out.md");
        atomic_write(&path, b"data").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.md");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn output_dir_is_created_lazily() {
        let dir = TempDir::new().unwrap();
        let out = OutputDir::new(dir.path().join("output"));
        assert!(!out.path().exists());
        let path = out.write_step(0, steps::step(0).unwrap(), "# Stories").unwrap();
        assert_eq!(path.file_name().unwrap(), "1-businessAnalyst.md");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Stories");
    }

    #[test]
    fn writes_combined_document() {
        let dir = TempDir::new().unwrap();
        let out = OutputDir::new(dir.path());
        let mut s = Session::new("A CRM");
        s.outputs.insert(OutputKey::Requirements, "REQ".into());
        let path = out.write_document(&s).unwrap();
        assert_eq!(path.file_name().unwrap(), "COMPLETE-DOCUMENTATION.md");
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("## System Description\n\nA CRM"));
    }
}
