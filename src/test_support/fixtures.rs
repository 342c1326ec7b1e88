//! On-disk project fixtures.
//!
//! A [`ProjectFixture`] owns a temporary directory laid out like a real
//! project (`src/` sources, `out/` objects) and hands out the normalized
//! paths the scanner would produce for its files.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use crate::core::source::SourceLayout;
use crate::util::config::Config;
use crate::util::context::GlobalContext;
use crate::util::fs::{modified_time, normalize_path};

/// Set a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(time))
        .unwrap_or_else(|e| panic!("failed to set mtime of {}: {}", path.display(), e));
}

/// Temporary project tree.
pub struct ProjectFixture {
    tmp: TempDir,
}

impl ProjectFixture {
    /// Create an empty project with a `src/` directory.
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        ProjectFixture { tmp }
    }

    /// Add a file, relative to the project root.
    pub fn file(self, path: &str, contents: &str) -> Self {
        self.write(path, contents);
        self
    }

    /// Write (or overwrite) a file, relative to the project root.
    pub fn write(&self, path: &str, contents: &str) {
        let full = self.tmp.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full, contents).unwrap();
    }

    /// Push a file's modification time forward so pollers see a change.
    pub fn touch(&self, path: &str) {
        let full = self.tmp.path().join(path);
        let current = modified_time(&full).unwrap();
        set_mtime(&full, current + Duration::from_secs(10));
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Normalized path of a file under `src/`.
    pub fn src(&self, path: &str) -> PathBuf {
        normalize_path(&self.tmp.path().join("src").join(path))
    }

    /// Normalized path of a file under `out/`.
    pub fn out(&self, path: &str) -> PathBuf {
        normalize_path(&self.tmp.path().join("out").join(path))
    }

    /// Default `src/` → `out/` layout.
    pub fn layout(&self) -> SourceLayout {
        SourceLayout::new(self.tmp.path().join("src"), self.tmp.path().join("out"))
    }

    /// Context with the default configuration rooted at this project.
    pub fn context(&self) -> GlobalContext {
        self.context_with(Config::default())
    }

    /// Context with a custom configuration rooted at this project.
    pub fn context_with(&self, config: Config) -> GlobalContext {
        GlobalContext::from_parts(self.tmp.path().to_path_buf(), config)
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
