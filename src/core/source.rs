//! Source files, translation units and output naming.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::util::config::ProjectConfig;
use crate::util::fs::normalize_path;

/// How a file participates in the build, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Compiled on its own into one object file.
    Implementation,
    /// Only ever reached through `#include`.
    Header,
    /// Included, but neither a known header nor implementation extension.
    Other,
}

/// A file discovered by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Normalized path; the file's identity.
    pub path: PathBuf,
    pub kind: SourceKind,
    /// Direct local includes, in discovery order.
    pub includes: Vec<PathBuf>,
    /// Modification time when the file was scanned.
    pub modified: Option<SystemTime>,
}

/// A compilable source paired with its object file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TranslationUnit {
    pub source: PathBuf,
    pub object: PathBuf,
}

/// Directory layout and extension rules of a project.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    src_dir: PathBuf,
    out_dir: PathBuf,
    source_extensions: Vec<String>,
    header_extensions: Vec<String>,
}

impl SourceLayout {
    /// Layout with the default extension sets.
    pub fn new(src_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        let defaults = ProjectConfig::default();
        SourceLayout {
            src_dir: normalize_path(&src_dir.into()),
            out_dir: normalize_path(&out_dir.into()),
            source_extensions: defaults.source_extensions,
            header_extensions: defaults.header_extensions,
        }
    }

    /// Layout from a project config, with directories resolved against `root`.
    pub fn from_config(root: &Path, project: &ProjectConfig) -> Self {
        SourceLayout {
            src_dir: normalize_path(&root.join(&project.src_dir)),
            out_dir: normalize_path(&root.join(&project.out_dir)),
            source_extensions: project.source_extensions.clone(),
            header_extensions: project.header_extensions.clone(),
        }
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Classify a path by extension.
    pub fn kind(&self, path: &Path) -> SourceKind {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return SourceKind::Other;
        };
        if self.source_extensions.iter().any(|e| e == ext) {
            SourceKind::Implementation
        } else if self.header_extensions.iter().any(|e| e == ext) {
            SourceKind::Header
        } else {
            SourceKind::Other
        }
    }

    /// The implementation file of a root component, e.g. `program` → `src/program.cpp`.
    pub fn root_source(&self, component: &str) -> Option<PathBuf> {
        self.source_extensions
            .iter()
            .map(|ext| self.src_dir.join(format!("{}.{}", component, ext)))
            .find(|p| p.is_file())
    }

    /// The same-named implementation file sitting next to a header, if any.
    pub fn implementation_for(&self, header: &Path) -> Option<PathBuf> {
        self.source_extensions
            .iter()
            .map(|ext| header.with_extension(ext))
            .find(|p| p.is_file())
    }

    /// Object file for a translation unit: the source path relative to the
    /// source root, moved under the output directory with an `o` extension.
    ///
    /// Sources outside the source root are mirrored under `<out>/_ext/`, by
    /// their path relative to the source root's parent when they live
    /// there, by their full path otherwise.
    pub fn object_path(&self, source: &Path) -> PathBuf {
        if let Ok(rel) = source.strip_prefix(&self.src_dir) {
            return self.out_dir.join(rel).with_extension("o");
        }

        let outside = self
            .src_dir
            .parent()
            .and_then(|parent| source.strip_prefix(parent).ok())
            .unwrap_or(source);
        let mirrored: PathBuf = outside
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        self.out_dir.join("_ext").join(mirrored).with_extension("o")
    }

    /// Pair a source file with its object.
    pub fn unit(&self, source: &Path) -> TranslationUnit {
        TranslationUnit {
            source: source.to_path_buf(),
            object: self.object_path(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_kind_by_extension() {
        let layout = SourceLayout::new("src", "out");
        assert_eq!(layout.kind(Path::new("src/a.cpp")), SourceKind::Implementation);
        assert_eq!(layout.kind(Path::new("src/a.c")), SourceKind::Implementation);
        assert_eq!(layout.kind(Path::new("src/a.h")), SourceKind::Header);
        assert_eq!(layout.kind(Path::new("src/a.hpp")), SourceKind::Header);
        assert_eq!(layout.kind(Path::new("src/a.inl")), SourceKind::Other);
        assert_eq!(layout.kind(Path::new("src/Makefile")), SourceKind::Other);
    }

    #[test]
    fn test_object_path_mirrors_source_tree() {
        let layout = SourceLayout::new("/p/src", "/p/out");
        assert_eq!(
            layout.object_path(Path::new("/p/src/scene.cpp")),
            PathBuf::from("/p/out/scene.o")
        );
        assert_eq!(
            layout.object_path(Path::new("/p/src/ui/button.cc")),
            PathBuf::from("/p/out/ui/button.o")
        );
    }

    #[test]
    fn test_object_path_mirrors_sources_outside_tree() {
        let layout = SourceLayout::new("/p/src", "/p/out");
        assert_eq!(
            layout.object_path(Path::new("/p/lib/net.cpp")),
            PathBuf::from("/p/out/_ext/lib/net.o")
        );
        assert_eq!(
            layout.object_path(Path::new("/elsewhere/extra.cpp")),
            PathBuf::from("/p/out/_ext/elsewhere/extra.o")
        );
        assert_ne!(
            layout.object_path(Path::new("/p/lib/net.cpp")),
            layout.object_path(Path::new("/p/src/net.cpp"))
        );
    }

    #[test]
    fn test_implementation_for_header() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("scene.h"), "").unwrap();
        std::fs::write(src.join("scene.cpp"), "").unwrap();
        std::fs::write(src.join("vec.h"), "").unwrap();

        let layout = SourceLayout::new(&src, tmp.path().join("out"));
        assert_eq!(
            layout.implementation_for(&src.join("scene.h")),
            Some(src.join("scene.cpp"))
        );
        assert_eq!(layout.implementation_for(&src.join("vec.h")), None);
    }

    #[test]
    fn test_root_source_uses_first_existing_extension() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("program.cc"), "").unwrap();

        let layout = SourceLayout::new(tmp.path(), tmp.path().join("out"));
        assert_eq!(layout.root_source("program"), Some(tmp.path().join("program.cc")));
        assert_eq!(layout.root_source("missing"), None);
    }
}
