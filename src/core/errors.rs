//! Dependency scanning error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error while discovering or flattening include dependencies.
///
/// Every variant is fatal to the scan or build attempt that produced it.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no source file for root component `{component}` in {}", .src_dir.display())]
    MissingRoot {
        component: String,
        src_dir: PathBuf,
    },

    #[error("unresolvable #include \"{include}\" in {}", .from.display())]
    UnresolvableDependency { include: String, from: PathBuf },

    #[error(
        "{} and {} both compile to {}",
        .first.display(),
        .second.display(),
        .object.display()
    )]
    ObjectCollision {
        object: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to read source file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// A suggestion for the operator, if one applies.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            ScanError::MissingRoot { .. } => {
                Some("help: set `project.root` in hotbuild.toml to the component holding main()")
            }
            ScanError::UnresolvableDependency { .. } => Some(
                "help: quoted includes are looked up next to the including file, then under the source root",
            ),
            ScanError::ObjectCollision { .. } => Some(
                "help: object files drop the source extension; rename one of the sources",
            ),
            ScanError::Io { .. } => None,
        }
    }
}
