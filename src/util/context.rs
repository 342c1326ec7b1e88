//! Global context for hotbuild operations.
//!
//! Resolves the project root (the directory holding `hotbuild.toml`, or the
//! working directory if there is none), loads the configuration and turns
//! configured relative directories into absolute paths.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_path, load_config, Config, CONFIG_FILE};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Directory all configured paths are relative to
    project_root: PathBuf,

    /// Merged configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context for the current working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::with_cwd(cwd)
    }

    /// Create a context for a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let project_root = find_project_root(&cwd).unwrap_or(cwd);
        let config = load_config(
            global_config_path().as_deref(),
            &project_root.join(CONFIG_FILE),
        )?;

        Ok(GlobalContext {
            project_root,
            config,
        })
    }

    /// Create a context from an explicit config file.
    pub fn with_config_file(path: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        let project_root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        let config = Config::load(&path)?;

        Ok(GlobalContext {
            project_root,
            config,
        })
    }

    /// Create a context from an in-memory configuration.
    pub fn from_parts(project_root: PathBuf, config: Config) -> Self {
        GlobalContext {
            project_root,
            config,
        }
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable configuration, for command-line overrides.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Absolute source root.
    pub fn src_dir(&self) -> PathBuf {
        self.project_root.join(&self.config.project.src_dir)
    }

    /// Absolute output directory.
    pub fn out_dir(&self) -> PathBuf {
        self.project_root.join(&self.config.project.out_dir)
    }

    /// Absolute path of the watch loop's linked artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.out_dir().join(&self.config.watch.artifact)
    }

    /// Absolute path of the `run` executable.
    pub fn executable_path(&self) -> PathBuf {
        self.out_dir().join(self.config.run_executable())
    }

    /// Ensure the output directory exists.
    pub fn ensure_out_dir(&self) -> Result<PathBuf> {
        let out = self.out_dir();
        crate::util::fs::ensure_dir(&out)?;
        Ok(out)
    }
}

/// Search `start` and its ancestors for `hotbuild.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}
