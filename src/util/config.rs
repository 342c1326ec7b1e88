//! Configuration file support for hotbuild.
//!
//! Two configuration file locations are read:
//! - Global: `~/.hotbuild/config.toml` - user-wide toolchain defaults
//! - Project: `hotbuild.toml` at the project root
//!
//! Project values take precedence over global ones. A missing file yields
//! the defaults, which match the layout `src/` → `out/` with `program` as
//! the root component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "hotbuild.toml";

/// hotbuild configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Source layout
    pub project: ProjectConfig,

    /// Compiler and flags
    pub toolchain: ToolchainConfig,

    /// Watch loop settings
    pub watch: WatchConfig,

    /// One-shot build-and-run settings
    pub run: RunConfig,

    /// Test loop settings
    pub test: TestConfig,
}

/// Where sources live and how they are classified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root component; scanning starts at `<src_dir>/<root>.<impl ext>`
    pub root: String,

    /// Source root, relative to the project root
    pub src_dir: PathBuf,

    /// Output directory, relative to the project root
    pub out_dir: PathBuf,

    /// Extensions of translation units, in lookup order
    pub source_extensions: Vec<String>,

    /// Extensions of headers
    pub header_extensions: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            root: "program".to_string(),
            src_dir: PathBuf::from("src"),
            out_dir: PathBuf::from("out"),
            source_extensions: vec!["cpp".into(), "cc".into(), "cxx".into(), "c".into()],
            header_extensions: vec!["h".into(), "hpp".into(), "hh".into()],
        }
    }
}

/// Compiler driver and flags shared by compile and link steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Compiler driver (e.g. /usr/bin/g++). Auto-detected if unset.
    pub cc: Option<PathBuf>,

    /// Flags passed to every compile
    pub cflags: Vec<String>,

    /// Flags passed to every link
    pub ldflags: Vec<String>,
}

impl ToolchainConfig {
    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ToolchainConfig) {
        if other.cc.is_some() {
            self.cc = other.cc;
        }
        if !other.cflags.is_empty() {
            self.cflags = other.cflags;
        }
        if !other.ldflags.is_empty() {
            self.ldflags = other.ldflags;
        }
    }
}

/// Watch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Linked artifact, relative to the output directory
    pub artifact: String,

    /// Extra flags for the artifact link (on top of toolchain ldflags)
    pub link_flags: Vec<String>,

    /// Delay between polls
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            artifact: default_shared_artifact(),
            link_flags: vec!["-shared".into()],
            poll_interval_ms: 100,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_shared_artifact() -> String {
    if cfg!(windows) {
        "game.dll".to_string()
    } else {
        "libgame.so".to_string()
    }
}

/// `run` settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Root component of the executable (defaults to `project.root`)
    pub root: Option<String>,

    /// Executable name, relative to the output directory (defaults to the root name)
    pub executable: Option<String>,

    /// Arguments passed to the executable
    pub args: Vec<String>,
}

/// Test loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestConfig {
    /// Shell command executed on every change
    pub command: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        TestConfig {
            command: "sh ./test.sh".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Root component for `run`.
    pub fn run_root(&self) -> &str {
        self.run.root.as_deref().unwrap_or(&self.project.root)
    }

    /// Executable name for `run`.
    pub fn run_executable(&self) -> String {
        let name = self
            .run
            .executable
            .clone()
            .unwrap_or_else(|| self.run_root().to_string());
        if cfg!(windows) && !name.ends_with(".exe") {
            format!("{}.exe", name)
        } else {
            name
        }
    }
}

/// Global configuration holds toolchain defaults only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GlobalConfig {
    toolchain: ToolchainConfig,
}

/// Load merged configuration.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`hotbuild.toml`)
/// 2. Global config (`~/.hotbuild/config.toml`, toolchain section only)
/// 3. Defaults
///
/// A project config that exists but does not parse is an error; a broken
/// global config only logs a warning.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut toolchain = ToolchainConfig::default();

    if let Some(global_path) = global_path.filter(|p| p.exists()) {
        match std::fs::read_to_string(global_path)
            .map_err(anyhow::Error::from)
            .and_then(|s| toml::from_str::<GlobalConfig>(&s).map_err(anyhow::Error::from))
        {
            Ok(global) => toolchain.merge(global.toolchain),
            Err(e) => tracing::warn!(
                "Failed to load global config from {}: {}",
                global_path.display(),
                e
            ),
        }
    }

    let mut config = if project_path.exists() {
        Config::load(project_path)?
    } else {
        tracing::debug!("no {} found, using defaults", project_path.display());
        Config::default()
    };

    toolchain.merge(std::mem::take(&mut config.toolchain));
    config.toolchain = toolchain;

    Ok(config)
}

/// Get the global hotbuild config directory (~/.hotbuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".hotbuild"))
}

/// Get the global config path (~/.hotbuild/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
