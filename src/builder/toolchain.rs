//! Compiler and linker collaborators.
//!
//! The scheduler only needs two operations: compile one source into one
//! object, and link a list of objects into an artifact. [`Toolchain`] is that
//! seam; [`GccToolchain`] drives any gcc-compatible driver (g++, clang++).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};

use crate::util::config::{ToolchainConfig, WatchConfig};
use crate::util::fs::ensure_dir;
use crate::util::process::{find_cxx_compiler, ProcessBuilder};

/// Result of one external compile or link step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub success: bool,
    pub elapsed: Duration,
    /// Process exit code, if the process exited normally.
    pub exit_code: Option<i32>,
}

impl StepOutcome {
    pub fn succeeded(elapsed: Duration) -> Self {
        StepOutcome {
            success: true,
            elapsed,
            exit_code: Some(0),
        }
    }

    pub fn failed(elapsed: Duration, exit_code: Option<i32>) -> Self {
        StepOutcome {
            success: false,
            elapsed,
            exit_code,
        }
    }
}

/// Kind of artifact a link produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// A shared library the running program reloads.
    Shared,
    /// A standalone executable.
    Executable,
}

/// Compile/link collaborator.
///
/// `Err` means the step could not be attempted at all (e.g. the compiler is
/// missing); a compiler that ran and rejected the input is `Ok` with
/// `success == false`.
pub trait Toolchain {
    /// Compile `source` into `object`.
    fn compile(&self, source: &Path, object: &Path) -> Result<StepOutcome>;

    /// Link `objects`, in order, into `output`.
    fn link(&self, objects: &[PathBuf], output: &Path, mode: LinkMode) -> Result<StepOutcome>;
}

/// gcc-compatible compiler driver.
#[derive(Debug, Clone)]
pub struct GccToolchain {
    cc: PathBuf,
    cflags: Vec<String>,
    ldflags: Vec<String>,
    shared_flags: Vec<String>,
}

impl GccToolchain {
    pub fn new(cc: impl Into<PathBuf>) -> Self {
        GccToolchain {
            cc: cc.into(),
            cflags: Vec::new(),
            ldflags: Vec::new(),
            shared_flags: vec!["-shared".to_string()],
        }
    }

    /// Build from configuration, detecting the compiler if none is set.
    pub fn from_config(toolchain: &ToolchainConfig, watch: &WatchConfig) -> Result<Self> {
        let cc = match &toolchain.cc {
            Some(cc) => cc.clone(),
            None => match find_cxx_compiler() {
                Some(cc) => cc,
                None => bail!(
                    "no C++ compiler found\n\
                     help: install g++ or clang++, set $CXX, or set `toolchain.cc` in hotbuild.toml"
                ),
            },
        };
        tracing::debug!("using compiler {}", cc.display());

        Ok(GccToolchain {
            cc,
            cflags: toolchain.cflags.clone(),
            ldflags: toolchain.ldflags.clone(),
            shared_flags: watch.link_flags.clone(),
        })
    }

    /// Command line for compiling one translation unit.
    pub fn compile_command(&self, source: &Path, object: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.cc)
            .arg("-c")
            .arg("-o")
            .arg(object)
            .arg(source)
            .args(&self.cflags)
    }

    /// Command line for linking objects into an artifact.
    pub fn link_command(&self, objects: &[PathBuf], output: &Path, mode: LinkMode) -> ProcessBuilder {
        let cmd = ProcessBuilder::new(&self.cc)
            .arg("-o")
            .arg(output)
            .args(objects)
            .args(&self.ldflags);
        match mode {
            LinkMode::Shared => cmd.args(&self.shared_flags),
            LinkMode::Executable => cmd,
        }
    }

    fn run(&self, cmd: ProcessBuilder) -> Result<StepOutcome> {
        let run = cmd.timed()?;
        if run.status.success() {
            Ok(StepOutcome::succeeded(run.elapsed))
        } else {
            Ok(StepOutcome::failed(run.elapsed, run.status.code()))
        }
    }
}

impl Toolchain for GccToolchain {
    fn compile(&self, source: &Path, object: &Path) -> Result<StepOutcome> {
        if let Some(parent) = object.parent() {
            ensure_dir(parent)?;
        }
        self.run(self.compile_command(source, object))
    }

    fn link(&self, objects: &[PathBuf], output: &Path, mode: LinkMode) -> Result<StepOutcome> {
        if let Some(parent) = output.parent() {
            ensure_dir(parent)?;
        }
        self.run(self.link_command(objects, output, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain() -> GccToolchain {
        let config = ToolchainConfig {
            cc: Some(PathBuf::from("g++")),
            cflags: vec!["-g".into(), "-Isdl/include".into()],
            ldflags: vec!["-lSDL2".into()],
        };
        GccToolchain::from_config(&config, &WatchConfig::default()).unwrap()
    }

    #[test]
    fn test_compile_command() {
        let cmd = toolchain().compile_command(Path::new("src/scene.cpp"), Path::new("out/scene.o"));
        assert_eq!(
            cmd.display_command(),
            "g++ -c -o out/scene.o src/scene.cpp -g -Isdl/include"
        );
    }

    #[test]
    fn test_shared_link_command() {
        let objects = vec![PathBuf::from("out/program.o"), PathBuf::from("out/scene.o")];
        let cmd = toolchain().link_command(&objects, Path::new("out/libgame.so"), LinkMode::Shared);
        assert_eq!(
            cmd.display_command(),
            "g++ -o out/libgame.so out/program.o out/scene.o -lSDL2 -shared"
        );
    }

    #[test]
    fn test_executable_link_command() {
        let objects = vec![PathBuf::from("out/scythe.o")];
        let cmd = toolchain().link_command(&objects, Path::new("out/scythe"), LinkMode::Executable);
        assert_eq!(cmd.display_command(), "g++ -o out/scythe out/scythe.o -lSDL2");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_compiler_is_unsuccessful_outcome() {
        let tmp = tempfile::TempDir::new().unwrap();
        let outcome = GccToolchain::new("false")
            .compile(&tmp.path().join("a.cpp"), &tmp.path().join("out/a.o"))
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(1));
    }

    #[test]
    fn test_missing_compiler_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = GccToolchain::new("no-such-compiler-xyz")
            .compile(&tmp.path().join("a.cpp"), &tmp.path().join("a.o"));
        assert!(result.is_err());
    }
}
