//! Centralized shell output and timing.
//!
//! The Shell module provides a unified API for all operator-facing output:
//! - Status messages with consistent formatting
//! - Elapsed-time grading (green/yellow/red) for external commands and builds
//! - Scoped timing spans that report on every exit path
//! - Progress bars (via indicatif)
//!
//! A `Shell` carries the name of the top-level command it reports for. Ops
//! receive the shell explicitly instead of reading a process-wide "current
//! command".

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    /// Default: status messages + progress bars
    #[default]
    Normal,
    /// --verbose: command lines, debug info, no progress bars
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Finished,
    Ok,

    // In-progress statuses (cyan)
    Compiling,
    Linking,
    Running,
    Testing,
    Watching,

    // Info statuses (blue)
    Changed,
    Info,

    // Error status (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Ok => "Ok",
            Status::Compiling => "Compiling",
            Status::Linking => "Linking",
            Status::Running => "Running",
            Status::Testing => "Testing",
            Status::Watching => "Watching",
            Status::Changed => "Changed",
            Status::Info => "Info",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Ok => "\x1b[1;32m",
            Status::Compiling
            | Status::Linking
            | Status::Running
            | Status::Testing
            | Status::Watching => "\x1b[1;36m",
            Status::Changed | Status::Info => "\x1b[1;34m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Colour grade of an elapsed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Ok,
    Warn,
    Err,
}

impl Grade {
    fn color_code(&self) -> &'static str {
        match self {
            Grade::Ok => "\x1b[32m",
            Grade::Warn => "\x1b[33m",
            Grade::Err => "\x1b[31m",
        }
    }
}

/// Thresholds above which an elapsed time is shown as a warning or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub warn: Duration,
    pub err: Duration,
}

impl Thresholds {
    /// A single external command (compile, link, run).
    pub const COMMAND: Thresholds = Thresholds {
        warn: Duration::from_secs(2),
        err: Duration::from_secs(5),
    };

    /// A whole rebuild cycle of the watch loop.
    pub const BUILD: Thresholds = Thresholds {
        warn: Duration::from_secs(5),
        err: Duration::from_secs(30),
    };

    /// A test run of the test loop.
    pub const TEST: Thresholds = Thresholds {
        warn: Duration::from_millis(2500),
        err: Duration::from_secs(10),
    };

    /// Grade an elapsed duration. Limits are exclusive: exactly `warn` is still Ok.
    pub fn grade(&self, elapsed: Duration) -> Grade {
        if elapsed > self.err {
            Grade::Err
        } else if elapsed > self.warn {
            Grade::Warn
        } else {
            Grade::Ok
        }
    }
}

/// Central shell for all CLI output.
#[derive(Debug, Clone)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
    command: String,
}

impl Shell {
    /// Create a new shell.
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };

        Shell {
            verbosity,
            use_color,
            command: String::new(),
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, color)
    }

    /// A shell that reports on behalf of the named top-level command.
    pub fn for_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Name of the command this shell reports for (empty if none).
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`. In quiet mode only errors print.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }

        let prefix = self.format_status(status);
        eprintln!("{} {}", prefix, msg);
        let _ = io::stderr().flush();
    }

    /// Print an info message.
    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    /// Print an error message, tagged with the current command.
    pub fn error(&self, msg: impl Display) {
        if self.command.is_empty() {
            self.status(Status::Error, msg);
        } else {
            self.status(Status::Error, format!("[{}] {}", self.command, msg));
        }
    }

    /// Print a line only in verbose mode.
    pub fn verbose(&self, msg: impl Display) {
        if self.is_verbose() {
            self.status(Status::Info, msg);
        }
    }

    /// Print a message followed by a graded elapsed time.
    ///
    /// Format: `{status:>12} {message} {elapsed}`.
    pub fn timed(&self, status: Status, msg: impl Display, elapsed: Duration, thresholds: Thresholds) {
        let grade = thresholds.grade(elapsed);
        let time = format_duration(elapsed);
        let time = if self.use_color {
            format!("{}{}\x1b[0m", grade.color_code(), time)
        } else {
            time
        };
        self.status(status, format!("{} {}", msg, time));
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();

        if self.use_color {
            format!("{}{:>12}\x1b[0m", status.color_code(), text)
        } else {
            format!("{:>12}", text)
        }
    }

    /// Create a scoped span timing a top-level command.
    ///
    /// The total elapsed time is reported when the span is dropped, so it is
    /// printed on success, on `?` early returns and on panics alike.
    pub fn span(self: &Arc<Self>) -> Span {
        Span {
            shell: Arc::clone(self),
            start: Instant::now(),
        }
    }

    /// Create a progress bar. Quiet and verbose shells get a silent one.
    pub fn progress(&self, total: u64, msg: impl Display) -> Progress {
        Progress::new(self, total, msg.to_string())
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}

/// Scoped timer for a top-level command.
pub struct Span {
    shell: Arc<Shell>,
    start: Instant,
}

impl Drop for Span {
    fn drop(&mut self) {
        let msg = if self.shell.command.is_empty() {
            "Total time elapsed:".to_string()
        } else {
            format!("`{}` total time elapsed:", self.shell.command)
        };
        let elapsed = self.start.elapsed();
        self.shell
            .status(Status::Finished, format!("{} {}", msg, format_duration(elapsed)));
    }
}

/// Progress bar wrapper that respects shell verbosity.
pub struct Progress {
    pb: Option<ProgressBar>,
}

impl Progress {
    fn new(shell: &Shell, total: u64, message: String) -> Self {
        let pb = if shell.is_quiet() || shell.is_verbose() || total <= 1 {
            None
        } else {
            let pb = ProgressBar::new(total);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb.set_message(message);
            Some(pb)
        };

        Progress { pb }
    }

    /// Advance the bar.
    pub fn inc(&self, delta: u64) {
        if let Some(pb) = &self.pb {
            pb.inc(delta);
        }
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}

/// Format a duration in a human-readable way.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
