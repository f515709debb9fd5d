//! What the attached terminal can show, and stderr tracing setup.
//!
//! Stdout carries the JSON result, so logs and the spinner only ever go to
//! stderr and are judged by stderr's capabilities.

use std::ffi::OsString;
use std::io::{self, IsTerminal};

/// Snapshot of the environment signals that affect stderr output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StderrCapabilities {
    pub(crate) is_terminal: bool,
    pub(crate) dumb: bool,
    pub(crate) no_color_env: bool,
}

impl StderrCapabilities {
    pub(crate) fn detect() -> Self {
        Self::from_env(
            io::stderr().is_terminal(),
            std::env::var_os("TERM"),
            std::env::var_os("NO_COLOR"),
        )
    }

    fn from_env(is_terminal: bool, term: Option<OsString>, no_color: Option<OsString>) -> Self {
        Self {
            is_terminal,
            dumb: term.is_some_and(|value| value.eq_ignore_ascii_case("dumb")),
            no_color_env: no_color.is_some_and(|value| !value.is_empty()),
        }
    }

    /// ANSI colors in log lines, unless `--no-color`, `NO_COLOR` or `TERM=dumb`.
    pub(crate) fn ansi(self, no_color_flag: bool) -> bool {
        !(no_color_flag || self.no_color_env || self.dumb)
    }

    /// A spinner needs an interactive, non-dumb stderr and no `--quiet`.
    pub(crate) fn spinner(self, quiet: bool) -> bool {
        self.is_terminal && !self.dumb && !quiet
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `default_level`.
pub(crate) fn init_tracing(default_level: &str, ansi: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_env_filter(filter)
        .try_init();
}
