//! Progress UI (spinner) for transfer runs.

use std::sync::Arc;
use std::time::Duration;

use files_downloader::{ProgressSink, TracingProgress};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::terminal::StderrCapabilities;

/// Shows each progress message on a stderr spinner.
pub(crate) struct SpinnerProgress {
    spinner: ProgressBar,
}

impl SpinnerProgress {
    pub(crate) fn start() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner }
    }

    pub(crate) fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressSink for SpinnerProgress {
    fn emit(&self, message: &str) {
        debug!(target: "files_downloader::progress", "{message}");
        self.spinner.set_message(message.to_string());
    }
}

/// The sink a run reports to, plus the spinner to clear afterwards.
pub(crate) struct ProgressUi {
    pub(crate) sink: Arc<dyn ProgressSink>,
    spinner: Option<Arc<SpinnerProgress>>,
}

impl ProgressUi {
    /// Spinner when stderr can show one, otherwise progress goes to the log.
    pub(crate) fn start(stderr: StderrCapabilities, quiet: bool) -> Self {
        if stderr.spinner(quiet) {
            let spinner = Arc::new(SpinnerProgress::start());
            Self {
                sink: spinner.clone(),
                spinner: Some(spinner),
            }
        } else {
            Self {
                sink: Arc::new(TracingProgress),
                spinner: None,
            }
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish();
        }
    }

    pub(crate) fn has_spinner(&self) -> bool {
        self.spinner.is_some()
    }
}
