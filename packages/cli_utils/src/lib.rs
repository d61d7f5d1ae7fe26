#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the crime bot.
//!
//! Provides an `indicatif` spinner behind the [`ProgressCallback`] trait,
//! plus [`init_logger`] which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while the spinner redraws.

use std::sync::Arc;
use std::time::Duration;

use crime_bot_source::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// An `indicatif` [`ProgressBar`] that implements [`ProgressCallback`].
pub struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    /// Creates a spinner that counts rows as they are read. The total is
    /// never known up front for a CSV stream.
    #[must_use]
    pub fn rows_spinner(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} {human_pos} rows [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        Arc::new(Self { bar })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge`.
///
/// Filtered by `RUST_LOG`. Returns the [`MultiProgress`] that spinners must
/// be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Already set when called twice (e.g. in tests).
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_progress_to_bar() {
        let progress = IndicatifProgress {
            bar: ProgressBar::hidden(),
        };
        progress.inc(10_000);
        progress.inc(42);
        assert_eq!(progress.bar.position(), 10_042);

        progress.set_message("Loading incidents".to_string());
        assert_eq!(progress.bar.message(), "Loading incidents");

        progress.finish("done".to_string());
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn rows_spinner_attaches_to_multi() {
        let multi = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        let progress = IndicatifProgress::rows_spinner(&multi, "Loading incidents");
        progress.inc(5);
        progress.finish("5 incidents loaded".to_string());
    }

    #[test]
    fn init_logger_is_idempotent() {
        let _first = init_logger();
        let _second = init_logger();
    }
}
