//! Logging setup and diagnostics.
//!
//! The engine logs through `tracing`. Hosts that do not install their own
//! subscriber can call [`init`].

use crate::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_filter`.
///
/// Returns `false` if a global subscriber was already set.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Report a recoverable input or service problem.
///
/// Loud (`warn`) when the facade runs with `debug`, otherwise only visible at `trace`.
pub fn diagnose(debug: bool, error: &Error) {
    if debug {
        tracing::warn!(error = %error, "goomaps diagnostic");
    } else {
        tracing::trace!(error = %error, "goomaps diagnostic");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessDocument, HeadlessService};
    use crate::{Config, Goomaps, MapOptions, MarkerSpec};
    use serde_json::json;
    use std::io;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use tracing::Level;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Add a marker without a position and return everything logged meanwhile.
    fn log_of_missing_position(config: Config) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut goomaps = Goomaps::new(
                Rc::new(HeadlessService::new()),
                Rc::new(HeadlessDocument::new()),
                config,
            );
            goomaps.init(&["map"], &MapOptions::new()).unwrap();
            let report = goomaps
                .set_markers(&["map"], &[MarkerSpec::new(json!({"title": "lost"}))])
                .unwrap();
            assert_eq!(report.skipped.len(), 1);
        });

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn skipped_marker_warns_in_debug_mode() {
        let log = log_of_missing_position(Config::default().with_debug(true));
        assert!(log
            .lines()
            .any(|line| line.contains("WARN") && line.contains("must be provided with a position")));
    }

    #[test]
    fn skipped_marker_stays_at_trace_without_debug() {
        let log = log_of_missing_position(Config::default());
        assert!(!log.lines().any(|line| line.contains("WARN")));
        assert!(log
            .lines()
            .any(|line| line.contains("TRACE") && line.contains("must be provided with a position")));
    }

    #[test]
    fn init_is_idempotent() {
        init("goomaps_engine=debug");
        assert!(!init("goomaps_engine=debug"));
    }
}
