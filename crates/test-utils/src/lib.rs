//! Shared helpers for the `plugin-exec` test suites.

pub mod buffer;
pub mod builders;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use plugin_exec::logging::LOG_ENV;
use tracing_subscriber::EnvFilter;

/// Upper bound for any single async test body.
pub const TEST_DEADLINE: Duration = Duration::from_secs(20);

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness capture.
///
/// Honors the same `PLUGIN_EXEC_LOG` directive as the binary, defaulting to
/// `debug` so failing tests show guard and kill decisions.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Fail the test instead of hanging when an execution never resolves.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_DEADLINE, f).await {
        Ok(value) => value,
        Err(_) => panic!("execution did not resolve within {TEST_DEADLINE:?}"),
    }
}
