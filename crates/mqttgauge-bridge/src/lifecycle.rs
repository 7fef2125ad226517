//! Task shutdown.
//!
//! After the shutdown signal is sent, background tasks get a bounded grace
//! period to run their own exit paths (MQTT DISCONNECT, HTTP drain, queue
//! drain). Anything still running at the deadline is aborted.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Wait for `tasks` to finish, sharing one `grace` deadline.
///
/// Handles that already finished are skipped (their output may have been
/// taken by a `select!`). Returns how many tasks had to be aborted.
pub async fn join_within<T>(grace: Duration, tasks: Vec<(&'static str, JoinHandle<T>)>) -> usize {
    let deadline = Instant::now() + grace;
    let mut aborted = 0;

    for (task, mut handle) in tasks {
        if handle.is_finished() {
            continue;
        }
        match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(_)) => debug!(task, "task stopped"),
            Ok(Err(e)) => warn!(task, error = %e, "task failed during shutdown"),
            Err(_) => {
                warn!(task, "task did not stop in time, aborting");
                handle.abort();
                aborted += 1;
            }
        }
    }
    aborted
}
