//! Fan-out scheduler
//!
//! All probes are futures multiplexed on the calling task and joined with
//! `join_all`, which yields results in input order: each probe owns its slot,
//! so completion order never leaks into the output. The whole join is bounded
//! by the invocation deadline; a probe still pending at that point is dropped
//! (cancelling its request) and recorded as `deadline exceeded`.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, instrument, warn};

use crate::config::TargetSpec;
use crate::probe::{ProbeExecutor, ProbeOutcome, Transport};

/// Probe every target concurrently and return exactly one outcome per target,
/// in target order.
#[instrument(skip_all, fields(targets = targets.len()))]
pub async fn fan_out<T: Transport>(
    executor: &ProbeExecutor<T>,
    targets: &[Arc<TargetSpec>],
    deadline: Instant,
) -> Vec<ProbeOutcome> {
    let started_at = Utc::now();
    let start = Instant::now();

    let probes = targets.iter().map(|target| async move {
        match timeout_at(deadline, executor.probe(Arc::clone(target))).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(service = %target.name, "cancelled at invocation deadline");
                ProbeOutcome::deadline_exceeded(Arc::clone(target), start.elapsed(), started_at)
            }
        }
    });

    let outcomes = join_all(probes).await;
    debug!("all {} probes settled in {:?}", outcomes.len(), start.elapsed());
    outcomes
}
