//! Async Driver
//!
//! [`DependencyResolver`] only tracks eligibility. This module closes the
//! loop: it runs a future for every eligible node on a tokio [`JoinSet`] and
//! reports each outcome back to the resolver, until nothing is left to run.
//!
//! # How It Works
//!
//! 1. The resolver is fired with the sources and every source is queued.
//! 2. Queued nodes are spawned, up to `max_in_flight` at a time.
//! 3. As each task finishes, `Ok` resolves the node and queues whatever it
//!    unblocked; `Err` rejects it and records the error.
//! 4. With `fail_fast`, the first error aborts every in-flight task and
//!    nothing further is spawned.
//!
//! The resolver is only ever touched from the driving task, so no locking is
//! involved.

use std::collections::{HashSet, VecDeque};
use std::fmt::Display;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::DriverError;
use crate::graph::{DependencyResolver, NodeKey};

/// Settings for [`drive`].
///
/// Deserializable so hosts can load it with the rest of their configuration;
/// missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Upper bound on concurrently running nodes. `None` means unbounded.
    pub max_in_flight: Option<usize>,

    /// Stop at the first failed node instead of letting independent
    /// branches finish.
    pub fail_fast: bool,
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit.max(1));
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// What happened during a [`drive`].
#[derive(Debug)]
pub struct Report<Id, E> {
    /// Nodes whose work succeeded, in completion order.
    pub resolved: Vec<Id>,

    /// Nodes rejected, either because their work failed or because every one
    /// of their dependencies was rejected.
    pub rejected: Vec<Id>,

    /// The error returned by each failed node.
    pub errors: Vec<(Id, E)>,

    /// Whether in-flight work was aborted because of `fail_fast`.
    pub aborted: bool,
}

impl<Id, E> Report<Id, E> {
    fn new() -> Self {
        Self {
            resolved: Vec::new(),
            rejected: Vec::new(),
            errors: Vec::new(),
            aborted: false,
        }
    }

    /// True if every node that ran succeeded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.aborted
    }
}

/// Run `work` for `sources` and everything they unblock.
///
/// Each node is started at most once per call. Returns an error only if a
/// task panicked; failures reported by `work` itself end up in the report.
pub async fn drive<Id, F, Fut, E>(
    resolver: &mut DependencyResolver<Id>,
    sources: impl IntoIterator<Item = Id>,
    config: &DriverConfig,
    mut work: F,
) -> Result<Report<Id, E>, DriverError>
where
    Id: NodeKey + Send + 'static,
    F: FnMut(Id) -> Fut,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let sources: Vec<Id> = sources.into_iter().collect();
    resolver.fire(sources.iter().cloned());

    let mut queue: VecDeque<Id> = VecDeque::new();
    let mut started: HashSet<Id> = HashSet::new();
    for source in sources {
        if started.insert(source.clone()) {
            queue.push_back(source);
        }
    }

    let limit = config.max_in_flight.unwrap_or(usize::MAX).max(1);
    let mut tasks: JoinSet<(Id, Result<(), E>)> = JoinSet::new();
    let mut report = Report::new();
    let mut stopping = false;

    loop {
        while !stopping && tasks.len() < limit {
            let Some(id) = queue.pop_front() else {
                break;
            };
            let fut = work(id.clone());
            tasks.spawn(async move { (id, fut.await) });
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };

        let (id, outcome) = match joined {
            Ok(done) => done,
            Err(err) if err.is_cancelled() => continue,
            Err(err) => {
                tasks.abort_all();
                return Err(err.into());
            }
        };

        match outcome {
            Ok(()) => {
                let ready = resolver.resolve([id.clone()]);
                report.resolved.push(id);
                // Tasks that finished before the abort still land here
                if stopping {
                    continue;
                }
                for next in ready {
                    if started.insert(next.clone()) {
                        queue.push_back(next);
                    }
                }
            }
            Err(err) => {
                warn!(node = ?id, error = %err, "node work failed");
                report.rejected.extend(resolver.reject([id.clone()]));
                report.errors.push((id, err));

                if config.fail_fast && !stopping {
                    stopping = true;
                    report.aborted = !tasks.is_empty() || !queue.is_empty();
                    queue.clear();
                    tasks.abort_all();
                }
            }
        }
    }

    debug!(
        resolved = report.resolved.len(),
        rejected = report.rejected.len(),
        aborted = report.aborted,
        "drive finished"
    );
    Ok(report)
}
