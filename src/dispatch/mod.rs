//! Packaging job dispatch.
//!
//! The dispatcher turns an accepted trigger (webhook or forced) into a
//! packaging job: it allocates the next process-wide job id and submits a
//! [`DispatchRequest`] to a [`PackageSink`]. Submission is fire-and-forget —
//! the gateway answers the network caller independent of packaging, nothing
//! is awaited, and a packaging failure never reaches the HTTP layer.
//!
//! The production sink ([`ChannelSink`]) forwards into an unbounded channel
//! whose receiver belongs to the packaging pipeline's task; tests substitute
//! a recording sink.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::registry::ProjectDescriptor;
use crate::types::JobId;

/// The immutable tuple handed to the packaging pipeline: a project snapshot
/// carrying the triggering tag, and the job's unique id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRequest {
    pub project: ProjectDescriptor,
    pub job: JobId,
}

/// Handoff point to the external packaging collaborator.
///
/// `submit` must not block and must not report the packaging outcome; the
/// relay's contract ends at the handoff.
pub trait PackageSink: Send + Sync {
    fn submit(&self, request: DispatchRequest);
}

/// Process-wide allocator for job ids.
///
/// Ids start at 1 and are strictly increasing; no two dispatches observe the
/// same id, even under concurrent requests.
#[derive(Debug, Default)]
pub struct JobCounter(AtomicU64);

impl JobCounter {
    pub fn new() -> Self {
        JobCounter::default()
    }

    /// Allocates the next job id.
    pub fn next(&self) -> JobId {
        JobId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Sequences id allocation and sink submission for accepted triggers.
#[derive(Clone)]
pub struct Dispatcher {
    counter: Arc<JobCounter>,
    sink: Arc<dyn PackageSink>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn PackageSink>) -> Self {
        Dispatcher {
            counter: Arc::new(JobCounter::new()),
            sink,
        }
    }

    /// Dispatches a packaging job for the given project snapshot.
    ///
    /// The snapshot must already carry the triggering tag (the registry
    /// update happens before dispatch). Returns the allocated job id.
    pub fn dispatch(&self, project: ProjectDescriptor) -> JobId {
        let job = self.counter.next();
        debug!(job = %job, repo = %project.repo, "submitting packaging job");
        self.sink.submit(DispatchRequest { project, job });
        job
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}

/// Production sink: forwards jobs into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DispatchRequest>,
}

/// Creates the channel-backed sink and the receiver the packaging pipeline
/// drains.
pub fn channel() -> (ChannelSink, mpsc::UnboundedReceiver<DispatchRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, rx)
}

impl PackageSink for ChannelSink {
    fn submit(&self, request: DispatchRequest) {
        // The receiver only disappears during shutdown; the already-decided
        // HTTP response is unaffected either way.
        if let Err(err) = self.tx.send(request) {
            warn!(job = %err.0.job, repo = %err.0.project.repo, "packaging channel closed; job dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{project, RecordingSink};

    #[test]
    fn job_ids_start_at_one_and_increase() {
        let counter = JobCounter::new();
        assert_eq!(counter.next(), JobId(1));
        assert_eq!(counter.next(), JobId(2));
        assert_eq!(counter.next(), JobId(3));
    }

    #[test]
    fn job_ids_unique_under_concurrency() {
        let counter = Arc::new(JobCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || (0..100).map(|_| counter.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<JobId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 800);
        assert_eq!(ids.first(), Some(&JobId(1)));
        assert_eq!(ids.last(), Some(&JobId(800)));
    }

    #[test]
    fn dispatch_allocates_and_submits() {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = Dispatcher::new(sink.clone());

        let job = dispatcher.dispatch(project("MyAddon"));
        assert_eq!(job, JobId(1));

        let requests = sink.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].job, JobId(1));
        assert_eq!(requests[0].project.repo, "MyAddon");
    }

    #[tokio::test]
    async fn channel_sink_delivers_requests() {
        let (sink, mut rx) = channel();
        let dispatcher = Dispatcher::new(Arc::new(sink));

        dispatcher.dispatch(project("MyAddon"));

        let request = rx.recv().await.unwrap();
        assert_eq!(request.job, JobId(1));
        assert_eq!(request.project.repo, "MyAddon");
    }

    #[tokio::test]
    async fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = channel();
        drop(rx);

        // Must not panic or block
        sink.submit(DispatchRequest {
            project: project("MyAddon"),
            job: JobId(1),
        });
    }
}
