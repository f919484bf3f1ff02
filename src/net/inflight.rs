//! In-flight request accounting.
//!
//! # Responsibilities
//! - Count requests currently being served
//! - Hand out sequence numbers for tracing
//! - Let shutdown report how much work it is draining or abandoning
//! - Cancel every running handler when the drain deadline passes

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::watch;

use crate::http::response::reply;
use crate::observability::metrics;

/// Tracks requests in flight.
///
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct InFlightTracker {
    inner: Arc<Counters>,
}

#[derive(Debug)]
struct Counters {
    /// Current count of requests being served.
    active: AtomicU64,
    /// Total requests admitted since start; also the source of sequence numbers.
    admitted: AtomicU64,
    /// Latched once the drain deadline has passed.
    abandon: watch::Sender<bool>,
}

impl InFlightTracker {
    /// Create a new tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Counters {
                active: AtomicU64::new(0),
                admitted: AtomicU64::new(0),
                abandon: watch::Sender::new(false),
            }),
        }
    }

    /// Cancel every request still running, and any admitted later.
    pub fn abandon_all(&self) {
        self.inner.abandon.send_replace(true);
    }

    /// Whether [`abandon_all`](Self::abandon_all) has been called.
    pub fn is_abandoned(&self) -> bool {
        *self.inner.abandon.borrow()
    }

    /// Record a new request. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        let seq = self.inner.admitted.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::set_in_flight(active);
        InFlightGuard {
            inner: Arc::clone(&self.inner),
            seq,
        }
    }

    /// Current number of requests in flight.
    pub fn active_count(&self) -> u64 {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Total number of requests admitted.
    pub fn admitted_count(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }
}

impl Default for InFlightTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks one request's lifetime.
/// Decrements the active count when dropped, including when the request
/// future is cancelled.
#[derive(Debug)]
pub struct InFlightGuard {
    inner: Arc<Counters>,
    seq: u64,
}

impl InFlightGuard {
    /// Sequence number of this request.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let active = self.inner.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_in_flight(active);
        tracing::trace!(seq = self.seq, "Request finished");
    }
}

/// Middleware holding an [`InFlightGuard`] for the duration of each request.
///
/// Once the tracker is abandoned the handler future is dropped and the
/// client gets a 503.
pub async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let guard = tracker.track();
    let abandoned = tracker.inner.abandon.subscribe();
    tracing::trace!(seq = guard.seq(), path = %request.uri().path(), "Request admitted");

    let response = tokio::select! {
        response = next.run(request) => response,
        _ = wait_abandoned(abandoned) => {
            tracing::warn!(seq = guard.seq(), "Request abandoned at shutdown deadline");
            reply(StatusCode::SERVICE_UNAVAILABLE, "request abandoned during shutdown")
        }
    };
    drop(guard);
    response
}

async fn wait_abandoned(mut abandoned: watch::Receiver<bool>) {
    if abandoned.wait_for(|abandoned| *abandoned).await.is_err() {
        // Sender gone: nothing can abandon this request any more.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tower::ServiceExt;

    #[test]
    fn tracker_counts() {
        let tracker = InFlightTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.seq(), guard2.seq());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.admitted_count(), 2);
    }

    #[test]
    fn clones_share_counters() {
        let tracker = InFlightTracker::new();
        let other = tracker.clone();
        let _guard = other.track();
        assert_eq!(tracker.active_count(), 1);
    }

    fn stalled_app(tracker: &InFlightTracker) -> axum::Router {
        axum::Router::new()
            .route(
                "/",
                axum::routing::get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "done"
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                tracker.clone(),
                track_in_flight,
            ))
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn abandon_cancels_running_handler() {
        let tracker = InFlightTracker::new();
        let app = stalled_app(&tracker);
        let pending = tokio::spawn(app.oneshot(request()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(tracker.active_count(), 1);

        tracker.abandon_all();
        let response = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("abandoned handler should be dropped")
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn requests_after_abandon_are_refused() {
        let tracker = InFlightTracker::new();
        tracker.abandon_all();
        assert!(tracker.is_abandoned());

        let response = tokio::time::timeout(
            Duration::from_secs(1),
            stalled_app(&tracker).oneshot(request()),
        )
        .await
        .expect("handler should not run")
        .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(tracker.admitted_count(), 1);
        assert_eq!(tracker.active_count(), 0);
    }
}
