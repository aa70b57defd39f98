//! Viewport-triggered pagination.
//!
//! A [`PaginationDriver`] watches a sentinel placed after the last item and
//! fires its trigger when the sentinel becomes visible and the supplied
//! enabled condition holds. It keeps no pagination state of its own.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};

/// Identifies a sentinel element. A re-rendered sentinel gets a new id.
pub type SentinelId = u64;

/// A visibility change of an observed sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intersection {
    /// The sentinel that changed.
    pub sentinel: SentinelId,
    /// Whether it now intersects the viewport.
    pub is_intersecting: bool,
}

/// Source of visibility changes, e.g. a browser `IntersectionObserver`.
pub trait IntersectionObserver: Send + Sync {
    /// Starts observing `sentinel`. Changes arrive on the returned channel
    /// until [`unobserve`](Self::unobserve) is called.
    fn observe(&self, sentinel: SentinelId) -> mpsc::UnboundedReceiver<Intersection>;

    /// Stops observing `sentinel`.
    fn unobserve(&self, sentinel: SentinelId);
}

type Condition = Arc<dyn Fn() -> bool + Send + Sync>;
type Trigger = Arc<dyn Fn() + Send + Sync>;

/// Fires a trigger when the observed sentinel scrolls into view.
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use storefront::viewport::{ManualObserver, PaginationDriver};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let observer = Arc::new(ManualObserver::new());
/// let fired = Arc::new(AtomicU32::new(0));
/// let counter = fired.clone();
///
/// let mut driver = PaginationDriver::new(
///     observer.clone(),
///     || true,
///     move || { counter.fetch_add(1, Ordering::SeqCst); },
/// );
/// driver.attach(1);
/// assert!(observer.is_observed(1));
///
/// drop(driver);
/// assert!(!observer.is_observed(1));
/// # }
/// ```
pub struct PaginationDriver {
    observer: Arc<dyn IntersectionObserver>,
    enabled: Condition,
    on_trigger: Trigger,
    sentinel: Option<SentinelId>,
    visible: Arc<AtomicBool>,
    triggers: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PaginationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationDriver")
            .field("sentinel", &self.sentinel)
            .field("visible", &self.visible.load(Ordering::Relaxed))
            .field("triggers", &self.triggers())
            .finish()
    }
}

impl PaginationDriver {
    /// Creates a driver; nothing is observed until [`attach`](Self::attach).
    ///
    /// `enabled` is evaluated on every visibility event, typically
    /// `has_more && !loading`.
    pub fn new(
        observer: Arc<dyn IntersectionObserver>,
        enabled: impl Fn() -> bool + Send + Sync + 'static,
        on_trigger: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            observer,
            enabled: Arc::new(enabled),
            on_trigger: Arc::new(on_trigger),
            sentinel: None,
            visible: Arc::new(AtomicBool::new(false)),
            triggers: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Observes `sentinel`, replacing any previously observed one.
    ///
    /// Must be called within a Tokio runtime.
    pub fn attach(&mut self, sentinel: SentinelId) {
        if self.sentinel == Some(sentinel) {
            return;
        }
        self.detach();

        let mut entries = self.observer.observe(sentinel);
        let enabled = Arc::clone(&self.enabled);
        let on_trigger = Arc::clone(&self.on_trigger);
        let visible = Arc::clone(&self.visible);
        let triggers = Arc::clone(&self.triggers);

        self.task = Some(tokio::spawn(async move {
            while let Some(entry) = entries.recv().await {
                visible.store(entry.is_intersecting, Ordering::SeqCst);
                if entry.is_intersecting && enabled() {
                    triggers.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(sentinel = entry.sentinel, "sentinel visible; loading more");
                    on_trigger();
                }
            }
        }));
        self.sentinel = Some(sentinel);
    }

    /// Stops observing. Safe to call when nothing is observed.
    pub fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(sentinel) = self.sentinel.take() {
            self.observer.unobserve(sentinel);
        }
        self.visible.store(false, Ordering::SeqCst);
    }

    /// Fires the trigger if the sentinel is still visible and the condition now holds.
    ///
    /// Visibility events only arrive on change, so a sentinel that stays in view
    /// after a short page needs this nudge once loading finishes.
    pub fn recheck(&self) -> bool {
        if self.visible.load(Ordering::SeqCst) && (self.enabled)() {
            self.triggers.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(sentinel = ?self.sentinel, "sentinel still visible; loading more");
            (self.on_trigger)();
            true
        } else {
            false
        }
    }

    /// The observed sentinel.
    pub fn sentinel(&self) -> Option<SentinelId> {
        self.sentinel
    }

    /// Number of times the trigger fired.
    pub fn triggers(&self) -> u64 {
        self.triggers.load(Ordering::Relaxed)
    }
}

impl Drop for PaginationDriver {
    fn drop(&mut self) {
        self.detach();
    }
}

/// [`IntersectionObserver`] driven by hand; for tests and non-visual front ends.
#[derive(Debug, Default)]
pub struct ManualObserver {
    observed: Mutex<HashMap<SentinelId, mpsc::UnboundedSender<Intersection>>>,
}

impl ManualObserver {
    /// Creates an observer with nothing observed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a visibility change. Returns `false` if `sentinel` is not observed.
    pub fn set_visible(&self, sentinel: SentinelId, visible: bool) -> bool {
        let observed = self.observed.lock();
        match observed.get(&sentinel) {
            Some(tx) => tx
                .send(Intersection {
                    sentinel,
                    is_intersecting: visible,
                })
                .is_ok(),
            None => false,
        }
    }

    /// Returns `true` if `sentinel` is observed.
    pub fn is_observed(&self, sentinel: SentinelId) -> bool {
        self.observed.lock().contains_key(&sentinel)
    }

    /// Number of observed sentinels.
    pub fn observed_count(&self) -> usize {
        self.observed.lock().len()
    }
}

impl IntersectionObserver for ManualObserver {
    fn observe(&self, sentinel: SentinelId) -> mpsc::UnboundedReceiver<Intersection> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observed.lock().insert(sentinel, tx);
        rx
    }

    fn unobserve(&self, sentinel: SentinelId) {
        self.observed.lock().remove(&sentinel);
    }
}
