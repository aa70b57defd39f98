//! Navigation state holding the query string.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;

/// How a query rewrite is recorded in the navigation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HistoryMode {
    /// Overwrite the current entry; no new back-button stop.
    #[default]
    Replace,
    /// Append a new entry, dropping any forward entries.
    Push,
}

/// The externally owned navigation state the filters live in.
///
/// A browser front end implements this over `location.search` and the History
/// API; [`MemoryLocation`] is the in-process implementation.
pub trait Location: Send + Sync {
    /// Current query string, without the leading `?`.
    fn query(&self) -> String;

    /// Moves to `query`, recording it per `mode`.
    fn navigate(&self, query: &str, mode: HistoryMode);

    /// Subscribes to query string changes from any source (including back/forward).
    fn subscribe(&self) -> watch::Receiver<String>;
}

#[derive(Debug)]
struct History {
    entries: Vec<String>,
    index: usize,
}

/// In-memory [`Location`] with a browser-like history stack.
///
/// ```rust
/// use storefront::query::{HistoryMode, Location, MemoryLocation};
///
/// let location = MemoryLocation::new("q=lap");
/// location.navigate("q=laptop", HistoryMode::Push);
/// assert!(location.back());
/// assert_eq!(location.query(), "q=lap");
/// ```
#[derive(Debug)]
pub struct MemoryLocation {
    history: Mutex<History>,
    current: watch::Sender<String>,
    navigations: AtomicU64,
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemoryLocation {
    /// Creates a location whose only history entry is `query`.
    pub fn new(query: impl Into<String>) -> Self {
        let query = strip_question_mark(query.into());
        Self {
            history: Mutex::new(History {
                entries: vec![query.clone()],
                index: 0,
            }),
            current: watch::channel(query).0,
            navigations: AtomicU64::new(0),
        }
    }

    /// Steps back one history entry. Returns `false` at the oldest entry.
    pub fn back(&self) -> bool {
        self.step(-1)
    }

    /// Steps forward one history entry. Returns `false` at the newest entry.
    pub fn forward(&self) -> bool {
        self.step(1)
    }

    /// Number of history entries.
    pub fn history_len(&self) -> usize {
        self.history.lock().entries.len()
    }

    /// All history entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.history.lock().entries.clone()
    }

    /// Number of [`navigate`](Location::navigate) calls so far.
    pub fn navigations(&self) -> u64 {
        self.navigations.load(Ordering::Relaxed)
    }

    fn step(&self, offset: isize) -> bool {
        let query = {
            let mut history = self.history.lock();
            let Some(index) = history.index.checked_add_signed(offset) else {
                return false;
            };
            if index >= history.entries.len() {
                return false;
            }
            history.index = index;
            history.entries[index].clone()
        };
        self.current.send_replace(query);
        true
    }
}

impl Location for MemoryLocation {
    fn query(&self) -> String {
        self.current.borrow().clone()
    }

    fn navigate(&self, query: &str, mode: HistoryMode) {
        let query = strip_question_mark(query.to_string());
        {
            let mut history = self.history.lock();
            match mode {
                HistoryMode::Replace => {
                    let index = history.index;
                    history.entries[index] = query.clone();
                }
                HistoryMode::Push => {
                    let keep = history.index + 1;
                    history.entries.truncate(keep);
                    history.entries.push(query.clone());
                    history.index = keep;
                }
            }
        }
        self.navigations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(query = %query, ?mode, "location updated");
        self.current.send_replace(query);
    }

    fn subscribe(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }
}

fn strip_question_mark(query: String) -> String {
    match query.strip_prefix('?') {
        Some(rest) => rest.to_string(),
        None => query,
    }
}
