//! Debounced values.
//!
//! A [`Debouncer`] holds two values: the *input*, updated immediately on every
//! [`set`](Debouncer::set), and the *settled* value, which only follows the
//! input once it has been stable for the full delay. Every new input restarts
//! the delay, so a burst of keystrokes produces a single emission.
//!
//! ```rust
//! use std::time::Duration;
//! use storefront::Debouncer;
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let search = Debouncer::new(String::new(), Duration::from_millis(400));
//! let mut settled = search.subscribe();
//!
//! search.set("a".to_string());
//! search.set("ab".to_string());
//! assert_eq!(search.input(), "ab");
//!
//! settled.changed().await.unwrap();
//! assert_eq!(*settled.borrow(), "ab");
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};

/// Delays propagation of a rapidly changing value.
///
/// Dropping the debouncer cancels any pending emission; subscribers then see
/// the channel close without a late value.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    settled: Arc<watch::Sender<T>>,
    delay: Duration,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + std::fmt::Debug + 'static,
{
    /// Creates a debouncer whose input and settled value both start at `initial`.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let settled = Arc::new(watch::channel(initial).0);
        let task = tokio::spawn(settle(input_rx, Arc::clone(&settled), delay));
        Self {
            input,
            settled,
            delay,
            task,
        }
    }

    /// Updates the input and restarts the delay.
    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Sets input and settled value at once, discarding any pending emission.
    ///
    /// Subscribers are only notified if the settled value actually changes.
    pub fn reset(&self, value: T) {
        self.input.send_replace(value.clone());
        self.settled.send_if_modified(|current| replace_if_changed(current, value));
    }

    /// The latest input, settled or not.
    pub fn input(&self) -> T {
        self.input.borrow().clone()
    }

    /// The settled value.
    pub fn value(&self) -> T {
        self.settled.borrow().clone()
    }

    /// Returns `true` while the input differs from the settled value.
    pub fn is_pending(&self) -> bool {
        *self.input.borrow() != *self.settled.borrow()
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Subscribes to settled values.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.subscribe()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("input", &*self.input.borrow())
            .field("settled", &*self.settled.borrow())
            .field("delay", &self.delay)
            .finish()
    }
}

async fn settle<T>(mut input: watch::Receiver<T>, settled: Arc<watch::Sender<T>>, delay: Duration)
where
    T: Clone + PartialEq + std::fmt::Debug,
{
    while input.changed().await.is_ok() {
        loop {
            tokio::select! {
                () = tokio::time::sleep(delay) => break,
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let value = input.borrow_and_update().clone();
        let emitted = settled.send_if_modified(|current| replace_if_changed(current, value));
        if emitted {
            tracing::debug!(value = ?*settled.borrow(), ?delay, "debounced value settled");
        }
    }
}

fn replace_if_changed<T: PartialEq>(current: &mut T, value: T) -> bool {
    if *current == value {
        false
    } else {
        *current = value;
        true
    }
}
