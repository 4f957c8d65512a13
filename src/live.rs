//! Latest-value publish/subscribe used for the "all notes" list and the selected note.
//!
//! Observers only ever see the most recent value; intermediate values published while an
//! observer is busy are skipped.

use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct LivePublisher<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> LivePublisher<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self { sender }
    }

    /// Stores `value` and wakes every observer, even when nobody is currently listening.
    pub fn publish(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Mutates the value in place; observers are woken only when `modify` returns `true`.
    pub fn modify(&self, modify: impl FnOnce(&mut T) -> bool) -> bool {
        self.sender.send_if_modified(modify)
    }

    pub fn current(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn stream(&self) -> LiveStream<T> {
        LiveStream {
            receiver: self.sender.subscribe(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiveStream<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> LiveStream<T> {
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Waits for the next published value. Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits until the latest value satisfies `predicate`, checking the current one first.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let value = self.receiver.wait_for(|value| predicate(value)).await.ok()?;
        Some((*value).clone())
    }

    /// Runs `on_change` with the current value and then with every later one until the
    /// returned subscription is dropped.
    pub fn observe<F>(&self, mut on_change: F) -> Subscription
    where
        F: FnMut(T) + Send + 'static,
    {
        let mut receiver = self.receiver.clone();
        let task = tokio::spawn(async move {
            let initial = receiver.borrow_and_update().clone();
            on_change(initial);
            while receiver.changed().await.is_ok() {
                let next = receiver.borrow_and_update().clone();
                on_change(next);
            }
        });
        Subscription { task }
    }
}

/// Scoped observer registration. Dropping it detaches the observer.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
