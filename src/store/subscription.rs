use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A feed of values with an explicit release handle.
///
/// Dropping the subscription releases it as well, so a feed can never
/// outlive whoever is reading it.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Subscription<T> {
    /// Delivers `value` once, then ends.
    pub fn ready(value: T) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(value);
        Self { rx, task: None }
    }

    /// Runs `producer` on its own task; whatever it sends is delivered until
    /// the subscription is released or the producer returns.
    pub fn spawn<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(mpsc::UnboundedSender<T>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(producer(tx));
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Next delivery, or `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// A delivery that is already waiting, if any.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Converts every delivery with `f`, keeping the release semantics.
    pub fn map<U, F>(mut self, mut f: F) -> Subscription<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        if self.task.is_none() {
            // ready(): everything is already buffered and the sender is gone
            let (tx, rx) = mpsc::unbounded_channel();
            while let Ok(value) = self.rx.try_recv() {
                let _ = tx.send(f(value));
            }
            return Subscription { rx, task: None };
        }

        let mut upstream = self;
        Subscription::spawn(move |tx| async move {
            while let Some(value) = upstream.recv().await {
                if tx.send(f(value)).is_err() {
                    break;
                }
            }
        })
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
