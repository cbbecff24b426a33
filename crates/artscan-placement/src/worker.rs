//! One-shot background queries polled from the main tick.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, TryRecvError};

pub(crate) enum Poll<T> {
    Pending,
    Ready(T),
    /// The worker died without an answer.
    Lost,
}

/// A query running on its own thread.
pub(crate) struct PendingQuery<T> {
    rx: Receiver<T>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> PendingQuery<T> {
    pub(crate) fn spawn<F>(name: &str, job: F) -> io::Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let handle = thread::Builder::new()
            .name(format!("placement-{name}"))
            .spawn(move || {
                // receiver gone means the query was abandoned
                let _ = tx.send(job());
            })?;
        Ok(Self {
            rx,
            handle: Some(handle),
        })
    }

    /// Never blocks.
    pub(crate) fn poll(&mut self) -> Poll<T> {
        match self.rx.try_recv() {
            Ok(value) => {
                self.join();
                Poll::Ready(value)
            }
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Poll::Lost
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("placement worker panicked");
            }
        }
    }
}
