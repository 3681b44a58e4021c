//! Asynchronous value sequence.
//!
//! [`Changes`] yields a cell's current value right away, then waits for the
//! next change, yields it, and so on forever. Each wait registers a fresh
//! one-shot listener when the consumer asks for the next item; changes that
//! happen while the consumer is busy with a previous item are not queued.
//!
//! There is no cancellation. A consumer that stops polling leaves at most one
//! pending listener behind, which fires into a closed channel on the next
//! change and is gone.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{FusedStream, Stream};
use tokio::sync::oneshot;

use super::cell::Cell;

enum State<T> {
    /// The current value has not been yielded yet.
    Start,
    /// Nothing registered; the next poll subscribes.
    Idle,
    Waiting(oneshot::Receiver<T>),
    /// The listener was dropped without firing. The stream holds its cell and
    /// never detaches, so this only happens when a notification pass on the
    /// cell unwinds before reaching this stream's listener.
    Done,
}

/// Stream returned by [`Cell::changes`].
pub struct Changes<T> {
    cell: Cell<T>,
    state: State<T>,
}

impl<T> Changes<T>
where
    T: Clone + PartialEq + 'static,
{
    pub(crate) fn new(cell: Cell<T>) -> Self {
        Self {
            cell,
            state: State::Start,
        }
    }

    /// The cell this stream follows.
    pub fn cell(&self) -> &Cell<T> {
        &self.cell
    }
}

impl<T> Stream for Changes<T>
where
    T: Clone + PartialEq + 'static,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                State::Start => {
                    this.state = State::Idle;
                    return Poll::Ready(Some(this.cell.get()));
                }
                State::Idle => {
                    let (tx, rx) = oneshot::channel();
                    this.cell.on_next(move |value: &T| {
                        // The receiver is gone if the consumer stopped early.
                        let _ = tx.send(value.clone());
                    });
                    this.state = State::Waiting(rx);
                }
                State::Waiting(rx) => {
                    return match Pin::new(rx).poll(cx) {
                        Poll::Ready(Ok(value)) => {
                            this.state = State::Idle;
                            Poll::Ready(Some(value))
                        }
                        Poll::Ready(Err(_)) => {
                            this.state = State::Done;
                            Poll::Ready(None)
                        }
                        Poll::Pending => Poll::Pending,
                    };
                }
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl<T> FusedStream for Changes<T>
where
    T: Clone + PartialEq + 'static,
{
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}
