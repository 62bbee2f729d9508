// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Value debouncing.
//!
//! A `Debouncer` publishes the latest input only after it has been left
//! alone for `delay`. Each new input restarts the wait. Dropping the
//! debouncer cancels a pending publish.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Debounced copy of a value.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a debouncer whose output starts at `initial`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);
        let task = tokio::spawn(run(input_rx, output_tx, delay));

        Self {
            input,
            output,
            task,
        }
    }

    /// Feed a new input value, restarting the quiet period.
    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Latest published (debounced) value.
    pub fn value(&self) -> T {
        self.output.borrow().clone()
    }

    /// Receiver notified each time a debounced value is published.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T: Clone>(mut input: watch::Receiver<T>, output: watch::Sender<T>, delay: Duration) {
    loop {
        // Wait for the first change after the last publish
        if input.changed().await.is_err() {
            return;
        }

        // Re-arm on every further change until the input goes quiet
        loop {
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(delay) => break,
            }
        }

        let latest = input.borrow_and_update().clone();
        // Every receiver is gone
        if output.send(latest).is_err() {
            return;
        }
    }
}
