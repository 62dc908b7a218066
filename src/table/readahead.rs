//! Background readahead
//!
//! Single-slot producer/consumer prefetch for the random-access reader:
//! one worker thread, bounded request and result channels of capacity one,
//! so there is never more than one read in flight and no queue growth. The
//! worker blocks on I/O while the caller computes; the caller never blocks
//! on the worker (a miss falls back to a direct read).

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::error::Result;
use crate::holder::Holder;
use crate::index::{self, ScpIndex};

/// Handle to the prefetch worker
pub(crate) struct Prefetcher<H> {
    req_tx: Option<Sender<usize>>,
    res_rx: Receiver<(usize, Result<H>)>,
    worker: Option<JoinHandle<()>>,
}

impl<H: Holder + Send + 'static> Prefetcher<H> {
    /// Spawn the worker over a shared index
    pub fn spawn(index: Arc<ScpIndex>) -> Result<Self> {
        let (req_tx, req_rx) = bounded::<usize>(1);
        let (res_tx, res_rx) = bounded::<(usize, Result<H>)>(1);
        let worker = thread::Builder::new()
            .name("arkio-readahead".to_string())
            .spawn(move || {
                while let Ok(pos) = req_rx.recv() {
                    let Some((_, location)) = index.record(pos) else {
                        continue; // past the last entry, nothing to prefetch
                    };
                    let value = index::resolve::<H>(location);
                    if res_tx.send((pos, value)).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            req_tx: Some(req_tx),
            res_rx,
            worker: Some(worker),
        })
    }

    /// Ask the worker to prefetch the entry at `pos` (best effort)
    pub fn request(&self, pos: usize) {
        if let Some(tx) = &self.req_tx {
            let _ = tx.try_send(pos);
        }
    }

    /// Claim a prefetched value for `pos`, if the slot holds one
    ///
    /// Stale results for other positions are discarded. Never blocks.
    pub fn take(&self, pos: usize) -> Option<Result<H>> {
        let mut hit = None;
        while let Ok((p, value)) = self.res_rx.try_recv() {
            if p == pos {
                hit = Some(value);
            }
        }
        hit
    }
}

impl<H> Prefetcher<H> {
    /// Stop the worker and join it; idempotent
    pub fn shutdown(&mut self) {
        self.req_tx.take();
        // Unblock a worker stuck on a full result slot.
        while self.res_rx.try_recv().is_ok() {}
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl<H> Drop for Prefetcher<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
