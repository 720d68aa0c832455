use super::ProcessingCounters;
use crate::errors::{BlockProcessError, BlockProcessResult};
use crossbeam_channel::{Receiver, Sender, unbounded};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::{
    sync::{Arc, atomic::Ordering},
    thread::{self, JoinHandle},
};
use tokio::sync::oneshot;

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

pub enum SequencerTask<S> {
    Exit,
    Process(Job<S>),
}

/// Runs operations against an exclusively owned state `S` one at a time, in submission order, on a
/// dedicated worker thread. Operations submitted before `init` are queued and run once the worker starts.
pub struct Sequencer<S> {
    sender: Sender<SequencerTask<S>>,

    // Moved into the worker by `init`
    worker_context: Mutex<Option<(Receiver<SequencerTask<S>>, S)>>,

    counters: Arc<ProcessingCounters>,
}

impl<S: Send + 'static> Sequencer<S> {
    pub fn new(state: S, counters: Arc<ProcessingCounters>) -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, worker_context: Mutex::new(Some((receiver, state))), counters }
    }

    /// Spawns the worker thread. Panics if called twice.
    pub fn init(&self) -> JoinHandle<()> {
        let (receiver, state) = self.worker_context.lock().take().expect("sequencer was already initialized");
        thread::spawn(move || Self::worker(receiver, state))
    }

    /// Queues an exit message. Operations submitted earlier still run.
    pub fn signal_exit(&self) {
        let _ = self.sender.send(SequencerTask::Exit);
    }

    /// Queues `operation` and returns a future of its result. If the worker has exited, or exits
    /// before reaching the operation, the future resolves to `SequencerClosed`.
    pub fn submit<T, F>(&self, operation: F) -> BoxFuture<'static, BlockProcessResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> BlockProcessResult<T> + Send + 'static,
    {
        self.counters.operations_submitted.fetch_add(1, Ordering::SeqCst);
        let (result_transmitter, result_receiver) = oneshot::channel();
        let counters = self.counters.clone();
        let job: Job<S> = Box::new(move |state| {
            let result = operation(state);
            match result {
                Ok(_) => counters.operations_completed.fetch_add(1, Ordering::SeqCst),
                Err(_) => counters.operations_failed.fetch_add(1, Ordering::SeqCst),
            };
            let _ = result_transmitter.send(result);
        });

        if self.sender.send(SequencerTask::Process(job)).is_err() {
            return Box::pin(async { Err(BlockProcessError::SequencerClosed) });
        }
        Box::pin(async move { result_receiver.await.unwrap_or(Err(BlockProcessError::SequencerClosed)) })
    }

    fn worker(receiver: Receiver<SequencerTask<S>>, mut state: S) {
        while let Ok(task) = receiver.recv() {
            match task {
                SequencerTask::Exit => break,
                SequencerTask::Process(job) => job(&mut state),
            }
        }
        // Dropping the receiver here closes the sequencer; jobs still queued are dropped along with
        // their result transmitters
    }
}
