//! Concurrent decoding of many files into one channel.
//!
//! A run fills a path queue with the whole file list, then starts a fixed
//! number of workers on a dedicated `rayon` pool. Each worker claims one path
//! at a time, decodes the whole file, and sends every record down a bounded
//! output channel. A failed file is reported as an `Err` item on the same
//! channel and the worker moves on.
//!
//! Workers only borrow the output sender; the orchestrating thread owns it and
//! drops it once every worker has returned, so a closed channel means the run
//! is complete.
//!
//! Records from one file arrive in file order. Across files the interleaving is
//! unspecified.
//!
//! ```no_run
//! use ironstream::io::parallel::{ParallelOptions, stream_jsonl_parallel};
//! use ironstream::io::resolve::ResolveOptions;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Event { id: u64 }
//!
//! # fn main() -> ironstream::Result<()> {
//! let opts = ParallelOptions::default().with_workers(4);
//! let mut run = stream_jsonl_parallel::<Event>("data/events", &ResolveOptions::jsonl(), &opts)?;
//! for event in run.by_ref() {
//!     println!("{}", event?.id);
//! }
//! let summary = run.join()?;
//! println!("{} files, {} records", summary.files, summary.records);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::io::compression::open_file;
use crate::io::jsonl::RecordStreamer;
use crate::io::resolve::{ResolveOptions, resolve};
use flume::{Receiver, Sender};
use rayon::ThreadPool;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Settings for a parallel run.
#[derive(Clone, Debug)]
pub struct ParallelOptions {
    /// Worker threads; at least one is always started.
    pub workers: usize,
    /// Capacity of the output channel. A full channel blocks workers.
    pub channel_capacity: usize,
    /// Cancel the whole run after the first failed file.
    pub stop_on_error: bool,
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            channel_capacity: 1024,
            stop_on_error: false,
        }
    }
}

impl ParallelOptions {
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }
}

/// Shared flag asking workers to stop.
///
/// Workers check it before claiming a file and before decoding each record.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Totals reported by [`ParallelRun::join`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files decoded to the end.
    pub files: usize,
    /// Records sent, including those from files that failed later on.
    pub records: usize,
    /// Files that failed to open or decode.
    pub failures: usize,
    /// The token was set, by the caller or by `stop_on_error`. A dropped
    /// receiver stops the workers without setting it.
    pub cancelled: bool,
}

#[derive(Default)]
struct Counters {
    files: AtomicUsize,
    records: AtomicUsize,
    failures: AtomicUsize,
}

/// Handle on a running pipeline.
///
/// Iterating yields every item of the output channel and ends when the run is
/// complete.
pub struct ParallelRun<T> {
    rx: Receiver<Result<T>>,
    cancel: CancelToken,
    handle: JoinHandle<RunSummary>,
}

impl<T> ParallelRun<T> {
    /// The output channel, for `select`-style consumers.
    pub fn receiver(&self) -> &Receiver<Result<T>> {
        &self.rx
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ask workers to stop at their next file or record boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to finish.
    ///
    /// Items still in the channel are discarded and workers stop at their next
    /// send, so drain the run first to observe everything.
    pub fn join(self) -> Result<RunSummary> {
        let Self { rx, handle, .. } = self;
        drop(rx);
        handle
            .join()
            .map_err(|_| Error::Pool("pipeline thread panicked".to_string()))
    }
}

impl<T> Iterator for ParallelRun<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

/// Decode `files` concurrently.
///
/// The path queue is filled in list order before any worker starts; which
/// worker finishes which file first is unspecified.
///
/// # Errors
/// [`Error::Pool`] if the worker pool or orchestrating thread cannot start.
/// Per-file failures are not returned here; they arrive on the channel.
pub fn read_jsonl_parallel<T>(files: Vec<PathBuf>, opts: &ParallelOptions) -> Result<ParallelRun<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    let workers = opts.workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("ironstream-worker-{i}"))
        .build()
        .map_err(|e| Error::Pool(e.to_string()))?;

    let total = files.len();
    let (path_tx, path_rx) = flume::bounded(total.max(1));
    for path in files {
        path_tx
            .send(path)
            .map_err(|_| Error::Pool("path queue closed".to_string()))?;
    }
    drop(path_tx);

    let (out_tx, out_rx) = flume::bounded(opts.channel_capacity.max(1));
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let stop_on_error = opts.stop_on_error;
    let handle = thread::Builder::new()
        .name("ironstream-pipeline".into())
        .spawn(move || orchestrate::<T>(&pool, workers, &path_rx, out_tx, &token, stop_on_error))
        .map_err(|e| Error::Pool(e.to_string()))?;

    debug!(workers, files = total, "started parallel decode");
    Ok(ParallelRun {
        rx: out_rx,
        cancel,
        handle,
    })
}

/// Resolve `path` and decode the resulting files concurrently.
pub fn stream_jsonl_parallel<T>(
    path: impl AsRef<Path>,
    resolve_opts: &ResolveOptions,
    opts: &ParallelOptions,
) -> Result<ParallelRun<T>>
where
    T: DeserializeOwned + Send + 'static,
{
    read_jsonl_parallel(resolve(path, resolve_opts)?, opts)
}

fn orchestrate<T>(
    pool: &ThreadPool,
    workers: usize,
    paths: &Receiver<PathBuf>,
    out: Sender<Result<T>>,
    cancel: &CancelToken,
    stop_on_error: bool,
) -> RunSummary
where
    T: DeserializeOwned + Send,
{
    let counters = Counters::default();
    pool.scope(|s| {
        for id in 0..workers {
            let (out, counters) = (&out, &counters);
            s.spawn(move |_| worker(id, paths, out, cancel, counters, stop_on_error));
        }
    });
    // Every worker has returned; this is the last sender.
    drop(out);

    let summary = RunSummary {
        files: counters.files.into_inner(),
        records: counters.records.into_inner(),
        failures: counters.failures.into_inner(),
        cancelled: cancel.is_cancelled(),
    };
    debug!(?summary, "parallel decode finished");
    summary
}

enum FileOutcome {
    Drained(usize),
    Failed(Error),
    Cancelled,
    Disconnected,
}

fn worker<T>(
    id: usize,
    paths: &Receiver<PathBuf>,
    out: &Sender<Result<T>>,
    cancel: &CancelToken,
    counters: &Counters,
    stop_on_error: bool,
) where
    T: DeserializeOwned + Send,
{
    trace!(worker = id, "worker started");
    while !cancel.is_cancelled() && !out.is_disconnected() {
        let Ok(path) = paths.recv() else {
            break;
        };
        match decode_file(&path, out, cancel, counters) {
            FileOutcome::Drained(n) => {
                counters.files.fetch_add(1, Ordering::Relaxed);
                trace!(worker = id, path = %path.display(), records = n, "file drained");
            }
            FileOutcome::Failed(e) => {
                counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(worker = id, path = %path.display(), error = %e, "file failed");
                if stop_on_error {
                    cancel.cancel();
                }
                if out.send(Err(e)).is_err() {
                    break;
                }
            }
            FileOutcome::Cancelled | FileOutcome::Disconnected => break,
        }
    }
    trace!(worker = id, "worker finished");
}

fn decode_file<T>(
    path: &Path,
    out: &Sender<Result<T>>,
    cancel: &CancelToken,
    counters: &Counters,
) -> FileOutcome
where
    T: DeserializeOwned + Send,
{
    let reader = match open_file(path) {
        Ok(reader) => reader,
        Err(e) => return FileOutcome::Failed(e),
    };
    let mut records = RecordStreamer::<T>::from_reader(reader, path.display().to_string());
    let mut n = 0;
    loop {
        if cancel.is_cancelled() {
            return FileOutcome::Cancelled;
        }
        match records.next_record() {
            Ok(Some(record)) => {
                if out.send(Ok(record)).is_err() {
                    return FileOutcome::Disconnected;
                }
                counters.records.fetch_add(1, Ordering::Relaxed);
                n += 1;
            }
            Ok(None) => return FileOutcome::Drained(n),
            Err(e) => return FileOutcome::Failed(e),
        }
    }
}
