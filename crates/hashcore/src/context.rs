use std::fs::{self, File};
use std::io::{self, Read};
use std::mem;
use std::path::{Path, PathBuf};

use hashcore_digest::{Accumulator, AnyAccumulator, Digest, HashingReader};

use crate::options::clamp_buffer_size;
use crate::{CancelToken, HashError, HashOptions, Progress, Result, State};

enum Resources<A> {
    /// File and buffer are live; the accumulator rides inside the reader.
    Open {
        reader: HashingReader<File, A>,
        buffer: Vec<u8>,
    },
    /// Loop has exited; only the accumulator is kept.
    Drained(A),
    Released,
}

/// One hashing session over a single file.
///
/// The context owns the file, the read buffer and the accumulator. Only the cancellation
/// flag is shared; hand a [`CancelToken`] to other threads with [`Context::cancel_token`].
pub struct Context<A = AnyAccumulator> {
    path:      PathBuf,
    state:     State,
    total:     u64,
    processed: u64,
    cancel:    CancelToken,
    resources: Resources<A>,
}

impl Context<AnyAccumulator> {
    pub fn open(path: impl AsRef<Path>, options: HashOptions) -> Result<Self> {
        Self::with_accumulator(
            path,
            options.get_buffer_size(),
            options.get_algorithm().accumulator(),
        )
    }
}

impl<A: Accumulator> Context<A> {
    /// Open `path` for hashing with a caller-supplied accumulator.
    ///
    /// Nothing is retained when opening fails.
    pub fn with_accumulator(
        path: impl AsRef<Path>,
        buffer_size: usize,
        accumulator: A,
    ) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |source: io::Error| HashError::Open {
            path: path.to_path_buf(),
            source,
        };

        let not_regular =
            || open_error(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));

        // Checked before opening: a FIFO would block in `open`. The size snapshot bounds the
        // read loop, so it must be the real content length.
        if !fs::metadata(path).map_err(open_error)?.is_file() {
            return Err(not_regular());
        }
        let file = File::open(path).map_err(open_error)?;
        let metadata = file.metadata().map_err(open_error)?;
        if !metadata.is_file() {
            return Err(not_regular());
        }

        let total = metadata.len();
        let buffer_size = clamp_buffer_size(buffer_size);
        tracing::debug!(
            target: "hashcore",
            path = %path.display(),
            total,
            buffer_size,
            "context created"
        );

        Ok(Self {
            path: path.to_path_buf(),
            state: State::Created,
            total,
            processed: 0,
            cancel: CancelToken::new(),
            resources: Resources::Open {
                reader: HashingReader::new(file, accumulator),
                buffer: vec![0u8; buffer_size],
            },
        })
    }

    /// Hash the whole input, calling `on_progress` after every chunk.
    ///
    /// Blocks until the input is exhausted, a read fails, or cancellation is observed. The
    /// callback runs on the calling thread and must not call back into this context.
    pub fn process<F>(&mut self, mut on_progress: F) -> Result<()>
    where
        F: FnMut(Progress),
    {
        if self.state != State::Created {
            return Err(HashError::InvalidState {
                operation: "process",
                state:     self.state,
            });
        }
        self.state = State::Processing;

        let _span = tracing::debug_span!(
            target: "hashcore",
            "process",
            path = %self.path.display(),
            total = self.total
        )
        .entered();

        let outcome = self.run(&mut on_progress);
        self.release_input();

        self.state = match &outcome {
            Ok(()) => State::Completed,
            Err(HashError::Cancelled { .. }) => State::Cancelled,
            Err(_) => State::Failed,
        };

        match &outcome {
            Ok(()) => tracing::debug!(target: "hashcore", processed = self.processed, "completed"),
            Err(HashError::Cancelled { .. }) => {
                tracing::debug!(target: "hashcore", processed = self.processed, "cancelled")
            }
            Err(e) => tracing::warn!(target: "hashcore", error = %e, "hashing failed"),
        }
        outcome
    }

    fn run(&mut self, on_progress: &mut impl FnMut(Progress)) -> Result<()> {
        let Resources::Open { reader, buffer } = &mut self.resources else {
            return Err(HashError::InvalidState {
                operation: "process",
                state:     self.state,
            });
        };

        loop {
            if self.cancel.is_cancelled() {
                return Err(HashError::Cancelled {
                    processed: self.processed,
                    total:     self.total,
                });
            }

            let remaining = self.total - self.processed;
            if remaining == 0 {
                return Ok(());
            }

            // never read past the size recorded at open
            let want = usize::try_from(remaining).map_or(buffer.len(), |r| r.min(buffer.len()));
            let n = match reader.read(&mut buffer[..want]) {
                Ok(0) => {
                    return Err(HashError::Truncated {
                        expected: self.total,
                        actual:   self.processed,
                    });
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::Io(e)),
            };

            self.processed += n as u64;
            on_progress(Progress::new(self.processed, self.total));
        }
    }

    /// Close the file and free the buffer, keeping the accumulator.
    fn release_input(&mut self) {
        self.resources = match mem::replace(&mut self.resources, Resources::Released) {
            Resources::Open { reader, .. } => Resources::Drained(reader.into_parts().1),
            other => other,
        };
    }

    /// Produce the digest and release everything.
    ///
    /// Only a completed context yields a digest. Any other non-consumed state is still
    /// consumed but reports an error instead, so a partial hash is never returned.
    pub fn finalize(&mut self) -> Result<Digest> {
        let state = self.state;
        if state.is_consumed() {
            return Err(HashError::InvalidState {
                operation: "finalize",
                state,
            });
        }

        let resources = mem::replace(&mut self.resources, Resources::Released);
        self.state = State::Consumed;
        tracing::debug!(target: "hashcore", from = %state, "finalize");

        match (state, resources) {
            (State::Completed, Resources::Drained(accumulator)) => Ok(accumulator.finalize()),
            (State::Cancelled, _) => Err(HashError::Cancelled {
                processed: self.processed,
                total:     self.total,
            }),
            (state, _) => Err(HashError::InvalidState {
                operation: "finalize",
                state,
            }),
        }
    }

    /// Release everything without producing a digest.
    pub fn cleanup(&mut self) -> Result<()> {
        if self.state.is_consumed() {
            return Err(HashError::InvalidState {
                operation: "cleanup",
                state:     self.state,
            });
        }
        tracing::debug!(target: "hashcore", from = %self.state, "cleanup");
        self.resources = Resources::Released;
        self.state = State::Consumed;
        Ok(())
    }
}

impl<A> Context<A> {
    /// Request cancellation. No effect once the context is consumed.
    pub fn cancel(&self) {
        if !self.state.is_consumed() {
            self.cancel.cancel();
        }
    }

    pub fn cancel_token(&self) -> CancelToken { self.cancel.clone() }

    pub fn is_cancelled(&self) -> bool { self.cancel.is_cancelled() }

    pub fn state(&self) -> State { self.state }

    pub fn processed(&self) -> u64 { self.processed }

    pub fn total(&self) -> u64 { self.total }

    pub fn path(&self) -> &Path { &self.path }

    /// Whether the file handle is still open.
    pub fn holds_file(&self) -> bool { matches!(self.resources, Resources::Open { .. }) }
}
