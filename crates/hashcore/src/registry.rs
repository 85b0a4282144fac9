use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

use hashcore_digest::{Accumulator, AnyAccumulator, Digest};

use crate::{CancelToken, Context, HashError, HashOptions, Progress, Result, State};

/// Opaque id for a context owned by a [`Registry`].
///
/// Ids are never reused, so a stale handle can only ever miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    pub const INVALID: Handle = Handle(0);

    pub fn from_raw(raw: u64) -> Self { Self(raw) }

    pub fn as_raw(self) -> u64 { self.0 }

    pub fn is_valid(self) -> bool { self.0 != 0 }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

struct Entry<A> {
    cancel:  CancelToken,
    context: Mutex<Context<A>>,
}

/// Arena of live contexts addressed by [`Handle`].
///
/// Every operation checks the handle before touching a context: unknown and consumed
/// handles are rejected instead of dereferenced. The map lock is only held for lookups and
/// insert/remove, never across I/O or callbacks. Operations that would have to wait for a
/// running `process` fail with [`HashError::Busy`] instead.
pub struct Registry<A = AnyAccumulator> {
    entries: RwLock<HashMap<Handle, Arc<Entry<A>>>>,
    next:    AtomicU64,
}

impl<A> Default for Registry<A> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next:    AtomicU64::new(1),
        }
    }
}

impl Registry<AnyAccumulator> {
    pub fn open(&self, path: impl AsRef<Path>, options: HashOptions) -> Result<Handle> {
        Context::open(path, options).map(|context| self.insert(context))
    }
}

impl<A: Accumulator> Registry<A> {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, context: Context<A>) -> Handle {
        let handle = Handle(self.next.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(Entry {
            cancel:  context.cancel_token(),
            context: Mutex::new(context),
        });
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, entry);
        tracing::trace!(target: "hashcore", %handle, "registered");
        handle
    }

    pub fn process<F>(&self, handle: Handle, on_progress: F) -> Result<()>
    where
        F: FnMut(Progress),
    {
        let entry = self.entry(handle)?;
        let mut context = lock(&entry, handle)?;
        context.process(on_progress)
    }

    pub fn finalize(&self, handle: Handle) -> Result<Digest> {
        self.consume(handle, |context| context.finalize())
    }

    pub fn cleanup(&self, handle: Handle) -> Result<()> {
        self.consume(handle, |context| context.cleanup())
    }

    fn consume<T>(
        &self,
        handle: Handle,
        op: impl FnOnce(&mut Context<A>) -> Result<T>,
    ) -> Result<T> {
        let entry = self.entry(handle)?;
        let mut context = lock(&entry, handle)?;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        op(&mut context)
    }
}

impl<A> Registry<A> {
    /// Set the cancellation flag of `handle`. Unknown or consumed handles are ignored.
    ///
    /// Never waits on a running `process`. The only lock taken is the map's read lock, which
    /// writers hold just long enough to insert or remove one entry, so the wait is bounded by
    /// a single map update.
    pub fn cancel(&self, handle: Handle) {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(&handle) {
            Some(entry) => entry.cancel.cancel(),
            None => tracing::trace!(target: "hashcore", %handle, "cancel on unknown handle"),
        }
    }

    /// Current state, reporting `Processing` while another thread runs the loop.
    pub fn state(&self, handle: Handle) -> Result<State> {
        let entry = self.entry(handle)?;
        match entry.context.try_lock() {
            Ok(context) => Ok(context.state()),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner().state()),
            Err(TryLockError::WouldBlock) => Ok(State::Processing),
        }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn entry(&self, handle: Handle) -> Result<Arc<Entry<A>>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or(HashError::UnknownHandle(handle))
    }
}

fn lock<A>(entry: &Entry<A>, handle: Handle) -> Result<MutexGuard<'_, Context<A>>> {
    match entry.context.try_lock() {
        Ok(guard) => Ok(guard),
        // a panicking progress callback poisons the lock; the state tag is still accurate
        Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => Err(HashError::Busy(handle)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::noop_progress;
    use crate::ResultCode;
    use std::sync::mpsc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_handles_are_unique_and_nonzero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"abc").unwrap();

        let registry: Registry = Registry::new();
        let a = registry.open(&path, HashOptions::new()).unwrap();
        let b = registry.open(&path, HashOptions::new()).unwrap();
        assert!(a.is_valid() && b.is_valid());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        registry.cleanup(a).unwrap();
        registry.cleanup(b).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_use_after_finalize() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"abc").unwrap();

        let registry: Registry = Registry::new();
        let handle = registry.open(&path, HashOptions::new()).unwrap();
        registry.process(handle, noop_progress).unwrap();
        registry.finalize(handle).unwrap();

        assert!(!registry.contains(handle));
        let codes = [
            ResultCode::of(&registry.process(handle, noop_progress)),
            ResultCode::of(&registry.finalize(handle)),
            ResultCode::of(&registry.cleanup(handle)),
            ResultCode::of(&registry.state(handle)),
        ];
        assert!(codes.iter().all(|code| *code == ResultCode::InvalidContext));
        registry.cancel(handle);
    }

    #[test]
    fn test_finalize_while_processing_is_busy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, vec![7u8; 64]).unwrap();

        let registry: Arc<Registry> = Arc::new(Registry::new());
        let handle = registry.open(&path, HashOptions::new().buffer_size(8)).unwrap();

        let (entered_tx, entered_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();

        let worker = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut first = true;
                registry.process(handle, move |_| {
                    if first {
                        first = false;
                        entered_tx.send(()).unwrap();
                        resume_rx.recv().unwrap();
                    }
                })
            })
        };

        entered_rx.recv().unwrap();
        assert!(matches!(registry.finalize(handle), Err(HashError::Busy(_))));
        assert!(matches!(registry.cleanup(handle), Err(HashError::Busy(_))));
        assert!(matches!(
            registry.process(handle, noop_progress),
            Err(HashError::Busy(_))
        ));
        assert_eq!(registry.state(handle).unwrap(), State::Processing);
        assert!(registry.contains(handle));

        resume_tx.send(()).unwrap();
        worker.join().unwrap().unwrap();

        assert_eq!(registry.state(handle).unwrap(), State::Completed);
        registry.finalize(handle).unwrap();
    }

    #[test]
    fn test_cancel_lands_during_process_and_map_churn() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, vec![3u8; 256]).unwrap();

        let registry: Arc<Registry> = Arc::new(Registry::new());
        let handle = registry.open(&path, HashOptions::new().buffer_size(16)).unwrap();

        let (entered_tx, entered_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();

        let worker = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut first = true;
                registry.process(handle, move |_| {
                    if first {
                        first = false;
                        entered_tx.send(()).unwrap();
                        resume_rx.recv().unwrap();
                    }
                })
            })
        };
        entered_rx.recv().unwrap();

        let churners: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let path = path.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let other = registry.open(&path, HashOptions::new()).unwrap();
                        registry.cleanup(other).unwrap();
                    }
                })
            })
            .collect();

        // the worker still holds the context lock here
        for _ in 0..100 {
            registry.cancel(handle);
        }
        for churner in churners {
            churner.join().unwrap();
        }

        resume_tx.send(()).unwrap();
        let result = worker.join().unwrap();
        assert!(matches!(result, Err(HashError::Cancelled { .. })));
        assert_eq!(registry.state(handle).unwrap(), State::Cancelled);
        registry.cleanup(handle).unwrap();
        assert!(registry.is_empty());
    }
}
