/// Snapshot handed to the progress callback after every chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Bytes fed to the accumulator so far.
    pub processed: u64,
    /// Input size recorded when the context was opened.
    pub total:     u64,
}

impl Progress {
    pub fn new(processed: u64, total: u64) -> Self { Self { processed, total } }

    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f32 / self.total as f32) * 100.0
        }
    }

    pub fn is_complete(&self) -> bool { self.processed == self.total }
}

pub fn noop_progress(_: Progress) {}
