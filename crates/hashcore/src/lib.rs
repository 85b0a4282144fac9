//! Cancellable streaming file hashing.
//!
//! A [`Context`] owns one hashing session: the open file, a reusable read buffer, the
//! accumulator and a cancellation flag. It moves through an explicit [`State`] lifecycle:
//!
//! - [`Context::process`] runs the blocking read/hash/report loop, once.
//! - [`Context::finalize`] yields the digest of a completed run and consumes the context.
//! - [`Context::cleanup`] releases everything on the error or cancel path.
//! - [`CancelToken::cancel`] may be called from any thread while `process` runs; the loop
//!   observes it between chunks.
//!
//! [`Registry`] puts contexts behind opaque [`Handle`]s so misuse (double finalize,
//! use after cleanup, overlapping calls) is reported as [`ResultCode::InvalidContext`]
//! instead of touching freed state.
//!
//! # Example
//!
//! ```no_run
//! use hashcore::{Context, HashOptions};
//!
//! let mut ctx = Context::open("archive.tar", HashOptions::new().buffer_size(1 << 20))?;
//! let token = ctx.cancel_token();
//! ctx.process(|p| {
//!     if p.percentage() > 50.0 {
//!         token.cancel();
//!     }
//! })?;
//! println!("{}", ctx.finalize()?);
//! # Ok::<(), hashcore::HashError>(())
//! ```

mod cancel;
mod context;
mod error;
mod options;
mod progress;
mod registry;
mod state;

use std::path::Path;

pub use cancel::CancelToken;
pub use context::Context;
pub use error::{HashError, Result, ResultCode};
pub use options::{DEFAULT_BUFFER_SIZE, HashOptions, MAX_BUFFER_SIZE};
pub use progress::{Progress, noop_progress};
pub use registry::{Handle, Registry};
pub use state::State;

pub use hashcore_digest::{Accumulator, Algorithm, AnyAccumulator, Digest};

/// Hash a whole file in one call.
pub fn hash_file(path: impl AsRef<Path>, options: HashOptions) -> Result<Digest> {
    let mut context = Context::open(path, options)?;
    context.process(noop_progress)?;
    context.finalize()
}
