//! Pluggable streaming accumulators for hashcore.
//!
//! An [`Accumulator`] folds ordered byte chunks into a single [`Digest`]. Chunk boundaries
//! never affect the result, so callers are free to pick any read buffer size.
//!
//! # Example
//!
//! ```
//! use hashcore_digest::{Accumulator, Algorithm, HashingReader};
//!
//! let data = b"hello world";
//! let expected = Algorithm::default().digest(data);
//!
//! let mut reader = HashingReader::new(&data[..], Algorithm::default().accumulator());
//! std::io::copy(&mut reader, &mut std::io::sink()).unwrap();
//!
//! assert_eq!(reader.verify(expected.as_bytes()).unwrap(), expected);
//! ```

pub use self::accumulator::{Accumulator, Algorithm, AnyAccumulator, Xxh64Accumulator};
pub use self::digest::Digest;
pub use self::error::{DigestError, Result};
pub use self::reader::HashingReader;

#[cfg(feature = "sha256")]
pub use self::accumulator::{DigestAccumulator, Sha256Accumulator};

#[cfg(feature = "blake3")]
pub use self::accumulator::Blake3Accumulator;

mod accumulator;
mod digest;
mod error;
mod reader;
