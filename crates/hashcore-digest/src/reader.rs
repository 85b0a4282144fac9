use std::io::{self, Read};

use crate::{Accumulator, Digest, DigestError, Result};

/// Reader adapter that feeds every byte it yields into an accumulator.
///
/// Bytes are hashed exactly once, in the order the inner reader produces them.
pub struct HashingReader<R, A> {
    reader:      R,
    accumulator: A,
    bytes_read:  u64,
}

impl<R, A> HashingReader<R, A> {
    pub fn new(reader: R, accumulator: A) -> Self {
        Self {
            reader,
            accumulator,
            bytes_read: 0,
        }
    }

    /// Bytes hashed so far.
    pub fn bytes_read(&self) -> u64 { self.bytes_read }

    /// Split into the inner reader and the accumulator, keeping partial hash state.
    pub fn into_parts(self) -> (R, A) { (self.reader, self.accumulator) }
}

impl<R: Read, A: Accumulator> Read for HashingReader<R, A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.accumulator.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}

impl<R, A: Accumulator> HashingReader<R, A> {
    pub fn finish(self) -> Digest { self.accumulator.finalize() }

    /// Finalize and compare against an expected digest.
    pub fn verify(self, expected: &[u8]) -> Result<Digest> {
        let actual = self.finish();
        if actual.matches(expected) {
            Ok(actual)
        } else {
            Err(DigestError::Mismatch {
                expected: hex::encode(expected),
                actual:   actual.to_hex(),
            })
        }
    }
}
