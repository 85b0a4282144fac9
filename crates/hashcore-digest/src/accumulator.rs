use std::fmt;
use std::str::FromStr;

#[cfg(feature = "sha256")]
use ::digest::Digest as ShaDigest;

use xxhash_rust::xxh64::{Xxh64, xxh64};

use crate::{Digest, DigestError};

/// Stateful hash function fed with ordered byte chunks.
///
/// `update` may be called any number of times; `finalize` consumes the accumulator so it
/// cannot be updated again.
pub trait Accumulator: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Digest;
}

pub struct Xxh64Accumulator(Xxh64);

impl Xxh64Accumulator {
    pub fn new(seed: u64) -> Self { Self(Xxh64::new(seed)) }

    pub fn digest(seed: u64, data: &[u8]) -> Digest {
        Digest::new(xxh64(data, seed).to_be_bytes())
    }
}

impl Default for Xxh64Accumulator {
    fn default() -> Self { Self::new(0) }
}

impl Accumulator for Xxh64Accumulator {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Digest { Digest::new(self.0.digest().to_be_bytes()) }
}

#[cfg(feature = "sha256")]
pub struct Sha256Accumulator(sha2::Sha256);

#[cfg(feature = "sha256")]
impl Sha256Accumulator {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Digest { Digest::new(sha2::Sha256::digest(data).to_vec()) }
}

#[cfg(feature = "sha256")]
impl Default for Sha256Accumulator {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "sha256")]
impl Accumulator for Sha256Accumulator {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Digest { Digest::new(self.0.finalize().to_vec()) }
}

#[cfg(feature = "blake3")]
pub struct Blake3Accumulator(blake3::Hasher);

#[cfg(feature = "blake3")]
impl Blake3Accumulator {
    pub fn new() -> Self { Self(blake3::Hasher::new()) }

    pub fn digest(data: &[u8]) -> Digest { Digest::new(blake3::hash(data).as_bytes().to_vec()) }
}

#[cfg(feature = "blake3")]
impl Default for Blake3Accumulator {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "blake3")]
impl Accumulator for Blake3Accumulator {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Digest { Digest::new(self.0.finalize().as_bytes().to_vec()) }
}

/// Adapter for any RustCrypto hash function.
#[cfg(feature = "sha256")]
pub struct DigestAccumulator<D: ShaDigest + Send>(D);

#[cfg(feature = "sha256")]
impl<D: ShaDigest + Send> DigestAccumulator<D> {
    pub fn new() -> Self { Self(D::new()) }
}

#[cfg(feature = "sha256")]
impl<D: ShaDigest + Send> Default for DigestAccumulator<D> {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "sha256")]
impl<D: ShaDigest + Send> Accumulator for DigestAccumulator<D> {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Digest { Digest::new(self.0.finalize().to_vec()) }
}

/// Built-in hash functions selectable at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Xxh64 { seed: u64 },
    #[cfg(feature = "sha256")]
    Sha256,
    #[cfg(feature = "blake3")]
    Blake3,
}

impl Default for Algorithm {
    fn default() -> Self { Self::Xxh64 { seed: 0 } }
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Xxh64 { .. } => "xxh64",
            #[cfg(feature = "sha256")]
            Self::Sha256 => "sha256",
            #[cfg(feature = "blake3")]
            Self::Blake3 => "blake3",
        }
    }

    /// Digest width in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Xxh64 { .. } => 8,
            #[cfg(feature = "sha256")]
            Self::Sha256 => 32,
            #[cfg(feature = "blake3")]
            Self::Blake3 => 32,
        }
    }

    pub fn accumulator(&self) -> AnyAccumulator {
        match *self {
            Self::Xxh64 { seed } => AnyAccumulator::Xxh64(Xxh64Accumulator::new(seed)),
            #[cfg(feature = "sha256")]
            Self::Sha256 => AnyAccumulator::Sha256(Sha256Accumulator::new()),
            #[cfg(feature = "blake3")]
            Self::Blake3 => AnyAccumulator::Blake3(Blake3Accumulator::new()),
        }
    }

    /// Non-streaming digest of a whole buffer.
    pub fn digest(&self, data: &[u8]) -> Digest {
        match *self {
            Self::Xxh64 { seed } => Xxh64Accumulator::digest(seed, data),
            #[cfg(feature = "sha256")]
            Self::Sha256 => Sha256Accumulator::digest(data),
            #[cfg(feature = "blake3")]
            Self::Blake3 => Blake3Accumulator::digest(data),
        }
    }

    /// Stable numeric tag used across the C boundary. xxh64 is always seeded with 0 there.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::default()),
            #[cfg(feature = "sha256")]
            1 => Some(Self::Sha256),
            #[cfg(feature = "blake3")]
            2 => Some(Self::Blake3),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            Self::Xxh64 { .. } => 0,
            #[cfg(feature = "sha256")]
            Self::Sha256 => 1,
            #[cfg(feature = "blake3")]
            Self::Blake3 => 2,
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        match self {
            Self::Xxh64 { .. } => Self::Xxh64 { seed },
            other => other,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Algorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xxh64" | "xxhash64" => Ok(Self::default()),
            #[cfg(feature = "sha256")]
            "sha256" | "sha-256" => Ok(Self::Sha256),
            #[cfg(feature = "blake3")]
            "blake3" => Ok(Self::Blake3),
            other => Err(DigestError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Enum dispatch over the built-in accumulators.
pub enum AnyAccumulator {
    Xxh64(Xxh64Accumulator),
    #[cfg(feature = "sha256")]
    Sha256(Sha256Accumulator),
    #[cfg(feature = "blake3")]
    Blake3(Blake3Accumulator),
}

impl From<Algorithm> for AnyAccumulator {
    fn from(algorithm: Algorithm) -> Self { algorithm.accumulator() }
}

impl Accumulator for AnyAccumulator {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Xxh64(acc) => acc.update(data),
            #[cfg(feature = "sha256")]
            Self::Sha256(acc) => acc.update(data),
            #[cfg(feature = "blake3")]
            Self::Blake3(acc) => acc.update(data),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Xxh64(acc) => acc.finalize(),
            #[cfg(feature = "sha256")]
            Self::Sha256(acc) => acc.finalize(),
            #[cfg(feature = "blake3")]
            Self::Blake3(acc) => acc.finalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunked<A: Accumulator>(mut acc: A, data: &[u8], chunk: usize) -> Digest {
        for piece in data.chunks(chunk) {
            acc.update(piece);
        }
        acc.finalize()
    }

    #[test]
    fn test_xxh64_empty_input() {
        let digest = Xxh64Accumulator::default().finalize();
        assert_eq!(digest.to_u64(), Some(0xef46db3751d8e999));
    }

    #[test]
    fn test_xxh64_seed_changes_digest() {
        let data = b"hashcore";
        assert_ne!(Xxh64Accumulator::digest(0, data), Xxh64Accumulator::digest(1, data));
    }

    #[test]
    fn test_xxh64_chunking_is_transparent() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let expected = Xxh64Accumulator::digest(0, &data);
        for chunk in [1, 7, 31, 32, 33, 4096, data.len()] {
            assert_eq!(chunked(Xxh64Accumulator::new(0), &data, chunk), expected);
        }
    }

    #[cfg(feature = "sha256")]
    #[test]
    fn test_sha256_accumulator() {
        let mut acc = Sha256Accumulator::new();
        acc.update(b"hello ");
        acc.update(b"world");
        let expected =
            hex::decode("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
                .unwrap();
        assert_eq!(acc.finalize().as_bytes(), expected.as_slice());
    }

    #[cfg(feature = "sha256")]
    #[test]
    fn test_digest_adapter_matches_sha256() {
        let data = b"adapter input";
        let adapted = chunked(DigestAccumulator::<sha2::Sha256>::new(), data, 3);
        assert_eq!(adapted, Sha256Accumulator::digest(data));
    }

    #[cfg(feature = "blake3")]
    #[test]
    fn test_blake3_empty_input() {
        let digest = Blake3Accumulator::new().finalize();
        assert_eq!(
            digest.to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_algorithm_parse_and_raw_tags() {
        assert_eq!("XXH64".parse::<Algorithm>().unwrap(), Algorithm::default());
        assert!(matches!(
            "md5".parse::<Algorithm>(),
            Err(DigestError::UnknownAlgorithm(name)) if name == "md5"
        ));
        assert_eq!(Algorithm::from_raw(0), Some(Algorithm::Xxh64 { seed: 0 }));
        assert_eq!(Algorithm::from_raw(99), None);
        assert_eq!(Algorithm::default().with_seed(5), Algorithm::Xxh64 { seed: 5 });
    }

    #[cfg(all(feature = "sha256", feature = "blake3"))]
    #[test]
    fn test_any_accumulator_matches_one_shot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        for algorithm in [Algorithm::default(), Algorithm::Sha256, Algorithm::Blake3] {
            let streamed = chunked(algorithm.accumulator(), data, 5);
            assert_eq!(streamed, algorithm.digest(data), "{algorithm}");
            assert_eq!(streamed.len(), algorithm.output_len());
            assert_eq!(Algorithm::from_raw(algorithm.as_raw()), Some(algorithm));
        }
    }
}
