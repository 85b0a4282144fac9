use hashcore_digest::Algorithm;

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

#[derive(Clone, Copy, Debug)]
pub struct HashOptions {
    buffer_size: usize,
    algorithm:   Algorithm,
}

impl Default for HashOptions {
    fn default() -> Self { Self::new() }
}

impl HashOptions {
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            algorithm:   Algorithm::default(),
        }
    }

    /// Read buffer size. Zero selects the default; anything above the maximum is capped.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = clamp_buffer_size(buffer_size);
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn get_buffer_size(&self) -> usize { self.buffer_size }

    pub fn get_algorithm(&self) -> Algorithm { self.algorithm }
}

pub fn clamp_buffer_size(requested: usize) -> usize {
    let size = match requested {
        0 => DEFAULT_BUFFER_SIZE,
        n => n.min(MAX_BUFFER_SIZE),
    };
    if size != requested {
        tracing::debug!(target: "hashcore", requested, size, "buffer size adjusted");
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = HashOptions::default();
        assert_eq!(options.get_buffer_size(), DEFAULT_BUFFER_SIZE);
        assert_eq!(options.get_algorithm(), Algorithm::Xxh64 { seed: 0 });
    }

    #[test]
    fn test_buffer_size_clamping() {
        assert_eq!(HashOptions::new().buffer_size(0).get_buffer_size(), DEFAULT_BUFFER_SIZE);
        assert_eq!(HashOptions::new().buffer_size(1).get_buffer_size(), 1);
        assert_eq!(
            HashOptions::new().buffer_size(MAX_BUFFER_SIZE + 1).get_buffer_size(),
            MAX_BUFFER_SIZE
        );
    }
}
