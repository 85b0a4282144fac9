use std::path::PathBuf;

use clap::Parser;
use hashcore::{Algorithm, DEFAULT_BUFFER_SIZE, HashOptions};

#[derive(Clone, Debug, Parser)]
#[command(name = "hashcore", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// File to hash
    pub path: PathBuf,

    #[arg(short, long, default_value = "xxh64", help = "xxh64, sha256 or blake3")]
    pub algorithm: Algorithm,

    #[arg(short, long, default_value_t = DEFAULT_BUFFER_SIZE, help = "Read buffer size in bytes")]
    pub buffer_size: usize,

    #[arg(long, default_value_t = 0, help = "Seed for xxh64")]
    pub seed: u64,

    #[arg(short, long, help = "Cancel hashing after this many milliseconds")]
    pub timeout_ms: Option<u64>,

    #[arg(short, long, help = "Expected digest in hex; exit with status 2 on mismatch")]
    pub expect: Option<String>,

    #[arg(short, long, help = "Hide the progress bar")]
    pub quiet: bool,

    #[arg(long, env = "HASHCORE_LOG", default_value = "warn")]
    pub log_level: String,
}

impl App {
    pub fn options(&self) -> HashOptions {
        HashOptions::new()
            .buffer_size(self.buffer_size)
            .algorithm(self.algorithm.with_seed(self.seed))
    }
}
