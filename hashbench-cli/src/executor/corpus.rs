//! Input Corpus Generation
//!
//! Every candidate of a suite hashes the same bytes. The corpus is built
//! before any timing starts, in fixed-size chunks that each draw from their
//! own seeded RNG so the chunks can be filled in parallel and the output
//! depends only on the seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;

/// Bytes generated per chunk
pub const CHUNK_SIZE: usize = 100_000;

/// Generated bytes are single-byte characters (`0x00..=0x7F`)
const CHAR_MASK: u8 = 0x7F;

/// Immutable input shared by all candidates of a suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    bytes: Arc<[u8]>,
    seed: u64,
}

impl Corpus {
    /// Wrap existing bytes
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, seed: u64) -> Self {
        Self {
            bytes: bytes.into(),
            seed,
        }
    }

    /// Corpus contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Seed the corpus was generated from
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Deterministic, parallel corpus generator
#[derive(Debug, Clone, Copy)]
pub struct CorpusGenerator {
    seed: u64,
}

impl CorpusGenerator {
    /// Create a generator. Without a seed one is drawn at random and logged.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = match seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                tracing::info!(seed, "No corpus seed given, drew a random one");
                seed
            }
        };
        Self { seed }
    }

    /// Generator seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate exactly `size_bytes` bytes
    pub fn generate(&self, size_bytes: usize) -> Corpus {
        let mut bytes = vec![0u8; size_bytes];
        bytes
            .par_chunks_mut(CHUNK_SIZE)
            .enumerate()
            .for_each(|(index, chunk)| fill_chunk(self.seed, index, chunk));

        tracing::debug!(size_bytes, seed = self.seed, "Generated corpus");
        Corpus::from_bytes(bytes, self.seed)
    }
}

fn fill_chunk(seed: u64, index: usize, chunk: &mut [u8]) {
    let mut rng = chunk_rng(seed, index);
    rng.fill(chunk);
    for byte in chunk.iter_mut() {
        *byte &= CHAR_MASK;
    }
}

/// RNG for one chunk, decorrelated from its neighbours
fn chunk_rng(seed: u64, index: usize) -> StdRng {
    let mixed = seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mixed)
}
