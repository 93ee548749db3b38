//! Hash Candidate Registry
//!
//! The algorithms HashBench compares out of the box. Seeded hashes use seed 0.

use hashbench_core::{Suite, SuiteError};
use sha2::Digest;
use std::fmt;
use std::hash::Hasher;
use std::hint::black_box;

/// A hash function available as a benchmark candidate
#[derive(Clone, Copy)]
pub struct HashAlgorithm {
    /// Candidate name
    pub name: &'static str,
    /// Crate providing the implementation
    pub provider: &'static str,
    /// Whether the algorithm is a cryptographic digest
    pub cryptographic: bool,
    /// Hash the input once
    pub hash: fn(&[u8]),
}

/// Every registered algorithm, in registration order
pub static ALGORITHMS: &[HashAlgorithm] = &[
    HashAlgorithm {
        name: "xxh32",
        provider: "xxhash-rust",
        cryptographic: false,
        hash: xxh32,
    },
    HashAlgorithm {
        name: "xxh64",
        provider: "xxhash-rust",
        cryptographic: false,
        hash: xxh64,
    },
    HashAlgorithm {
        name: "xxh3",
        provider: "xxhash-rust",
        cryptographic: false,
        hash: xxh3,
    },
    HashAlgorithm {
        name: "fxhash",
        provider: "fxhash",
        cryptographic: false,
        hash: fxhash64,
    },
    HashAlgorithm {
        name: "metrohash64",
        provider: "metrohash",
        cryptographic: false,
        hash: metrohash64,
    },
    HashAlgorithm {
        name: "metrohash128",
        provider: "metrohash",
        cryptographic: false,
        hash: metrohash128,
    },
    HashAlgorithm {
        name: "farmhash32",
        provider: "farmhash",
        cryptographic: false,
        hash: farmhash32,
    },
    HashAlgorithm {
        name: "farmhash64",
        provider: "farmhash",
        cryptographic: false,
        hash: farmhash64,
    },
    HashAlgorithm {
        name: "md4",
        provider: "md4",
        cryptographic: true,
        hash: digest::<md4::Md4>,
    },
    HashAlgorithm {
        name: "md5",
        provider: "md-5",
        cryptographic: true,
        hash: digest::<md5::Md5>,
    },
    HashAlgorithm {
        name: "sha1",
        provider: "sha-1",
        cryptographic: true,
        hash: digest::<sha1::Sha1>,
    },
    HashAlgorithm {
        name: "sha256",
        provider: "sha2",
        cryptographic: true,
        hash: digest::<sha2::Sha256>,
    },
    HashAlgorithm {
        name: "blake2b",
        provider: "blake2",
        cryptographic: true,
        hash: digest::<blake2::Blake2b512>,
    },
    HashAlgorithm {
        name: "blake2s",
        provider: "blake2",
        cryptographic: true,
        hash: digest::<blake2::Blake2s256>,
    },
    HashAlgorithm {
        name: "blake3",
        provider: "blake3",
        cryptographic: true,
        hash: blake3_hash,
    },
];

impl fmt::Debug for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashAlgorithm")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("cryptographic", &self.cryptographic)
            .finish()
    }
}

fn xxh32(input: &[u8]) {
    black_box(xxhash_rust::xxh32::xxh32(input, 0));
}

fn xxh64(input: &[u8]) {
    black_box(xxhash_rust::xxh64::xxh64(input, 0));
}

fn xxh3(input: &[u8]) {
    black_box(xxhash_rust::xxh3::xxh3_64_with_seed(input, 0));
}

fn fxhash64(input: &[u8]) {
    black_box(fxhash::hash64(input));
}

fn metrohash64(input: &[u8]) {
    let mut hasher = metrohash::MetroHash64::with_seed(0);
    hasher.write(input);
    black_box(hasher.finish());
}

fn metrohash128(input: &[u8]) {
    let mut hasher = metrohash::MetroHash128::with_seed(0);
    hasher.write(input);
    black_box(hasher.finish128());
}

fn farmhash32(input: &[u8]) {
    black_box(farmhash::hash32_with_seed(input, 0));
}

fn farmhash64(input: &[u8]) {
    black_box(farmhash::hash64_with_seed(input, 0));
}

fn blake3_hash(input: &[u8]) {
    black_box(blake3::hash(input));
}

fn digest<D: Digest>(input: &[u8]) {
    black_box(D::digest(input));
}

/// Look up an algorithm by name
pub fn find_algorithm(name: &str) -> Option<&'static HashAlgorithm> {
    ALGORITHMS.iter().find(|a| a.name == name)
}

/// Build a suite over `size` bytes with the given algorithms, in order
pub fn build_suite(size: usize, algorithms: &[&HashAlgorithm]) -> Result<Suite, SuiteError> {
    let mut suite = Suite::for_size(size);
    for algorithm in algorithms {
        suite.register(algorithm.name, algorithm.hash)?;
    }
    Ok(suite)
}
