//! Hostname to worker routing
//!
//! The worker index is the first 8 bytes of the SHA-256 digest of the key,
//! read big-endian, modulo the worker count. No seed is mixed in, so a host
//! maps to the same worker in every run with the same pool size.

use sha2::{Digest, Sha256};

use crate::utils::{BenchmarkError, Result};

/// Stable 64-bit hash of a routing key
pub fn key_hash(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}

/// Select the worker responsible for `key`
pub fn route(key: &str, worker_count: usize) -> Result<usize> {
    if worker_count == 0 {
        return Err(BenchmarkError::Config(
            "worker count must be at least 1".to_string(),
        ));
    }
    Ok((key_hash(key) % worker_count as u64) as usize)
}
