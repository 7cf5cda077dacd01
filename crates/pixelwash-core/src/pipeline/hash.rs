//! Content hashing for inputs and artifacts.

use blake3::Hasher as Blake3Hasher;

/// BLAKE3 content hashes, hex encoded.
pub struct Hasher;

impl Hasher {
    /// Hash an in-memory byte buffer.
    ///
    /// Inputs are read fully before decoding anyway, so there is no streaming
    /// variant.
    pub fn content_hash(data: &[u8]) -> String {
        let mut hasher = Blake3Hasher::new();
        hasher.update(data);
        hasher.finalize().to_hex().to_string()
    }
}
