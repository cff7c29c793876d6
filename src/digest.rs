use crate::engine::{BLOCK_LEN, DigestError};

/// Common surface of the fixed-output digests built on the accumulation
/// engine.
///
/// Generic callers use the associated constants for output-buffer and
/// HMAC key-block sizing; [`BLOCK_LEN`](Self::BLOCK_LEN) is the 64-byte
/// compression block, not the engine's 4-byte buffering word.
pub trait BlockDigest: Sized {
    /// Fixed-size digest output.
    type Digest: AsRef<[u8]>;

    /// Digest length in bytes.
    const DIGEST_LEN: usize;

    /// Compression block length in bytes.
    const BLOCK_LEN: usize = BLOCK_LEN;

    /// Human-readable algorithm name, e.g. `"SHA-256"`.
    const NAME: &'static str;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Writes the digest at `out[offset..offset + DIGEST_LEN]`, leaving
    /// every byte outside that range untouched, then resets the digest to
    /// its initial state. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::OutOfRange`] when the destination range does
    /// not fit in `out`; the digest state is unchanged in that case.
    fn finalize_into(&mut self, out: &mut [u8], offset: usize) -> Result<usize, DigestError>;

    /// Finalises the digest, consuming the hasher.
    #[must_use]
    fn finalize(self) -> Self::Digest;

    /// Returns the digest to its initial state.
    fn reset(&mut self);

    /// Convenience helper that hashes `data` in one shot.
    #[must_use]
    fn digest(data: &[u8]) -> Self::Digest
    where
        Self: Default,
    {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }
}
