//! SHA-256 digest built on the accumulation engine.

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::digest::BlockDigest;
use crate::engine::{Accumulator, BLOCK_LEN, Compress, DigestError, STATE_FOOTER_LEN, WORD_LEN};
use crate::snapshot::Snapshot;

/// SHA-256 digest length in bytes.
pub const SHA256_DIGEST_LEN: usize = 32;

/// Words per compression block.
const SCHEDULE_WORDS: usize = BLOCK_LEN / WORD_LEN;

/// FIPS 180 initial register values.
const H_INIT: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

/// FIPS 180 round constants.
const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// Register region of an encoded state, before the variable schedule tail:
/// the eight hash registers plus the 4-byte schedule fill level.
const REGISTER_FIXED_LEN: usize = SHA256_DIGEST_LEN + 4;

/// Hash registers and message-schedule window driven by the engine's
/// [`Compress`] callbacks.
#[derive(Clone, Debug)]
struct Sha256Core {
    h: [u32; 8],
    x: [u32; SCHEDULE_WORDS],
    x_off: usize,
}

impl Sha256Core {
    const fn new() -> Self {
        Self {
            h: H_INIT,
            x: [0; SCHEDULE_WORDS],
            x_off: 0,
        }
    }

    fn reset(&mut self) {
        self.h = H_INIT;
        self.x = [0; SCHEDULE_WORDS];
        self.x_off = 0;
    }

    fn write_registers(&self, state: &mut Vec<u8>) {
        for word in self.h {
            state.extend_from_slice(&word.to_be_bytes());
        }
        state.extend_from_slice(&(self.x_off as u32).to_be_bytes());
        for &word in &self.x[..self.x_off] {
            state.extend_from_slice(&word.to_be_bytes());
        }
    }

    fn from_registers(registers: &[u8]) -> Result<Self, DigestError> {
        if registers.len() < REGISTER_FIXED_LEN {
            return Err(DigestError::RegisterMismatch {
                expected: REGISTER_FIXED_LEN,
                found: registers.len(),
            });
        }

        let x_off = read_u32(registers, SHA256_DIGEST_LEN);
        if x_off as usize >= SCHEDULE_WORDS {
            return Err(DigestError::InvalidOffset {
                offset: x_off,
                limit: SCHEDULE_WORDS as u32,
            });
        }

        let x_off = x_off as usize;
        let expected = REGISTER_FIXED_LEN + WORD_LEN * x_off;
        if registers.len() != expected {
            return Err(DigestError::RegisterMismatch {
                expected,
                found: registers.len(),
            });
        }

        let mut h = [0u32; 8];
        for (i, word) in h.iter_mut().enumerate() {
            *word = read_u32(registers, i * WORD_LEN);
        }

        let mut x = [0u32; SCHEDULE_WORDS];
        for (i, word) in x[..x_off].iter_mut().enumerate() {
            *word = read_u32(registers, REGISTER_FIXED_LEN + i * WORD_LEN);
        }

        Ok(Self { h, x, x_off })
    }
}

impl Compress for Sha256Core {
    fn process_word(&mut self, word: [u8; WORD_LEN]) {
        self.x[self.x_off] = u32::from_be_bytes(word);
        self.x_off += 1;

        if self.x_off == SCHEDULE_WORDS {
            self.process_block();
        }
    }

    fn process_length(&mut self, bit_length: u64) {
        if self.x_off > SCHEDULE_WORDS - 2 {
            self.process_block();
        }

        self.x[SCHEDULE_WORDS - 2] = (bit_length >> 32) as u32;
        self.x[SCHEDULE_WORDS - 1] = bit_length as u32;
    }

    fn process_block(&mut self) {
        let mut w = [0u32; 64];
        w[..SCHEDULE_WORDS].copy_from_slice(&self.x);
        for i in SCHEDULE_WORDS..64 {
            let s0 = w[i - 15].rotate_right(7) ^ w[i - 15].rotate_right(18) ^ (w[i - 15] >> 3);
            let s1 = w[i - 2].rotate_right(17) ^ w[i - 2].rotate_right(19) ^ (w[i - 2] >> 10);
            w[i] = w[i - 16]
                .wrapping_add(s0)
                .wrapping_add(w[i - 7])
                .wrapping_add(s1);
        }

        let mut a = self.h[0];
        let mut b = self.h[1];
        let mut c = self.h[2];
        let mut d = self.h[3];
        let mut e = self.h[4];
        let mut f = self.h[5];
        let mut g = self.h[6];
        let mut hh = self.h[7];

        for i in 0..64 {
            let big_s1 = e.rotate_right(6) ^ e.rotate_right(11) ^ e.rotate_right(25);
            let ch = (e & f) ^ (!e & g);
            let t1 = hh
                .wrapping_add(big_s1)
                .wrapping_add(ch)
                .wrapping_add(K[i])
                .wrapping_add(w[i]);
            let big_s0 = a.rotate_right(2) ^ a.rotate_right(13) ^ a.rotate_right(22);
            let maj = (a & b) ^ (a & c) ^ (b & c);
            let t2 = big_s0.wrapping_add(maj);

            hh = g;
            g = f;
            f = e;
            e = d.wrapping_add(t1);
            d = c;
            c = b;
            b = a;
            a = t1.wrapping_add(t2);
        }

        self.h[0] = self.h[0].wrapping_add(a);
        self.h[1] = self.h[1].wrapping_add(b);
        self.h[2] = self.h[2].wrapping_add(c);
        self.h[3] = self.h[3].wrapping_add(d);
        self.h[4] = self.h[4].wrapping_add(e);
        self.h[5] = self.h[5].wrapping_add(f);
        self.h[6] = self.h[6].wrapping_add(g);
        self.h[7] = self.h[7].wrapping_add(hh);

        // The zeroed schedule doubles as the implicit zero padding between
        // the 0x80 marker word and the trailing length words.
        self.x = [0; SCHEDULE_WORDS];
        self.x_off = 0;
    }
}

/// Streaming SHA-256 hasher.
///
/// Owns an [`Accumulator`] for byte buffering and its own register state;
/// the two travel together through snapshots and the portable encoded
/// state.
#[derive(Clone, Debug)]
pub struct Sha256 {
    engine: Accumulator,
    core: Sha256Core,
}

impl Default for Sha256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha256 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            engine: Accumulator::new(),
            core: Sha256Core::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.engine.update(&mut self.core, data);
    }

    /// Feeds a single byte into the digest state.
    pub fn update_byte(&mut self, byte: u8) {
        self.engine.update_byte(&mut self.core, byte);
    }

    /// Feeds the `offset`/`len` sub-range of `data` into the digest state.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::OutOfRange`] when the pair does not describe
    /// an in-bounds region of `data`.
    pub fn update_range(
        &mut self,
        data: &[u8],
        offset: usize,
        len: usize,
    ) -> Result<(), DigestError> {
        self.engine.update_range(&mut self.core, data, offset, len)
    }

    /// Returns the total number of message bytes hashed so far.
    #[must_use]
    pub const fn bytes_hashed(&self) -> u64 {
        self.engine.byte_count()
    }

    /// Finalises the digest and returns the 256-bit SHA-256 output.
    #[must_use]
    pub fn finalize(mut self) -> [u8; SHA256_DIGEST_LEN] {
        self.engine.finish(&mut self.core);
        let mut out = [0u8; SHA256_DIGEST_LEN];
        write_words(&self.core.h, &mut out);
        out
    }

    /// Writes the digest at `out[offset..offset + 32]`, leaving every byte
    /// outside that range untouched, then resets the hasher.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::OutOfRange`] when the destination range does
    /// not fit in `out`; the hasher state is unchanged in that case.
    pub fn finalize_into(&mut self, out: &mut [u8], offset: usize) -> Result<usize, DigestError> {
        let end = offset
            .checked_add(SHA256_DIGEST_LEN)
            .filter(|&end| end <= out.len())
            .ok_or(DigestError::OutOfRange {
                offset,
                len: SHA256_DIGEST_LEN,
                available: out.len(),
            })?;

        self.engine.finish(&mut self.core);
        write_words(&self.core.h, &mut out[offset..end]);
        self.reset();
        Ok(SHA256_DIGEST_LEN)
    }

    /// Returns the hasher to its initial state.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.core.reset();
    }

    /// Convenience helper that computes the SHA-256 digest of `data` in
    /// one shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; SHA256_DIGEST_LEN] {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Serialises the full hasher state: the hash registers, the schedule
    /// fill level, the filled schedule words (all big-endian), then the
    /// engine's fixed footer.
    #[must_use]
    pub fn encoded_state(&self) -> Vec<u8> {
        let mut state = Vec::with_capacity(
            REGISTER_FIXED_LEN + WORD_LEN * self.core.x_off + STATE_FOOTER_LEN,
        );
        self.core.write_registers(&mut state);

        let mut footer = [0u8; STATE_FOOTER_LEN];
        self.engine.write_state_footer(&mut footer);
        state.extend_from_slice(&footer);
        state
    }

    /// Reconstructs a hasher from a state produced by
    /// [`encoded_state`](Self::encoded_state).
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Truncated`] for states shorter than the
    /// engine footer, [`DigestError::InvalidOffset`] for out-of-range
    /// buffer or schedule offsets, and [`DigestError::RegisterMismatch`]
    /// when the register region does not match the decoded fill level.
    #[cfg_attr(
        feature = "tracing",
        instrument(skip(state), fields(len = state.len()), name = "sha256_from_encoded_state")
    )]
    pub fn from_encoded_state(state: &[u8]) -> Result<Self, DigestError> {
        let (engine, registers) = Accumulator::from_encoded_state(state)?;
        let core = Sha256Core::from_registers(registers)?;
        Ok(Self { engine, core })
    }
}

impl BlockDigest for Sha256 {
    type Digest = [u8; SHA256_DIGEST_LEN];
    const DIGEST_LEN: usize = SHA256_DIGEST_LEN;
    const NAME: &'static str = "SHA-256";

    fn update(&mut self, data: &[u8]) {
        self.update(data);
    }

    fn finalize_into(&mut self, out: &mut [u8], offset: usize) -> Result<usize, DigestError> {
        self.finalize_into(out, offset)
    }

    fn finalize(self) -> Self::Digest {
        self.finalize()
    }

    fn reset(&mut self) {
        self.reset();
    }
}

impl Snapshot for Sha256 {
    fn capture(&self) -> Self {
        self.clone()
    }

    fn restore(&mut self, snapshot: &Self) {
        self.engine = snapshot.engine.clone();
        self.core = snapshot.core.clone();
    }
}

fn write_words(words: &[u32], out: &mut [u8]) {
    for (slot, word) in out.chunks_exact_mut(WORD_LEN).zip(words) {
        slot.copy_from_slice(&word.to_be_bytes());
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_be_bytes(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(bytes: &[u8]) -> String {
        use std::fmt::Write as _;

        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
        }
        out
    }

    #[test]
    fn sha256_streaming_matches_fips_vectors() {
        let vectors = [
            (
                b"".as_slice(),
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            ),
            (
                b"a".as_slice(),
                "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb",
            ),
            (
                b"abc".as_slice(),
                "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            ),
            (
                b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq".as_slice(),
                "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
            ),
        ];

        for (input, expected_hex) in vectors {
            let mut hasher = Sha256::new();
            let mid = input.len() / 2;
            hasher.update(&input[..mid]);
            hasher.update(&input[mid..]);
            assert_eq!(to_hex(&hasher.finalize()), expected_hex);

            let one_shot = Sha256::digest(input);
            assert_eq!(to_hex(&one_shot), expected_hex);
        }
    }

    #[test]
    fn encoded_state_resumes_mid_message() {
        let input = b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq";

        let mut hasher = Sha256::new();
        hasher.update(&input[..23]);

        let mut resumed = Sha256::from_encoded_state(&hasher.encoded_state())
            .expect("state produced by encoded_state always decodes");

        hasher.update(&input[23..]);
        resumed.update(&input[23..]);

        assert_eq!(hasher.finalize(), resumed.finalize());
    }

    #[test]
    fn malformed_register_region_is_rejected() {
        let hasher = Sha256::new();
        let mut state = hasher.encoded_state();

        state[SHA256_DIGEST_LEN..SHA256_DIGEST_LEN + 4].copy_from_slice(&5u32.to_be_bytes());
        let err = Sha256::from_encoded_state(&state).expect_err("inconsistent region must fail");
        assert_eq!(
            err,
            DigestError::RegisterMismatch {
                expected: REGISTER_FIXED_LEN + 5 * WORD_LEN,
                found: REGISTER_FIXED_LEN,
            }
        );
    }
}
