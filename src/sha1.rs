//! SHA-1 digest built on the accumulation engine.

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::digest::BlockDigest;
use crate::engine::{Accumulator, BLOCK_LEN, Compress, DigestError, STATE_FOOTER_LEN, WORD_LEN};
use crate::snapshot::Snapshot;

/// SHA-1 digest length in bytes.
pub const SHA1_DIGEST_LEN: usize = 20;

/// Words per compression block.
const SCHEDULE_WORDS: usize = BLOCK_LEN / WORD_LEN;

/// FIPS 180 initial register values.
const H_INIT: [u32; 5] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476, 0xc3d2e1f0];

/// Register region of an encoded state, before the variable schedule tail:
/// the five hash registers plus the 4-byte schedule fill level.
const REGISTER_FIXED_LEN: usize = SHA1_DIGEST_LEN + 4;

/// Hash registers and message-schedule window driven by the engine's
/// [`Compress`] callbacks.
#[derive(Clone, Debug)]
struct Sha1Core {
    h: [u32; 5],
    x: [u32; SCHEDULE_WORDS],
    x_off: usize,
}

impl Sha1Core {
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

        let x_off = read_u32(registers, SHA1_DIGEST_LEN);
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

        let mut h = [0u32; 5];
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

impl Compress for Sha1Core {
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
        let mut w = [0u32; 80];
        w[..SCHEDULE_WORDS].copy_from_slice(&self.x);
        for i in SCHEDULE_WORDS..80 {
            w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1);
        }

        let mut a = self.h[0];
        let mut b = self.h[1];
        let mut c = self.h[2];
        let mut d = self.h[3];
        let mut e = self.h[4];

        for (i, &wi) in w.iter().enumerate() {
            let (f, k) = match i {
                0..=19 => ((b & c) | (!b & d), 0x5a827999),
                20..=39 => (b ^ c ^ d, 0x6ed9eba1),
                40..=59 => ((b & c) | (b & d) | (c & d), 0x8f1bbcdc),
                _ => (b ^ c ^ d, 0xca62c1d6),
            };

            let rotated = a
                .rotate_left(5)
                .wrapping_add(f)
                .wrapping_add(e)
                .wrapping_add(k)
                .wrapping_add(wi);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = rotated;
        }

        self.h[0] = self.h[0].wrapping_add(a);
        self.h[1] = self.h[1].wrapping_add(b);
        self.h[2] = self.h[2].wrapping_add(c);
        self.h[3] = self.h[3].wrapping_add(d);
        self.h[4] = self.h[4].wrapping_add(e);

        // The zeroed schedule doubles as the implicit zero padding between
        // the 0x80 marker word and the trailing length words.
        self.x = [0; SCHEDULE_WORDS];
        self.x_off = 0;
    }
}

/// Streaming SHA-1 hasher.
///
/// Owns an [`Accumulator`] for byte buffering and its own register state;
/// the two travel together through snapshots and the portable encoded
/// state.
#[derive(Clone, Debug)]
pub struct Sha1 {
    engine: Accumulator,
    core: Sha1Core,
}

impl Default for Sha1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha1 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            engine: Accumulator::new(),
            core: Sha1Core::new(),
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

    /// Finalises the digest and returns the 160-bit SHA-1 output.
    #[must_use]
    pub fn finalize(mut self) -> [u8; SHA1_DIGEST_LEN] {
        self.engine.finish(&mut self.core);
        let mut out = [0u8; SHA1_DIGEST_LEN];
        write_words(&self.core.h, &mut out);
        out
    }

    /// Writes the digest at `out[offset..offset + 20]`, leaving every byte
    /// outside that range untouched, then resets the hasher.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::OutOfRange`] when the destination range does
    /// not fit in `out`; the hasher state is unchanged in that case.
    pub fn finalize_into(&mut self, out: &mut [u8], offset: usize) -> Result<usize, DigestError> {
        let end = offset
            .checked_add(SHA1_DIGEST_LEN)
            .filter(|&end| end <= out.len())
            .ok_or(DigestError::OutOfRange {
                offset,
                len: SHA1_DIGEST_LEN,
                available: out.len(),
            })?;

        self.engine.finish(&mut self.core);
        write_words(&self.core.h, &mut out[offset..end]);
        self.reset();
        Ok(SHA1_DIGEST_LEN)
    }

    /// Returns the hasher to its initial state.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.core.reset();
    }

    /// Convenience helper that computes the SHA-1 digest of `data` in one
    /// shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; SHA1_DIGEST_LEN] {
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
        instrument(skip(state), fields(len = state.len()), name = "sha1_from_encoded_state")
    )]
    pub fn from_encoded_state(state: &[u8]) -> Result<Self, DigestError> {
        let (engine, registers) = Accumulator::from_encoded_state(state)?;
        let core = Sha1Core::from_registers(registers)?;
        Ok(Self { engine, core })
    }
}

impl BlockDigest for Sha1 {
    type Digest = [u8; SHA1_DIGEST_LEN];
    const DIGEST_LEN: usize = SHA1_DIGEST_LEN;
    const NAME: &'static str = "SHA-1";

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

impl Snapshot for Sha1 {
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
