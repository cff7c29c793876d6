use thiserror::Error;

/// Smallest unit the compression callbacks consume, in bytes.
///
/// All 32-bit-register MD4-family digests (MD5, SHA-1, SHA-256) buffer
/// input in 4-byte words before handing them to the message schedule.
pub const WORD_LEN: usize = 4;

/// Compression block size in bytes, over which padding and the final
/// length-encoding are organised.
///
/// This is deliberately distinct from [`WORD_LEN`]: callers sizing HMAC
/// key blocks need the 64-byte block, while the accumulator itself only
/// ever buffers a single word.
pub const BLOCK_LEN: usize = 64;

/// Size of the accumulator's portion of an encoded state: the word
/// buffer, a 4-byte big-endian offset, and an 8-byte big-endian byte
/// count. The algorithm's register region precedes this footer.
pub const STATE_FOOTER_LEN: usize = WORD_LEN + 4 + 8;

/// Errors surfaced by the accumulation engine and the digests built on it.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DigestError {
    /// A caller-supplied offset/length pair does not describe a valid
    /// sub-range of the buffer it was paired with.
    #[error("range {offset}+{len} exceeds the available {available} bytes")]
    OutOfRange {
        /// Start of the requested range.
        offset: usize,
        /// Length of the requested range.
        len: usize,
        /// Number of bytes actually available.
        available: usize,
    },
    /// An encoded state is shorter than the fixed accumulator footer.
    #[error("encoded state of {len} bytes is shorter than the {STATE_FOOTER_LEN} byte footer")]
    Truncated {
        /// Length of the rejected encoding.
        len: usize,
    },
    /// A decoded buffer offset or schedule fill level is out of range; a
    /// drained accumulator never persists a full word, so the stored
    /// value must be strictly below the capacity.
    #[error("decoded offset {offset} is outside the valid range of {limit}")]
    InvalidOffset {
        /// Offset recovered from the encoding.
        offset: u32,
        /// Exclusive upper bound for a well-formed state.
        limit: u32,
    },
    /// The register region of an encoded state does not have the length
    /// the concrete algorithm requires.
    #[error("encoded register region holds {found} bytes where {expected} were expected")]
    RegisterMismatch {
        /// Register-region length implied by the decoded fill level.
        expected: usize,
        /// Register-region length actually present.
        found: usize,
    },
}

/// Algorithm-specific compression callbacks driven by the [`Accumulator`].
///
/// The accumulator holds no reference to the algorithm's registers; it
/// forwards work through these three operations instead. `process_word`
/// must accept any number of exact-word calls with no state carried
/// between them beyond what the implementor itself retains.
pub trait Compress {
    /// Consumes one full word of message input.
    fn process_word(&mut self, word: [u8; WORD_LEN]);

    /// Encodes the total message bit length into the pending block, using
    /// whatever endianness the algorithm's padding rules dictate.
    fn process_length(&mut self, bit_length: u64);

    /// Runs the final compression step once padding and length are in place.
    fn process_block(&mut self);
}

/// Byte-accumulation engine shared by MD4-family digests.
///
/// Input arrives at the caller's own chunk boundaries; the engine buffers
/// partial words, forwards full words to the algorithm's [`Compress`]
/// callbacks, and tracks the total byte count for length padding. The
/// buffer is exclusively owned and never aliased; snapshots always deep
/// copy it.
#[derive(Clone, Debug, Default)]
pub struct Accumulator {
    buf: [u8; WORD_LEN],
    off: usize,
    byte_count: u64,
}

/// Only `buf[..off]` is significant: a forwarded word may leave its bytes
/// stale in the buffer on the single-byte path while the bulk path
/// forwards words without touching it, so equality must not look past the
/// offset.
impl PartialEq for Accumulator {
    fn eq(&self, other: &Self) -> bool {
        self.off == other.off
            && self.byte_count == other.byte_count
            && self.buf[..self.off] == other.buf[..other.off]
    }
}

impl Eq for Accumulator {}

impl Accumulator {
    /// Creates an engine with an empty buffer and a zero byte count.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; WORD_LEN],
            off: 0,
            byte_count: 0,
        }
    }

    /// Returns the total number of bytes fed through `update` so far,
    /// including bytes already forwarded as full words.
    #[must_use]
    pub const fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Appends a single byte, forwarding the buffered word to `alg` when
    /// it completes.
    pub fn update_byte(&mut self, alg: &mut impl Compress, byte: u8) {
        self.buf[self.off] = byte;
        self.off += 1;

        if self.off == WORD_LEN {
            alg.process_word(self.buf);
            self.off = 0;
        }

        self.byte_count = self.byte_count.wrapping_add(1);
    }

    /// Appends a slice of bytes.
    ///
    /// A pending partial word is completed first; whole words are then
    /// forwarded directly from `data` without copying through the
    /// internal buffer, and any tail shorter than a word is stashed for
    /// the next call.
    pub fn update(&mut self, alg: &mut impl Compress, data: &[u8]) {
        let mut input = data;

        if self.off != 0 {
            while let Some((&byte, rest)) = input.split_first() {
                self.buf[self.off] = byte;
                self.off += 1;
                input = rest;

                if self.off == WORD_LEN {
                    alg.process_word(self.buf);
                    self.off = 0;
                    break;
                }
            }
        }

        let mut words = input.chunks_exact(WORD_LEN);
        for chunk in &mut words {
            let mut word = [0u8; WORD_LEN];
            word.copy_from_slice(chunk);
            alg.process_word(word);
        }

        for &byte in words.remainder() {
            self.buf[self.off] = byte;
            self.off += 1;
        }

        self.byte_count = self.byte_count.wrapping_add(data.len() as u64);
    }

    /// Appends the `offset`/`len` sub-range of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::OutOfRange`] when the pair does not describe
    /// an in-bounds region of `data`; nothing is consumed in that case.
    pub fn update_range(
        &mut self,
        alg: &mut impl Compress,
        data: &[u8],
        offset: usize,
        len: usize,
    ) -> Result<(), DigestError> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= data.len())
            .ok_or(DigestError::OutOfRange {
                offset,
                len,
                available: data.len(),
            })?;

        self.update(alg, &data[offset..end]);
        Ok(())
    }

    /// Pads the message and drives the final compression.
    ///
    /// The bit length is captured before any padding is appended. A single
    /// `0x80` marker byte is written, then zero bytes until the pending
    /// word is exactly full and has been forwarded (1 to [`WORD_LEN`] pad
    /// bytes in total), then the algorithm consumes the bit length and
    /// compresses the final block. The engine is left as the callbacks
    /// left it; call [`reset`](Self::reset) before reuse.
    pub fn finish(&mut self, alg: &mut impl Compress) {
        let bit_length = self.byte_count << 3;

        self.update_byte(alg, 0x80);
        while self.off != 0 {
            self.update_byte(alg, 0x00);
        }

        alg.process_length(bit_length);
        alg.process_block();
    }

    /// Returns the engine to its freshly constructed state. Idempotent.
    pub fn reset(&mut self) {
        self.byte_count = 0;
        self.off = 0;
        self.buf = [0; WORD_LEN];
    }

    /// Serialises the buffering state into the fixed-size footer region of
    /// an encoded state: the significant buffer bytes, the offset as a
    /// 4-byte big-endian integer, and the byte count as an 8-byte
    /// big-endian integer.
    pub fn write_state_footer(&self, footer: &mut [u8; STATE_FOOTER_LEN]) {
        footer.fill(0);
        footer[..self.off].copy_from_slice(&self.buf[..self.off]);
        footer[WORD_LEN..WORD_LEN + 4].copy_from_slice(&(self.off as u32).to_be_bytes());
        footer[WORD_LEN + 4..].copy_from_slice(&self.byte_count.to_be_bytes());
    }

    /// Reconstructs the buffering state from the trailing footer of
    /// `state`, returning the engine together with the algorithm's
    /// register region that precedes it.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Truncated`] when `state` is shorter than the
    /// footer and [`DigestError::InvalidOffset`] when the stored buffer
    /// offset is not strictly below [`WORD_LEN`]. A malformed state is
    /// rejected whole, never partially accepted.
    pub fn from_encoded_state(state: &[u8]) -> Result<(Self, &[u8]), DigestError> {
        if state.len() < STATE_FOOTER_LEN {
            return Err(DigestError::Truncated { len: state.len() });
        }

        let (registers, footer) = state.split_at(state.len() - STATE_FOOTER_LEN);

        let mut off_bytes = [0u8; 4];
        off_bytes.copy_from_slice(&footer[WORD_LEN..WORD_LEN + 4]);
        let off = u32::from_be_bytes(off_bytes);
        if off as usize >= WORD_LEN {
            return Err(DigestError::InvalidOffset {
                offset: off,
                limit: WORD_LEN as u32,
            });
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&footer[WORD_LEN + 4..]);

        let mut buf = [0u8; WORD_LEN];
        buf.copy_from_slice(&footer[..WORD_LEN]);

        Ok((
            Self {
                buf,
                off: off as usize,
                byte_count: u64::from_be_bytes(count_bytes),
            },
            registers,
        ))
    }
}
